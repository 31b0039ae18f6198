//! Shared fixtures for the litesend end-to-end tests.

pub mod helpers;
