//! # litesend-core
//! Foundation types, exact amount arithmetic, and collaborator traits for
//! the litesend payment pipeline.

pub mod amount;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
