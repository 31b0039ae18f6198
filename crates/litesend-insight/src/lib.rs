//! # litesend-insight
//! Ledger access through an Insight block explorer: unspent outputs, fee
//! estimates, and transaction relay.

pub mod client;
pub mod config;
pub mod wire;

pub use client::{connect, InsightClient};
pub use config::{ConfigError, Endpoints};
