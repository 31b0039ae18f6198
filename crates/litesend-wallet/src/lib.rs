//! # litesend-wallet
//! Coin selection, fee estimation, and the staged payment pipeline.
//!
//! Modules:
//! - `utxo_source`: fetch, validate, and sort an address's unspent outputs
//! - `coin_selection`: largest-first greedy selection
//! - `fee`: fee-rate quote to absolute fee
//! - `builder`: balanced transaction request assembly
//! - `pipeline`: the payment state machine and its outcome types
//! - `wallet`: wiring to the Insight client and the Litecoin signer
//! - `error`: payment errors and their failure classes

pub mod builder;
pub mod coin_selection;
pub mod error;
pub mod fee;
pub mod pipeline;
pub mod utxo_source;
pub mod wallet;

#[cfg(test)]
mod test_support;

pub use builder::TransactionBuilder;
pub use coin_selection::CoinSelector;
pub use error::{FailureClass, PaymentError};
pub use fee::FeeEstimator;
pub use pipeline::{
    BroadcastOutcome, PaymentFailure, PaymentPipeline, PaymentReceipt, PaymentStage,
    PipelineConfig,
};
pub use utxo_source::UtxoSource;
pub use wallet::send_payment;
