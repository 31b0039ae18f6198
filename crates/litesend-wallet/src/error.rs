//! Payment error types.

use litesend_core::amount::Amount;
use litesend_core::error::{AmountError, LedgerError, SignerError};
use thiserror::Error;

/// Everything that can terminate a payment attempt.
///
/// Collaborator errors are carried unchanged as the error source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The requested amount is malformed, negative, zero, or too precise.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[source] AmountError),

    /// The destination address is not valid on the target network.
    #[error("invalid destination: {0}")]
    InvalidAddress(#[source] SignerError),

    /// Fetching unspent outputs failed.
    #[error("UTXO source unavailable: {0}")]
    SourceUnavailable(#[source] LedgerError),

    /// The address does not hold enough value to cover the payment.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Total value of all candidate outputs, in litoshis.
        have: Amount,
        /// Requested payment, in litoshis.
        need: Amount,
    },

    /// Fetching a fee rate failed, or the ledger could not estimate one.
    #[error("fee estimate unavailable: {0}")]
    FeeUnavailable(#[source] LedgerError),

    /// The selected outputs cover the payment but not the fee.
    #[error("negative change: selected {selected}, amount {amount}, fee {fee}")]
    NegativeChange {
        selected: Amount,
        amount: Amount,
        fee: Amount,
    },

    /// Building the request broke the value equation.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Key handling or signing failed.
    #[error("signing failed: {0}")]
    SigningError(#[source] SignerError),

    /// The relay refused the transaction.
    #[error("broadcast rejected: {0}")]
    BroadcastRejected(#[source] LedgerError),

    /// The broadcast call failed or timed out without a verdict. The relay
    /// may have accepted the transaction.
    #[error("broadcast outcome unknown: {0}")]
    BroadcastUnconfirmed(#[source] LedgerError),

    /// The caller cancelled the attempt, or a stage exceeded its time limit.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

/// How a caller should react to a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// Try again later, with fresh ledger data.
    Retryable,
    /// Will not succeed without different input.
    Permanent,
    /// An internal invariant broke; report it.
    Bug,
    /// The transaction may already be on the network. Look up the signed
    /// txid before trying again.
    Unknown,
}

impl PaymentError {
    pub fn class(&self) -> FailureClass {
        match self {
            PaymentError::SourceUnavailable(_)
            | PaymentError::FeeUnavailable(_)
            | PaymentError::Cancelled(_) => FailureClass::Retryable,
            PaymentError::BroadcastUnconfirmed(_) => FailureClass::Unknown,
            PaymentError::NegativeChange { .. } | PaymentError::InvariantViolation(_) => {
                FailureClass::Bug
            }
            PaymentError::InvalidAmount(_)
            | PaymentError::InvalidAddress(_)
            | PaymentError::InsufficientFunds { .. }
            | PaymentError::SigningError(_)
            | PaymentError::BroadcastRejected(_) => FailureClass::Permanent,
        }
    }
}
