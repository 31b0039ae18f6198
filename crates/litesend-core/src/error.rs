//! Error types shared across litesend crates.
use thiserror::Error;

/// Failures of exact decimal arithmetic and amount conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("malformed number: {0:?}")] Malformed(String),
    #[error("negative amount: {0}")] Negative(String),
    #[error("amount must be greater than zero")] Zero,
    #[error("too many decimal places in {value}: at most {max_decimals} allowed")] ExcessPrecision { value: String, max_decimals: u32 },
    #[error("amount out of range: {0}")] Overflow(String),
    #[error("division by zero")] DivisionByZero,
    #[error("unsupported operator: {0:?}")] UnsupportedOperator(String),
    #[error("exponent must be an integer: {0}")] NonIntegerExponent(String),
    #[error("exponent too large: {0}")] ExponentTooLarge(String),
}

/// Failures reported by the remote ledger service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The request never produced a response (connect, DNS, timeout).
    #[error("transport: {0}")] Transport(String),
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")] Http { status: u16, body: String },
    /// The response body could not be understood.
    #[error("unexpected response: {0}")] Parse(String),
    /// The service understood the request but cannot answer it right now.
    #[error("unavailable: {0}")] Unavailable(String),
    /// The relay refused a submitted transaction.
    #[error("rejected by relay: {0}")] Rejected(String),
}

impl LedgerError {
    /// Whether the failure happened below the application protocol, so the
    /// same request may succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Transport(_) | LedgerError::Unavailable(_) => true,
            LedgerError::Http { status, .. } => *status >= 500 || *status == 429,
            LedgerError::Parse(_) | LedgerError::Rejected(_) => false,
        }
    }
}

/// Failures of key handling, address encoding, and signing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("invalid key material: {0}")] InvalidKey(String),
    #[error("invalid address {address:?}: {reason}")] InvalidAddress { address: String, reason: String },
    #[error("address {address} belongs to {found}, expected {expected}")] WrongNetwork { address: String, expected: String, found: String },
    #[error("invalid transaction input: {0}")] InvalidInput(String),
    #[error("signing failed: {0}")] Signing(String),
}
