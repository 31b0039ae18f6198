//! Payment data model: unspent outputs, selections, fee quotes, and the
//! transaction request handed to the signer.
//!
//! All monetary values are [`Amount`]s in litoshis.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::amount::{Amount, ExactDecimal};

/// Reference to a specific output of a previous transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    /// Transaction ID (hex, display byte order).
    pub txid: String,
    /// Index of the output within the transaction.
    pub index: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// A spendable output as reported by the ledger.
///
/// Immutable once fetched. Identity is its [`OutPoint`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnspentOutput {
    /// Funding transaction ID.
    pub txid: String,
    /// Output index within the funding transaction.
    pub output_index: u32,
    /// Address that owns the output.
    pub address: String,
    /// Value in litoshis.
    pub value: Amount,
    /// Confirmations at fetch time (0 = mempool).
    pub confirmations: u64,
    /// Locking script (hex), when the ledger reports it.
    pub script_pubkey: Option<String>,
}

impl UnspentOutput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid.clone(),
            index: self.output_index,
        }
    }
}

/// Outcome of coin selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionResult {
    /// Chosen outputs, in selection order.
    pub chosen: Vec<UnspentOutput>,
    /// Sum of `chosen` values.
    pub total_selected: Amount,
}

/// A fee-rate quote from the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeQuote {
    /// Rate in major units per kilobyte, exactly as quoted.
    pub fee_rate_per_kb: ExactDecimal,
    /// Confirmation target the quote was requested for.
    pub blocks_to_confirm: u32,
}

/// One transaction output: destination address and value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOutputSpec {
    pub address: String,
    pub amount: Amount,
}

/// A fully balanced payment, ready for signing.
///
/// Only constructible through [`TransactionRequest::new`], which enforces
/// `sum(inputs) == recipient + change + fee`. Fields are read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    inputs: Vec<UnspentOutput>,
    recipient: TxOutputSpec,
    change: TxOutputSpec,
    fee: Amount,
}

impl TransactionRequest {
    /// Assemble a request. Returns `None` if the value equation does not
    /// balance exactly (or overflows).
    pub fn new(
        inputs: Vec<UnspentOutput>,
        recipient: TxOutputSpec,
        change: TxOutputSpec,
        fee: Amount,
    ) -> Option<Self> {
        let total_in = Amount::checked_sum(inputs.iter().map(|u| u.value))?;
        let total_out = recipient
            .amount
            .checked_add(change.amount)?
            .checked_add(fee)?;
        (total_in == total_out).then_some(Self {
            inputs,
            recipient,
            change,
            fee,
        })
    }

    pub fn inputs(&self) -> &[UnspentOutput] {
        &self.inputs
    }

    pub fn recipient(&self) -> &TxOutputSpec {
        &self.recipient
    }

    pub fn change(&self) -> &TxOutputSpec {
        &self.change
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    /// Sum of input values. Cannot overflow: checked at construction.
    pub fn total_input(&self) -> Amount {
        self.inputs
            .iter()
            .fold(Amount::ZERO, |acc, u| Amount::from_minor(acc.as_minor() + u.value.as_minor()))
    }
}

/// A signed, serialized transaction as produced by the signer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Transaction ID (hex, display byte order).
    pub txid: String,
    /// Consensus-serialized transaction, hex encoded.
    pub raw_hex: String,
}

/// Secret key material (an extended private key string).
///
/// Zeroized on drop and never printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    secret: String,
}

impl KeyMaterial {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The secret string. Handle with care.
    pub fn expose_secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
