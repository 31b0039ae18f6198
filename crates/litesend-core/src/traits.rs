//! Collaborator interfaces for the payment pipeline.
//!
//! - [`LedgerReader`] — UTXO and fee-rate queries (litesend-insight implements)
//! - [`LedgerWriter`] — transaction relay (litesend-insight implements)
//! - [`TransactionSigner`] — key handling and signing (litesend-keys implements)
//!
//! Implementations perform no retries or backoff; that policy belongs to
//! whoever drives the pipeline.

use async_trait::async_trait;

use crate::error::{LedgerError, SignerError};
use crate::types::{FeeQuote, KeyMaterial, SignedTransaction, TransactionRequest, UnspentOutput};

/// Read access to the remote ledger/indexing service.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Unspent outputs currently owned by `address`, in the service's order.
    async fn fetch_unspent_outputs(&self, address: &str) -> Result<Vec<UnspentOutput>, LedgerError>;

    /// Fee rate for confirmation within `block_target` blocks.
    async fn fetch_fee_rate(&self, block_target: u32) -> Result<FeeQuote, LedgerError>;
}

/// Transaction submission to the network relay.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Submit a signed transaction. Returns the relay-assigned transaction ID.
    async fn broadcast_transaction(&self, tx: &SignedTransaction) -> Result<String, LedgerError>;
}

/// Key derivation, address handling, and transaction signing.
///
/// Signing is local CPU work, so this trait is synchronous.
pub trait TransactionSigner: Send + Sync {
    /// The address controlled by `key`. Used as the change address.
    fn derive_address(&self, key: &KeyMaterial) -> Result<String, SignerError>;

    /// Check that `address` is a valid destination on the signer's network.
    fn validate_address(&self, address: &str) -> Result<(), SignerError>;

    /// Build the concrete transaction for `request` and sign every input.
    fn build_and_sign(
        &self,
        request: &TransactionRequest,
        key: &KeyMaterial,
    ) -> Result<SignedTransaction, SignerError>;
}
