//! Mocks and fixtures shared by the unit tests.

use async_trait::async_trait;
use litesend_core::amount::Amount;
use litesend_core::error::{LedgerError, SignerError};
use litesend_core::traits::{LedgerReader, LedgerWriter, TransactionSigner};
use litesend_core::types::{
    FeeQuote, KeyMaterial, SignedTransaction, TransactionRequest, UnspentOutput,
};
use mockall::mock;

mock! {
    pub Ledger {}

    #[async_trait]
    impl LedgerReader for Ledger {
        async fn fetch_unspent_outputs(
            &self,
            address: &str,
        ) -> Result<Vec<UnspentOutput>, LedgerError>;
        async fn fetch_fee_rate(&self, block_target: u32) -> Result<FeeQuote, LedgerError>;
    }

    #[async_trait]
    impl LedgerWriter for Ledger {
        async fn broadcast_transaction(
            &self,
            tx: &SignedTransaction,
        ) -> Result<String, LedgerError>;
    }
}

mock! {
    pub Signer {}

    impl TransactionSigner for Signer {
        fn derive_address(&self, key: &KeyMaterial) -> Result<String, SignerError>;
        fn validate_address(&self, address: &str) -> Result<(), SignerError>;
        fn build_and_sign(
            &self,
            request: &TransactionRequest,
            key: &KeyMaterial,
        ) -> Result<SignedTransaction, SignerError>;
    }
}

pub fn utxo(txid: &str, index: u32, value: u64) -> UnspentOutput {
    UnspentOutput {
        txid: txid.to_string(),
        output_index: index,
        address: "mSender".into(),
        value: Amount::from_minor(value),
        confirmations: 3,
        script_pubkey: None,
    }
}

pub fn quote(rate: &str) -> FeeQuote {
    FeeQuote {
        fee_rate_per_kb: rate.parse().unwrap(),
        blocks_to_confirm: 3,
    }
}
