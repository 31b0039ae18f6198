//! Shared test helpers for end-to-end payment tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bitcoin::bip32::Xpriv;
use bitcoin::{consensus, NetworkKind, Transaction};
use litesend_core::amount::Amount;
use litesend_core::constants::Network;
use litesend_core::error::LedgerError;
use litesend_core::traits::{LedgerReader, LedgerWriter};
use litesend_core::types::{FeeQuote, KeyMaterial, SignedTransaction, UnspentOutput};
use litesend_keys::{LitecoinAddress, SigningKey};
use parking_lot::Mutex;

/// Deterministic extended private key for `network`.
pub fn test_key(network: Network, seed: u8) -> KeyMaterial {
    let kind = match network {
        Network::Mainnet => NetworkKind::Main,
        Network::Testnet => NetworkKind::Test,
    };
    let xpriv = Xpriv::new_master(kind, &[seed; 32]).unwrap();
    KeyMaterial::new(xpriv.to_string())
}

/// Address controlled by `key`.
pub fn address_of(key: &KeyMaterial, network: Network) -> String {
    SigningKey::from_key_material(key, network)
        .unwrap()
        .address()
        .to_string()
}

/// Outputs locked to `owner`, one per value, with distinct txids.
pub fn fund(owner: &str, network: Network, values: &[u64]) -> Vec<UnspentOutput> {
    let script = LitecoinAddress::parse(owner, network)
        .unwrap()
        .script_pubkey();
    values
        .iter()
        .enumerate()
        .map(|(i, value)| UnspentOutput {
            txid: format!("{:064x}", 0x1000 + i),
            output_index: (i % 3) as u32,
            address: owner.to_string(),
            value: Amount::from_minor(*value),
            confirmations: 6,
            script_pubkey: Some(hex::encode(script.as_bytes())),
        })
        .collect()
}

/// Decode a broadcast transaction.
pub fn decode(signed: &SignedTransaction) -> Transaction {
    consensus::encode::deserialize(&hex::decode(&signed.raw_hex).unwrap()).unwrap()
}

/// In-memory ledger with call counters.
pub struct FakeLedger {
    utxos: Vec<UnspentOutput>,
    fee_rate: Option<String>,
    reject: Option<String>,
    utxo_calls: AtomicUsize,
    fee_calls: AtomicUsize,
    broadcasts: Mutex<Vec<SignedTransaction>>,
}

impl FakeLedger {
    pub fn new(utxos: Vec<UnspentOutput>) -> Self {
        Self {
            utxos,
            fee_rate: Some("0.0002".to_string()),
            reject: None,
            utxo_calls: AtomicUsize::new(0),
            fee_calls: AtomicUsize::new(0),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    /// Quote `rate` (LTC/kB); `None` makes the estimate fail.
    pub fn with_fee_rate(mut self, rate: Option<&str>) -> Self {
        self.fee_rate = rate.map(str::to_string);
        self
    }

    /// Refuse every broadcast with `reason`.
    pub fn rejecting(mut self, reason: &str) -> Self {
        self.reject = Some(reason.to_string());
        self
    }

    pub fn utxo_calls(&self) -> usize {
        self.utxo_calls.load(Ordering::SeqCst)
    }

    pub fn fee_calls(&self) -> usize {
        self.fee_calls.load(Ordering::SeqCst)
    }

    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts.lock().clone()
    }
}

#[async_trait]
impl LedgerReader for FakeLedger {
    async fn fetch_unspent_outputs(
        &self,
        address: &str,
    ) -> Result<Vec<UnspentOutput>, LedgerError> {
        self.utxo_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .utxos
            .iter()
            .filter(|u| u.address == address)
            .cloned()
            .collect())
    }

    async fn fetch_fee_rate(&self, block_target: u32) -> Result<FeeQuote, LedgerError> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        let rate = self
            .fee_rate
            .as_deref()
            .ok_or_else(|| LedgerError::Transport("estimator offline".into()))?;
        Ok(FeeQuote {
            fee_rate_per_kb: rate
                .parse()
                .map_err(|e| LedgerError::Parse(format!("{e}")))?,
            blocks_to_confirm: block_target,
        })
    }
}

#[async_trait]
impl LedgerWriter for FakeLedger {
    async fn broadcast_transaction(&self, tx: &SignedTransaction) -> Result<String, LedgerError> {
        if let Some(reason) = &self.reject {
            return Err(LedgerError::Rejected(reason.clone()));
        }
        self.broadcasts.lock().push(tx.clone());
        Ok(tx.txid.clone())
    }
}
