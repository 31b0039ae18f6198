//! Spendable-output discovery for a single address.

use std::collections::HashSet;

use litesend_core::error::LedgerError;
use litesend_core::traits::LedgerReader;
use litesend_core::types::UnspentOutput;
use tracing::debug;

use crate::error::PaymentError;

/// Fetches an address's unspent outputs and orders them for selection.
pub struct UtxoSource<'a> {
    reader: &'a dyn LedgerReader,
    min_confirmations: u64,
}

impl<'a> UtxoSource<'a> {
    pub fn new(reader: &'a dyn LedgerReader) -> Self {
        Self {
            reader,
            min_confirmations: 0,
        }
    }

    /// Ignore outputs with fewer confirmations (default 0: mempool outputs
    /// are spendable).
    pub fn with_min_confirmations(mut self, min_confirmations: u64) -> Self {
        self.min_confirmations = min_confirmations;
        self
    }

    /// One ledger read, then validation and a stable descending sort by value.
    ///
    /// # Errors
    /// [`PaymentError::SourceUnavailable`] carrying the ledger error, or a
    /// parse error when the response lists the same outpoint twice.
    pub async fn fetch_sorted(&self, address: &str) -> Result<Vec<UnspentOutput>, PaymentError> {
        let fetched = self
            .reader
            .fetch_unspent_outputs(address)
            .await
            .map_err(PaymentError::SourceUnavailable)?;

        let mut seen = HashSet::with_capacity(fetched.len());
        for utxo in &fetched {
            if !seen.insert(utxo.outpoint()) {
                return Err(PaymentError::SourceUnavailable(LedgerError::Parse(format!(
                    "duplicate outpoint {}",
                    utxo.outpoint()
                ))));
            }
        }

        let total = fetched.len();
        let mut utxos: Vec<UnspentOutput> = fetched
            .into_iter()
            .filter(|u| u.confirmations >= self.min_confirmations)
            .collect();
        sort_descending(&mut utxos);

        debug!(
            address,
            fetched = total,
            spendable = utxos.len(),
            "utxo_source: fetched outputs"
        );
        Ok(utxos)
    }
}

/// Sort by value, largest first. Stable: equal values keep their order.
pub fn sort_descending(utxos: &mut [UnspentOutput]) {
    utxos.sort_by(|a, b| b.value.cmp(&a.value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{utxo, MockLedger};

    #[tokio::test]
    async fn sorts_descending_and_keeps_tie_order() {
        let mut ledger = MockLedger::new();
        ledger.expect_fetch_unspent_outputs().times(1).returning(|_| {
            Ok(vec![
                utxo("aa", 0, 100),
                utxo("bb", 0, 300),
                utxo("cc", 0, 100),
                utxo("dd", 1, 200),
            ])
        });

        let sorted = UtxoSource::new(&ledger).fetch_sorted("addr").await.unwrap();
        let order: Vec<(&str, u64)> = sorted
            .iter()
            .map(|u| (u.txid.as_str(), u.value.as_minor()))
            .collect();
        assert_eq!(order, vec![("bb", 300), ("dd", 200), ("aa", 100), ("cc", 100)]);
    }

    #[tokio::test]
    async fn passes_address_through() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .withf(|address| address.to_string() == "mySender")
            .times(1)
            .returning(|_| Ok(vec![]));

        let sorted = UtxoSource::new(&ledger).fetch_sorted("mySender").await.unwrap();
        assert!(sorted.is_empty());
    }

    #[tokio::test]
    async fn ledger_error_is_preserved() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .times(1)
            .returning(|_| Err(LedgerError::Transport("connection reset".into())));

        let err = UtxoSource::new(&ledger).fetch_sorted("addr").await.unwrap_err();
        assert_eq!(
            err,
            PaymentError::SourceUnavailable(LedgerError::Transport("connection reset".into()))
        );
    }

    #[tokio::test]
    async fn duplicate_outpoint_rejected() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .returning(|_| Ok(vec![utxo("aa", 0, 1), utxo("aa", 0, 1)]));

        let err = UtxoSource::new(&ledger).fetch_sorted("addr").await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::SourceUnavailable(LedgerError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn min_confirmations_filters() {
        let mut ledger = MockLedger::new();
        ledger.expect_fetch_unspent_outputs().returning(|_| {
            let mut fresh = utxo("aa", 0, 500);
            fresh.confirmations = 0;
            Ok(vec![fresh, utxo("bb", 0, 100)])
        });

        let sorted = UtxoSource::new(&ledger)
            .with_min_confirmations(1)
            .fetch_sorted("addr")
            .await
            .unwrap();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].txid, "bb");
    }
}
