//! Largest-first coin selection.
//!
//! Walks UTXOs already sorted by value descending and takes the shortest
//! prefix whose value covers the target. Favors few inputs and a simple,
//! reproducible choice over minimal change or minimal transaction size.

use litesend_core::amount::Amount;
use litesend_core::types::{SelectionResult, UnspentOutput};

use crate::error::PaymentError;

/// Greedy largest-first coin selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Select a prefix of `sorted` covering `target`.
    ///
    /// `sorted` must be ordered by value descending (see
    /// [`UtxoSource`](crate::utxo_source::UtxoSource)). Iteration is bounded
    /// by `sorted.len()`; a zero target selects exactly the first output.
    ///
    /// # Errors
    /// [`PaymentError::InsufficientFunds`] when the whole set falls short.
    pub fn select(
        sorted: &[UnspentOutput],
        target: Amount,
    ) -> Result<SelectionResult, PaymentError> {
        let mut chosen = Vec::new();
        let mut remaining = target;
        let mut total = Amount::ZERO;

        for utxo in sorted {
            chosen.push(utxo.clone());
            total = total
                .checked_add(utxo.value)
                .ok_or_else(|| PaymentError::InvariantViolation("UTXO total overflows".into()))?;

            if utxo.value >= remaining {
                return Ok(SelectionResult {
                    chosen,
                    total_selected: total,
                });
            }
            // value < remaining, so this cannot underflow
            remaining = Amount::from_minor(remaining.as_minor() - utxo.value.as_minor());
        }

        Err(PaymentError::InsufficientFunds {
            have: total,
            need: target,
        })
    }
}
