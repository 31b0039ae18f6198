//! Fee estimation.
//!
//! The ledger quotes a rate in LTC per kilobyte. The pipeline budgets a
//! single kilobyte, so the quoted rate converted to litoshis is the absolute
//! fee. A sub-litoshi remainder rounds up so the fee never undershoots the
//! quote.

use litesend_core::amount::Amount;
use litesend_core::error::LedgerError;
use litesend_core::traits::LedgerReader;
use litesend_core::types::FeeQuote;
use tracing::debug;

use crate::error::PaymentError;

/// Turns a ledger fee-rate quote into an absolute fee.
pub struct FeeEstimator<'a> {
    reader: &'a dyn LedgerReader,
}

impl<'a> FeeEstimator<'a> {
    pub fn new(reader: &'a dyn LedgerReader) -> Self {
        Self { reader }
    }

    /// Query the rate for `block_target` once and convert it.
    ///
    /// No fallback fee: any failure surfaces as
    /// [`PaymentError::FeeUnavailable`].
    pub async fn estimate(&self, block_target: u32) -> Result<Amount, PaymentError> {
        let quote = self
            .reader
            .fetch_fee_rate(block_target)
            .await
            .map_err(PaymentError::FeeUnavailable)?;
        let fee = fee_from_quote(&quote)?;
        debug!(
            block_target,
            rate = %quote.fee_rate_per_kb,
            fee = fee.as_minor(),
            "fee: estimated"
        );
        Ok(fee)
    }
}

/// Convert a per-kB quote in major units to litoshis, rounding up.
///
/// A non-positive rate means the service could not estimate.
pub fn fee_from_quote(quote: &FeeQuote) -> Result<Amount, PaymentError> {
    let rate = &quote.fee_rate_per_kb;
    if rate.is_negative() || rate.is_zero() {
        return Err(PaymentError::FeeUnavailable(LedgerError::Unavailable(format!(
            "no estimate for {} blocks (rate {rate})",
            quote.blocks_to_confirm
        ))));
    }
    Amount::from_major_decimal_ceil(rate).map_err(|e| {
        PaymentError::FeeUnavailable(LedgerError::Parse(format!("fee rate {rate}: {e}")))
    })
}
