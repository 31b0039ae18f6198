//! Transaction request assembly.
//!
//! Turns a coin selection and a fee into a balanced [`TransactionRequest`]:
//! one output to the destination, one change output back to the sender.

use litesend_core::amount::Amount;
use litesend_core::types::{SelectionResult, TransactionRequest, TxOutputSpec};

use crate::error::PaymentError;

/// Builds the unsigned request for a single payment.
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    destination: String,
    amount: Amount,
    change_address: String,
}

impl TransactionBuilder {
    pub fn new(
        destination: impl Into<String>,
        amount: Amount,
        change_address: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            amount,
            change_address: change_address.into(),
        }
    }

    /// Assemble the request.
    ///
    /// `change = selected - amount - fee`. The selected total is recomputed
    /// from `selection.chosen` rather than trusted.
    ///
    /// # Errors
    /// - [`PaymentError::NegativeChange`] if the selection cannot also pay the fee.
    /// - [`PaymentError::InvariantViolation`] if the selection is inconsistent.
    pub fn build(
        &self,
        selection: SelectionResult,
        fee: Amount,
    ) -> Result<TransactionRequest, PaymentError> {
        let selected = Amount::checked_sum(selection.chosen.iter().map(|u| u.value))
            .ok_or_else(|| PaymentError::InvariantViolation("selected total overflows".into()))?;
        if selected != selection.total_selected {
            return Err(PaymentError::InvariantViolation(format!(
                "selection reports {} but inputs sum to {selected}",
                selection.total_selected
            )));
        }

        let change = selected
            .checked_sub(self.amount)
            .and_then(|rest| rest.checked_sub(fee))
            .ok_or(PaymentError::NegativeChange {
                selected,
                amount: self.amount,
                fee,
            })?;

        TransactionRequest::new(
            selection.chosen,
            TxOutputSpec {
                address: self.destination.clone(),
                amount: self.amount,
            },
            TxOutputSpec {
                address: self.change_address.clone(),
                amount: change,
            },
            fee,
        )
        .ok_or_else(|| PaymentError::InvariantViolation("request does not balance".into()))
    }
}
