//! Composition of the concrete collaborators into a ready pipeline.

use std::sync::Arc;

use litesend_core::error::LedgerError;
use litesend_core::types::KeyMaterial;
use litesend_insight::Endpoints;
use litesend_keys::LitecoinSigner;

use crate::error::PaymentError;
use crate::pipeline::{
    BroadcastOutcome, PaymentFailure, PaymentPipeline, PaymentStage, PipelineConfig,
};

impl PaymentPipeline {
    /// Pipeline backed by the Insight explorer and the local Litecoin signer,
    /// both bound to `config.network`.
    pub fn connect(endpoints: &Endpoints, config: PipelineConfig) -> Result<Self, LedgerError> {
        let client = Arc::new(litesend_insight::connect(config.network, endpoints)?);
        let signer = Arc::new(LitecoinSigner::new(config.network));
        Ok(PaymentPipeline::new(client.clone(), client, signer, config))
    }
}

/// One-shot payment on `config.network`.
///
/// A client that cannot be constructed is reported as a failure before
/// any stage runs.
pub async fn send_payment(
    key: &KeyMaterial,
    destination: &str,
    amount_major: &str,
    endpoints: &Endpoints,
    config: PipelineConfig,
) -> BroadcastOutcome {
    let pipeline = PaymentPipeline::connect(endpoints, config).map_err(|e| PaymentFailure {
        stage: PaymentStage::Idle,
        error: PaymentError::SourceUnavailable(e),
        history: vec![PaymentStage::Idle, PaymentStage::Failed],
        signed: None,
    })?;
    pipeline.send_payment(key, destination, amount_major).await
}
