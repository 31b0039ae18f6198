//! Payment pipeline: the staged state machine that turns a payment request
//! into a broadcast transaction.
//!
//! ```text
//! Idle → FetchingUtxos → Selecting → EstimatingFee → Building → Signing
//!      → Broadcasting → Succeeded
//! ```
//!
//! Any stage may end in `Failed`, which records the stage that failed and
//! the error. Every external call is made at most once per attempt; nothing
//! is retried here.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use litesend_core::amount::Amount;
use litesend_core::constants::{Network, DEFAULT_FEE_TARGET_BLOCKS, MAX_MONEY};
use litesend_core::error::{AmountError, LedgerError};
use litesend_core::traits::{LedgerReader, LedgerWriter, TransactionSigner};
use litesend_core::types::{KeyMaterial, OutPoint, SignedTransaction};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::builder::TransactionBuilder;
use crate::coin_selection::CoinSelector;
use crate::error::PaymentError;
use crate::fee::FeeEstimator;
use crate::utxo_source::UtxoSource;

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Network the collaborators are bound to.
    pub network: Network,
    /// Confirmation target passed to the fee estimate.
    pub fee_target_blocks: u32,
    /// Outputs with fewer confirmations are not spent.
    pub min_confirmations: u64,
    /// Upper bound on each networked stage. `None` leaves it to the transport.
    pub stage_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            fee_target_blocks: DEFAULT_FEE_TARGET_BLOCKS,
            min_confirmations: 0,
            stage_timeout: None,
        }
    }
}

/// Where a payment attempt is (or was when it stopped).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaymentStage {
    Idle,
    FetchingUtxos,
    Selecting,
    EstimatingFee,
    Building,
    Signing,
    Broadcasting,
    Succeeded,
    Failed,
}

impl PaymentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStage::Idle => "idle",
            PaymentStage::FetchingUtxos => "fetching_utxos",
            PaymentStage::Selecting => "selecting",
            PaymentStage::EstimatingFee => "estimating_fee",
            PaymentStage::Building => "building",
            PaymentStage::Signing => "signing",
            PaymentStage::Broadcasting => "broadcasting",
            PaymentStage::Succeeded => "succeeded",
            PaymentStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStage::Succeeded | PaymentStage::Failed)
    }
}

impl fmt::Display for PaymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment the relay accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Transaction ID as returned by the relay.
    pub txid: String,
    pub amount: Amount,
    pub fee: Amount,
    /// Value returned to the sender.
    pub change: Amount,
    /// Outputs spent, in selection order.
    pub inputs: Vec<OutPoint>,
    /// Stages visited, ending with `Succeeded`.
    pub history: Vec<PaymentStage>,
}

/// A payment attempt that stopped before the relay accepted it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("payment failed while {stage}: {error}")]
pub struct PaymentFailure {
    /// The stage that failed.
    pub stage: PaymentStage,
    #[source]
    pub error: PaymentError,
    /// Stages visited, ending with `Failed`.
    pub history: Vec<PaymentStage>,
    /// The transaction handed to the relay, once the attempt reached
    /// `Broadcasting`. Check its txid before retrying an `Unknown` failure.
    pub signed: Option<SignedTransaction>,
}

/// Terminal result of one payment attempt.
pub type BroadcastOutcome = Result<PaymentReceipt, PaymentFailure>;

struct StageTracker {
    current: PaymentStage,
    history: Vec<PaymentStage>,
    signed: Option<SignedTransaction>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: PaymentStage::Idle,
            history: vec![PaymentStage::Idle],
            signed: None,
        }
    }

    fn advance(&mut self, next: PaymentStage) {
        debug!(from = %self.current, to = %next, "pipeline: stage transition");
        self.current = next;
        self.history.push(next);
    }
}

/// Sequences one payment through its collaborators.
///
/// Holds only immutable configuration and shared collaborators, so a single
/// pipeline may serve concurrent attempts. Attempts spending from the same
/// address are not serialized and may race for the same outputs.
pub struct PaymentPipeline {
    reader: Arc<dyn LedgerReader>,
    writer: Arc<dyn LedgerWriter>,
    signer: Arc<dyn TransactionSigner>,
    config: PipelineConfig,
    cancel: Option<watch::Receiver<bool>>,
}

impl PaymentPipeline {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        signer: Arc<dyn TransactionSigner>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            signer,
            config,
            cancel: None,
        }
    }

    /// Abort at the next stage boundary once `cancel` reads `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Pay `amount_major` (LTC, decimal string) to `destination` from the
    /// address controlled by `key`. Change returns to that same address.
    pub async fn send_payment(
        &self,
        key: &KeyMaterial,
        destination: &str,
        amount_major: &str,
    ) -> BroadcastOutcome {
        let mut tracker = StageTracker::new();
        match self.execute(&mut tracker, key, destination, amount_major).await {
            Ok(mut receipt) => {
                tracker.advance(PaymentStage::Succeeded);
                receipt.history = tracker.history;
                info!(
                    txid = %receipt.txid,
                    amount = receipt.amount.as_minor(),
                    fee = receipt.fee.as_minor(),
                    change = receipt.change.as_minor(),
                    inputs = receipt.inputs.len(),
                    "payment broadcast"
                );
                Ok(receipt)
            }
            Err(error) => {
                let stage = tracker.current;
                tracker.advance(PaymentStage::Failed);
                let txid = tracker.signed.as_ref().map(|tx| tx.txid.as_str());
                warn!(%stage, %error, class = ?error.class(), ?txid, "payment failed");
                Err(PaymentFailure {
                    stage,
                    error,
                    history: tracker.history,
                    signed: tracker.signed,
                })
            }
        }
    }

    async fn execute(
        &self,
        tracker: &mut StageTracker,
        key: &KeyMaterial,
        destination: &str,
        amount_major: &str,
    ) -> Result<PaymentReceipt, PaymentError> {
        let amount = parse_amount(amount_major)?;
        self.signer
            .validate_address(destination)
            .map_err(PaymentError::InvalidAddress)?;
        let sender = self
            .signer
            .derive_address(key)
            .map_err(PaymentError::SigningError)?;
        info!(
            network = %self.config.network,
            %sender,
            %destination,
            amount = amount.as_minor(),
            "payment requested"
        );

        self.enter(tracker, PaymentStage::FetchingUtxos)?;
        let source = UtxoSource::new(self.reader.as_ref())
            .with_min_confirmations(self.config.min_confirmations);
        let utxos = self
            .guarded(PaymentStage::FetchingUtxos, source.fetch_sorted(&sender))
            .await?;

        self.enter(tracker, PaymentStage::Selecting)?;
        let selection = CoinSelector::select(&utxos, amount)?;
        debug!(
            chosen = selection.chosen.len(),
            total = selection.total_selected.as_minor(),
            "pipeline: selected inputs"
        );

        self.enter(tracker, PaymentStage::EstimatingFee)?;
        let estimator = FeeEstimator::new(self.reader.as_ref());
        let fee = self
            .guarded(
                PaymentStage::EstimatingFee,
                estimator.estimate(self.config.fee_target_blocks),
            )
            .await?;

        self.enter(tracker, PaymentStage::Building)?;
        let request = TransactionBuilder::new(destination, amount, sender.as_str())
            .build(selection, fee)?;

        self.enter(tracker, PaymentStage::Signing)?;
        let signed = self
            .signer
            .build_and_sign(&request, key)
            .map_err(PaymentError::SigningError)?;

        self.enter(tracker, PaymentStage::Broadcasting)?;
        tracker.signed = Some(signed.clone());
        let broadcast = self.writer.broadcast_transaction(&signed);
        let submitted = match self.config.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, broadcast)
                .await
                .unwrap_or_else(|_| {
                    Err(LedgerError::Transport(format!(
                        "broadcasting timed out after {limit:?}"
                    )))
                }),
            None => broadcast.await,
        };
        let txid = submitted.map_err(broadcast_error)?;
        if txid != signed.txid {
            warn!(relay = %txid, local = %signed.txid, "relay reported a different txid");
        }

        Ok(PaymentReceipt {
            txid,
            amount,
            fee: request.fee(),
            change: request.change().amount,
            inputs: request.inputs().iter().map(|u| u.outpoint()).collect(),
            history: Vec::new(),
        })
    }

    /// Move to `stage`, failing with `Cancelled` if cancellation was requested.
    fn enter(&self, tracker: &mut StageTracker, stage: PaymentStage) -> Result<(), PaymentError> {
        tracker.advance(stage);
        match &self.cancel {
            Some(rx) if *rx.borrow() => {
                Err(PaymentError::Cancelled(format!("cancelled before {stage}")))
            }
            _ => Ok(()),
        }
    }

    async fn guarded<T, F>(&self, stage: PaymentStage, fut: F) -> Result<T, PaymentError>
    where
        F: Future<Output = Result<T, PaymentError>>,
    {
        match self.config.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                PaymentError::Cancelled(format!("{stage} timed out after {limit:?}"))
            })?,
            None => fut.await,
        }
    }
}

/// Only an explicit refusal is final. Any other failure may have reached the
/// relay, so the outcome stays open.
fn broadcast_error(error: LedgerError) -> PaymentError {
    let refused = match &error {
        LedgerError::Rejected(_) => true,
        LedgerError::Http { status, .. } => (400..500).contains(status) && *status != 429,
        _ => false,
    };
    if refused {
        PaymentError::BroadcastRejected(error)
    } else {
        PaymentError::BroadcastUnconfirmed(error)
    }
}

/// Parse the user-facing amount. Zero and values beyond the coin supply are
/// rejected up front.
fn parse_amount(amount_major: &str) -> Result<Amount, PaymentError> {
    let amount = Amount::from_major_str(amount_major).map_err(PaymentError::InvalidAmount)?;
    if amount == Amount::ZERO {
        return Err(PaymentError::InvalidAmount(AmountError::Zero));
    }
    if amount.as_minor() > MAX_MONEY {
        return Err(PaymentError::InvalidAmount(AmountError::Overflow(
            amount_major.to_string(),
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;
    use crate::test_support::{quote, utxo, MockLedger, MockSigner};
    use async_trait::async_trait;
    use litesend_core::error::{LedgerError, SignerError};
    use litesend_core::types::{FeeQuote, SignedTransaction, UnspentOutput};

    const DEST: &str = "mDestination";
    const SENDER: &str = "mSender";

    fn signer() -> MockSigner {
        let mut signer = MockSigner::new();
        signer.expect_validate_address().returning(|_| Ok(()));
        signer
            .expect_derive_address()
            .returning(|_| Ok(SENDER.to_string()));
        signer
    }

    fn signed() -> SignedTransaction {
        SignedTransaction {
            txid: "feed".into(),
            raw_hex: "0100".into(),
        }
    }

    fn pipeline(ledger: MockLedger, signer: MockSigner) -> PaymentPipeline {
        let ledger = Arc::new(ledger);
        PaymentPipeline::new(
            ledger.clone(),
            ledger,
            Arc::new(signer),
            PipelineConfig::default(),
        )
    }

    fn three_utxos() -> Vec<UnspentOutput> {
        vec![
            utxo("cc", 0, 100_000_000),
            utxo("aa", 0, 500_000_000),
            utxo("bb", 1, 300_000_000),
        ]
    }

    fn key() -> KeyMaterial {
        KeyMaterial::new("tprv-test")
    }

    #[tokio::test]
    async fn happy_path() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .withf(|address| address.to_string() == SENDER)
            .times(1)
            .returning(|_| Ok(three_utxos()));
        ledger
            .expect_fetch_fee_rate()
            .withf(|target| *target == DEFAULT_FEE_TARGET_BLOCKS)
            .times(1)
            .returning(|_| Ok(quote("0.0002")));
        ledger
            .expect_broadcast_transaction()
            .withf(|tx| tx.raw_hex == "0100")
            .times(1)
            .returning(|_| Ok("feed".into()));

        let mut signer = signer();
        signer
            .expect_build_and_sign()
            .withf(|request, _| {
                request.recipient().address == DEST
                    && request.recipient().amount.as_minor() == 600_000_000
                    && request.change().address == SENDER
                    && request.change().amount.as_minor() == 199_980_000
                    && request.fee().as_minor() == 20_000
            })
            .times(1)
            .returning(|_, _| Ok(signed()));

        let receipt = pipeline(ledger, signer)
            .send_payment(&key(), DEST, "6")
            .await
            .unwrap();

        assert_eq!(receipt.txid, "feed");
        assert_eq!(receipt.amount.as_minor(), 600_000_000);
        assert_eq!(receipt.fee.as_minor(), 20_000);
        assert_eq!(receipt.change.as_minor(), 199_980_000);
        assert_eq!(
            receipt.inputs,
            vec![
                OutPoint { txid: "aa".into(), index: 0 },
                OutPoint { txid: "bb".into(), index: 1 },
            ]
        );
        assert_eq!(
            receipt.history,
            vec![
                PaymentStage::Idle,
                PaymentStage::FetchingUtxos,
                PaymentStage::Selecting,
                PaymentStage::EstimatingFee,
                PaymentStage::Building,
                PaymentStage::Signing,
                PaymentStage::Broadcasting,
                PaymentStage::Succeeded,
            ]
        );
    }

    #[tokio::test]
    async fn source_failure_stops_everything() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .times(1)
            .returning(|_| Err(LedgerError::Transport("connection refused".into())));
        ledger.expect_fetch_fee_rate().times(0);
        ledger.expect_broadcast_transaction().times(0);
        let mut signer = signer();
        signer.expect_build_and_sign().times(0);

        let failure = pipeline(ledger, signer)
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();

        assert_eq!(failure.stage, PaymentStage::FetchingUtxos);
        assert_eq!(
            failure.error,
            PaymentError::SourceUnavailable(LedgerError::Transport("connection refused".into()))
        );
        assert_eq!(failure.error.class(), FailureClass::Retryable);
        assert_eq!(failure.history.last(), Some(&PaymentStage::Failed));
    }

    #[tokio::test]
    async fn insufficient_funds_skips_fee() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .returning(|_| Ok(three_utxos()));
        ledger.expect_fetch_fee_rate().times(0);
        ledger.expect_broadcast_transaction().times(0);

        let failure = pipeline(ledger, signer())
            .send_payment(&key(), DEST, "9.00000001")
            .await
            .unwrap_err();

        assert_eq!(failure.stage, PaymentStage::Selecting);
        assert_eq!(
            failure.error,
            PaymentError::InsufficientFunds {
                have: Amount::from_minor(900_000_000),
                need: Amount::from_minor(900_000_001),
            }
        );
    }

    #[tokio::test]
    async fn fee_failure_is_fail_closed() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .returning(|_| Ok(three_utxos()));
        ledger
            .expect_fetch_fee_rate()
            .times(1)
            .returning(|_| Ok(quote("-1")));
        ledger.expect_broadcast_transaction().times(0);

        let failure = pipeline(ledger, signer())
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();

        assert_eq!(failure.stage, PaymentStage::EstimatingFee);
        assert!(matches!(failure.error, PaymentError::FeeUnavailable(_)));
    }

    #[tokio::test]
    async fn negative_change_never_signs() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .returning(|_| Ok(vec![utxo("aa", 0, 100_000_000)]));
        ledger
            .expect_fetch_fee_rate()
            .returning(|_| Ok(quote("0.0002")));
        ledger.expect_broadcast_transaction().times(0);
        let mut signer = signer();
        signer.expect_build_and_sign().times(0);

        let failure = pipeline(ledger, signer)
            .send_payment(&key(), DEST, "0.99999")
            .await
            .unwrap_err();

        assert_eq!(failure.stage, PaymentStage::Building);
        assert_eq!(
            failure.error,
            PaymentError::NegativeChange {
                selected: Amount::from_minor(100_000_000),
                amount: Amount::from_minor(99_999_000),
                fee: Amount::from_minor(20_000),
            }
        );
        assert_eq!(failure.error.class(), FailureClass::Bug);
    }

    #[tokio::test]
    async fn signing_failure() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .returning(|_| Ok(three_utxos()));
        ledger
            .expect_fetch_fee_rate()
            .returning(|_| Ok(quote("0.0002")));
        ledger.expect_broadcast_transaction().times(0);
        let mut signer = signer();
        signer
            .expect_build_and_sign()
            .times(1)
            .returning(|_, _| Err(SignerError::Signing("bad script".into())));

        let failure = pipeline(ledger, signer)
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();

        assert_eq!(failure.stage, PaymentStage::Signing);
        assert!(matches!(failure.error, PaymentError::SigningError(_)));
        assert_eq!(failure.signed, None);
    }

    #[tokio::test]
    async fn broadcast_rejected() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .returning(|_| Ok(three_utxos()));
        ledger
            .expect_fetch_fee_rate()
            .returning(|_| Ok(quote("0.0002")));
        ledger
            .expect_broadcast_transaction()
            .times(1)
            .returning(|_| Err(LedgerError::Rejected("258: txn-mempool-conflict".into())));
        let mut signer = signer();
        signer.expect_build_and_sign().returning(|_, _| Ok(signed()));

        let failure = pipeline(ledger, signer)
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();

        assert_eq!(failure.stage, PaymentStage::Broadcasting);
        assert_eq!(failure.error.class(), FailureClass::Permanent);
        assert_eq!(failure.signed, Some(signed()));
        assert_eq!(
            failure.to_string(),
            "payment failed while broadcasting: broadcast rejected: \
             rejected by relay: 258: txn-mempool-conflict"
        );
    }

    #[tokio::test]
    async fn invalid_input_makes_no_calls() {
        for amount in ["0", "-1", "0.000000001", "abc"] {
            let mut ledger = MockLedger::new();
            ledger.expect_fetch_unspent_outputs().times(0);
            let failure = pipeline(ledger, signer())
                .send_payment(&key(), DEST, amount)
                .await
                .unwrap_err();
            assert_eq!(failure.stage, PaymentStage::Idle);
            assert!(
                matches!(failure.error, PaymentError::InvalidAmount(_)),
                "{amount}: {:?}",
                failure.error
            );
        }

        let mut ledger = MockLedger::new();
        ledger.expect_fetch_unspent_outputs().times(0);
        let mut signer = MockSigner::new();
        signer.expect_validate_address().returning(|a| {
            Err(SignerError::InvalidAddress {
                address: a.to_string(),
                reason: "bad checksum".into(),
            })
        });
        let failure = pipeline(ledger, signer)
            .send_payment(&key(), "nonsense", "1")
            .await
            .unwrap_err();
        assert_eq!(failure.stage, PaymentStage::Idle);
        assert!(matches!(failure.error, PaymentError::InvalidAddress(_)));
        assert_eq!(failure.error.class(), FailureClass::Permanent);
    }

    #[tokio::test]
    async fn amount_above_supply_rejected() {
        let ledger = MockLedger::new();
        let failure = pipeline(ledger, signer())
            .send_payment(&key(), DEST, "84000001")
            .await
            .unwrap_err();
        assert!(matches!(
            failure.error,
            PaymentError::InvalidAmount(AmountError::Overflow(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let (_tx, rx) = watch::channel(true);
        let mut ledger = MockLedger::new();
        ledger.expect_fetch_unspent_outputs().times(0);
        let failure = pipeline(ledger, signer())
            .with_cancellation(rx)
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();
        assert_eq!(failure.stage, PaymentStage::FetchingUtxos);
        assert!(matches!(failure.error, PaymentError::Cancelled(_)));
    }

    #[tokio::test]
    async fn cancelled_between_stages() {
        let (tx, rx) = watch::channel(false);
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .times(1)
            .returning(move |_| {
                tx.send_replace(true);
                Ok(three_utxos())
            });
        ledger.expect_fetch_fee_rate().times(0);

        let failure = pipeline(ledger, signer())
            .with_cancellation(rx)
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();
        assert_eq!(failure.stage, PaymentStage::Selecting);
        assert_eq!(failure.error.class(), FailureClass::Retryable);
    }

    struct StalledLedger;

    #[async_trait]
    impl LedgerReader for StalledLedger {
        async fn fetch_unspent_outputs(
            &self,
            _address: &str,
        ) -> Result<Vec<UnspentOutput>, LedgerError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }

        async fn fetch_fee_rate(&self, _block_target: u32) -> Result<FeeQuote, LedgerError> {
            Ok(quote("0.0002"))
        }
    }

    #[tokio::test]
    async fn stage_timeout_cancels() {
        let writer = Arc::new(MockLedger::new());
        let config = PipelineConfig {
            stage_timeout: Some(Duration::from_millis(20)),
            ..PipelineConfig::default()
        };
        let pipeline =
            PaymentPipeline::new(Arc::new(StalledLedger), writer, Arc::new(signer()), config);

        let failure = pipeline
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();
        assert_eq!(failure.stage, PaymentStage::FetchingUtxos);
        assert!(matches!(failure.error, PaymentError::Cancelled(_)));
    }

    /// Takes the transaction, then never answers.
    struct StalledRelay {
        received: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl LedgerWriter for StalledRelay {
        async fn broadcast_transaction(
            &self,
            _tx: &SignedTransaction,
        ) -> Result<String, LedgerError> {
            self.received.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("late".into())
        }
    }

    #[tokio::test]
    async fn broadcast_timeout_is_unknown() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .returning(|_| Ok(three_utxos()));
        ledger
            .expect_fetch_fee_rate()
            .returning(|_| Ok(quote("0.0002")));
        let mut signer = signer();
        signer.expect_build_and_sign().returning(|_, _| Ok(signed()));
        let relay = Arc::new(StalledRelay {
            received: std::sync::atomic::AtomicUsize::new(0),
        });
        let config = PipelineConfig {
            stage_timeout: Some(Duration::from_millis(50)),
            ..PipelineConfig::default()
        };
        let pipeline =
            PaymentPipeline::new(Arc::new(ledger), relay.clone(), Arc::new(signer), config);

        let failure = pipeline
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();

        assert_eq!(relay.received.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(failure.stage, PaymentStage::Broadcasting);
        assert!(matches!(
            failure.error,
            PaymentError::BroadcastUnconfirmed(LedgerError::Transport(_))
        ));
        assert_eq!(failure.error.class(), FailureClass::Unknown);
        assert_eq!(failure.signed, Some(signed()));
    }

    #[tokio::test]
    async fn broadcast_transport_error_is_unknown() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_fetch_unspent_outputs()
            .returning(|_| Ok(three_utxos()));
        ledger
            .expect_fetch_fee_rate()
            .returning(|_| Ok(quote("0.0002")));
        ledger
            .expect_broadcast_transaction()
            .times(1)
            .returning(|_| Err(LedgerError::Transport("connection reset".into())));
        let mut signer = signer();
        signer.expect_build_and_sign().returning(|_, _| Ok(signed()));

        let failure = pipeline(ledger, signer)
            .send_payment(&key(), DEST, "1")
            .await
            .unwrap_err();

        assert_eq!(
            failure.error,
            PaymentError::BroadcastUnconfirmed(LedgerError::Transport("connection reset".into()))
        );
        assert_eq!(failure.error.class(), FailureClass::Unknown);
        assert_eq!(failure.signed.map(|tx| tx.txid), Some("feed".to_string()));
    }

    #[test]
    fn broadcast_error_mapping() {
        let refused = [
            LedgerError::Rejected("66: min relay fee not met".into()),
            LedgerError::Http { status: 400, body: String::new() },
        ];
        for e in refused {
            assert!(matches!(broadcast_error(e), PaymentError::BroadcastRejected(_)));
        }
        let open = [
            LedgerError::Http { status: 502, body: String::new() },
            LedgerError::Http { status: 429, body: String::new() },
            LedgerError::Parse("eof".into()),
        ];
        for e in open {
            assert!(matches!(broadcast_error(e), PaymentError::BroadcastUnconfirmed(_)));
        }
    }

    #[test]
    fn stage_display() {
        assert_eq!(PaymentStage::EstimatingFee.to_string(), "estimating_fee");
        assert!(PaymentStage::Failed.is_terminal());
        assert!(!PaymentStage::Signing.is_terminal());
    }
}
