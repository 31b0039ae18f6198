//! HTTP client for the Insight REST API.

use std::time::Duration;

use async_trait::async_trait;
use litesend_core::constants::Network;
use litesend_core::error::LedgerError;
use litesend_core::traits::{LedgerReader, LedgerWriter};
use litesend_core::types::{FeeQuote, SignedTransaction, UnspentOutput};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::Endpoints;
use crate::wire::{self, SendRequest};

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Insight explorer bound to one API base URL.
///
/// Each call is a single HTTP request; there are no retries.
#[derive(Clone, Debug)]
pub struct InsightClient {
    client: Client,
    base_url: String,
}

impl InsightClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("building HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<String, LedgerError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "insight: GET");
        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        let body = read_body(response).await?;
        if !status.is_success() {
            return Err(LedgerError::Http {
                status: status.as_u16(),
                body: truncate(body),
            });
        }
        Ok(body)
    }
}

/// Client for `network` using the configured base URL and timeout.
pub fn connect(network: Network, endpoints: &Endpoints) -> Result<InsightClient, LedgerError> {
    InsightClient::new(endpoints.base_url(network), endpoints.timeout)
}

#[async_trait]
impl LedgerReader for InsightClient {
    async fn fetch_unspent_outputs(
        &self,
        address: &str,
    ) -> Result<Vec<UnspentOutput>, LedgerError> {
        let body = self.get(&format!("/addr/{address}/utxo")).await?;
        let utxos = wire::parse_utxos(&body)?;
        debug!(address, count = utxos.len(), "insight: utxos");
        Ok(utxos)
    }

    async fn fetch_fee_rate(&self, block_target: u32) -> Result<FeeQuote, LedgerError> {
        let body = self
            .get(&format!("/utils/estimatefee?nbBlocks={block_target}"))
            .await?;
        let quote = wire::parse_fee_rate(&body, block_target)?;
        debug!(block_target, rate = %quote.fee_rate_per_kb, "insight: fee rate");
        Ok(quote)
    }
}

#[async_trait]
impl LedgerWriter for InsightClient {
    async fn broadcast_transaction(&self, tx: &SignedTransaction) -> Result<String, LedgerError> {
        let url = format!("{}/tx/send", self.base_url);
        debug!(%url, txid = %tx.txid, "insight: POST");
        let response = self
            .client
            .post(&url)
            .json(&SendRequest { rawtx: &tx.raw_hex })
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = read_body(response).await?;

        if status.is_client_error() {
            warn!(status = status.as_u16(), txid = %tx.txid, "insight: broadcast rejected");
            return Err(LedgerError::Rejected(truncate(body)));
        }
        if !status.is_success() {
            return Err(LedgerError::Http {
                status: status.as_u16(),
                body: truncate(body),
            });
        }
        wire::parse_broadcast(&body)
    }
}

async fn read_body(response: Response) -> Result<String, LedgerError> {
    let status: StatusCode = response.status();
    response
        .text()
        .await
        .map_err(|e| LedgerError::Transport(format!("reading {status} response: {e}")))
}

fn transport(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Transport(format!("timed out: {e}"))
    } else {
        LedgerError::Transport(e.to_string())
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
