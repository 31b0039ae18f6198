//! Insight REST payloads and their conversion into core types.
//!
//! Values are read from the integer `satoshis` field; the float `amount`
//! field is ignored. Fee rates are taken from the JSON number's text, so
//! they never pass through a float.

use std::collections::HashMap;

use litesend_core::amount::{Amount, ExactDecimal};
use litesend_core::error::LedgerError;
use litesend_core::types::{FeeQuote, UnspentOutput};
use serde::{Deserialize, Serialize};

/// One entry of `GET /addr/{address}/utxo`.
#[derive(Deserialize, Debug, Clone)]
pub struct InsightUtxo {
    pub address: String,
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: Option<String>,
    pub satoshis: u64,
    #[serde(default)]
    pub confirmations: u64,
}

impl From<InsightUtxo> for UnspentOutput {
    fn from(u: InsightUtxo) -> Self {
        UnspentOutput {
            txid: u.txid,
            output_index: u.vout,
            address: u.address,
            value: Amount::from_minor(u.satoshis),
            confirmations: u.confirmations,
            script_pubkey: u.script_pub_key,
        }
    }
}

/// Body of `POST /tx/send`.
#[derive(Serialize, Debug)]
pub struct SendRequest<'a> {
    pub rawtx: &'a str,
}

/// Success response of `POST /tx/send`.
#[derive(Deserialize, Debug)]
pub struct SendResponse {
    pub txid: String,
}

pub fn parse_utxos(body: &str) -> Result<Vec<UnspentOutput>, LedgerError> {
    let utxos: Vec<InsightUtxo> =
        serde_json::from_str(body).map_err(|e| LedgerError::Parse(format!("utxo list: {e}")))?;
    Ok(utxos.into_iter().map(UnspentOutput::from).collect())
}

/// Parse `{"<block_target>": rate}`. A missing key means the service has
/// no estimate for that target.
pub fn parse_fee_rate(body: &str, block_target: u32) -> Result<FeeQuote, LedgerError> {
    let rates: HashMap<String, serde_json::Value> =
        serde_json::from_str(body).map_err(|e| LedgerError::Parse(format!("fee estimate: {e}")))?;
    let key = block_target.to_string();
    let text = match rates.get(&key) {
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(LedgerError::Parse(format!(
                "fee rate for {key} blocks is not a number: {other}"
            )));
        }
        None => {
            return Err(LedgerError::Unavailable(format!(
                "no fee estimate for {key} blocks"
            )));
        }
    };
    let fee_rate_per_kb: ExactDecimal = text
        .parse()
        .map_err(|e| LedgerError::Parse(format!("fee rate {text:?}: {e}")))?;
    Ok(FeeQuote {
        fee_rate_per_kb,
        blocks_to_confirm: block_target,
    })
}

pub fn parse_broadcast(body: &str) -> Result<String, LedgerError> {
    let response: SendResponse = serde_json::from_str(body)
        .map_err(|e| LedgerError::Parse(format!("broadcast response: {e}")))?;
    Ok(response.txid)
}
