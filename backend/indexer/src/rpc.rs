//! Soroban RPC client: pages through `getEvents` for the sale contract and
//! decodes the results into [`SaleEvent`]s.
//!
//! Failed requests, rate limits and soft RPC errors are retried with
//! exponential back-off capped at [`MAX_BACKOFF_SECS`]. Every wait observes
//! the shutdown token, so a pending retry never delays shutdown.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, SaleEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// JSON-RPC codes that will not succeed on retry.
const HARD_ERROR_CODES: [i64; 2] = [-32600, -32601];

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    pub topic: Vec<String>,
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall", default = "default_true")]
    pub in_successful_contract_call: bool,
}

fn default_true() -> bool {
    true
}

/// One page of `getEvents`.
#[derive(Debug, Default)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

/// Fetch one page of events, retrying until it succeeds, a hard error is
/// returned, or `shutdown` fires (which yields an empty page).
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
    shutdown: &CancellationToken,
) -> Result<EventPage> {
    let mut backoff = INITIAL_BACKOFF_SECS;
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });

    loop {
        let reason = match client.post(rpc_url).json(&request).send().await {
            Err(e) => format!("request failed: {e}"),
            Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                "rate limited".to_string()
            }
            Ok(resp) => {
                let body: RpcResponse = resp.json().await?;
                match (body.error, body.result) {
                    (Some(err), _) if HARD_ERROR_CODES.contains(&err.code) => {
                        return Err(IndexerError::EventParse(format!(
                            "RPC hard error {}: {}",
                            err.code, err.message
                        )));
                    }
                    (Some(err), _) => format!("soft error {} {}", err.code, err.message),
                    (None, Some(result)) => {
                        debug!(
                            count = result.events.len(),
                            latest_ledger = ?result.latest_ledger,
                            "fetched events"
                        );
                        return Ok(EventPage {
                            events: result.events,
                            cursor: result.cursor,
                            latest_ledger: result.latest_ledger,
                        });
                    }
                    (None, None) => {
                        return Err(IndexerError::EventParse(
                            "Empty result from getEvents".to_string(),
                        ));
                    }
                }
            }
        };

        warn!("RPC {reason} (retrying in {backoff}s)");
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(EventPage::default()),
            _ = tokio::time::sleep(Duration::from_secs(backoff)) => {}
        }
        backoff = next_backoff(backoff);
    }
}

fn next_backoff(current: u64) -> u64 {
    (current * 2).min(MAX_BACKOFF_SECS)
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        }
    });

    // RPC rejects startLedger together with a cursor.
    match cursor {
        Some(cur) => params["pagination"]["cursor"] = json!(cur),
        None => params["startLedger"] = json!(start_ledger),
    }

    params
}

/// Decode raw RPC events, skipping those from reverted calls.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<SaleEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call)
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<SaleEvent> {
    let kind = EventKind::from_topic(&extract_symbol(raw.topic.first()?));

    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    // Relay-scoped events carry the relay id as the second topic.
    let relay_id = raw.topic.get(1).map(|t| extract_scalar(t));

    let data = &raw.value;
    let actor = match kind {
        EventKind::SaleStarted => extract_field(data, &["admin"]),
        EventKind::RelayCreated
        | EventKind::RelayFunded
        | EventKind::ContributionProcessed
        | EventKind::ContributorRefunded => extract_field(data, &["contributor"]),
        _ => None,
    };
    let stable_coin = extract_field(data, &["stable_coin"]);
    let amount = match kind {
        EventKind::SaleFinished | EventKind::SaleFailed => extract_field(data, &["tokens_sold"]),
        _ => extract_field(data, &["amount"]),
    };
    let raised_amount = extract_field(data, &["raised_amount"]);

    Some(SaleEvent {
        event_type: kind.as_str().to_string(),
        relay_id,
        actor,
        stable_coin,
        amount,
        raised_amount,
        ledger: raw.ledger.unwrap_or(0) as i64,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// First matching key rendered as a string. Soroban's JSON form may wrap
/// values as `{"type": .., "value": ..}`.
fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find_map(scalar_to_string)
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(_) => v.get("value").and_then(scalar_to_string),
        _ => None,
    }
}

/// Extract a Symbol from a topic entry, which may be
/// `{"type":"symbol","value":"contrib"}` or the bare symbol.
fn extract_symbol(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("value").and_then(|x| x.as_str()).map(String::from))
        .unwrap_or_else(|| raw.to_string())
}

/// Extract a numeric or string topic entry.
fn extract_scalar(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("value").and_then(scalar_to_string))
        .unwrap_or_else(|| raw.to_string())
}

fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}
