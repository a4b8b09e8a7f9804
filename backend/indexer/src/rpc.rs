//! Soroban RPC client: polls `getEvents` and decodes FundMe events.
//!
//! Events are requested with `xdrFormat: "json"`, so topics and values come
//! back as JSON-encoded `ScVal`s (`{"symbol":"funded"}`, `{"i128":"10"}`,
//! `{"map":[{"key":…,"val":…}]}`). Older RPC builds return
//! `{"type":…,"value":…}` objects or bare strings; the decoder accepts all three.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, FundMeEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// Single-key `ScVal` wrappers whose payload is a scalar.
const SCALAR_KEYS: &[&str] = &[
    "symbol", "address", "string", "i128", "u128", "i64", "u64", "i32", "u32", "bool",
];

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

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
#[allow(dead_code)]
pub struct RawEvent {
    /// Topic list, JSON-encoded `ScVal`s
    #[serde(alias = "topicJson", default)]
    pub topic: Vec<Value>,
    /// Event data, JSON-encoded `ScVal`
    #[serde(alias = "valueJson", default)]
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
            }
            Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                warn!("Rate-limited by RPC (will retry in {backoff}s)");
            }
            Ok(resp) => {
                let body: RpcResponse = resp.json().await?;

                if let Some(err) = body.error {
                    // Invalid request / unknown method will never succeed.
                    if err.code == -32600 || err.code == -32601 {
                        return Err(IndexerError::Rpc {
                            code: err.code,
                            message: err.message,
                        });
                    }
                    warn!(
                        "RPC soft error (will retry in {backoff}s): {} {}",
                        err.code, err.message
                    );
                } else {
                    let result = body.result.ok_or_else(|| {
                        IndexerError::EventParse("Empty result from getEvents".to_string())
                    })?;

                    debug!(
                        "Fetched {} events (latest_ledger={:?})",
                        result.events.len(),
                        result.latest_ledger
                    );

                    return Ok((result.events, result.cursor, result.latest_ledger));
                }
            }
        }

        tokio::time::sleep(Duration::from_secs(backoff)).await;
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
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`FundMeEvent`] structs.
///
/// Events from failed contract calls are dropped; their effects were rolled back.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<FundMeEvent> {
    raw.iter()
        .enumerate()
        .filter(|(_, e)| e.in_successful_contract_call != Some(false))
        .filter_map(|(i, e)| decode_single(e, contract_id, i))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str, position: usize) -> Option<FundMeEvent> {
    // Extract leading topic symbol to determine event type.
    let first_topic = raw.topic.first()?;
    let kind = EventKind::from_topic(&topic_scalar(first_topic)?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let topic_actor = raw.topic.get(1).and_then(topic_scalar);
    let (data_actor, amount) = decode_data(&raw.value, &kind);

    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| {
            format!(
                "{ledger}-{}-{position}",
                raw.tx_hash.as_deref().unwrap_or("unknown")
            )
        });

    Some(FundMeEvent {
        event_type: kind.as_str().to_string(),
        actor: data_actor.or(topic_actor),
        amount,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
        event_id,
    })
}

/// Pull the actor and amount out of the event data.
fn decode_data(value: &Value, kind: &EventKind) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::Funded => (
            extract_field(value, &["funder", "address"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::Withdrawn => (
            extract_field(value, &["owner", "address"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::Unknown => (None, None),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| map_field(value, key))
}

/// Look up `key` in either a plain JSON object or an `ScVal` map.
fn map_field(value: &Value, key: &str) -> Option<String> {
    let inner = value.get("value").unwrap_or(value);

    if let Some(v) = inner.get(key) {
        return scalar(v);
    }

    inner.get("map")?.as_array()?.iter().find_map(|entry| {
        let k = scalar(entry.get("key")?)?;
        if k == key {
            scalar(entry.get("val")?)
        } else {
            None
        }
    })
}

/// Reduce an `ScVal` in any of the accepted encodings to its scalar text.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => {
            if let Some(v) = map.get("value") {
                return scalar(v);
            }
            if map.len() == 1 {
                let (k, v) = map.iter().next()?;
                if SCALAR_KEYS.contains(&k.as_str()) {
                    return scalar(v);
                }
            }
            None
        }
        _ => None,
    }
}

/// Topics may arrive as JSON values or as strings holding JSON text.
fn topic_scalar(topic: &Value) -> Option<String> {
    if let Value::String(raw) = topic {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            if parsed.is_object() {
                return scalar(&parsed);
            }
        }
    }
    scalar(topic)
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
