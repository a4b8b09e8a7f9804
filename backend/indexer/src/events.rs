//! Canonical event types emitted by the FundMe contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/fund_me/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the FundMe contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A funder paid into the contract (`funded` topic).
    Funded,
    /// The owner withdrew the balance and the ledger was reset (`withdrawn` topic).
    Withdrawn,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "funded" => Self::Funded,
            "withdrawn" => Self::Withdrawn,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Funded => "funded",
            Self::Withdrawn => "withdrawn",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded FundMe event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundMeEvent {
    pub event_type: String,
    /// Funder for `funded`, owner for `withdrawn`.
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    /// Unique event identifier used to make inserts idempotent.
    pub event_id: String,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub event_id: Option<String>,
    pub created_at: i64,
}
