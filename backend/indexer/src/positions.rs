//! Off-chain replay of the FundMe ledger.
//!
//! Walking the indexed events in ledger order reproduces the contract's
//! funding ledger: `funded` adds the amount to the funder's position,
//! `withdrawn` resets every position. The result is what
//! `get_address_to_amount_funded` would return for each funder, without
//! one RPC simulation per address.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::events::{EventKind, EventRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunderPosition {
    pub address: String,
    /// Cumulative amount since the last withdrawal, as a decimal string.
    pub amount: String,
    /// Number of `fund` calls since the last withdrawal.
    pub contributions: u32,
    /// Ledger of the first contribution since the last withdrawal.
    pub first_ledger: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    /// Sum of all open positions; equals the contract balance.
    pub total: String,
    /// Ledger of the most recent withdrawal, if any.
    pub last_withdrawal_ledger: Option<i64>,
    /// Open positions in first-contribution order.
    pub funders: Vec<FunderPosition>,
}

#[derive(Default)]
struct Position {
    amount: i128,
    contributions: u32,
    first_ledger: i64,
    order: usize,
}

/// Replay `events` (ledger ascending) into the current ledger snapshot.
pub fn replay(events: &[EventRecord]) -> LedgerSnapshot {
    let mut positions: HashMap<String, Position> = HashMap::new();
    let mut last_withdrawal_ledger = None;

    for ev in events {
        match EventKind::from_topic(&ev.event_type) {
            EventKind::Funded => {
                let (Some(actor), Some(amount)) = (ev.actor.as_ref(), parse_amount(ev)) else {
                    continue;
                };
                let order = positions.len();
                let position = positions.entry(actor.clone()).or_insert_with(|| Position {
                    first_ledger: ev.ledger,
                    order,
                    ..Position::default()
                });
                position.amount = position.amount.saturating_add(amount);
                position.contributions += 1;
            }
            EventKind::Withdrawn => {
                positions.clear();
                last_withdrawal_ledger = Some(ev.ledger);
            }
            EventKind::Unknown => {}
        }
    }

    let mut open: Vec<(String, Position)> = positions.into_iter().collect();
    open.sort_by_key(|(_, p)| p.order);

    let total: i128 = open.iter().map(|(_, p)| p.amount).sum();
    let funders = open
        .into_iter()
        .map(|(address, p)| FunderPosition {
            address,
            amount: p.amount.to_string(),
            contributions: p.contributions,
            first_ledger: p.first_ledger,
        })
        .collect();

    LedgerSnapshot {
        total: total.to_string(),
        last_withdrawal_ledger,
        funders,
    }
}

fn parse_amount(ev: &EventRecord) -> Option<i128> {
    let raw = ev.amount.as_deref()?;
    match raw.parse::<i128>() {
        Ok(amount) => Some(amount),
        Err(_) => {
            warn!("Skipping event {} with unparseable amount {raw:?}", ev.id);
            None
        }
    }
}
