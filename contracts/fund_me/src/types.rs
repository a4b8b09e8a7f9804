//! # Types
//!
//! Shared data structures used across the FundMe modules.
//!
//! ## Config vs ledger entries
//!
//! The three addresses fixed at construction live together in one
//! instance-storage [`Config`] entry; they are read on every call but never
//! written again. The funding ledger itself (per-funder amounts and the
//! funder sequence) lives in persistent storage, see [`crate::storage`].
//!
//! ## Price rounds
//!
//! [`RoundData`] mirrors the round shape of a Chainlink-style V3 aggregator.
//! Soroban converts contract types by field name, so any feed returning a
//! struct with these fields and types can be read through
//! [`crate::price::PriceFeedClient`].

use soroban_sdk::{contracttype, Address};

/// Immutable contract configuration, written once by the constructor.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The only address allowed to withdraw.
    pub owner: Address,
    /// Price feed quoting the funding token in USD.
    pub price_feed: Address,
    /// Stellar Asset Contract of the funding token.
    pub token: Address,
}

/// One answer from the price feed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundData {
    pub round_id: u64,
    /// Price with `decimals()` fractional digits.
    pub answer: i128,
    pub started_at: u64,
    pub updated_at: u64,
    /// Round in which `answer` was computed; lower than `round_id` means stale.
    pub answered_in_round: u64,
}
