//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by FundMe.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key           | Type     | Description                           |
//! |---------------|----------|---------------------------------------|
//! | `Config`      | `Config` | Owner, price feed and token addresses |
//! | `FunderCount` | `u32`    | Length of the funder sequence         |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                     | Type           | Description                         |
//! |-------------------------|----------------|-------------------------------------|
//! | `Funder(index)`         | `Address`      | One funder sequence entry           |
//! | `AmountFunded(address)` | `i128`         | Cumulative amount for one funder    |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Withdrawals remove ledger entries instead of writing zeros; an absent
//! entry reads as `0`, so both are observably the same and removal frees the
//! ledger space.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::Config;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Construction-time configuration (Instance).
    Config,
    /// Length of the funder sequence (Instance).
    FunderCount,
    /// One funder sequence entry by position, duplicates included (Persistent).
    Funder(u32),
    /// Cumulative amount funded by one address (Persistent).
    AmountFunded(Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn save_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

/// Panics only if the constructor never ran, which the host rules out.
pub fn load_config(env: &Env) -> Config {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("config not set")
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Amount funded by `funder` since the last withdrawal, `0` if none.
pub fn amount_funded(env: &Env, funder: &Address) -> i128 {
    let key = DataKey::AmountFunded(funder.clone());
    match env.storage().persistent().get::<_, i128>(&key) {
        Some(amount) => {
            bump_persistent(env, &key);
            amount
        }
        None => 0,
    }
}

pub fn set_amount_funded(env: &Env, funder: &Address, amount: i128) {
    let key = DataKey::AmountFunded(funder.clone());
    env.storage().persistent().set(&key, &amount);
    bump_persistent(env, &key);
}

pub fn remove_amount_funded(env: &Env, funder: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::AmountFunded(funder.clone()));
}

// ── Funder Sequence ──────────────────────────────────────────────────

/// Length of the funder sequence.
pub fn funder_count(env: &Env) -> u32 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::FunderCount)
        .unwrap_or(0)
}

/// Funder at `index`, or `None` past the end of the sequence.
pub fn funder_at(env: &Env, index: u32) -> Option<Address> {
    if index >= funder_count(env) {
        return None;
    }
    let key = DataKey::Funder(index);
    let funder = env.storage().persistent().get::<_, Address>(&key)?;
    bump_persistent(env, &key);
    Some(funder)
}

/// Append `funder` at the end of the sequence. Writes one entry and the count.
pub fn push_funder(env: &Env, funder: &Address) {
    let index = funder_count(env);
    let key = DataKey::Funder(index);
    env.storage().persistent().set(&key, funder);
    bump_persistent(env, &key);
    env.storage()
        .instance()
        .set(&DataKey::FunderCount, &(index + 1));
}

pub fn remove_funder_at(env: &Env, index: u32) {
    env.storage().persistent().remove(&DataKey::Funder(index));
}

/// Empty the sequence. Entries must already have been removed.
pub fn reset_funder_count(env: &Env) {
    env.storage().instance().set(&DataKey::FunderCount, &0u32);
    bump_instance(env);
}
