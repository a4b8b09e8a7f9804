//! # Mock V3 Aggregator
//!
//! A stand-in for a Chainlink-style price feed, deployed on local networks
//! and in unit tests where no real oracle exists. It answers the same two
//! calls the FundMe contract makes (`decimals`, `latest_round_data`) and adds
//! setters so tests can move the price or take the feed down, and one that
//! leaves the latest round unanswered.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, contracttype, panic_with_error, Env};


/// Decimals used by the development feed.
pub const DECIMALS: u32 = 8;

/// Answer the development feed starts with (8 decimals).
pub const INITIAL_ANSWER: i128 = 20_000_000_000_000;

const DAY_IN_LEDGERS: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    FeedHalted = 1,
}

/// One price round, field-for-field compatible with the FundMe price client.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundData {
    pub round_id: u64,
    pub answer: i128,
    pub started_at: u64,
    pub updated_at: u64,
    pub answered_in_round: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Decimals,
    Latest,
    Halted,
}

#[contract]
pub struct MockV3Aggregator;

#[contractimpl]
impl MockV3Aggregator {
    pub fn __constructor(env: Env, decimals: u32, initial_answer: i128) {
        env.storage().instance().set(&DataKey::Decimals, &decimals);
        write_new_round(&env, 0, initial_answer);
    }

    pub fn decimals(env: Env) -> u32 {
        bump_instance(&env);
        env.storage()
            .instance()
            .get(&DataKey::Decimals)
            .unwrap_or(DECIMALS)
    }

    /// Return the most recent round. Fails with `FeedHalted` while halted.
    pub fn latest_round_data(env: Env) -> RoundData {
        bump_instance(&env);
        if is_halted(&env) {
            panic_with_error!(&env, Error::FeedHalted);
        }
        load_latest(&env)
    }

    pub fn latest_answer(env: Env) -> i128 {
        load_latest(&env).answer
    }

    /// Publish `answer` as a fresh round.
    pub fn update_answer(env: Env, answer: i128) {
        let latest = load_latest(&env);
        write_new_round(&env, latest.round_id, answer);
    }

    /// Overwrite the latest round verbatim; the round answers itself.
    pub fn update_round_data(
        env: Env,
        round_id: u64,
        answer: i128,
        updated_at: u64,
        started_at: u64,
    ) {
        let round = RoundData {
            round_id,
            answer,
            started_at,
            updated_at,
            answered_in_round: round_id,
        };
        env.storage().instance().set(&DataKey::Latest, &round);
        bump_instance(&env);
    }

    /// Rewrite `answered_in_round` of the latest round. A value below
    /// `round_id` is how a stale round looks on a real feed.
    pub fn set_answered_in_round(env: Env, answered_in_round: u64) {
        let mut round = load_latest(&env);
        round.answered_in_round = answered_in_round;
        env.storage().instance().set(&DataKey::Latest, &round);
        bump_instance(&env);
    }

    pub fn set_halted(env: Env, halted: bool) {
        env.storage().instance().set(&DataKey::Halted, &halted);
        bump_instance(&env);
    }
}

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

fn is_halted(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Halted)
        .unwrap_or(false)
}

fn load_latest(env: &Env) -> RoundData {
    env.storage()
        .instance()
        .get(&DataKey::Latest)
        .unwrap_or(RoundData {
            round_id: 0,
            answer: 0,
            started_at: 0,
            updated_at: 0,
            answered_in_round: 0,
        })
}

fn write_new_round(env: &Env, previous_round: u64, answer: i128) {
    let now = env.ledger().timestamp();
    let round_id = previous_round + 1;
    let round = RoundData {
        round_id,
        answer,
        started_at: now,
        updated_at: now,
        answered_in_round: round_id,
    };
    env.storage().instance().set(&DataKey::Latest, &round);
    bump_instance(env);
}
