//! # FundMe Contract
//!
//! Collects payments in a Stellar asset from any number of funders, gates
//! each payment on a minimum USD value read from an external price feed, and
//! lets the owner withdraw everything that has been collected.
//!
//! | Phase        | Entry Point(s)                                   |
//! |--------------|--------------------------------------------------|
//! | Deployment   | `__constructor(owner, price_feed, token)`        |
//! | Funding      | [`FundMe::fund`]                                 |
//! | Withdrawal   | [`FundMe::withdraw`], [`FundMe::cheap_withdraw`] |
//! | Queries      | `get_owner`, `get_price_feed`, `get_funder`, `get_address_to_amount_funded`, ... |
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`], price reads and conversion to
//! [`price`], and event publishing to [`events`]. Every entry point returns
//! `Result<_, Error>`; an `Err` fails the invocation and the host rolls back
//! every storage write and token movement made before it.
//!
//! ## Ledger
//!
//! Each funder has a cumulative amount, and every successful `fund` call
//! appends the funder to an ordered sequence (repeat funders appear once per
//! call). A withdrawal walks the sequence, deletes each funder's amount,
//! clears the sequence and pays the contract's entire token balance to the
//! owner.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, token, Address, Env};

mod events;
mod price;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_withdraw;

pub use events::{Funded, Withdrawn};
pub use types::{Config, RoundData};

/// Minimum USD value of a single `fund` call: 50 USD with 7 decimals,
/// the same fixed-point scale as Stellar asset amounts.
pub const MINIMUM_USD: i128 = 50 * 10_000_000;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotEnoughValue    = 1,
    NotOwner          = 2,
    TransferFailed    = 3,
    OracleUnavailable = 4,
    IndexOutOfRange   = 5,
    Overflow          = 6,
}

#[contract]
pub struct FundMe;

#[contractimpl]
impl FundMe {
    /// Record `owner`, the USD `price_feed` and the funding `token`.
    ///
    /// `owner` must sign the deployment; it can never be changed afterwards.
    pub fn __constructor(env: Env, owner: Address, price_feed: Address, token: Address) {
        owner.require_auth();
        storage::save_config(
            &env,
            &Config {
                owner,
                price_feed,
                token,
            },
        );
    }

    /// Fund the contract with `amount` of the token.
    ///
    /// - `sender` must authorize.
    /// - The USD value of `amount` at the current quote must be at least
    ///   [`MINIMUM_USD`], otherwise `NotEnoughValue`.
    /// - An unusable quote fails with `OracleUnavailable`.
    pub fn fund(env: Env, sender: Address, amount: i128) -> Result<(), Error> {
        sender.require_auth();
        let config = storage::load_config(&env);

        let quote = price::latest_quote(&env, &config.price_feed)?;
        let usd_value = quote.usd_value(amount)?;
        if usd_value < MINIMUM_USD {
            return Err(Error::NotEnoughValue);
        }

        let total = storage::amount_funded(&env, &sender)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;

        token::Client::new(&env, &config.token).transfer(
            &sender,
            &env.current_contract_address(),
            &amount,
        );

        storage::set_amount_funded(&env, &sender, total);
        storage::push_funder(&env, &sender);

        events::emit_funded(&env, sender, amount, usd_value);
        Ok(())
    }

    /// Pay the whole contract balance to the owner and reset the ledger.
    ///
    /// Re-reads the sequence length from storage on each iteration.
    /// `caller` must be the owner, otherwise `NotOwner`. If the owner cannot
    /// receive the payment the call fails with `TransferFailed` and the
    /// ledger is left as it was.
    pub fn withdraw(env: Env, caller: Address) -> Result<(), Error> {
        let config = require_owner(&env, &caller)?;
        let balance = held_balance(&env, &config);

        let cleared = storage::funder_count(&env);
        let mut index = 0;
        while index < storage::funder_count(&env) {
            if let Some(funder) = storage::funder_at(&env, index) {
                storage::remove_amount_funded(&env, &funder);
            }
            storage::remove_funder_at(&env, index);
            index += 1;
        }
        storage::reset_funder_count(&env);

        payout(&env, config.owner, &config.token, balance, cleared)
    }

    /// Same effects and failure modes as [`FundMe::withdraw`]; the sequence
    /// length is read once instead of on every iteration.
    pub fn cheap_withdraw(env: Env, caller: Address) -> Result<(), Error> {
        let config = require_owner(&env, &caller)?;
        let balance = held_balance(&env, &config);

        let count = storage::funder_count(&env);
        for index in 0..count {
            if let Some(funder) = storage::funder_at(&env, index) {
                storage::remove_amount_funded(&env, &funder);
            }
            storage::remove_funder_at(&env, index);
        }
        storage::reset_funder_count(&env);

        payout(&env, config.owner, &config.token, balance, count)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_owner(env: Env) -> Address {
        storage::load_config(&env).owner
    }

    pub fn get_price_feed(env: Env) -> Address {
        storage::load_config(&env).price_feed
    }

    pub fn get_token(env: Env) -> Address {
        storage::load_config(&env).token
    }

    /// Amount funded by `funder` since the last withdrawal.
    pub fn get_address_to_amount_funded(env: Env, funder: Address) -> i128 {
        storage::amount_funded(&env, &funder)
    }

    /// Funder at position `index` in the sequence.
    pub fn get_funder(env: Env, index: u32) -> Result<Address, Error> {
        storage::funder_at(&env, index).ok_or(Error::IndexOutOfRange)
    }

    pub fn get_funder_count(env: Env) -> u32 {
        storage::funder_count(&env)
    }

    pub fn minimum_usd(_env: Env) -> i128 {
        MINIMUM_USD
    }

    /// USD value of `amount` at the current quote.
    pub fn get_conversion_rate(env: Env, amount: i128) -> Result<i128, Error> {
        let config = storage::load_config(&env);
        price::latest_quote(&env, &config.price_feed)?.usd_value(amount)
    }
}

fn require_owner(env: &Env, caller: &Address) -> Result<Config, Error> {
    caller.require_auth();
    let config = storage::load_config(env);
    if *caller != config.owner {
        return Err(Error::NotOwner);
    }
    Ok(config)
}

fn held_balance(env: &Env, config: &Config) -> i128 {
    token::Client::new(env, &config.token).balance(&env.current_contract_address())
}

fn payout(
    env: &Env,
    owner: Address,
    token: &Address,
    amount: i128,
    funders: u32,
) -> Result<(), Error> {
    if amount > 0 {
        let client = token::Client::new(env, token);
        match client.try_transfer(&env.current_contract_address(), &owner, &amount) {
            Ok(Ok(())) => {}
            _ => return Err(Error::TransferFailed),
        }
    }
    events::emit_withdrawn(env, owner, amount, funders);
    Ok(())
}
