//! Price conversion against an external USD price feed.
//!
//! The feed is any contract exposing `decimals()` and `latest_round_data()`.
//! A quote is rejected as unavailable when the feed call fails, the answer
//! is not positive, the round is stale, or the decimals do not fit `i128`.

use soroban_sdk::{contractclient, Address, Env};

use crate::types::RoundData;
use crate::Error;

#[allow(dead_code)]
#[contractclient(name = "PriceFeedClient")]
pub trait PriceFeed {
    fn decimals(env: Env) -> u32;
    fn latest_round_data(env: Env) -> RoundData;
}

/// A validated price: `answer / scale` USD per whole token unit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Quote {
    pub answer: i128,
    pub scale: i128,
}

impl Quote {
    pub fn new(answer: i128, decimals: u32) -> Result<Self, Error> {
        if answer <= 0 {
            return Err(Error::OracleUnavailable);
        }
        let scale = 10i128
            .checked_pow(decimals)
            .ok_or(Error::OracleUnavailable)?;
        Ok(Quote { answer, scale })
    }

    /// USD value of `amount`, in the same fixed-point scale as `amount`.
    pub fn usd_value(&self, amount: i128) -> Result<i128, Error> {
        amount
            .checked_mul(self.answer)
            .map(|v| v / self.scale)
            .ok_or(Error::Overflow)
    }
}

/// Read and validate the current quote from `feed`.
pub fn latest_quote(env: &Env, feed: &Address) -> Result<Quote, Error> {
    let client = PriceFeedClient::new(env, feed);

    let decimals = match client.try_decimals() {
        Ok(Ok(decimals)) => decimals,
        _ => return Err(Error::OracleUnavailable),
    };
    let round = match client.try_latest_round_data() {
        Ok(Ok(round)) => round,
        _ => return Err(Error::OracleUnavailable),
    };

    if round.answered_in_round < round.round_id {
        return Err(Error::OracleUnavailable);
    }
    Quote::new(round.answer, decimals)
}
