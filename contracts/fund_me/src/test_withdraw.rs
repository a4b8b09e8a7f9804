extern crate std;

use std::vec::Vec as StdVec;

use mock_aggregator::{MockV3Aggregator, DECIMALS, INITIAL_ANSWER};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error,
    testutils::Address as _, Address, Env,
};

use crate::invariants::{assert_empty, assert_ledger_matches_balance};
use crate::test::{setup, Setup, MINIMUM_AMOUNT, SEND_VALUE};
use crate::{Error, FundMe, FundMeClient};

#[derive(Clone, Copy, Debug)]
enum Strategy {
    Withdraw,
    CheapWithdraw,
}

fn call(s: &Setup, strategy: Strategy, caller: &Address) {
    match strategy {
        Strategy::Withdraw => s.client.withdraw(caller),
        Strategy::CheapWithdraw => s.client.cheap_withdraw(caller),
    }
}

fn try_call(client: &FundMeClient, strategy: Strategy, caller: &Address) -> Result<(), Error> {
    let result = match strategy {
        Strategy::Withdraw => client.try_withdraw(caller),
        Strategy::CheapWithdraw => client.try_cheap_withdraw(caller),
    };
    match result {
        Ok(Ok(())) => Ok(()),
        Err(Ok(e)) => Err(e),
        other => panic!("unexpected invocation result: {:?}", other),
    }
}

const STRATEGIES: [Strategy; 2] = [Strategy::Withdraw, Strategy::CheapWithdraw];

/// Fund from `n` fresh funders, the first of which is the owner.
fn fund_many(s: &Setup, n: usize) -> StdVec<Address> {
    let mut funders = StdVec::new();
    s.token_admin.mint(&s.owner, &(100 * SEND_VALUE));
    s.client.fund(&s.owner, &SEND_VALUE);
    funders.push(s.owner.clone());
    for _ in 1..n {
        let funder = s.funder();
        s.client.fund(&funder, &SEND_VALUE);
        funders.push(funder);
    }
    funders
}

// ── single and multiple funders ──────────────────────────────────────

#[test]
fn test_withdraw_from_single_funder() {
    for strategy in STRATEGIES {
        let s = setup();
        let funders = fund_many(&s, 1);

        let starting_contract = s.token.balance(&s.client.address);
        let starting_owner = s.token.balance(&s.owner);

        call(&s, strategy, &s.owner);

        assert_eq!(s.token.balance(&s.client.address), 0, "{:?}", strategy);
        assert_eq!(
            s.token.balance(&s.owner),
            starting_owner + starting_contract,
            "{:?}",
            strategy
        );
        assert_empty(&s.client, &s.token, &funders);
    }
}

#[test]
fn test_withdraw_from_multiple_funders() {
    for strategy in STRATEGIES {
        let s = setup();
        let funders = fund_many(&s, 5);
        assert_ledger_matches_balance(&s.client, &s.token, &funders);

        let starting_contract = s.token.balance(&s.client.address);
        let starting_owner = s.token.balance(&s.owner);
        assert_eq!(starting_contract, 5 * SEND_VALUE);

        call(&s, strategy, &s.owner);

        assert_eq!(
            s.token.balance(&s.owner),
            starting_owner + starting_contract,
            "{:?}",
            strategy
        );
        assert_eq!(s.client.try_get_funder(&0), Err(Ok(Error::IndexOutOfRange)));
        for funder in &funders {
            assert_eq!(s.client.get_address_to_amount_funded(funder), 0);
        }
        assert_empty(&s.client, &s.token, &funders);
    }
}

#[test]
fn test_withdraw_clears_duplicate_entries() {
    for strategy in STRATEGIES {
        let s = setup();
        let funder = s.funder();
        s.client.fund(&funder, &SEND_VALUE);
        s.client.fund(&funder, &SEND_VALUE);
        assert_eq!(s.client.get_funder_count(), 2);

        call(&s, strategy, &s.owner);

        assert_empty(&s.client, &s.token, &[funder]);
    }
}

#[test]
fn test_long_sequence_is_indexed_and_cleared() {
    const FUND_CALLS: u32 = 200;

    for strategy in STRATEGIES {
        let s = setup();
        let regular = s.funder();
        let last = s.funder();
        for _ in 1..FUND_CALLS {
            s.client.fund(&regular, &MINIMUM_AMOUNT);
        }
        s.client.fund(&last, &MINIMUM_AMOUNT);

        assert_eq!(s.client.get_funder_count(), FUND_CALLS);
        assert_eq!(s.client.get_funder(&(FUND_CALLS - 2)), regular);
        assert_eq!(s.client.get_funder(&(FUND_CALLS - 1)), last);
        assert_eq!(
            s.client.try_get_funder(&FUND_CALLS),
            Err(Ok(Error::IndexOutOfRange))
        );
        assert_eq!(
            s.client.get_address_to_amount_funded(&regular),
            (FUND_CALLS as i128 - 1) * MINIMUM_AMOUNT
        );

        call(&s, strategy, &s.owner);

        assert_empty(&s.client, &s.token, &[regular, last]);
        assert_eq!(
            s.client.try_get_funder(&(FUND_CALLS - 1)),
            Err(Ok(Error::IndexOutOfRange)),
            "{:?}",
            strategy
        );
    }
}

// ── authorization ────────────────────────────────────────────────────

#[test]
fn test_non_owner_cannot_withdraw() {
    for strategy in STRATEGIES {
        let s = setup();
        let funders = fund_many(&s, 3);
        let not_owner = funders[1].clone();
        let balance_before = s.token.balance(&s.client.address);

        assert_eq!(
            try_call(&s.client, strategy, &not_owner),
            Err(Error::NotOwner),
            "{:?}",
            strategy
        );

        assert_eq!(s.token.balance(&s.client.address), balance_before);
        assert_eq!(s.client.get_funder_count(), 3);
        assert_eq!(s.client.get_funder(&1), not_owner);
        assert_ledger_matches_balance(&s.client, &s.token, &funders);
    }
}

// ── empty ledger ─────────────────────────────────────────────────────

#[test]
fn test_withdraw_on_empty_ledger_is_noop() {
    for strategy in STRATEGIES {
        let s = setup();
        let owner_before = s.token.balance(&s.owner);

        assert_eq!(try_call(&s.client, strategy, &s.owner), Ok(()), "{:?}", strategy);

        assert_eq!(s.token.balance(&s.owner), owner_before);
        assert_empty(&s.client, &s.token, &[]);
    }
}

#[test]
fn test_second_withdraw_is_noop() {
    for strategy in STRATEGIES {
        let s = setup();
        let funders = fund_many(&s, 2);

        call(&s, strategy, &s.owner);
        let owner_after_first = s.token.balance(&s.owner);

        assert_eq!(try_call(&s.client, strategy, &s.owner), Ok(()), "{:?}", strategy);

        assert_eq!(s.token.balance(&s.owner), owner_after_first);
        assert_empty(&s.client, &s.token, &funders);
    }
}

#[test]
fn test_funding_after_withdraw_starts_fresh_sequence() {
    for strategy in STRATEGIES {
        let s = setup();
        let first = fund_many(&s, 2);
        call(&s, strategy, &s.owner);

        let late = s.funder();
        s.client.fund(&late, &SEND_VALUE);

        assert_eq!(s.client.get_funder(&0), late);
        assert_eq!(s.client.get_funder_count(), 1);
        assert_eq!(s.client.get_address_to_amount_funded(&first[1]), 0);
        assert_eq!(s.client.get_address_to_amount_funded(&late), SEND_VALUE);
    }
}

// ── equivalence ──────────────────────────────────────────────────────

#[test]
fn test_withdraw_and_cheap_withdraw_are_equivalent() {
    let outcome = |strategy: Strategy| {
        let s = setup();
        let funders = fund_many(&s, 4);
        let extra = funders[2].clone();
        s.client.fund(&extra, &(2 * SEND_VALUE));
        let owner_before = s.token.balance(&s.owner);

        call(&s, strategy, &s.owner);

        let amounts: StdVec<i128> = funders
            .iter()
            .map(|f| s.client.get_address_to_amount_funded(f))
            .collect();
        (
            s.token.balance(&s.owner) - owner_before,
            s.token.balance(&s.client.address),
            s.client.get_funder_count(),
            amounts,
        )
    };

    let plain = outcome(Strategy::Withdraw);
    let cheap = outcome(Strategy::CheapWithdraw);

    assert_eq!(plain, cheap);
    assert_eq!(plain.0, 6 * SEND_VALUE);
}

// ── transfer failure ─────────────────────────────────────────────────

/// Token that refuses payments to addresses marked with `reject`.
#[contract]
pub struct RejectingToken;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RejectingTokenError {
    RecipientRejected = 1,
    InsufficientBalance = 2,
}

#[contracttype]
#[derive(Clone)]
pub enum TokenKey {
    Balance(Address),
    Rejects(Address),
}

#[contractimpl]
impl RejectingToken {
    pub fn mint(env: Env, to: Address, amount: i128) {
        let balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .instance()
            .set(&TokenKey::Balance(to), &(balance + amount));
    }

    pub fn reject(env: Env, id: Address) {
        env.storage().instance().set(&TokenKey::Rejects(id), &true);
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        env.storage()
            .instance()
            .get(&TokenKey::Balance(id))
            .unwrap_or(0)
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        let rejects: bool = env
            .storage()
            .instance()
            .get(&TokenKey::Rejects(to.clone()))
            .unwrap_or(false);
        if rejects {
            panic_with_error!(&env, RejectingTokenError::RecipientRejected);
        }
        let from_balance = Self::balance(env.clone(), from.clone());
        if from_balance < amount {
            panic_with_error!(&env, RejectingTokenError::InsufficientBalance);
        }
        let to_balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .instance()
            .set(&TokenKey::Balance(from), &(from_balance - amount));
        env.storage()
            .instance()
            .set(&TokenKey::Balance(to), &(to_balance + amount));
    }
}

#[test]
fn test_failed_transfer_rolls_back_withdraw() {
    for strategy in STRATEGIES {
        let env = Env::default();
        env.mock_all_auths();

        let owner = Address::generate(&env);
        let token_id = env.register(RejectingToken, ());
        let token = RejectingTokenClient::new(&env, &token_id);
        let feed_id = env.register(MockV3Aggregator, (DECIMALS, INITIAL_ANSWER));
        let contract_id = env.register(FundMe, (owner.clone(), feed_id, token_id.clone()));
        let client = FundMeClient::new(&env, &contract_id);

        let a = Address::generate(&env);
        let b = Address::generate(&env);
        token.mint(&a, &(10 * SEND_VALUE));
        token.mint(&b, &(10 * SEND_VALUE));
        client.fund(&a, &SEND_VALUE);
        client.fund(&b, &(2 * SEND_VALUE));

        token.reject(&owner);

        assert_eq!(
            try_call(&client, strategy, &owner),
            Err(Error::TransferFailed),
            "{:?}",
            strategy
        );

        assert_eq!(client.get_funder_count(), 2);
        assert_eq!(client.get_funder(&0), a);
        assert_eq!(client.get_funder(&1), b);
        assert_eq!(client.get_address_to_amount_funded(&a), SEND_VALUE);
        assert_eq!(client.get_address_to_amount_funded(&b), 2 * SEND_VALUE);
        assert_eq!(token.balance(&contract_id), 3 * SEND_VALUE);
        assert_eq!(token.balance(&owner), 0);
    }
}
