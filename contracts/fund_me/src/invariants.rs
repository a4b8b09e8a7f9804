#![allow(dead_code)]

extern crate std;

use soroban_sdk::{token, Address};

use crate::{Error, FundMeClient};

/// INV-1: the ledger total over `identities` equals the contract's token
/// balance. `identities` must list every address that funded, once each.
pub fn assert_ledger_matches_balance(
    client: &FundMeClient,
    token: &token::Client,
    identities: &[Address],
) {
    let total: i128 = identities
        .iter()
        .map(|id| client.get_address_to_amount_funded(id))
        .sum();
    let balance = token.balance(&client.address);
    assert_eq!(
        total, balance,
        "INV-1 violated: ledger total {} != contract balance {}",
        total, balance
    );
}

/// INV-2: every entry in the funder sequence has a positive ledger amount.
pub fn assert_sequence_entries_funded(client: &FundMeClient) {
    for index in 0..client.get_funder_count() {
        let funder = client.get_funder(&index);
        let amount = client.get_address_to_amount_funded(&funder);
        assert!(
            amount > 0,
            "INV-2 violated: funder at {} has amount {}",
            index,
            amount
        );
    }
}

/// INV-3: the empty state. No sequence entries, no ledger amounts, no balance.
pub fn assert_empty(client: &FundMeClient, token: &token::Client, identities: &[Address]) {
    assert_eq!(client.get_funder_count(), 0, "INV-3 violated: sequence not empty");
    assert_eq!(
        client.try_get_funder(&0),
        Err(Ok(Error::IndexOutOfRange)),
        "INV-3 violated: funder 0 still readable"
    );
    for id in identities {
        assert_eq!(
            client.get_address_to_amount_funded(id),
            0,
            "INV-3 violated: ledger entry not reset"
        );
    }
    assert_eq!(
        token.balance(&client.address),
        0,
        "INV-3 violated: contract still holds funds"
    );
}

/// INV-4: a failed call leaves the funder's amount and the sequence length as they were.
pub fn assert_unchanged(
    client: &FundMeClient,
    funder: &Address,
    amount_before: i128,
    count_before: u32,
) {
    assert_eq!(
        client.get_address_to_amount_funded(funder),
        amount_before,
        "INV-4 violated: ledger entry changed by a failed call"
    );
    assert_eq!(
        client.get_funder_count(),
        count_before,
        "INV-4 violated: funder sequence changed by a failed call"
    );
}
