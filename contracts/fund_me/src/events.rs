//! Contract events.
//!
//! | Topics                    | Data        |
//! |---------------------------|-------------|
//! | `("funded", funder)`      | [`Funded`]    |
//! | `("withdrawn", owner)`    | [`Withdrawn`] |

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Funded {
    pub funder: Address,
    pub amount: i128,
    /// USD value of `amount` at the quote used to accept it.
    pub usd_value: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawn {
    pub owner: Address,
    pub amount: i128,
    /// Length of the funder sequence that was cleared.
    pub funders: u32,
}

pub fn emit_funded(env: &Env, funder: Address, amount: i128, usd_value: i128) {
    env.events().publish(
        (symbol_short!("funded"), funder.clone()),
        Funded {
            funder,
            amount,
            usd_value,
        },
    );
}

pub fn emit_withdrawn(env: &Env, owner: Address, amount: i128, funders: u32) {
    env.events().publish(
        (symbol_short!("withdrawn"), owner.clone()),
        Withdrawn {
            owner,
            amount,
            funders,
        },
    );
}
