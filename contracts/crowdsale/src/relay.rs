//! Contributor relays.
//!
//! A relay is an escrow record, not a separate contract. Tokens deposited into
//! a relay are held by the sale contract and attributed to the relay through
//! its own `RelayBalance` entries. Only two flows move them out again:
//! a refund to the relay's contributor, or an accepted contribution to the
//! fund.

use soroban_sdk::{Address, Env};

use crate::storage;
use crate::types::{ContributorRelay, SaleState};
use crate::Error;

/// Return the contributor's relay, creating it if needed.
///
/// The boolean is `true` when a new relay was created; `state.relay_count` is
/// advanced in that case and the caller must persist `state`.
pub fn open(env: &Env, state: &mut SaleState, contributor: &Address) -> (ContributorRelay, bool) {
    if let Some(existing) = storage::relay_id_of(env, contributor) {
        if let Ok(relay) = storage::load_relay(env, existing) {
            return (relay, false);
        }
    }

    let relay = ContributorRelay {
        id: state.relay_count,
        contributor_account: contributor.clone(),
        crowd_sale: env.current_contract_address(),
        contributed: 0,
        tokens_purchased: 0,
    };
    state.relay_count += 1;
    storage::save_relay(env, &relay);
    (relay, true)
}

/// Add `amount` to the relay's escrow; returns the new balance.
pub fn credit(env: &Env, relay_id: u32, stable_coin: &Address, amount: i128) -> Result<i128, Error> {
    let balance = storage::relay_balance(env, relay_id, stable_coin)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::set_relay_balance(env, relay_id, stable_coin, balance);
    Ok(balance)
}

/// Remove `amount` from the relay's escrow; returns the remaining balance.
pub fn debit(env: &Env, relay_id: u32, stable_coin: &Address, amount: i128) -> Result<i128, Error> {
    let balance = storage::relay_balance(env, relay_id, stable_coin);
    if amount > balance {
        return Err(Error::InsufficientRelayBalance);
    }
    let remaining = balance - amount;
    storage::set_relay_balance(env, relay_id, stable_coin, remaining);
    Ok(remaining)
}

/// Record an accepted contribution on the relay record.
pub fn record_purchase(
    env: &Env,
    relay: &mut ContributorRelay,
    normalized: i128,
    tokens: i128,
) -> Result<(), Error> {
    relay.contributed = relay
        .contributed
        .checked_add(normalized)
        .ok_or(Error::Overflow)?;
    relay.tokens_purchased = relay
        .tokens_purchased
        .checked_add(tokens)
        .ok_or(Error::Overflow)?;
    storage::save_relay(env, relay);
    Ok(())
}
