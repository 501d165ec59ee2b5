//! Contract events.
//!
//! Relay-scoped events use `(symbol, relay_id)` as topics; sale-wide
//! lifecycle events use `(symbol,)`. Each data payload is a `contracttype`
//! struct so off-chain consumers get named fields.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleStarted {
    pub admin: Address,
    pub started_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelayCreated {
    pub relay_id: u32,
    pub contributor: Address,
    pub crowd_sale: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelayFunded {
    pub relay_id: u32,
    pub contributor: Address,
    pub stable_coin: Address,
    pub amount: i128,
    pub balance: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributionProcessed {
    pub relay_id: u32,
    pub contributor: Address,
    pub stable_coin: Address,
    pub amount: i128,
    pub normalized_amount: i128,
    pub tokens: i128,
    pub raised_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SoftCapReached {
    pub raised_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleClosed {
    pub raised_amount: i128,
    pub tokens_sold: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributorRefunded {
    pub relay_id: u32,
    pub contributor: Address,
    pub stable_coin: Address,
    pub amount: i128,
}

pub fn emit_sale_started(env: &Env, admin: Address, started_at: u64) {
    env.events().publish(
        (symbol_short!("started"),),
        SaleStarted { admin, started_at },
    );
}

pub fn emit_relay_created(env: &Env, relay_id: u32, contributor: Address, crowd_sale: Address) {
    env.events().publish(
        (symbol_short!("relay_new"), relay_id),
        RelayCreated {
            relay_id,
            contributor,
            crowd_sale,
        },
    );
}

pub fn emit_relay_funded(
    env: &Env,
    relay_id: u32,
    contributor: Address,
    stable_coin: Address,
    amount: i128,
    balance: i128,
) {
    env.events().publish(
        (symbol_short!("relay_dep"), relay_id),
        RelayFunded {
            relay_id,
            contributor,
            stable_coin,
            amount,
            balance,
        },
    );
}

pub fn emit_contribution_processed(env: &Env, event: ContributionProcessed) {
    env.events()
        .publish((symbol_short!("contrib"), event.relay_id), event);
}

pub fn emit_soft_cap_reached(env: &Env, raised_amount: i128) {
    env.events()
        .publish((symbol_short!("softcap"),), SoftCapReached { raised_amount });
}

pub fn emit_sale_finished(env: &Env, raised_amount: i128, tokens_sold: i128) {
    env.events().publish(
        (symbol_short!("finished"),),
        SaleClosed {
            raised_amount,
            tokens_sold,
        },
    );
}

pub fn emit_sale_failed(env: &Env, raised_amount: i128, tokens_sold: i128) {
    env.events().publish(
        (symbol_short!("failed"),),
        SaleClosed {
            raised_amount,
            tokens_sold,
        },
    );
}

pub fn emit_contributor_refunded(
    env: &Env,
    relay_id: u32,
    contributor: Address,
    stable_coin: Address,
    amount: i128,
) {
    env.events().publish(
        (symbol_short!("refund"), relay_id),
        ContributorRefunded {
            relay_id,
            contributor,
            stable_coin,
            amount,
        },
    );
}
