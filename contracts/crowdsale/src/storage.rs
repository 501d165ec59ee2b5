//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the sale:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key         | Type         | Description                              |
//! |-------------|--------------|------------------------------------------|
//! | `Config`    | `SaleConfig` | Immutable sale configuration             |
//! | `State`     | `SaleState`  | Status, raised amount, counters          |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                        | Type               | Description                    |
//! |----------------------------|--------------------|--------------------------------|
//! | `Relay(id)`                | `ContributorRelay` | Relay record                   |
//! | `RelayOf(contributor)`     | `u32`              | Contributor → relay id index   |
//! | `RelayBalance(id, coin)`   | `i128`             | Escrowed stablecoin per relay  |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Every relay balance lives under its own key, so a contribution or refund on
//! one relay never reads or writes another relay's entries.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{ContributorRelay, SaleConfig, SaleState};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Immutable sale configuration (Instance).
    Config,
    /// Mutable aggregate state (Instance).
    State,
    /// Relay record keyed by relay id (Persistent).
    Relay(u32),
    /// Relay id keyed by contributor address (Persistent).
    RelayOf(Address),
    /// Escrowed balance keyed by relay id and stablecoin (Persistent).
    RelayBalance(u32, Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn save_config(env: &Env, config: &SaleConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn load_config(env: &Env) -> Result<SaleConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn save_state(env: &Env, state: &SaleState) {
    env.storage().instance().set(&DataKey::State, state);
    bump_instance(env);
}

pub fn load_state(env: &Env) -> Result<SaleState, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::State)
        .ok_or(Error::NotInitialized)
}

/// Load config and state together; both exist once `init` has run.
pub fn load_sale(env: &Env) -> Result<(SaleConfig, SaleState), Error> {
    Ok((load_config(env)?, load_state(env)?))
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Store a relay record together with its contributor index entry.
pub fn save_relay(env: &Env, relay: &ContributorRelay) {
    let relay_key = DataKey::Relay(relay.id);
    let index_key = DataKey::RelayOf(relay.contributor_account.clone());

    env.storage().persistent().set(&relay_key, relay);
    env.storage().persistent().set(&index_key, &relay.id);
    bump_persistent(env, &relay_key);
    bump_persistent(env, &index_key);
}

pub fn load_relay(env: &Env, relay_id: u32) -> Result<ContributorRelay, Error> {
    let key = DataKey::Relay(relay_id);
    let relay: ContributorRelay = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::RelayNotFound)?;
    bump_persistent(env, &key);
    Ok(relay)
}

/// Relay id registered for `contributor`, if any.
pub fn relay_id_of(env: &Env, contributor: &Address) -> Option<u32> {
    let key = DataKey::RelayOf(contributor.clone());
    let id: Option<u32> = env.storage().persistent().get(&key);
    if id.is_some() {
        bump_persistent(env, &key);
    }
    id
}

pub fn relay_balance(env: &Env, relay_id: u32, stable_coin: &Address) -> i128 {
    let key = DataKey::RelayBalance(relay_id, stable_coin.clone());
    match env.storage().persistent().get::<_, i128>(&key) {
        Some(balance) => {
            bump_persistent(env, &key);
            balance
        }
        None => 0,
    }
}

/// Overwrite a relay balance; a zero balance removes the entry.
pub fn set_relay_balance(env: &Env, relay_id: u32, stable_coin: &Address, balance: i128) {
    let key = DataKey::RelayBalance(relay_id, stable_coin.clone());
    if balance == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &balance);
        bump_persistent(env, &key);
    }
}
