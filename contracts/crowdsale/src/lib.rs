//! # CrowdSale Contract
//!
//! A time- and cap-bounded token sale funded in stablecoins. Contributors
//! park stablecoins in a personal [`ContributorRelay`]; the sale pulls them
//! from there, normalizes them to 18 decimals, checks them against the caps,
//! forwards them to the fund and mints project tokens to the contributor.
//!
//! | Phase         | Entry Point(s)                                          |
//! |---------------|---------------------------------------------------------|
//! | Bootstrap     | [`CrowdSale::init`]                                     |
//! | Lifecycle     | `start`, `finish`, `try_to_switch_state`                |
//! | Relays        | `new_contributor_relay`, `deposit_to_relay`             |
//! | Contributions | [`CrowdSale::process_contribution`]                     |
//! | Refunds       | [`CrowdSale::return_stc_to_contributor`]                |
//! | Pricing       | `convert_to_normalized`, `calculate_tokens`             |
//! | Queries       | `sale_info`, `config`, `get_relay`, `relay_balance`, …  |
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`], the lifecycle rules to
//! [`lifecycle`], escrow bookkeeping to [`relay`] and all arithmetic to
//! [`pricing`]. Internal helpers return `Result<_, Error>`; entry points
//! abort with `panic_with_error!`, which reverts every write and sub-call of
//! the invocation.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, panic_with_error, token, Address, Env};

pub mod events;
pub mod lifecycle;
pub mod organization;
pub mod pricing;
mod relay;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod testutils;
#[cfg(test)]
mod test_events;

pub use types::{
    BonusTier, Collaborators, ContributionReceipt, ContributorRelay, PriceSchedule, SaleConfig,
    SaleInfo, SaleParams, SaleState, SaleStatus,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized           = 1,
    AlreadyInitialized       = 2,
    Unauthorized             = 3,
    InvalidState             = 4,
    AlreadyStarted           = 5,
    UnsupportedStableCoin    = 6,
    BelowMinimumContribution = 7,
    CapacityExceeded         = 8,
    InsufficientRelayBalance = 9,
    RelayNotFound            = 10,
    InvalidAmount            = 11,
    InvalidConfig            = 12,
    Overflow                 = 13,
}

fn abort_on_err<T>(env: &Env, result: Result<T, Error>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic_with_error!(env, err),
    }
}

#[contract]
pub struct CrowdSale;

#[contractimpl]
impl CrowdSale {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Configure the sale. Must be called exactly once after deployment.
    ///
    /// - `admin` must sign and becomes the only account allowed to `start`
    ///   and `finish` the sale.
    /// - The sale must be made admin of the project token before the first
    ///   contribution, since allocations are minted.
    pub fn init(env: Env, admin: Address, collaborators: Collaborators, params: SaleParams) {
        admin.require_auth();
        abort_on_err(&env, Self::init_sale(&env, admin, collaborators, params));
    }

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────

    /// Open the sale for contributions.
    pub fn start(env: Env, caller: Address) {
        caller.require_auth();
        abort_on_err(&env, Self::start_sale(&env, &caller));
    }

    /// Close a running sale as `Finished`. Admin only.
    pub fn finish(env: Env, caller: Address) {
        caller.require_auth();
        abort_on_err(&env, Self::finish_sale(&env, &caller));
    }

    /// Apply the automatic transition due at the current ledger time, if any.
    ///
    /// Callable by anyone; calling it again without an intervening
    /// contribution or deadline never changes the status.
    pub fn try_to_switch_state(env: Env) -> SaleStatus {
        abort_on_err(&env, Self::switch_state(&env))
    }

    // ─────────────────────────────────────────────────────────
    // Relays
    // ─────────────────────────────────────────────────────────

    /// Return the relay of `contributor`, creating it on first use.
    ///
    /// A `relay_new` event is emitted only when a relay is created.
    pub fn new_contributor_relay(env: Env, contributor: Address) -> ContributorRelay {
        abort_on_err(&env, Self::open_relay(&env, &contributor))
    }

    /// Move `amount` of `stable_coin` from the relay's contributor into the
    /// relay's escrow. Returns the new escrow balance.
    pub fn deposit_to_relay(env: Env, relay_id: u32, stable_coin: Address, amount: i128) -> i128 {
        abort_on_err(&env, Self::deposit(&env, relay_id, &stable_coin, amount))
    }

    /// Refund escrowed funds to the relay's contributor.
    ///
    /// Available in every sale status; only the contributor may call it.
    pub fn return_stc_to_contributor(env: Env, relay_id: u32, stable_coin: Address, amount: i128) {
        abort_on_err(&env, Self::refund(&env, relay_id, &stable_coin, amount));
    }

    // ─────────────────────────────────────────────────────────
    // Contributions
    // ─────────────────────────────────────────────────────────

    /// Pull `amount` of `stable_coin` from a relay into the fund and credit
    /// the contributor with project tokens.
    ///
    /// `operator` must be the admin, the web platform account or the relay's
    /// contributor. If the contribution does not fit under the hardcap only
    /// the fitting part is accepted and the rest stays in the relay.
    pub fn process_contribution(
        env: Env,
        operator: Address,
        relay_id: u32,
        stable_coin: Address,
        amount: i128,
    ) -> ContributionReceipt {
        operator.require_auth();
        abort_on_err(
            &env,
            Self::contribute(&env, &operator, relay_id, &stable_coin, amount),
        )
    }

    // ─────────────────────────────────────────────────────────
    // Pricing
    // ─────────────────────────────────────────────────────────

    /// Normalized (18 decimal) value of `amount` of an accepted stablecoin.
    pub fn convert_to_normalized(env: Env, stable_coin: Address, amount: i128) -> i128 {
        abort_on_err(&env, Self::to_normalized(&env, &stable_coin, amount))
    }

    /// Stablecoin amount worth at most `normalized`.
    pub fn normalized_to_stable(env: Env, stable_coin: Address, normalized: i128) -> i128 {
        abort_on_err(&env, Self::from_normalized(&env, &stable_coin, normalized))
    }

    /// Project-token units bought by a normalized contribution.
    pub fn calculate_tokens(env: Env, normalized: i128) -> i128 {
        let config = abort_on_err(&env, storage::load_config(&env));
        abort_on_err(
            &env,
            pricing::tokens_for_contribution(&config.params.price, normalized),
        )
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn config(env: Env) -> SaleConfig {
        abort_on_err(&env, storage::load_config(&env))
    }

    pub fn sale_info(env: Env) -> SaleInfo {
        let (config, state) = abort_on_err(&env, storage::load_sale(&env));
        let params = config.params;
        SaleInfo {
            status: state.status,
            raised_amount: state.raised_amount,
            soft_cap_reached: state.soft_cap_reached,
            started_at: state.started_at,
            tokens_sold: state.tokens_sold,
            relay_count: state.relay_count,
            softcap_amount: params.softcap_amount,
            hardcap_amount: params.hardcap_amount,
            softcap_deadline: params.softcap_deadline,
            hardcap_deadline: params.hardcap_deadline,
            min_contribution: params.min_contribution,
        }
    }

    pub fn status(env: Env) -> SaleStatus {
        abort_on_err(&env, storage::load_state(&env)).status
    }

    /// `true` while contributions are accepted.
    pub fn is_running(env: Env) -> bool {
        abort_on_err(&env, storage::load_state(&env))
            .status
            .accepts_contributions()
    }

    pub fn raised_amount(env: Env) -> i128 {
        abort_on_err(&env, storage::load_state(&env)).raised_amount
    }

    pub fn soft_cap_reached(env: Env) -> bool {
        abort_on_err(&env, storage::load_state(&env)).soft_cap_reached
    }

    /// Normalized amount still accepted before the hardcap.
    pub fn remaining_capacity(env: Env) -> i128 {
        let (config, state) = abort_on_err(&env, storage::load_sale(&env));
        config.params.hardcap_amount - state.raised_amount
    }

    pub fn softcap_amount(env: Env) -> i128 {
        Self::config(env).params.softcap_amount
    }

    pub fn hardcap_amount(env: Env) -> i128 {
        Self::config(env).params.hardcap_amount
    }

    pub fn softcap_deadline(env: Env) -> u64 {
        Self::config(env).params.softcap_deadline
    }

    pub fn hardcap_deadline(env: Env) -> u64 {
        Self::config(env).params.hardcap_deadline
    }

    pub fn min_contribution(env: Env) -> i128 {
        Self::config(env).params.min_contribution
    }

    pub fn admin(env: Env) -> Address {
        Self::config(env).admin
    }

    pub fn organization(env: Env) -> Address {
        Self::config(env).collaborators.organization
    }

    pub fn governance(env: Env) -> Address {
        Self::config(env).collaborators.governance
    }

    pub fn refund_tap(env: Env) -> Address {
        Self::config(env).collaborators.refund_tap
    }

    pub fn fund(env: Env) -> Address {
        Self::config(env).collaborators.fund
    }

    pub fn web_platform(env: Env) -> Address {
        Self::config(env).collaborators.web_platform
    }

    /// Relay id registered for `contributor`, if any.
    pub fn relay_of(env: Env, contributor: Address) -> Option<u32> {
        storage::relay_id_of(&env, &contributor)
    }

    pub fn get_relay(env: Env, relay_id: u32) -> ContributorRelay {
        abort_on_err(&env, storage::load_relay(&env, relay_id))
    }

    /// Escrowed `stable_coin` held for the relay.
    pub fn relay_balance(env: Env, relay_id: u32, stable_coin: Address) -> i128 {
        storage::relay_balance(&env, relay_id, &stable_coin)
    }

    pub fn relay_contributor(env: Env, relay_id: u32) -> Address {
        Self::get_relay(env, relay_id).contributor_account
    }

    pub fn relay_crowd_sale(env: Env, relay_id: u32) -> Address {
        Self::get_relay(env, relay_id).crowd_sale
    }
}

impl CrowdSale {
    fn init_sale(
        env: &Env,
        admin: Address,
        collaborators: Collaborators,
        params: SaleParams,
    ) -> Result<(), Error> {
        if storage::is_initialized(env) {
            return Err(Error::AlreadyInitialized);
        }
        Self::validate_params(env, &params)?;

        storage::save_config(
            env,
            &SaleConfig {
                admin,
                collaborators,
                params,
            },
        );
        storage::save_state(
            env,
            &SaleState {
                status: SaleStatus::Pending,
                raised_amount: 0,
                soft_cap_reached: false,
                started_at: 0,
                tokens_sold: 0,
                relay_count: 0,
            },
        );
        Ok(())
    }

    fn validate_params(env: &Env, params: &SaleParams) -> Result<(), Error> {
        let now = env.ledger().timestamp();
        if params.softcap_amount <= 0
            || params.hardcap_amount < params.softcap_amount
            || params.min_contribution <= 0
            || params.min_contribution > params.hardcap_amount
        {
            return Err(Error::InvalidConfig);
        }
        if params.softcap_deadline > params.hardcap_deadline || params.hardcap_deadline <= now {
            return Err(Error::InvalidConfig);
        }
        pricing::validate_schedule(&params.price)
    }

    fn start_sale(env: &Env, caller: &Address) -> Result<(), Error> {
        let (config, mut state) = storage::load_sale(env)?;
        if *caller != config.admin {
            return Err(Error::Unauthorized);
        }
        if state.status != SaleStatus::Pending {
            return Err(Error::AlreadyStarted);
        }

        state.status = SaleStatus::Running;
        state.started_at = env.ledger().timestamp();
        storage::save_state(env, &state);

        events::emit_sale_started(env, caller.clone(), state.started_at);
        Ok(())
    }

    fn finish_sale(env: &Env, caller: &Address) -> Result<(), Error> {
        let (config, mut state) = storage::load_sale(env)?;
        if *caller != config.admin {
            return Err(Error::Unauthorized);
        }
        if !state.status.accepts_contributions() {
            return Err(Error::InvalidState);
        }

        Self::close(env, &mut state, SaleStatus::Finished);
        storage::save_state(env, &state);
        Ok(())
    }

    fn switch_state(env: &Env) -> Result<SaleStatus, Error> {
        let (config, mut state) = storage::load_sale(env)?;
        if let Some(next) = lifecycle::next_status(&config.params, &state, env.ledger().timestamp()) {
            Self::close(env, &mut state, next);
            storage::save_state(env, &state);
        }
        Ok(state.status)
    }

    /// Move to a terminal status and announce it. Caller persists `state`.
    fn close(env: &Env, state: &mut SaleState, status: SaleStatus) {
        state.status = status;
        match status {
            SaleStatus::Failed => events::emit_sale_failed(env, state.raised_amount, state.tokens_sold),
            _ => events::emit_sale_finished(env, state.raised_amount, state.tokens_sold),
        }
    }

    fn open_relay(env: &Env, contributor: &Address) -> Result<ContributorRelay, Error> {
        let mut state = storage::load_state(env)?;
        if state.status.is_terminal() {
            return Err(Error::InvalidState);
        }

        let (relay, created) = relay::open(env, &mut state, contributor);
        if created {
            storage::save_state(env, &state);
            events::emit_relay_created(
                env,
                relay.id,
                relay.contributor_account.clone(),
                relay.crowd_sale.clone(),
            );
        }
        Ok(relay)
    }

    fn deposit(env: &Env, relay_id: u32, stable_coin: &Address, amount: i128) -> Result<i128, Error> {
        let (config, state) = storage::load_sale(env)?;
        let relay = storage::load_relay(env, relay_id)?;
        relay.contributor_account.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if state.status.is_terminal() {
            return Err(Error::InvalidState);
        }
        organization::require_accepted(env, &config.collaborators.organization, stable_coin)?;

        token::Client::new(env, stable_coin).transfer(
            &relay.contributor_account,
            &env.current_contract_address(),
            &amount,
        );
        let balance = relay::credit(env, relay_id, stable_coin, amount)?;

        events::emit_relay_funded(
            env,
            relay_id,
            relay.contributor_account,
            stable_coin.clone(),
            amount,
            balance,
        );
        Ok(balance)
    }

    fn refund(env: &Env, relay_id: u32, stable_coin: &Address, amount: i128) -> Result<(), Error> {
        let relay = storage::load_relay(env, relay_id)?;
        relay.contributor_account.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        relay::debit(env, relay_id, stable_coin, amount)?;

        token::Client::new(env, stable_coin).transfer(
            &env.current_contract_address(),
            &relay.contributor_account,
            &amount,
        );

        events::emit_contributor_refunded(
            env,
            relay_id,
            relay.contributor_account,
            stable_coin.clone(),
            amount,
        );
        Ok(())
    }

    fn contribute(
        env: &Env,
        operator: &Address,
        relay_id: u32,
        stable_coin: &Address,
        amount: i128,
    ) -> Result<ContributionReceipt, Error> {
        let (config, mut state) = storage::load_sale(env)?;
        let mut relay = storage::load_relay(env, relay_id)?;
        let params = &config.params;

        if *operator != config.admin
            && *operator != config.collaborators.web_platform
            && *operator != relay.contributor_account
        {
            return Err(Error::Unauthorized);
        }

        // A pending automatic close means the window is already shut.
        let now = env.ledger().timestamp();
        if !state.status.accepts_contributions()
            || lifecycle::next_status(params, &state, now).is_some()
        {
            return Err(Error::InvalidState);
        }

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let decimals =
            organization::accepted_decimals(env, &config.collaborators.organization, stable_coin)?;
        if amount > storage::relay_balance(env, relay_id, stable_coin) {
            return Err(Error::InsufficientRelayBalance);
        }

        let requested = pricing::scale_to_normalized(amount, decimals)?;
        if requested < params.min_contribution {
            return Err(Error::BelowMinimumContribution);
        }

        let remaining = params.hardcap_amount - state.raised_amount;
        let (accepted_amount, normalized) = if requested <= remaining {
            (amount, requested)
        } else {
            let fitting = pricing::normalized_to_stable(remaining, decimals)?;
            (fitting, pricing::scale_to_normalized(fitting, decimals)?)
        };
        if accepted_amount == 0 || normalized == 0 {
            return Err(Error::CapacityExceeded);
        }

        let tokens = pricing::tokens_for_contribution(&params.price, normalized)?;

        relay::debit(env, relay_id, stable_coin, accepted_amount)?;
        token::Client::new(env, stable_coin).transfer(
            &env.current_contract_address(),
            &config.collaborators.fund,
            &accepted_amount,
        );

        let crossed_softcap = lifecycle::record_raise(params, &mut state, normalized);
        state.tokens_sold = state
            .tokens_sold
            .checked_add(tokens)
            .ok_or(Error::Overflow)?;

        if tokens > 0 {
            let project_token =
                organization::project_token(env, &config.collaborators.organization);
            token::StellarAssetClient::new(env, &project_token)
                .mint(&relay.contributor_account, &tokens);
        }
        relay::record_purchase(env, &mut relay, normalized, tokens)?;

        events::emit_contribution_processed(
            env,
            events::ContributionProcessed {
                relay_id,
                contributor: relay.contributor_account.clone(),
                stable_coin: stable_coin.clone(),
                amount: accepted_amount,
                normalized_amount: normalized,
                tokens,
                raised_amount: state.raised_amount,
            },
        );
        if crossed_softcap {
            events::emit_soft_cap_reached(env, state.raised_amount);
        }
        if let Some(next) = lifecycle::next_status(params, &state, now) {
            Self::close(env, &mut state, next);
        }
        storage::save_state(env, &state);

        Ok(ContributionReceipt {
            relay_id,
            accepted_amount,
            left_in_relay: amount - accepted_amount,
            normalized_amount: normalized,
            tokens,
            raised_amount: state.raised_amount,
            status: state.status,
        })
    }

    fn to_normalized(env: &Env, stable_coin: &Address, amount: i128) -> Result<i128, Error> {
        let config = storage::load_config(env)?;
        let decimals =
            organization::accepted_decimals(env, &config.collaborators.organization, stable_coin)?;
        pricing::scale_to_normalized(amount, decimals)
    }

    fn from_normalized(env: &Env, stable_coin: &Address, normalized: i128) -> Result<i128, Error> {
        let config = storage::load_config(env)?;
        let decimals =
            organization::accepted_decimals(env, &config.collaborators.organization, stable_coin)?;
        pricing::normalized_to_stable(normalized, decimals)
    }
}
