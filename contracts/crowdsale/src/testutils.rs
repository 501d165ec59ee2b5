#![allow(dead_code)]

extern crate std;

use soroban_sdk::{
    contract, contractimpl, contracttype,
    testutils::{Address as _, Ledger},
    token, Address, Env, Vec,
};

use crate::pricing::NORMALIZED_UNIT;
use crate::{Collaborators, CrowdSale, CrowdSaleClient, PriceSchedule, SaleParams};

// ── Mock Organization ────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
enum OrgKey {
    Token,
    Accepted(Address),
}

/// Minimal registry: a project token plus a set of accepted stablecoins.
#[contract]
pub struct MockOrganization;

#[contractimpl]
impl MockOrganization {
    pub fn set_token(env: Env, token: Address) {
        env.storage().instance().set(&OrgKey::Token, &token);
    }

    pub fn add_stable_coin(env: Env, stable_coin: Address) {
        env.storage()
            .instance()
            .set(&OrgKey::Accepted(stable_coin), &true);
    }

    pub fn is_accepted_stable_coin(env: Env, stable_coin: Address) -> bool {
        env.storage()
            .instance()
            .get(&OrgKey::Accepted(stable_coin))
            .unwrap_or(false)
    }

    pub fn token_address(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&OrgKey::Token)
            .expect("token not set")
    }
}

// ── Mock StableCoin ──────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
enum CoinKey {
    Decimals,
    Frozen,
    Balance(Address),
}

/// Token with configurable decimals; transfers can be frozen to simulate a
/// failing collaborator.
#[contract]
pub struct MockStableCoin;

#[contractimpl]
impl MockStableCoin {
    pub fn set_decimals(env: Env, decimals: u32) {
        env.storage().instance().set(&CoinKey::Decimals, &decimals);
    }

    pub fn set_frozen(env: Env, frozen: bool) {
        env.storage().instance().set(&CoinKey::Frozen, &frozen);
    }

    pub fn mint(env: Env, to: Address, amount: i128) {
        let balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .persistent()
            .set(&CoinKey::Balance(to), &(balance + amount));
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&CoinKey::Balance(id))
            .unwrap_or(0)
    }

    pub fn decimals(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&CoinKey::Decimals)
            .unwrap_or(18)
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        let frozen: bool = env
            .storage()
            .instance()
            .get(&CoinKey::Frozen)
            .unwrap_or(false);
        if frozen {
            panic!("transfers frozen");
        }

        let from_balance = Self::balance(env.clone(), from.clone());
        if from_balance < amount {
            panic!("insufficient balance");
        }
        env.storage()
            .persistent()
            .set(&CoinKey::Balance(from), &(from_balance - amount));
        let to_balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .persistent()
            .set(&CoinKey::Balance(to), &(to_balance + amount));
    }
}

// ── Sale fixture ─────────────────────────────────────────────────────

pub const START_TIME: u64 = 10_000;
pub const SOFTCAP_DEADLINE: u64 = START_TIME + 1_000;
pub const HARDCAP_DEADLINE: u64 = START_TIME + 2_000;

/// One project token (7 decimals) per normalized unit.
pub const TOKENS_PER_UNIT: i128 = 10_000_000;

/// `n` whole normalized units.
pub fn units(n: i128) -> i128 {
    n * NORMALIZED_UNIT
}

pub fn default_params(env: &Env) -> SaleParams {
    SaleParams {
        softcap_amount: units(100),
        hardcap_amount: units(1_000),
        softcap_deadline: SOFTCAP_DEADLINE,
        hardcap_deadline: HARDCAP_DEADLINE,
        min_contribution: units(1),
        price: PriceSchedule {
            tokens_per_unit: TOKENS_PER_UNIT,
            bonus_tiers: Vec::new(env),
        },
    }
}

pub struct Fixture {
    pub env: Env,
    pub client: CrowdSaleClient<'static>,
    pub admin: Address,
    pub web_platform: Address,
    pub fund: Address,
    pub collaborators: Collaborators,
    pub organization: MockOrganizationClient<'static>,
    pub project_token: token::Client<'static>,
}

impl Fixture {
    /// Deployed but not initialised.
    pub fn deployed() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        set_time(&env, START_TIME);

        let contract_id = env.register(CrowdSale, ());
        let client = CrowdSaleClient::new(&env, &contract_id);

        let admin = Address::generate(&env);
        let web_platform = Address::generate(&env);
        let fund = Address::generate(&env);

        let token_admin = Address::generate(&env);
        let sac = env.register_stellar_asset_contract_v2(token_admin);
        let project_token = token::Client::new(&env, &sac.address());
        token::StellarAssetClient::new(&env, &sac.address()).set_admin(&contract_id);

        let org_id = env.register(MockOrganization, ());
        let organization = MockOrganizationClient::new(&env, &org_id);
        organization.set_token(&sac.address());

        let collaborators = Collaborators {
            organization: org_id,
            governance: Address::generate(&env),
            refund_tap: Address::generate(&env),
            fund: fund.clone(),
            web_platform: web_platform.clone(),
        };

        Fixture {
            env,
            client,
            admin,
            web_platform,
            fund,
            collaborators,
            organization,
            project_token,
        }
    }

    /// Initialised with [`default_params`], still pending.
    pub fn pending() -> Self {
        let f = Self::deployed();
        f.client
            .init(&f.admin, &f.collaborators, &default_params(&f.env));
        f
    }

    /// Initialised and started.
    pub fn running() -> Self {
        let f = Self::pending();
        f.client.start(&f.admin);
        f
    }

    /// Register an accepted stablecoin with `decimals`.
    pub fn stable_coin(&self, decimals: u32) -> MockStableCoinClient<'static> {
        let coin = self.unlisted_stable_coin(decimals);
        self.organization.add_stable_coin(&coin.address);
        coin
    }

    pub fn unlisted_stable_coin(&self, decimals: u32) -> MockStableCoinClient<'static> {
        let id = self.env.register(MockStableCoin, ());
        let coin = MockStableCoinClient::new(&self.env, &id);
        coin.set_decimals(&decimals);
        coin
    }

    /// New contributor holding `amount` of `coin`, with that amount already
    /// deposited into a fresh relay. Returns `(contributor, relay_id)`.
    pub fn funded_relay(&self, coin: &MockStableCoinClient, amount: i128) -> (Address, u32) {
        let contributor = Address::generate(&self.env);
        coin.mint(&contributor, &amount);
        let relay = self.client.new_contributor_relay(&contributor);
        self.client
            .deposit_to_relay(&relay.id, &coin.address, &amount);
        (contributor, relay.id)
    }
}

pub fn set_time(env: &Env, timestamp: u64) {
    env.ledger().with_mut(|li| li.timestamp = timestamp);
}
