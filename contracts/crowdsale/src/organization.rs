//! Client interface for the Organization registry.
//!
//! The registry is an external contract; the sale only needs to know which
//! stablecoins it accepts and which token it sells.

use soroban_sdk::{contractclient, token, Address, Env};

use crate::Error;

#[contractclient(name = "OrganizationClient")]
pub trait OrganizationInterface {
    /// `true` if `stable_coin` may be contributed.
    fn is_accepted_stable_coin(env: Env, stable_coin: Address) -> bool;

    /// Address of the project token sold by the organization.
    fn token_address(env: Env) -> Address;
}

/// Fail with `UnsupportedStableCoin` unless the registry accepts the coin.
pub fn require_accepted(env: &Env, organization: &Address, stable_coin: &Address) -> Result<(), Error> {
    if OrganizationClient::new(env, organization).is_accepted_stable_coin(stable_coin) {
        Ok(())
    } else {
        Err(Error::UnsupportedStableCoin)
    }
}

/// Decimals reported by an accepted stablecoin.
pub fn accepted_decimals(
    env: &Env,
    organization: &Address,
    stable_coin: &Address,
) -> Result<u32, Error> {
    require_accepted(env, organization, stable_coin)?;
    Ok(token::Client::new(env, stable_coin).decimals())
}

pub fn project_token(env: &Env, organization: &Address) -> Address {
    OrganizationClient::new(env, organization).token_address()
}
