//! # Conversion and pricing
//!
//! Stablecoins arrive with their own decimal precision (6 for USDC-like
//! coins, 7 for Stellar assets, 18 for bridged ERC20s). Every amount is
//! rescaled to [`NORMALIZED_DECIMALS`] before it is compared against caps or
//! priced. All arithmetic is integer-only and checked.

use crate::types::PriceSchedule;
use crate::Error;

/// Precision of the sale's accounting unit.
pub const NORMALIZED_DECIMALS: u32 = 18;

/// One whole normalized unit.
pub const NORMALIZED_UNIT: i128 = 1_000_000_000_000_000_000;

pub const MAX_BONUS_BPS: u32 = 10_000;

const BPS_DENOMINATOR: i128 = 10_000;

fn pow10(exp: u32) -> Result<i128, Error> {
    10i128.checked_pow(exp).ok_or(Error::Overflow)
}

/// Rescale `amount` expressed with `decimals` into normalized units.
///
/// Coins with more than 18 decimals are truncated toward zero.
pub fn scale_to_normalized(amount: i128, decimals: u32) -> Result<i128, Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    if decimals <= NORMALIZED_DECIMALS {
        amount
            .checked_mul(pow10(NORMALIZED_DECIMALS - decimals)?)
            .ok_or(Error::Overflow)
    } else {
        // A divisor beyond i128 range truncates everything.
        Ok(match 10i128.checked_pow(decimals - NORMALIZED_DECIMALS) {
            Some(divisor) => amount / divisor,
            None => 0,
        })
    }
}

/// Largest coin amount (in `decimals` base units) whose normalized value does
/// not exceed `normalized`.
pub fn normalized_to_stable(normalized: i128, decimals: u32) -> Result<i128, Error> {
    if normalized < 0 {
        return Err(Error::InvalidAmount);
    }
    if decimals <= NORMALIZED_DECIMALS {
        Ok(normalized / pow10(NORMALIZED_DECIMALS - decimals)?)
    } else {
        normalized
            .checked_mul(pow10(decimals - NORMALIZED_DECIMALS)?)
            .ok_or(Error::Overflow)
    }
}

/// Check that a schedule yields a monotonic allocation.
pub fn validate_schedule(schedule: &PriceSchedule) -> Result<(), Error> {
    if schedule.tokens_per_unit <= 0 {
        return Err(Error::InvalidConfig);
    }

    let mut previous: Option<(i128, u32)> = None;
    for tier in schedule.bonus_tiers.iter() {
        if tier.min_contribution <= 0 || tier.bonus_bps > MAX_BONUS_BPS {
            return Err(Error::InvalidConfig);
        }
        if let Some((prev_min, prev_bps)) = previous {
            if tier.min_contribution <= prev_min || tier.bonus_bps < prev_bps {
                return Err(Error::InvalidConfig);
            }
        }
        previous = Some((tier.min_contribution, tier.bonus_bps));
    }
    Ok(())
}

/// Project-token units purchased by a normalized contribution.
pub fn tokens_for_contribution(schedule: &PriceSchedule, normalized: i128) -> Result<i128, Error> {
    if normalized < 0 {
        return Err(Error::InvalidAmount);
    }

    let base = normalized
        .checked_mul(schedule.tokens_per_unit)
        .ok_or(Error::Overflow)?
        / NORMALIZED_UNIT;

    // Tiers are ascending, so the last matching one is the highest.
    let bonus_bps = schedule
        .bonus_tiers
        .iter()
        .filter(|tier| tier.min_contribution <= normalized)
        .map(|tier| tier.bonus_bps)
        .last()
        .unwrap_or(0);

    let bonus = base
        .checked_mul(bonus_bps as i128)
        .ok_or(Error::Overflow)?
        / BPS_DENOMINATOR;

    base.checked_add(bonus).ok_or(Error::Overflow)
}
