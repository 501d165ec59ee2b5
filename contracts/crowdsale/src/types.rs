//! # Types
//!
//! Shared data structures used across all modules of the crowdsale contract.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A sale is internally stored as two separate instance entries:
//!
//! - [`SaleConfig`]: written once by `init`; never mutated.
//! - [`SaleState`]: written on every lifecycle transition and contribution.
//!
//! The public API exposes the reconstructed [`SaleInfo`] struct for convenience.
//!
//! ### Status as a Finite-State Machine
//!
//! [`SaleStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Pending ──► Running ──► SoftCapReached ──► Finished
//!                │                              ▲
//!                ├──────────────────────────────┘
//!                └──► Failed
//! ```
//!
//! `Finished` and `Failed` are terminal.

use soroban_sdk::{contracttype, Address, Vec};

/// Lifecycle status of the sale.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaleStatus {
    /// Configured, waiting for the administrator to start it.
    Pending,
    /// Accepting contributions; soft cap not reached yet.
    Running,
    /// Accepting contributions; soft cap reached.
    SoftCapReached,
    /// Closed successfully.
    Finished,
    /// Soft cap missed before its deadline; relays are refundable.
    Failed,
}

impl SaleStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Finished | SaleStatus::Failed)
    }

    pub fn accepts_contributions(&self) -> bool {
        matches!(self, SaleStatus::Running | SaleStatus::SoftCapReached)
    }
}

/// Contracts and accounts the sale talks to. Fixed at `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Collaborators {
    /// Registry of accepted stablecoins and the sold token.
    pub organization: Address,
    /// Stored for downstream spending logic; never called by the sale.
    pub governance: Address,
    /// Rate-limited refund tap; stored only.
    pub refund_tap: Address,
    /// Receives every accepted stablecoin amount.
    pub fund: Address,
    /// Front-end operator allowed to process contributions.
    pub web_platform: Address,
}

/// Volume bonus applied to contributions of at least `min_contribution`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BonusTier {
    /// Normalized amount from which the tier applies.
    pub min_contribution: i128,
    /// Extra tokens in basis points of the base allocation.
    pub bonus_bps: u32,
}

/// Price schedule for converting normalized contributions into tokens.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceSchedule {
    /// Project-token base units granted per whole normalized unit (10^18).
    pub tokens_per_unit: i128,
    /// Ascending by `min_contribution`; empty means a flat rate.
    pub bonus_tiers: Vec<BonusTier>,
}

/// Static sale parameters supplied to `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleParams {
    pub softcap_amount: i128,
    pub hardcap_amount: i128,
    pub softcap_deadline: u64,
    pub hardcap_deadline: u64,
    pub min_contribution: i128,
    pub price: PriceSchedule,
}

/// Immutable sale configuration, written once by `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleConfig {
    pub admin: Address,
    pub collaborators: Collaborators,
    pub params: SaleParams,
}

/// Mutable aggregate state, updated on transitions and contributions.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleState {
    pub status: SaleStatus,
    pub raised_amount: i128,
    pub soft_cap_reached: bool,
    /// Ledger timestamp of `start`; zero while pending.
    pub started_at: u64,
    pub tokens_sold: i128,
    pub relay_count: u32,
}

/// Full view of the sale returned by `sale_info`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleInfo {
    pub status: SaleStatus,
    pub raised_amount: i128,
    pub soft_cap_reached: bool,
    pub started_at: u64,
    pub tokens_sold: i128,
    pub relay_count: u32,
    pub softcap_amount: i128,
    pub hardcap_amount: i128,
    pub softcap_deadline: u64,
    pub hardcap_deadline: u64,
    pub min_contribution: i128,
}

/// Per-contributor escrow record.
///
/// The escrowed tokens are held by the sale contract itself; each relay only
/// owns its `RelayBalance` entries, so one relay can never spend another's
/// funds.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributorRelay {
    pub id: u32,
    /// Sole address allowed to withdraw from this relay.
    pub contributor_account: Address,
    /// The owning sale contract.
    pub crowd_sale: Address,
    /// Normalized amount accepted from this relay so far.
    pub contributed: i128,
    /// Project-token units minted to the contributor so far.
    pub tokens_purchased: i128,
}

/// Outcome of a successful `process_contribution`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributionReceipt {
    pub relay_id: u32,
    /// Stablecoin units moved to the fund.
    pub accepted_amount: i128,
    /// Stablecoin units left in the relay because of the hardcap.
    pub left_in_relay: i128,
    pub normalized_amount: i128,
    pub tokens: i128,
    pub raised_amount: i128,
    pub status: SaleStatus,
}
