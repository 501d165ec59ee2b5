//! Event kinds published by the CrowdSale contract and their stored form.
//!
//! Topic symbols match `contracts/crowdsale/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the CrowdSale contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Admin started the sale (`started`).
    SaleStarted,
    /// A contributor relay was opened (`relay_new`).
    RelayCreated,
    /// Stablecoin was deposited into a relay (`relay_dep`).
    RelayFunded,
    /// Relay funds were forwarded to the fund and tokens minted (`contrib`).
    ContributionProcessed,
    /// The raised amount crossed the soft cap (`softcap`).
    SoftCapReached,
    /// The sale closed successfully (`finished`).
    SaleFinished,
    /// The soft cap deadline passed without reaching the soft cap (`failed`).
    SaleFailed,
    /// Relay funds were returned to the contributor (`refund`).
    ContributorRefunded,
    /// An event from this contract that we don't recognise.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "started" => Self::SaleStarted,
            "relay_new" => Self::RelayCreated,
            "relay_dep" => Self::RelayFunded,
            "contrib" => Self::ContributionProcessed,
            "softcap" => Self::SoftCapReached,
            "finished" => Self::SaleFinished,
            "failed" => Self::SaleFailed,
            "refund" => Self::ContributorRefunded,
            _ => Self::Unknown,
        }
    }

    /// Identifier stored in the `event_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaleStarted => "sale_started",
            Self::RelayCreated => "relay_created",
            Self::RelayFunded => "relay_funded",
            Self::ContributionProcessed => "contribution_processed",
            Self::SoftCapReached => "softcap_reached",
            Self::SaleFinished => "sale_finished",
            Self::SaleFailed => "sale_failed",
            Self::ContributorRefunded => "contributor_refunded",
            Self::Unknown => "unknown",
        }
    }

    /// Sale status implied by this event, if it changes the lifecycle.
    pub fn implied_status(&self) -> Option<&'static str> {
        match self {
            Self::SaleStarted => Some("running"),
            Self::SoftCapReached => Some("soft_cap_reached"),
            Self::SaleFinished => Some("finished"),
            Self::SaleFailed => Some("failed"),
            _ => None,
        }
    }
}

/// A decoded sale event, ready to be stored.
///
/// Amounts are kept as decimal strings since contract values are `i128`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleEvent {
    pub event_type: String,
    pub relay_id: Option<String>,
    pub actor: Option<String>,
    pub stable_coin: Option<String>,
    pub amount: Option<String>,
    pub raised_amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// An event row as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub relay_id: Option<String>,
    pub actor: Option<String>,
    pub stable_coin: Option<String>,
    pub amount: Option<String>,
    pub raised_amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Sale summary rebuilt from indexed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSummary {
    pub status: String,
    pub raised_amount: String,
    pub soft_cap_reached: bool,
    pub relays: i64,
    pub contributions: i64,
    pub last_ledger: Option<i64>,
}
