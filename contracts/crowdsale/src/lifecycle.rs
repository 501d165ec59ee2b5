//! Automatic lifecycle transitions.
//!
//! Deadlines are plain ledger timestamps; a deadline has passed once the
//! ledger time reaches it.

use crate::types::{SaleParams, SaleState, SaleStatus};

/// The single automatic transition due at `now`, if any.
///
/// Checked in order: hardcap reached, hardcap deadline with the soft cap met,
/// soft cap deadline without it. Pending and terminal sales never move.
pub fn next_status(params: &SaleParams, state: &SaleState, now: u64) -> Option<SaleStatus> {
    if !state.status.accepts_contributions() {
        return None;
    }

    if state.raised_amount >= params.hardcap_amount {
        return Some(SaleStatus::Finished);
    }
    if state.soft_cap_reached && now >= params.hardcap_deadline {
        return Some(SaleStatus::Finished);
    }
    if !state.soft_cap_reached && now >= params.softcap_deadline {
        return Some(SaleStatus::Failed);
    }
    None
}

/// Record newly raised funds, flipping to `SoftCapReached` on the crossing.
///
/// Returns `true` when this call crossed the soft cap.
pub fn record_raise(params: &SaleParams, state: &mut SaleState, normalized: i128) -> bool {
    state.raised_amount += normalized;
    if !state.soft_cap_reached && state.raised_amount >= params.softcap_amount {
        state.soft_cap_reached = true;
        state.status = SaleStatus::SoftCapReached;
        return true;
    }
    false
}
