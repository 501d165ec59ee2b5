#![allow(dead_code)]

extern crate std;

use crate::{SaleInfo, SaleStatus};

/// INV-1: Raised amount is never negative and never above the hardcap.
pub fn assert_raised_within_caps(info: &SaleInfo) {
    assert!(
        info.raised_amount >= 0,
        "INV-1 violated: negative raised amount ({})",
        info.raised_amount
    );
    assert!(
        info.raised_amount <= info.hardcap_amount,
        "INV-1 violated: raised {} exceeds hardcap {}",
        info.raised_amount,
        info.hardcap_amount
    );
}

/// INV-2: The soft cap flag agrees with the raised amount.
pub fn assert_softcap_flag_consistent(info: &SaleInfo) {
    if info.raised_amount >= info.softcap_amount {
        assert!(
            info.soft_cap_reached,
            "INV-2 violated: raised {} >= softcap {} but flag unset",
            info.raised_amount,
            info.softcap_amount
        );
    }
    if info.status == SaleStatus::SoftCapReached {
        assert!(info.soft_cap_reached, "INV-2 violated: status without flag");
    }
}

/// INV-3: Raised amount never decreases.
pub fn assert_raised_monotonic(before: i128, after: i128) {
    assert!(
        after >= before,
        "INV-3 violated: raised amount decreased from {} to {}",
        before,
        after
    );
}

/// INV-4: Raised amount equals the sum of all accepted normalized amounts.
pub fn assert_raised_equals_sum(info: &SaleInfo, accepted: &[i128]) {
    let sum: i128 = accepted.iter().sum();
    assert_eq!(
        info.raised_amount, sum,
        "INV-4 violated: raised {} != sum of accepted {}",
        info.raised_amount, sum
    );
}

/// INV-5: Only forward transitions are allowed:
///   Pending        -> Running
///   Running        -> SoftCapReached | Finished | Failed
///   SoftCapReached -> Finished
///   Finished / Failed -> (none)
pub fn assert_valid_status_transition(from: &SaleStatus, to: &SaleStatus) {
    if from == to {
        return;
    }
    let valid = matches!(
        (from, to),
        (SaleStatus::Pending, SaleStatus::Running)
            | (SaleStatus::Running, SaleStatus::SoftCapReached)
            | (SaleStatus::Running, SaleStatus::Finished)
            | (SaleStatus::Running, SaleStatus::Failed)
            | (SaleStatus::SoftCapReached, SaleStatus::Finished)
    );

    assert!(
        valid,
        "INV-5 violated: invalid status transition from {:?} to {:?}",
        from, to
    );
}

/// Run all stateless sale invariants.
pub fn assert_all_sale_invariants(info: &SaleInfo) {
    assert_raised_within_caps(info);
    assert_softcap_flag_consistent(info);
}
