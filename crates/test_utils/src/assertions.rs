//! Custom assertion helpers for domain types

use domain_claims::audit::AuditRecord;
use domain_claims::claim::{Claim, ClaimAction, ClaimStatus};

/// Asserts the rejection-reason invariant: non-empty exactly when rejected
pub fn assert_rejection_consistent(claim: &Claim) {
    assert!(
        claim.rejection_reason_consistent(),
        "claim {} violates the rejection-reason invariant: status={}, reason={:?}",
        claim.id,
        claim.status,
        claim.rejection_reason
    );
}

/// Asserts an audit trail records exactly the given actions, in order
pub fn assert_audit_actions(trail: &[AuditRecord], expected: &[ClaimAction]) {
    let actual: Vec<_> = trail.iter().map(|r| r.action).collect();
    assert_eq!(
        actual, expected,
        "audit trail {:?} does not match expected {:?}",
        actual, expected
    );
}

/// Asserts every ledger-backed action in a trail carries a transaction ref
pub fn assert_ledger_backed_actions_have_refs(trail: &[AuditRecord]) {
    for record in trail {
        let ledger_backed = matches!(
            record.action,
            ClaimAction::Submit | ClaimAction::Verify | ClaimAction::Approve | ClaimAction::Reject
        );
        if ledger_backed {
            assert!(
                record.ledger_tx_ref.is_some(),
                "{} record for claim {} has no ledger tx ref",
                record.action,
                record.claim_id
            );
        }
    }
}

/// Asserts a claim has moved to the expected status
pub fn assert_status(claim: &Claim, expected: ClaimStatus) {
    assert_eq!(
        claim.status, expected,
        "claim {} is {}, expected {}",
        claim.id, claim.status, expected
    );
}
