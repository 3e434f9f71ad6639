//! Tests for the claim aggregate and its status machine

use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, PartyId};
use domain_claims::claim::{Claim, ClaimAction, ClaimStatus, SubmitClaim};
use domain_claims::ClaimError;

fn submit_input() -> SubmitClaim {
    SubmitClaim {
        claimant_id: PartyId::new_v7(),
        provider_id: PartyId::new_v7(),
        amount: Money::new(dec!(1500), Currency::USD),
        description: "Outpatient visit".to_string(),
        diagnosis: "Flu".to_string(),
        treatment: "Oseltamivir".to_string(),
        document_ref: None,
    }
}

const ALL_STATUSES: [ClaimStatus; 6] = [
    ClaimStatus::Submitted,
    ClaimStatus::UnderReview,
    ClaimStatus::Verified,
    ClaimStatus::Approved,
    ClaimStatus::Rejected,
    ClaimStatus::Paid,
];

/// Position of a status along the lifecycle's partial order
fn rank(status: ClaimStatus) -> u8 {
    match status {
        ClaimStatus::Submitted => 0,
        ClaimStatus::UnderReview => 1,
        ClaimStatus::Verified => 2,
        ClaimStatus::Approved | ClaimStatus::Rejected => 3,
        ClaimStatus::Paid => 4,
    }
}

#[test]
fn every_allowed_transition_moves_forward() {
    for from in ALL_STATUSES {
        for to in ALL_STATUSES {
            if from.can_transition_to(to) {
                assert!(
                    rank(to) > rank(from),
                    "{} -> {} goes backward",
                    from,
                    to
                );
            }
        }
    }
}

#[test]
fn paid_is_only_reachable_from_approved() {
    for from in ALL_STATUSES {
        let allowed = from.can_transition_to(ClaimStatus::Paid);
        assert_eq!(allowed, from == ClaimStatus::Approved);
    }
}

#[test]
fn terminal_statuses_have_no_exits() {
    for from in [ClaimStatus::Rejected, ClaimStatus::Paid] {
        assert!(from.is_terminal());
        for to in ALL_STATUSES {
            assert!(!from.can_transition_to(to));
        }
    }
}

#[test]
fn actions_target_their_documented_statuses() {
    assert_eq!(ClaimAction::Verify.target_status(), ClaimStatus::Verified);
    assert_eq!(ClaimAction::Dispute.target_status(), ClaimStatus::UnderReview);
    assert_eq!(ClaimAction::Approve.target_status(), ClaimStatus::Approved);
    assert_eq!(ClaimAction::Reject.target_status(), ClaimStatus::Rejected);
    assert_eq!(ClaimAction::Pay.target_status(), ClaimStatus::Paid);
}

#[test]
fn serde_statuses_are_snake_case() {
    let json = serde_json::to_string(&ClaimStatus::UnderReview).unwrap();
    assert_eq!(json, "\"under_review\"");

    let back: ClaimStatus = serde_json::from_str("\"paid\"").unwrap();
    assert_eq!(back, ClaimStatus::Paid);
}

#[test]
fn claim_serializes_round_trip() {
    let claim = Claim::submitted(submit_input()).unwrap();
    let json = serde_json::to_string(&claim).unwrap();
    let back: Claim = serde_json::from_str(&json).unwrap();

    assert_eq!(back.id, claim.id);
    assert_eq!(back.status, claim.status);
    assert_eq!(back.amount, claim.amount);
    assert_eq!(back.version, claim.version);
}

proptest! {
    #[test]
    fn random_walks_respect_the_partial_order(
        steps in proptest::collection::vec(0usize..6, 1..12)
    ) {
        let mut claim = Claim::submitted(submit_input()).unwrap();
        let mut visited = vec![claim.status];

        for step in steps {
            let target = ALL_STATUSES[step];
            match claim.apply_status(target) {
                Ok(()) => visited.push(target),
                Err(ClaimError::InvalidStateTransition { .. }) => {}
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
        }

        // Ranks never decrease along the walk, and Paid is always
        // immediately preceded by Approved.
        for pair in visited.windows(2) {
            prop_assert!(rank(pair[1]) > rank(pair[0]));
            if pair[1] == ClaimStatus::Paid {
                prop_assert_eq!(pair[0], ClaimStatus::Approved);
            }
        }
    }

    #[test]
    fn positive_amounts_are_accepted(minor in 1i64..100_000_000i64) {
        let mut input = submit_input();
        input.amount = Money::from_minor(minor, Currency::USD);
        prop_assert!(Claim::submitted(input).is_ok());
    }

    #[test]
    fn blank_text_fields_are_rejected(
        field in 0usize..3,
        pad in prop_oneof![
            Just(String::new()),
            Just("   ".to_string()),
            Just("\t".to_string()),
        ]
    ) {
        let mut input = submit_input();
        match field {
            0 => input.description = pad,
            1 => input.diagnosis = pad,
            _ => input.treatment = pad,
        }
        prop_assert!(matches!(
            Claim::submitted(input),
            Err(ClaimError::Validation(_))
        ));
    }
}
