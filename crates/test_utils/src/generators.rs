//! Property-based test data generators

use proptest::prelude::*;

use core_kernel::{Currency, Money};
use domain_claims::claim::{ClaimStatus, SubmitClaim};

use crate::builders::TestClaimBuilder;
use crate::fixtures::DIAGNOSES;

/// Strategy for strictly positive USD amounts
pub fn arb_positive_money() -> impl Strategy<Value = Money> {
    (1i64..100_000_000i64).prop_map(|minor| Money::from_minor(minor, Currency::USD))
}

/// Strategy over the known diagnoses
pub fn arb_diagnosis() -> impl Strategy<Value = String> {
    (0..DIAGNOSES.len()).prop_map(|i| DIAGNOSES[i].to_string())
}

/// Strategy over every claim status
pub fn arb_status() -> impl Strategy<Value = ClaimStatus> {
    prop_oneof![
        Just(ClaimStatus::Submitted),
        Just(ClaimStatus::UnderReview),
        Just(ClaimStatus::Verified),
        Just(ClaimStatus::Approved),
        Just(ClaimStatus::Rejected),
        Just(ClaimStatus::Paid),
    ]
}

/// Strategy for valid claim submissions
pub fn arb_submission() -> impl Strategy<Value = SubmitClaim> {
    (arb_positive_money(), arb_diagnosis()).prop_map(|(amount, diagnosis)| {
        TestClaimBuilder::new()
            .with_amount(amount)
            .with_diagnosis(diagnosis)
            .submit_input()
    })
}
