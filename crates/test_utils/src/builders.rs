//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults, so
//! tests specify only the fields they care about.

use core_kernel::{DocumentRef, Money, PartyId};
use domain_claims::claim::{Claim, ClaimStatus, SubmitClaim};

use crate::fixtures::{IdFixtures, MoneyFixtures, StringFixtures};

/// Builder for claim submissions and pre-positioned claims
pub struct TestClaimBuilder {
    claimant_id: PartyId,
    provider_id: PartyId,
    amount: Money,
    description: String,
    diagnosis: String,
    treatment: String,
    document_ref: Option<DocumentRef>,
    status: ClaimStatus,
}

impl Default for TestClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClaimBuilder {
    /// Creates a builder with default values
    pub fn new() -> Self {
        Self {
            claimant_id: IdFixtures::claimant(),
            provider_id: IdFixtures::provider(),
            amount: MoneyFixtures::consultation(),
            description: StringFixtures::description(),
            diagnosis: StringFixtures::diagnosis().to_string(),
            treatment: StringFixtures::treatment(),
            document_ref: None,
            status: ClaimStatus::Submitted,
        }
    }

    pub fn with_claimant(mut self, id: PartyId) -> Self {
        self.claimant_id = id;
        self
    }

    pub fn with_provider(mut self, id: PartyId) -> Self {
        self.provider_id = id;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_diagnosis(mut self, diagnosis: impl Into<String>) -> Self {
        self.diagnosis = diagnosis.into();
        self
    }

    pub fn with_document(mut self) -> Self {
        self.document_ref =
            Some(DocumentRef::new(StringFixtures::document_hash()).expect("fixture hash is valid"));
        self
    }

    /// Sets the status the built claim is positioned in
    ///
    /// Only meaningful for [`TestClaimBuilder::build_claim`]; submissions
    /// always start at Submitted.
    pub fn in_status(mut self, status: ClaimStatus) -> Self {
        self.status = status;
        self
    }

    /// Builds the submission input
    pub fn submit_input(&self) -> SubmitClaim {
        SubmitClaim {
            claimant_id: self.claimant_id,
            provider_id: self.provider_id,
            amount: self.amount,
            description: self.description.clone(),
            diagnosis: self.diagnosis.clone(),
            treatment: self.treatment.clone(),
            document_ref: self.document_ref.clone(),
        }
    }

    /// Builds a claim positioned at the configured status, bypassing the
    /// lifecycle (for store seeding)
    pub fn build_claim(&self) -> Claim {
        let mut claim = Claim::submitted(self.submit_input())
            .expect("builder defaults always pass validation");
        claim.status = self.status;
        if self.status == ClaimStatus::Rejected {
            claim.rejection_reason = Some("Seeded rejection".to_string());
        }
        claim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_submission_is_valid() {
        let input = TestClaimBuilder::new().submit_input();
        assert!(Claim::submitted(input).is_ok());
    }

    #[test]
    fn test_positioned_claim_carries_status() {
        let claim = TestClaimBuilder::new()
            .in_status(ClaimStatus::Verified)
            .build_claim();
        assert_eq!(claim.status, ClaimStatus::Verified);
    }

    #[test]
    fn test_seeded_rejection_stays_consistent() {
        let claim = TestClaimBuilder::new()
            .in_status(ClaimStatus::Rejected)
            .build_claim();
        assert!(claim.rejection_reason_consistent());
    }
}
