//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{ClaimId, DocumentRef, Money, PartyId, TxRef};
use crate::error::ClaimError;

/// Claim status
///
/// Statuses form a fixed partial order; transitions only ever move forward
/// along it. See [`ClaimStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Received and recorded on the ledger
    Submitted,
    /// Disputed by the claimant, awaiting re-verification
    UnderReview,
    /// Verified against the ledger
    Verified,
    /// Approved for payment
    Approved,
    /// Rejected with a stated reason
    Rejected,
    /// Paid out and closed
    Paid,
}

impl ClaimStatus {
    /// Checks whether a direct transition to `target` is allowed
    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, target),
            (Submitted, UnderReview)
                | (Submitted, Verified)
                | (Submitted, Rejected)
                | (UnderReview, Verified)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (Verified, Approved)
                | (Verified, Rejected)
                | (Approved, Paid)
        )
    }

    /// Returns true if no further transition can leave this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Rejected | ClaimStatus::Paid)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClaimStatus::Submitted => "submitted",
            ClaimStatus::UnderReview => "under_review",
            ClaimStatus::Verified => "verified",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Paid => "paid",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimAction {
    Submit,
    Verify,
    Dispute,
    Approve,
    Reject,
    Pay,
}

impl ClaimAction {
    /// The status a claim ends up in when this action succeeds
    pub fn target_status(&self) -> ClaimStatus {
        match self {
            ClaimAction::Submit => ClaimStatus::Submitted,
            ClaimAction::Verify => ClaimStatus::Verified,
            ClaimAction::Dispute => ClaimStatus::UnderReview,
            ClaimAction::Approve => ClaimStatus::Approved,
            ClaimAction::Reject => ClaimStatus::Rejected,
            ClaimAction::Pay => ClaimStatus::Paid,
        }
    }

    /// Checks whether `role` may perform this action
    pub fn permitted_for(&self, role: ActorRole) -> bool {
        if role == ActorRole::Admin {
            return true;
        }
        match self {
            ClaimAction::Submit | ClaimAction::Dispute => role == ActorRole::Member,
            ClaimAction::Verify | ClaimAction::Approve | ClaimAction::Reject => {
                role == ActorRole::Approver
            }
            ClaimAction::Pay => false,
        }
    }
}

impl fmt::Display for ClaimAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClaimAction::Submit => "submit",
            ClaimAction::Verify => "verify",
            ClaimAction::Dispute => "dispute",
            ClaimAction::Approve => "approve",
            ClaimAction::Reject => "reject",
            ClaimAction::Pay => "pay",
        };
        write!(f, "{}", s)
    }
}

/// Roles recognized by the lifecycle authorization gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Approver,
    Auditor,
    Member,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActorRole::Admin => "admin",
            ActorRole::Approver => "approver",
            ActorRole::Auditor => "auditor",
            ActorRole::Member => "member",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ActorRole {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(ActorRole::Admin),
            "approver" => Ok(ActorRole::Approver),
            "auditor" => Ok(ActorRole::Auditor),
            "member" => Ok(ActorRole::Member),
            other => Err(ClaimError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

/// The identity performing a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Stable identifier of the caller (user id or service account)
    pub id: String,
    /// Role granted by the authentication layer
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self { id: id.into(), role }
    }
}

/// Input for submitting a new claim
#[derive(Debug, Clone)]
pub struct SubmitClaim {
    pub claimant_id: PartyId,
    pub provider_id: PartyId,
    pub amount: Money,
    pub description: String,
    pub diagnosis: String,
    pub treatment: String,
    pub document_ref: Option<DocumentRef>,
}

/// A reimbursement claim tied to a patient/provider encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Claimant (patient)
    pub claimant_id: PartyId,
    /// Submitting provider (doctor)
    pub provider_id: PartyId,
    /// Claimed amount, strictly positive
    pub amount: Money,
    /// Free-text description of the encounter
    pub description: String,
    /// Diagnosis
    pub diagnosis: String,
    /// Treatment
    pub treatment: String,
    /// Current status
    pub status: ClaimStatus,
    /// Reason, non-empty exactly when status is Rejected
    pub rejection_reason: Option<String>,
    /// Message recorded when the claimant disputes
    pub dispute_message: Option<String>,
    /// Content-addressed pointer to the supporting document
    pub document_ref: Option<DocumentRef>,
    /// Reference of the most recent confirmed ledger transaction
    pub ledger_tx_ref: Option<TxRef>,
    /// Optimistic-concurrency token, incremented on every store update
    pub version: u64,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a new claim in Submitted status
    ///
    /// Rejects non-positive amounts and empty required text fields before any
    /// external call is made.
    pub fn submitted(input: SubmitClaim) -> Result<Self, ClaimError> {
        if !input.amount.is_positive() {
            return Err(ClaimError::Validation(
                "Claim amount must be strictly positive".to_string(),
            ));
        }
        for (field, value) in [
            ("description", &input.description),
            ("diagnosis", &input.diagnosis),
            ("treatment", &input.treatment),
        ] {
            if value.trim().is_empty() {
                return Err(ClaimError::Validation(format!(
                    "Claim {} must not be empty",
                    field
                )));
            }
        }

        let now = Utc::now();
        Ok(Self {
            id: ClaimId::new_v7(),
            claimant_id: input.claimant_id,
            provider_id: input.provider_id,
            amount: input.amount,
            description: input.description,
            diagnosis: input.diagnosis,
            treatment: input.treatment,
            status: ClaimStatus::Submitted,
            rejection_reason: None,
            dispute_message: None,
            document_ref: input.document_ref,
            ledger_tx_ref: None,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a status change, enforcing the transition matrix
    pub fn apply_status(&mut self, target: ClaimStatus) -> Result<(), ClaimError> {
        if !self.status.can_transition_to(target) {
            return Err(ClaimError::InvalidStateTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    /// Records the confirmed ledger transaction backing the latest change
    pub fn record_ledger_tx(&mut self, tx_ref: TxRef) {
        self.ledger_tx_ref = Some(tx_ref);
    }

    /// Bumps version and updated-at; called on every committed mutation
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Invariant check: rejection reason present exactly when rejected
    pub fn rejection_reason_consistent(&self) -> bool {
        match self.status {
            ClaimStatus::Rejected => self
                .rejection_reason
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty()),
            _ => self.rejection_reason.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

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

    #[test]
    fn test_submitted_claim_defaults() {
        let claim = Claim::submitted(submit_input()).unwrap();

        assert_eq!(claim.status, ClaimStatus::Submitted);
        assert_eq!(claim.version, 1);
        assert!(claim.ledger_tx_ref.is_none());
        assert!(claim.rejection_reason.is_none());
        assert!(claim.rejection_reason_consistent());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut input = submit_input();
        input.amount = Money::zero(Currency::USD);
        assert!(matches!(
            Claim::submitted(input),
            Err(ClaimError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_diagnosis_rejected() {
        let mut input = submit_input();
        input.diagnosis = "   ".to_string();
        assert!(matches!(
            Claim::submitted(input),
            Err(ClaimError::Validation(_))
        ));
    }

    #[test]
    fn test_transition_matrix() {
        use ClaimStatus::*;

        assert!(Submitted.can_transition_to(Verified));
        assert!(Submitted.can_transition_to(UnderReview));
        assert!(Submitted.can_transition_to(Rejected));
        assert!(UnderReview.can_transition_to(Verified));
        assert!(Verified.can_transition_to(Approved));
        assert!(Verified.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Paid));

        // No backward or skipping edges
        assert!(!Submitted.can_transition_to(Approved));
        assert!(!Submitted.can_transition_to(Paid));
        assert!(!Verified.can_transition_to(Submitted));
        assert!(!Verified.can_transition_to(Paid));
        assert!(!Approved.can_transition_to(Verified));
        assert!(!Rejected.can_transition_to(Verified));
        assert!(!Paid.can_transition_to(Approved));
    }

    #[test]
    fn test_apply_status_invalid() {
        let mut claim = Claim::submitted(submit_input()).unwrap();
        let result = claim.apply_status(ClaimStatus::Paid);
        assert!(matches!(
            result,
            Err(ClaimError::InvalidStateTransition { .. })
        ));
        assert_eq!(claim.status, ClaimStatus::Submitted);
    }

    #[test]
    fn test_apply_status_bumps_version() {
        let mut claim = Claim::submitted(submit_input()).unwrap();
        claim.apply_status(ClaimStatus::Verified).unwrap();
        assert_eq!(claim.status, ClaimStatus::Verified);
        assert_eq!(claim.version, 2);
    }

    #[test]
    fn test_role_gates() {
        assert!(ClaimAction::Approve.permitted_for(ActorRole::Approver));
        assert!(ClaimAction::Approve.permitted_for(ActorRole::Admin));
        assert!(!ClaimAction::Approve.permitted_for(ActorRole::Member));
        assert!(!ClaimAction::Approve.permitted_for(ActorRole::Auditor));

        assert!(ClaimAction::Submit.permitted_for(ActorRole::Member));
        assert!(!ClaimAction::Submit.permitted_for(ActorRole::Approver));

        assert!(ClaimAction::Pay.permitted_for(ActorRole::Admin));
        assert!(!ClaimAction::Pay.permitted_for(ActorRole::Approver));
    }
}
