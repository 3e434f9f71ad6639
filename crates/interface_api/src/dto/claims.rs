//! Claims DTOs
//!
//! One validated request struct per lifecycle operation. Unknown fields are
//! rejected at the boundary rather than ignored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use domain_claims::claim::{Claim, ClaimStatus};
use domain_claims::lifecycle::ReconciliationReport;
use domain_claims::audit::AuditRecord;
use domain_claims::LedgerClaimState;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SubmitClaimRequest {
    pub claimant_id: Uuid,
    pub provider_id: Uuid,
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    /// ISO 4217 code; defaults to USD
    pub currency: Option<String>,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub diagnosis: String,
    #[validate(length(min = 1))]
    pub treatment: String,
    /// Content hash of the supporting document
    pub document_ref: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApproveClaimRequest {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RejectClaimRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DisputeClaimRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

/// Query string for claim listings
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ListClaimsQuery {
    pub status: Option<ClaimStatus>,
    pub claimant_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    /// "newest" (default) or "oldest"
    pub order: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("amount_must_be_positive"))
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: Uuid,
    pub claimant_id: Uuid,
    pub provider_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub diagnosis: String,
    pub treatment: String,
    pub status: ClaimStatus,
    pub rejection_reason: Option<String>,
    pub dispute_message: Option<String>,
    pub document_ref: Option<String>,
    pub ledger_tx_ref: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        Self {
            id: *claim.id.as_uuid(),
            claimant_id: *claim.claimant_id.as_uuid(),
            provider_id: *claim.provider_id.as_uuid(),
            amount: claim.amount.amount(),
            currency: claim.amount.currency().code().to_string(),
            description: claim.description,
            diagnosis: claim.diagnosis,
            treatment: claim.treatment,
            status: claim.status,
            rejection_reason: claim.rejection_reason,
            dispute_message: claim.dispute_message,
            document_ref: claim.document_ref.map(|d| d.as_str().to_string()),
            ledger_tx_ref: claim.ledger_tx_ref.map(|t| t.as_str().to_string()),
            version: claim.version,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditRecordResponse {
    pub id: Uuid,
    pub claim_id: Uuid,
    pub action: String,
    pub actor: String,
    pub actor_role: String,
    pub resulting_status: ClaimStatus,
    pub ledger_tx_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<AuditRecord> for AuditRecordResponse {
    fn from(record: AuditRecord) -> Self {
        Self {
            id: *record.id.as_uuid(),
            claim_id: *record.claim_id.as_uuid(),
            action: record.action.to_string(),
            actor: record.actor,
            actor_role: record.actor_role.to_string(),
            resulting_status: record.resulting_status,
            ledger_tx_ref: record.ledger_tx_ref.map(|t| t.as_str().to_string()),
            recorded_at: record.recorded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReconciliationResponse {
    pub claim_id: Uuid,
    pub store_status: ClaimStatus,
    pub ledger_state: LedgerClaimState,
    pub in_agreement: bool,
    pub checked_at: DateTime<Utc>,
}

impl From<ReconciliationReport> for ReconciliationResponse {
    fn from(report: ReconciliationReport) -> Self {
        Self {
            claim_id: *report.claim_id.as_uuid(),
            store_status: report.store_status,
            ledger_state: report.ledger_state,
            in_agreement: true,
            checked_at: report.checked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unknown_fields_rejected() {
        let body = r#"{
            "claimant_id": "2f2b4b1e-58b5-4b0a-a3f0-2c6a0f6f9a11",
            "provider_id": "2f2b4b1e-58b5-4b0a-a3f0-2c6a0f6f9a12",
            "amount": "1500",
            "description": "d",
            "diagnosis": "Flu",
            "treatment": "t",
            "bogus": true
        }"#;
        assert!(serde_json::from_str::<SubmitClaimRequest>(body).is_err());
    }

    #[test]
    fn test_negative_amount_fails_validation() {
        let request = SubmitClaimRequest {
            claimant_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            amount: dec!(-5),
            currency: None,
            description: "d".to_string(),
            diagnosis: "Flu".to_string(),
            treatment: "t".to_string(),
            document_ref: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_empty_reject_reason_fails_validation() {
        let request = RejectClaimRequest {
            reason: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
