//! Claims repository
//!
//! PostgreSQL implementation of the `ClaimStore` port. Updates are guarded by
//! the claim's version column, so a writer holding stale state gets a
//! conflict instead of silently overwriting a concurrent commit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use core_kernel::{ClaimId, DocumentRef, DomainPort, Money, PortError, TxRef};
use domain_claims::claim::{Claim, ClaimStatus};
use domain_claims::ports::{ClaimQuery, ClaimStore, SortOrder};

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = "claim_id, claimant_id, provider_id, amount, currency, \
     description, diagnosis, treatment, status, rejection_reason, dispute_message, \
     document_ref, ledger_tx_ref, version, created_at, updated_at";

/// Repository for claim records
#[derive(Debug, Clone)]
pub struct PgClaimStore {
    pool: PgPool,
}

impl PgClaimStore {
    /// Creates a new repository over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, claim_id: Uuid) -> Result<Claim, DatabaseError> {
        let row: Option<ClaimRow> = sqlx::query_as(&format!(
            "SELECT {} FROM claims WHERE claim_id = $1",
            CLAIM_COLUMNS
        ))
        .bind(claim_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DatabaseError::not_found("Claim", claim_id))?
            .try_into()
    }

    async fn insert(&self, claim: &Claim) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO claims (claim_id, claimant_id, provider_id, amount, currency, \
             description, diagnosis, treatment, status, rejection_reason, dispute_message, \
             document_ref, ledger_tx_ref, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(*claim.id.as_uuid())
        .bind(*claim.claimant_id.as_uuid())
        .bind(*claim.provider_id.as_uuid())
        .bind(claim.amount.amount())
        .bind(claim.amount.currency().code())
        .bind(&claim.description)
        .bind(&claim.diagnosis)
        .bind(&claim.treatment)
        .bind(claim.status.to_string())
        .bind(claim.rejection_reason.as_deref())
        .bind(claim.dispute_message.as_deref())
        .bind(claim.document_ref.as_ref().map(DocumentRef::as_str))
        .bind(claim.ledger_tx_ref.as_ref().map(TxRef::as_str))
        .bind(claim.version as i64)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace(
        &self,
        claim_id: Uuid,
        expected_version: u64,
        claim: &Claim,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE claims SET status = $3, rejection_reason = $4, dispute_message = $5, \
             document_ref = $6, ledger_tx_ref = $7, version = $8, updated_at = $9 \
             WHERE claim_id = $1 AND version = $2",
        )
        .bind(claim_id)
        .bind(expected_version as i64)
        .bind(claim.status.to_string())
        .bind(claim.rejection_reason.as_deref())
        .bind(claim.dispute_message.as_deref())
        .bind(claim.document_ref.as_ref().map(DocumentRef::as_str))
        .bind(claim.ledger_tx_ref.as_ref().map(TxRef::as_str))
        .bind(claim.version as i64)
        .bind(claim.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a stale version from a missing claim
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT version FROM claims WHERE claim_id = $1")
                    .bind(claim_id)
                    .fetch_optional(&self.pool)
                    .await?;

            return Err(match exists {
                Some(found) => DatabaseError::StaleVersion(format!(
                    "claim {} is at version {}, expected {}",
                    claim_id, found, expected_version
                )),
                None => DatabaseError::not_found("Claim", claim_id),
            });
        }

        Ok(())
    }

    async fn search(&self, query: ClaimQuery) -> Result<Vec<Claim>, DatabaseError> {
        let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM claims WHERE TRUE",
            CLAIM_COLUMNS
        ));

        if let Some(status) = query.status {
            qb.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(claimant_id) = query.claimant_id {
            qb.push(" AND claimant_id = ").push_bind(*claimant_id.as_uuid());
        }
        if let Some(provider_id) = query.provider_id {
            qb.push(" AND provider_id = ").push_bind(*provider_id.as_uuid());
        }

        qb.push(match query.order {
            SortOrder::NewestFirst => " ORDER BY created_at DESC",
            SortOrder::OldestFirst => " ORDER BY created_at ASC",
        });

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            qb.push(" OFFSET ").push_bind(offset as i64);
        }

        let rows: Vec<ClaimRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(ClaimRow::try_into).collect()
    }
}

impl DomainPort for PgClaimStore {}

#[async_trait]
impl ClaimStore for PgClaimStore {
    async fn create(&self, claim: &Claim) -> Result<(), PortError> {
        self.insert(claim).await.map_err(PortError::from)
    }

    async fn get(&self, id: ClaimId) -> Result<Claim, PortError> {
        self.fetch(*id.as_uuid()).await.map_err(PortError::from)
    }

    async fn list(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
        self.search(query).await.map_err(PortError::from)
    }

    async fn update(
        &self,
        id: ClaimId,
        expected_version: u64,
        claim: &Claim,
    ) -> Result<(), PortError> {
        self.replace(*id.as_uuid(), expected_version, claim)
            .await
            .map_err(PortError::from)
    }
}

/// Database row for a claim
#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    claim_id: Uuid,
    claimant_id: Uuid,
    provider_id: Uuid,
    amount: Decimal,
    currency: String,
    description: String,
    diagnosis: String,
    treatment: String,
    status: String,
    rejection_reason: Option<String>,
    dispute_message: Option<String>,
    document_ref: Option<String>,
    ledger_tx_ref: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for Claim {
    type Error = DatabaseError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        let currency = row
            .currency
            .parse()
            .map_err(|e| DatabaseError::Decode(format!("currency: {}", e)))?;
        let document_ref = row
            .document_ref
            .map(DocumentRef::new)
            .transpose()
            .map_err(|e| DatabaseError::Decode(format!("document_ref: {}", e)))?;
        let ledger_tx_ref = row
            .ledger_tx_ref
            .map(TxRef::new)
            .transpose()
            .map_err(|e| DatabaseError::Decode(format!("ledger_tx_ref: {}", e)))?;

        Ok(Claim {
            id: ClaimId::from_uuid(row.claim_id),
            claimant_id: row.claimant_id.into(),
            provider_id: row.provider_id.into(),
            amount: Money::new(row.amount, currency),
            description: row.description,
            diagnosis: row.diagnosis,
            treatment: row.treatment,
            status: status_from_str(&row.status)?,
            rejection_reason: row.rejection_reason,
            dispute_message: row.dispute_message,
            document_ref,
            ledger_tx_ref,
            version: row.version as u64,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn status_from_str(value: &str) -> Result<ClaimStatus, DatabaseError> {
    match value {
        "submitted" => Ok(ClaimStatus::Submitted),
        "under_review" => Ok(ClaimStatus::UnderReview),
        "verified" => Ok(ClaimStatus::Verified),
        "approved" => Ok(ClaimStatus::Approved),
        "rejected" => Ok(ClaimStatus::Rejected),
        "paid" => Ok(ClaimStatus::Paid),
        other => Err(DatabaseError::Decode(format!(
            "unknown claim status '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_round_trip() {
        for status in [
            ClaimStatus::Submitted,
            ClaimStatus::UnderReview,
            ClaimStatus::Verified,
            ClaimStatus::Approved,
            ClaimStatus::Rejected,
            ClaimStatus::Paid,
        ] {
            assert_eq!(status_from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_a_decode_error() {
        assert!(matches!(
            status_from_str("pending"),
            Err(DatabaseError::Decode(_))
        ));
    }
}
