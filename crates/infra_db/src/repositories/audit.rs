//! Audit repository
//!
//! Insert-only PostgreSQL sink for audit records. There is deliberately no
//! update or delete path here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{AuditEventId, ClaimId, DomainPort, PortError, TxRef};
use domain_claims::audit::{AuditRecord, AuditSink};
use domain_claims::claim::{ActorRole, ClaimAction};

use crate::error::DatabaseError;
use crate::repositories::claims::status_from_str;

/// Append-only repository for audit records
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    /// Creates a new sink over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, record: &AuditRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO claim_audit (event_id, claim_id, action, actor, actor_role, \
             resulting_status, ledger_tx_ref, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*record.id.as_uuid())
        .bind(*record.claim_id.as_uuid())
        .bind(record.action.to_string())
        .bind(&record.actor)
        .bind(record.actor_role.to_string())
        .bind(record.resulting_status.to_string())
        .bind(record.ledger_tx_ref.as_ref().map(TxRef::as_str))
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn select(&self, claim_id: Uuid) -> Result<Vec<AuditRecord>, DatabaseError> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            "SELECT event_id, claim_id, action, actor, actor_role, resulting_status, \
             ledger_tx_ref, recorded_at \
             FROM claim_audit WHERE claim_id = $1 ORDER BY recorded_at, event_id",
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRow::try_into).collect()
    }
}

impl DomainPort for PgAuditSink {}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), PortError> {
        self.insert(record).await.map_err(PortError::from)
    }

    async fn for_claim(&self, claim_id: ClaimId) -> Result<Vec<AuditRecord>, PortError> {
        self.select(*claim_id.as_uuid())
            .await
            .map_err(PortError::from)
    }
}

/// Database row for an audit record
#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    event_id: Uuid,
    claim_id: Uuid,
    action: String,
    actor: String,
    actor_role: String,
    resulting_status: String,
    ledger_tx_ref: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditRecord {
    type Error = DatabaseError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let ledger_tx_ref = row
            .ledger_tx_ref
            .map(TxRef::new)
            .transpose()
            .map_err(|e| DatabaseError::Decode(format!("ledger_tx_ref: {}", e)))?;

        Ok(AuditRecord {
            id: AuditEventId::from_uuid(row.event_id),
            claim_id: ClaimId::from_uuid(row.claim_id),
            action: action_from_str(&row.action)?,
            actor: row.actor,
            actor_role: role_from_str(&row.actor_role)?,
            resulting_status: status_from_str(&row.resulting_status)?,
            ledger_tx_ref,
            recorded_at: row.recorded_at,
        })
    }
}

fn action_from_str(value: &str) -> Result<ClaimAction, DatabaseError> {
    match value {
        "submit" => Ok(ClaimAction::Submit),
        "verify" => Ok(ClaimAction::Verify),
        "dispute" => Ok(ClaimAction::Dispute),
        "approve" => Ok(ClaimAction::Approve),
        "reject" => Ok(ClaimAction::Reject),
        "pay" => Ok(ClaimAction::Pay),
        other => Err(DatabaseError::Decode(format!(
            "unknown claim action '{}'",
            other
        ))),
    }
}

fn role_from_str(value: &str) -> Result<ActorRole, DatabaseError> {
    value
        .parse()
        .map_err(|_| DatabaseError::Decode(format!("unknown actor role '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_strings_round_trip() {
        for action in [
            ClaimAction::Submit,
            ClaimAction::Verify,
            ClaimAction::Dispute,
            ClaimAction::Approve,
            ClaimAction::Reject,
            ClaimAction::Pay,
        ] {
            assert_eq!(action_from_str(&action.to_string()).unwrap(), action);
        }
    }

    #[test]
    fn test_role_strings_round_trip() {
        for role in [
            ActorRole::Admin,
            ActorRole::Approver,
            ActorRole::Auditor,
            ActorRole::Member,
        ] {
            assert_eq!(role_from_str(&role.to_string()).unwrap(), role);
        }
    }
}
