//! Append-only audit trail
//!
//! Every committed lifecycle transition emits one record. Sinks only ever
//! append and read; there is no update or delete surface anywhere.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AuditEventId, ClaimId, DomainPort, PortError, TxRef};
use crate::claim::{Actor, ClaimAction, ClaimStatus};

/// One committed lifecycle action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditEventId,
    pub claim_id: ClaimId,
    pub action: ClaimAction,
    /// Identifier of the actor who performed the action
    pub actor: String,
    pub actor_role: crate::claim::ActorRole,
    /// Status the claim ended up in
    pub resulting_status: ClaimStatus,
    /// Confirmed ledger transaction backing the action, if one exists
    pub ledger_tx_ref: Option<TxRef>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Creates a record for a committed action
    pub fn committed(
        claim_id: ClaimId,
        action: ClaimAction,
        actor: &Actor,
        resulting_status: ClaimStatus,
        ledger_tx_ref: Option<TxRef>,
    ) -> Self {
        Self {
            id: AuditEventId::new_v7(),
            claim_id,
            action,
            actor: actor.id.clone(),
            actor_role: actor.role,
            resulting_status,
            ledger_tx_ref,
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only destination for audit records
#[async_trait]
pub trait AuditSink: DomainPort {
    /// Appends one record; existing records are never touched
    async fn append(&self, record: &AuditRecord) -> Result<(), PortError>;

    /// Returns a claim's records in insertion order
    async fn for_claim(&self, claim_id: ClaimId) -> Result<Vec<AuditRecord>, PortError>;
}

/// In-memory implementation of AuditSink
pub mod memory {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory append-only audit sink
    #[derive(Debug, Default)]
    pub struct MemoryAuditSink {
        records: Arc<RwLock<Vec<AuditRecord>>>,
    }

    impl MemoryAuditSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Total number of records across all claims
        pub async fn len(&self) -> usize {
            self.records.read().await.len()
        }
    }

    impl DomainPort for MemoryAuditSink {}

    #[async_trait]
    impl AuditSink for MemoryAuditSink {
        async fn append(&self, record: &AuditRecord) -> Result<(), PortError> {
            self.records.write().await.push(record.clone());
            Ok(())
        }

        async fn for_claim(&self, claim_id: ClaimId) -> Result<Vec<AuditRecord>, PortError> {
            Ok(self
                .records
                .read()
                .await
                .iter()
                .filter(|r| r.claim_id == claim_id)
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryAuditSink;
    use super::*;
    use crate::claim::ActorRole;

    #[tokio::test]
    async fn test_append_and_read_in_order() {
        let sink = MemoryAuditSink::new();
        let claim_id = ClaimId::new_v7();
        let actor = Actor::new("approver@example.com", ActorRole::Approver);

        sink.append(&AuditRecord::committed(
            claim_id,
            ClaimAction::Verify,
            &actor,
            ClaimStatus::Verified,
            None,
        ))
        .await
        .unwrap();
        sink.append(&AuditRecord::committed(
            claim_id,
            ClaimAction::Approve,
            &actor,
            ClaimStatus::Approved,
            None,
        ))
        .await
        .unwrap();

        let trail = sink.for_claim(claim_id).await.unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, ClaimAction::Verify);
        assert_eq!(trail[1].action, ClaimAction::Approve);
        assert_eq!(trail[1].resulting_status, ClaimStatus::Approved);
    }

    #[tokio::test]
    async fn test_records_scoped_by_claim() {
        let sink = MemoryAuditSink::new();
        let actor = Actor::new("admin", ActorRole::Admin);

        sink.append(&AuditRecord::committed(
            ClaimId::new_v7(),
            ClaimAction::Submit,
            &actor,
            ClaimStatus::Submitted,
            None,
        ))
        .await
        .unwrap();

        let other = ClaimId::new_v7();
        assert!(sink.for_claim(other).await.unwrap().is_empty());
        assert_eq!(sink.len().await, 1);
    }
}
