//! Claim storage port
//!
//! The `ClaimStore` trait is the lifecycle service's only view of claim
//! persistence. Adapters implement it for PostgreSQL (infra_db) and for an
//! in-memory map used by tests and database-less deployments.
//!
//! Updates carry the caller's expected version; an adapter must refuse the
//! write with `PortError::Conflict` when the stored version differs, so a
//! writer holding stale state can never overwrite a concurrent commit.

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, PartyId, PortError};
use crate::claim::{Claim, ClaimStatus};

/// Result ordering for claim listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recent first, for review queues
    #[default]
    NewestFirst,
    /// Oldest first, for historical search
    OldestFirst,
}

/// Query parameters for listing claims
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
    /// Filter by status
    pub status: Option<ClaimStatus>,
    /// Filter by claimant
    pub claimant_id: Option<PartyId>,
    /// Filter by submitting provider
    pub provider_id: Option<PartyId>,
    /// Result ordering by creation time
    pub order: SortOrder,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl ClaimQuery {
    /// Creates a review-queue query for one status
    pub fn by_status(status: ClaimStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Creates a query for a claimant's history, oldest first
    pub fn history_for(claimant_id: PartyId) -> Self {
        Self {
            claimant_id: Some(claimant_id),
            order: SortOrder::OldestFirst,
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

/// Durable keyed storage of claim records
#[async_trait]
pub trait ClaimStore: DomainPort {
    /// Persists a new claim; fails with Conflict if the id already exists
    async fn create(&self, claim: &Claim) -> Result<(), PortError>;

    /// Retrieves a claim by id
    async fn get(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// Lists claims matching the query
    async fn list(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError>;

    /// Replaces a claim's record if the stored version equals `expected_version`
    ///
    /// The claim passed in already carries the incremented version; the check
    /// runs against the version the caller loaded.
    async fn update(
        &self,
        id: ClaimId,
        expected_version: u64,
        claim: &Claim,
    ) -> Result<(), PortError>;
}

/// In-memory implementation of ClaimStore
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory claim store backed by a map
    #[derive(Debug, Default)]
    pub struct MemoryClaimStore {
        claims: Arc<RwLock<HashMap<ClaimId, Claim>>>,
    }

    impl MemoryClaimStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with claims, bypassing creation checks
        ///
        /// Useful for seeding a claim in an arbitrary lifecycle state.
        pub async fn seed(&self, claims: impl IntoIterator<Item = Claim>) {
            let mut map = self.claims.write().await;
            for claim in claims {
                map.insert(claim.id, claim);
            }
        }
    }

    impl DomainPort for MemoryClaimStore {}

    #[async_trait]
    impl ClaimStore for MemoryClaimStore {
        async fn create(&self, claim: &Claim) -> Result<(), PortError> {
            let mut claims = self.claims.write().await;
            if claims.contains_key(&claim.id) {
                return Err(PortError::conflict(format!(
                    "Claim {} already exists",
                    claim.id
                )));
            }
            claims.insert(claim.id, claim.clone());
            Ok(())
        }

        async fn get(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.claims
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn list(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
            let claims = self.claims.read().await;
            let mut results: Vec<_> = claims
                .values()
                .filter(|c| {
                    if let Some(status) = query.status {
                        if c.status != status {
                            return false;
                        }
                    }
                    if let Some(claimant_id) = query.claimant_id {
                        if c.claimant_id != claimant_id {
                            return false;
                        }
                    }
                    if let Some(provider_id) = query.provider_id {
                        if c.provider_id != provider_id {
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect();

            match query.order {
                SortOrder::NewestFirst => results.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
                SortOrder::OldestFirst => results.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            }

            if let Some(offset) = query.offset {
                results = results.into_iter().skip(offset as usize).collect();
            }
            if let Some(limit) = query.limit {
                results.truncate(limit as usize);
            }

            Ok(results)
        }

        async fn update(
            &self,
            id: ClaimId,
            expected_version: u64,
            claim: &Claim,
        ) -> Result<(), PortError> {
            let mut claims = self.claims.write().await;
            let current = claims
                .get(&id)
                .ok_or_else(|| PortError::not_found("Claim", id))?;

            if current.version != expected_version {
                return Err(PortError::conflict(format!(
                    "Claim {} version is {}, expected {}",
                    id, current.version, expected_version
                )));
            }

            claims.insert(id, claim.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryClaimStore;
    use super::*;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    use crate::claim::SubmitClaim;

    fn claim() -> Claim {
        Claim::submitted(SubmitClaim {
            claimant_id: PartyId::new_v7(),
            provider_id: PartyId::new_v7(),
            amount: Money::new(dec!(100), Currency::USD),
            description: "Consultation".to_string(),
            diagnosis: "Sprain".to_string(),
            treatment: "Rest".to_string(),
            document_ref: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryClaimStore::new();
        let c = claim();
        store.create(&c).await.unwrap();

        let fetched = store.get(c.id).await.unwrap();
        assert_eq!(fetched.id, c.id);
        assert_eq!(fetched.diagnosis, "Sprain");
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = MemoryClaimStore::new();
        let c = claim();
        store.create(&c).await.unwrap();

        let result = store.create(&c).await;
        assert!(matches!(result, Err(PortError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let store = MemoryClaimStore::new();
        let mut c = claim();
        store.create(&c).await.unwrap();

        let loaded_version = c.version;
        c.apply_status(ClaimStatus::Verified).unwrap();

        // Correct expected version succeeds
        store.update(c.id, loaded_version, &c).await.unwrap();

        // Re-running with the stale expected version conflicts
        let result = store.update(c.id, loaded_version, &c).await;
        assert!(matches!(result, Err(PortError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_list_by_status_newest_first() {
        let store = MemoryClaimStore::new();
        let first = claim();
        // Later creation timestamp
        let second = claim();
        store.create(&first).await.unwrap();
        store.create(&second).await.unwrap();

        let listed = store
            .list(ClaimQuery::by_status(ClaimStatus::Submitted))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);
    }
}
