//! Claim lifecycle service
//!
//! The single writer of claim state. Every operation follows the same
//! contract: load, check the state precondition, check authorization, drive
//! the ledger call through confirmation, then commit the store update and
//! append an audit record. A failure before the store commit leaves the claim
//! exactly as it was.
//!
//! Operations on one claim are serialized through a per-claim async lock, so
//! two concurrent approvals cannot both pass the precondition check before
//! either commits; unrelated claims proceed in parallel. The store's version
//! check backstops the lock against out-of-band writers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use core_kernel::{ClaimId, PortError, TxRef};

use crate::audit::{AuditRecord, AuditSink};
use crate::claim::{Actor, Claim, ClaimAction, ClaimStatus, SubmitClaim};
use crate::error::ClaimError;
use crate::ledger::{
    LedgerClaimState, LedgerClaimSubmission, LedgerDecision, LedgerError, LedgerGateway,
};
use crate::ports::{ClaimQuery, ClaimStore};

/// Per-claim mutual exclusion scope
///
/// One entry per claim that has seen a lifecycle operation; entries are tiny
/// and bounded by the number of live claims.
#[derive(Default)]
struct ClaimLocks {
    inner: Mutex<HashMap<ClaimId, Arc<Mutex<()>>>>,
}

impl ClaimLocks {
    async fn acquire(&self, id: ClaimId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(id).or_default())
        };
        lock.lock_owned().await
    }
}

/// Outcome of a reconciliation pass where store and ledger agree
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub claim_id: ClaimId,
    pub store_status: ClaimStatus,
    pub ledger_state: LedgerClaimState,
    pub checked_at: DateTime<Utc>,
}

/// Parameters distinguishing the lifecycle actions
enum ActionInput<'a> {
    Verify,
    Dispute { message: &'a str },
    Approve { note: Option<&'a str> },
    Reject { reason: &'a str },
    Pay,
}

impl ActionInput<'_> {
    fn action(&self) -> ClaimAction {
        match self {
            ActionInput::Verify => ClaimAction::Verify,
            ActionInput::Dispute { .. } => ClaimAction::Dispute,
            ActionInput::Approve { .. } => ClaimAction::Approve,
            ActionInput::Reject { .. } => ClaimAction::Reject,
            ActionInput::Pay => ClaimAction::Pay,
        }
    }
}

/// Orchestrates claim state against the store and the external ledger
pub struct ClaimLifecycleService {
    store: Arc<dyn ClaimStore>,
    ledger: Arc<dyn LedgerGateway>,
    audit: Arc<dyn AuditSink>,
    locks: ClaimLocks,
}

impl ClaimLifecycleService {
    pub fn new(
        store: Arc<dyn ClaimStore>,
        ledger: Arc<dyn LedgerGateway>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            ledger,
            audit,
            locks: ClaimLocks::default(),
        }
    }

    /// Submits a new claim
    ///
    /// The claim is recorded on the ledger first; only a confirmed ledger
    /// submission is persisted to the store.
    pub async fn submit(&self, input: SubmitClaim, actor: &Actor) -> Result<Claim, ClaimError> {
        if !ClaimAction::Submit.permitted_for(actor.role) {
            return Err(ClaimError::Unauthorized {
                action: ClaimAction::Submit,
                role: actor.role,
            });
        }

        let mut claim = Claim::submitted(input)?;

        let submission = LedgerClaimSubmission {
            claim_id: claim.id,
            amount_minor: claim.amount.minor_units(),
            description: claim.description.clone(),
            claimant: claim.claimant_id.to_string(),
            provider: claim.provider_id.to_string(),
            document_hash: claim
                .document_ref
                .as_ref()
                .map(|d| d.as_str().to_string()),
        };

        let tx_ref = self
            .ledger_call("submit", self.ledger.submit_claim(&submission))
            .await?;
        claim.record_ledger_tx(tx_ref.clone());

        self.store.create(&claim).await.map_err(|e| {
            // The ledger already holds this claim; losing the store write is
            // a divergence, not a plain storage failure.
            ClaimError::Reconciliation(format!(
                "ledger confirmed {} for claim {} but the store create failed: {}",
                tx_ref, claim.id, e
            ))
        })?;

        self.append_audit(&claim, ClaimAction::Submit, actor, Some(tx_ref))
            .await;
        info!(claim_id = %claim.id, actor = %actor.id, "claim submitted");
        Ok(claim)
    }

    /// Verifies a submitted (or disputed) claim against the ledger
    pub async fn verify(&self, id: ClaimId, actor: &Actor) -> Result<Claim, ClaimError> {
        self.transition(id, actor, ActionInput::Verify).await
    }

    /// Records a claimant dispute, moving the claim under review
    pub async fn dispute(
        &self,
        id: ClaimId,
        actor: &Actor,
        message: &str,
    ) -> Result<Claim, ClaimError> {
        self.transition(id, actor, ActionInput::Dispute { message })
            .await
    }

    /// Approves a verified or under-review claim
    pub async fn approve(
        &self,
        id: ClaimId,
        actor: &Actor,
        note: Option<&str>,
    ) -> Result<Claim, ClaimError> {
        self.transition(id, actor, ActionInput::Approve { note })
            .await
    }

    /// Rejects a claim with a stated reason
    pub async fn reject(
        &self,
        id: ClaimId,
        actor: &Actor,
        reason: &str,
    ) -> Result<Claim, ClaimError> {
        self.transition(id, actor, ActionInput::Reject { reason })
            .await
    }

    /// Marks an approved claim as paid
    pub async fn pay(&self, id: ClaimId, actor: &Actor) -> Result<Claim, ClaimError> {
        self.transition(id, actor, ActionInput::Pay).await
    }

    /// Fetches a claim; reads are not serialized against writers
    pub async fn get_claim(&self, id: ClaimId) -> Result<Claim, ClaimError> {
        self.load(id).await
    }

    /// Lists claims matching the query
    pub async fn list_claims(&self, query: ClaimQuery) -> Result<Vec<Claim>, ClaimError> {
        self.store
            .list(query)
            .await
            .map_err(|e| ClaimError::Store(e.to_string()))
    }

    /// Returns the audit trail for a claim
    pub async fn audit_trail(&self, id: ClaimId) -> Result<Vec<AuditRecord>, ClaimError> {
        self.load(id).await?;
        self.audit
            .for_claim(id)
            .await
            .map_err(|e| ClaimError::Store(e.to_string()))
    }

    /// Compares the store's view of a claim against the ledger's
    ///
    /// Agreement yields a report; divergence (including a missing ledger
    /// counterpart) surfaces as `ClaimError::Reconciliation` so an operator
    /// can intervene before any retry.
    pub async fn reconcile(&self, id: ClaimId) -> Result<ReconciliationReport, ClaimError> {
        let _guard = self.locks.acquire(id).await;

        let claim = self.load(id).await?;
        let record = self
            .ledger
            .claim_record(id)
            .await
            .map_err(|e| map_ledger_error("reconcile", e))?;

        let expected = expected_ledger_state(claim.status);
        match record {
            None => Err(ClaimError::Reconciliation(format!(
                "claim {} is {} in the store but has no ledger counterpart",
                id, claim.status
            ))),
            Some(r) if r.state == expected => Ok(ReconciliationReport {
                claim_id: id,
                store_status: claim.status,
                ledger_state: r.state,
                checked_at: Utc::now(),
            }),
            Some(r) => Err(ClaimError::Reconciliation(format!(
                "claim {} is {} in the store but {:?} on the ledger (tx {})",
                id, claim.status, r.state, r.tx_ref
            ))),
        }
    }

    async fn transition(
        &self,
        id: ClaimId,
        actor: &Actor,
        input: ActionInput<'_>,
    ) -> Result<Claim, ClaimError> {
        let _guard = self.locks.acquire(id).await;

        let mut claim = self.load(id).await?;
        let action = input.action();
        let target = action.target_status();

        // Precondition: current status must be a valid predecessor. Repeating
        // a satisfied action lands here rather than silently succeeding.
        if !claim.status.can_transition_to(target) {
            return Err(ClaimError::InvalidStateTransition {
                from: claim.status,
                to: target,
            });
        }

        if !action.permitted_for(actor.role) {
            return Err(ClaimError::Unauthorized {
                action,
                role: actor.role,
            });
        }

        match &input {
            ActionInput::Reject { reason } if reason.trim().is_empty() => {
                return Err(ClaimError::Validation(
                    "Rejection reason must not be empty".to_string(),
                ));
            }
            ActionInput::Dispute { message } if message.trim().is_empty() => {
                return Err(ClaimError::Validation(
                    "Dispute message must not be empty".to_string(),
                ));
            }
            _ => {}
        }

        // Ledger leg. Dispute and payment have no ledger counterpart.
        let tx_ref = match &input {
            ActionInput::Verify => Some(
                self.ledger_call("verify", self.ledger.verify_claim(id))
                    .await?,
            ),
            ActionInput::Approve { note } => {
                let decision = LedgerDecision {
                    decided_by: actor.id.clone(),
                    note: note.map(str::to_string),
                };
                Some(
                    self.ledger_call("approve", self.ledger.approve_claim(id, &decision))
                        .await?,
                )
            }
            ActionInput::Reject { reason } => Some(
                self.ledger_call("reject", self.ledger.reject_claim(id, reason))
                    .await?,
            ),
            ActionInput::Dispute { .. } | ActionInput::Pay => None,
        };

        let expected_version = claim.version;
        claim.apply_status(target)?;
        match &input {
            ActionInput::Dispute { message } => {
                claim.dispute_message = Some(message.to_string());
            }
            ActionInput::Reject { reason } => {
                claim.rejection_reason = Some(reason.to_string());
            }
            _ => {}
        }
        if let Some(ref tx) = tx_ref {
            claim.record_ledger_tx(tx.clone());
        }

        self.store
            .update(id, expected_version, &claim)
            .await
            .map_err(|e| match (&tx_ref, e) {
                // The ledger change is confirmed; a lost store write here is
                // the divergence the reconciliation sweep exists for.
                (Some(tx), e) => ClaimError::Reconciliation(format!(
                    "ledger confirmed {} for claim {} but the store update failed: {}",
                    tx, id, e
                )),
                (None, PortError::Conflict { message }) => ClaimError::Store(format!(
                    "claim {} was modified concurrently: {}",
                    id, message
                )),
                (None, e) => ClaimError::Store(e.to_string()),
            })?;

        self.append_audit(&claim, action, actor, tx_ref).await;
        info!(
            claim_id = %id,
            action = %action,
            status = %claim.status,
            actor = %actor.id,
            "claim transition committed"
        );
        Ok(claim)
    }

    async fn load(&self, id: ClaimId) -> Result<Claim, ClaimError> {
        self.store.get(id).await.map_err(|e| {
            if e.is_not_found() {
                ClaimError::NotFound(id)
            } else {
                ClaimError::Store(e.to_string())
            }
        })
    }

    /// Drives a mutating ledger call through confirmation
    ///
    /// Returns the transaction reference only once the receipt's status flag
    /// signals success; everything else surfaces without touching the store.
    async fn ledger_call(
        &self,
        operation: &str,
        call: impl std::future::Future<Output = Result<TxRef, LedgerError>>,
    ) -> Result<TxRef, ClaimError> {
        let tx_ref = call.await.map_err(|e| map_ledger_error(operation, e))?;

        let receipt = self
            .ledger
            .wait_for_confirmation(&tx_ref)
            .await
            .map_err(|e| map_ledger_error(operation, e))?;

        if !receipt.confirmed() {
            warn!(operation, tx_ref = %tx_ref, "ledger transaction reverted");
            return Err(ClaimError::Ledger(format!(
                "{} transaction {} was not confirmed",
                operation, tx_ref
            )));
        }

        Ok(tx_ref)
    }

    async fn append_audit(
        &self,
        claim: &Claim,
        action: ClaimAction,
        actor: &Actor,
        tx_ref: Option<TxRef>,
    ) {
        let record = AuditRecord::committed(claim.id, action, actor, claim.status, tx_ref);
        // The transition is already durable; an audit sink failure is logged,
        // not surfaced as an operation failure.
        if let Err(e) = self.audit.append(&record).await {
            error!(claim_id = %record.claim_id, error = %e, "audit append failed");
        }
    }
}

/// Ledger state a claim in `status` is expected to carry
fn expected_ledger_state(status: ClaimStatus) -> LedgerClaimState {
    match status {
        // Dispute is store-only, so a claim under review is still Submitted
        // from the ledger's point of view.
        ClaimStatus::Submitted | ClaimStatus::UnderReview => LedgerClaimState::Submitted,
        ClaimStatus::Verified => LedgerClaimState::Verified,
        // Payment is store-only as well.
        ClaimStatus::Approved | ClaimStatus::Paid => LedgerClaimState::Approved,
        ClaimStatus::Rejected => LedgerClaimState::Rejected,
    }
}

fn map_ledger_error(operation: &str, error: LedgerError) -> ClaimError {
    match error {
        LedgerError::Timeout { elapsed_ms, .. } => ClaimError::LedgerTimeout {
            operation: operation.to_string(),
            elapsed_ms,
        },
        LedgerError::NoRecord(claim_id) => ClaimError::Reconciliation(format!(
            "ledger has no counterpart for claim {} during {}",
            claim_id, operation
        )),
        other => ClaimError::Ledger(other.to_string()),
    }
}
