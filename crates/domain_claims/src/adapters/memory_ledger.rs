//! In-process ledger adapter
//!
//! A deterministic implementation of the gateway contract: every mutating
//! call mints a transaction reference, and confirmation succeeds immediately
//! with an incrementing block number. Faults can be injected one call at a
//! time so tests can exercise the failure paths of the lifecycle service.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use core_kernel::{
    AdapterHealth, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, TxRef,
};

use crate::ledger::{
    ConfirmationReceipt, LedgerClaimRecord, LedgerClaimState, LedgerClaimSubmission,
    LedgerDecision, LedgerError, LedgerGateway,
};

/// Fault applied to the next gateway call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerFault {
    /// Next mutating call fails at the RPC layer
    RpcFailure,
    /// Next mutating call returns a reference whose transaction reverts
    Revert,
    /// Next confirmation wait times out
    ConfirmationTimeout,
}

#[derive(Debug, Default)]
struct LedgerState {
    records: HashMap<ClaimId, LedgerClaimRecord>,
    receipts: HashMap<TxRef, ConfirmationReceipt>,
    pending_fault: Option<LedgerFault>,
}

/// Deterministic in-memory ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    tx_counter: AtomicU64,
    block_counter: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `fault` to the next matching gateway call
    pub async fn inject_fault(&self, fault: LedgerFault) {
        self.state.lock().await.pending_fault = Some(fault);
    }

    /// Removes the ledger's record for a claim
    ///
    /// Lets tests manufacture store/ledger divergence.
    pub async fn drop_record(&self, claim_id: ClaimId) {
        self.state.lock().await.records.remove(&claim_id);
    }

    fn mint_tx_ref(&self) -> TxRef {
        let n = self.tx_counter.fetch_add(1, Ordering::Relaxed) + 1;
        TxRef::new(format!("0x{:064x}", n)).expect("minted tx ref is valid hex")
    }

    async fn take_fault(&self, expected: LedgerFault) -> bool {
        let mut state = self.state.lock().await;
        if state.pending_fault == Some(expected) {
            state.pending_fault = None;
            true
        } else {
            false
        }
    }

    /// Records a state change and mints a confirmable receipt for it
    async fn record_transition(
        &self,
        claim_id: ClaimId,
        new_state: LedgerClaimState,
        expected: &[LedgerClaimState],
    ) -> Result<TxRef, LedgerError> {
        if self.take_fault(LedgerFault::RpcFailure).await {
            return Err(LedgerError::Rpc("connection refused".to_string()));
        }

        let reverted = self.take_fault(LedgerFault::Revert).await;
        let tx_ref = self.mint_tx_ref();
        let block = self.block_counter.fetch_add(1, Ordering::Relaxed) + 1;

        let mut state = self.state.lock().await;

        if !reverted {
            let current = state.records.get(&claim_id).map(|r| r.state);
            match current {
                None => return Err(LedgerError::NoRecord(claim_id)),
                Some(s) if !expected.contains(&s) => {
                    return Err(LedgerError::Reverted(format!(
                        "claim {} is {:?} on the ledger",
                        claim_id, s
                    )));
                }
                Some(_) => {}
            }
        }

        let receipt = ConfirmationReceipt {
            tx_ref: tx_ref.clone(),
            status: if reverted { 0 } else { 1 },
            block_ref: Some(format!("0x{:x}", block)),
        };

        if !reverted {
            state.records.insert(
                claim_id,
                LedgerClaimRecord {
                    claim_id,
                    state: new_state,
                    tx_ref: tx_ref.clone(),
                    block_ref: receipt.block_ref.clone(),
                },
            );
        }
        state.receipts.insert(tx_ref.clone(), receipt);

        Ok(tx_ref)
    }
}

impl DomainPort for MemoryLedger {}

#[async_trait]
impl HealthCheckable for MemoryLedger {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-ledger".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerGateway for MemoryLedger {
    async fn submit_claim(
        &self,
        submission: &LedgerClaimSubmission,
    ) -> Result<TxRef, LedgerError> {
        if self.take_fault(LedgerFault::RpcFailure).await {
            return Err(LedgerError::Rpc("connection refused".to_string()));
        }

        let reverted = self.take_fault(LedgerFault::Revert).await;
        let tx_ref = self.mint_tx_ref();
        let block = self.block_counter.fetch_add(1, Ordering::Relaxed) + 1;

        let mut state = self.state.lock().await;
        if !reverted && state.records.contains_key(&submission.claim_id) {
            return Err(LedgerError::Reverted(format!(
                "claim {} already recorded",
                submission.claim_id
            )));
        }

        let receipt = ConfirmationReceipt {
            tx_ref: tx_ref.clone(),
            status: if reverted { 0 } else { 1 },
            block_ref: Some(format!("0x{:x}", block)),
        };

        if !reverted {
            state.records.insert(
                submission.claim_id,
                LedgerClaimRecord {
                    claim_id: submission.claim_id,
                    state: LedgerClaimState::Submitted,
                    tx_ref: tx_ref.clone(),
                    block_ref: receipt.block_ref.clone(),
                },
            );
        }
        state.receipts.insert(tx_ref.clone(), receipt);

        Ok(tx_ref)
    }

    async fn verify_claim(&self, claim_id: ClaimId) -> Result<TxRef, LedgerError> {
        self.record_transition(
            claim_id,
            LedgerClaimState::Verified,
            &[LedgerClaimState::Submitted, LedgerClaimState::Verified],
        )
        .await
    }

    async fn approve_claim(
        &self,
        claim_id: ClaimId,
        _decision: &LedgerDecision,
    ) -> Result<TxRef, LedgerError> {
        self.record_transition(
            claim_id,
            LedgerClaimState::Approved,
            &[LedgerClaimState::Submitted, LedgerClaimState::Verified],
        )
        .await
    }

    async fn reject_claim(&self, claim_id: ClaimId, _reason: &str) -> Result<TxRef, LedgerError> {
        self.record_transition(
            claim_id,
            LedgerClaimState::Rejected,
            &[LedgerClaimState::Submitted, LedgerClaimState::Verified],
        )
        .await
    }

    async fn wait_for_confirmation(
        &self,
        tx_ref: &TxRef,
    ) -> Result<ConfirmationReceipt, LedgerError> {
        if self.take_fault(LedgerFault::ConfirmationTimeout).await {
            return Err(LedgerError::Timeout {
                operation: "wait_for_confirmation".to_string(),
                elapsed_ms: 0,
            });
        }

        self.state
            .lock()
            .await
            .receipts
            .get(tx_ref)
            .cloned()
            .ok_or_else(|| {
                LedgerError::InvalidResponse(format!("unknown transaction {}", tx_ref))
            })
    }

    async fn claim_record(
        &self,
        claim_id: ClaimId,
    ) -> Result<Option<LedgerClaimRecord>, LedgerError> {
        Ok(self.state.lock().await.records.get(&claim_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(claim_id: ClaimId) -> LedgerClaimSubmission {
        LedgerClaimSubmission {
            claim_id,
            amount_minor: 250_000,
            description: "Knee Surgery".to_string(),
            claimant: "PTY-1".to_string(),
            provider: "PTY-2".to_string(),
            document_hash: None,
        }
    }

    #[tokio::test]
    async fn test_submit_then_confirm() {
        let ledger = MemoryLedger::new();
        let claim_id = ClaimId::new_v7();

        let tx = ledger.submit_claim(&submission(claim_id)).await.unwrap();
        let receipt = ledger.wait_for_confirmation(&tx).await.unwrap();
        assert!(receipt.confirmed());

        let record = ledger.claim_record(claim_id).await.unwrap().unwrap();
        assert_eq!(record.state, LedgerClaimState::Submitted);
        assert_eq!(record.tx_ref, tx);
    }

    #[tokio::test]
    async fn test_duplicate_submission_reverts() {
        let ledger = MemoryLedger::new();
        let claim_id = ClaimId::new_v7();
        ledger.submit_claim(&submission(claim_id)).await.unwrap();

        let result = ledger.submit_claim(&submission(claim_id)).await;
        assert!(matches!(result, Err(LedgerError::Reverted(_))));
    }

    #[tokio::test]
    async fn test_verify_unknown_claim() {
        let ledger = MemoryLedger::new();
        let result = ledger.verify_claim(ClaimId::new_v7()).await;
        assert!(matches!(result, Err(LedgerError::NoRecord(_))));
    }

    #[tokio::test]
    async fn test_injected_rpc_failure_is_one_shot() {
        let ledger = MemoryLedger::new();
        let claim_id = ClaimId::new_v7();

        ledger.inject_fault(LedgerFault::RpcFailure).await;
        assert!(matches!(
            ledger.submit_claim(&submission(claim_id)).await,
            Err(LedgerError::Rpc(_))
        ));

        // The fault is consumed; the retry goes through
        assert!(ledger.submit_claim(&submission(claim_id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_revert_produces_failed_receipt() {
        let ledger = MemoryLedger::new();
        let claim_id = ClaimId::new_v7();

        ledger.inject_fault(LedgerFault::Revert).await;
        let tx = ledger.submit_claim(&submission(claim_id)).await.unwrap();
        let receipt = ledger.wait_for_confirmation(&tx).await.unwrap();
        assert!(!receipt.confirmed());

        // A reverted submission leaves no record behind
        assert!(ledger.claim_record(claim_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_confirmation_timeout() {
        let ledger = MemoryLedger::new();
        let claim_id = ClaimId::new_v7();
        let tx = ledger.submit_claim(&submission(claim_id)).await.unwrap();

        ledger.inject_fault(LedgerFault::ConfirmationTimeout).await;
        let result = ledger.wait_for_confirmation(&tx).await;
        assert!(matches!(result, Err(LedgerError::Timeout { .. })));
    }
}
