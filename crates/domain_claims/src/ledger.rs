//! Ledger gateway port
//!
//! The lifecycle service's only view of the external append-only ledger.
//! Every mutating operation returns a transaction reference that MUST be
//! driven through [`LedgerGateway::wait_for_confirmation`] before the claim
//! store is touched: an unconfirmed transaction has not taken effect.
//!
//! The ledger itself offers no idempotency guarantee; callers are expected to
//! check prior state before invoking a mutating operation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{CircuitBreakerConfig, ClaimId, DomainPort, TxRef};

/// Configuration injected into ledger gateway adapters
///
/// Replaces any module-level constants: endpoint, signing credential and
/// contract identity all arrive from the deployment environment.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerGatewayConfig {
    /// RPC endpoint of the ledger node
    pub endpoint: String,
    /// Reference to the signing credential (a key name, never the key itself)
    pub credential_ref: String,
    /// Identity of the claims contract on the ledger
    pub contract_ref: String,
    /// Budget for a single confirmation wait, in milliseconds
    pub confirmation_timeout_ms: u64,
    /// Interval between receipt polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Circuit breaker settings for the RPC adapter
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for LedgerGatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            credential_ref: "LEDGER_SIGNING_KEY".to_string(),
            contract_ref: String::new(),
            confirmation_timeout_ms: 30_000,
            poll_interval_ms: 500,
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

/// Errors raised by ledger gateway operations
#[derive(Debug, Error)]
pub enum LedgerError {
    /// RPC transport failed
    #[error("Ledger RPC failed: {0}")]
    Rpc(String),

    /// The ledger accepted the call but the transaction reverted
    #[error("Ledger transaction reverted: {0}")]
    Reverted(String),

    /// The ledger has no record for the claim
    #[error("No ledger record for claim {0}")]
    NoRecord(ClaimId),

    /// A confirmation wait exceeded its budget
    #[error("Ledger {operation} timed out after {elapsed_ms}ms")]
    Timeout {
        operation: String,
        elapsed_ms: u64,
    },

    /// The gateway is refusing calls (circuit open)
    #[error("Ledger gateway unavailable: {0}")]
    Unavailable(String),

    /// The node returned something the adapter could not interpret
    #[error("Unexpected ledger response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LedgerError::Timeout { .. })
    }
}

/// Claim details recorded on the ledger at submission
///
/// Field order mirrors the contract call's positional-argument schema:
/// claim id, amount in minor units, description, claimant, provider,
/// document content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerClaimSubmission {
    pub claim_id: ClaimId,
    pub amount_minor: i64,
    pub description: String,
    pub claimant: String,
    pub provider: String,
    pub document_hash: Option<String>,
}

/// Payload accompanying an approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerDecision {
    pub decided_by: String,
    pub note: Option<String>,
}

/// Receipt returned once a transaction is included in a block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationReceipt {
    pub tx_ref: TxRef,
    /// Receipt status flag; 1 signals success
    pub status: u64,
    pub block_ref: Option<String>,
}

impl ConfirmationReceipt {
    /// True when the transaction was included and succeeded
    pub fn confirmed(&self) -> bool {
        self.status == 1
    }
}

/// State the ledger records for a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerClaimState {
    Submitted,
    Verified,
    Approved,
    Rejected,
}

/// The ledger's view of one claim, as returned by the read path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerClaimRecord {
    pub claim_id: ClaimId,
    pub state: LedgerClaimState,
    pub tx_ref: TxRef,
    pub block_ref: Option<String>,
}

/// External ledger operations used by the lifecycle service
#[async_trait]
pub trait LedgerGateway: DomainPort {
    /// Records a new claim on the ledger
    async fn submit_claim(
        &self,
        submission: &LedgerClaimSubmission,
    ) -> Result<TxRef, LedgerError>;

    /// Marks a claim verified on the ledger
    async fn verify_claim(&self, claim_id: ClaimId) -> Result<TxRef, LedgerError>;

    /// Records an approval decision on the ledger
    async fn approve_claim(
        &self,
        claim_id: ClaimId,
        decision: &LedgerDecision,
    ) -> Result<TxRef, LedgerError>;

    /// Records a rejection and its reason on the ledger
    async fn reject_claim(&self, claim_id: ClaimId, reason: &str) -> Result<TxRef, LedgerError>;

    /// Blocks until the transaction is included or the configured budget elapses
    async fn wait_for_confirmation(
        &self,
        tx_ref: &TxRef,
    ) -> Result<ConfirmationReceipt, LedgerError>;

    /// Reads the ledger's current record for a claim, if any
    ///
    /// Used by the reconciliation pass; `Ok(None)` means the ledger has never
    /// seen the claim.
    async fn claim_record(
        &self,
        claim_id: ClaimId,
    ) -> Result<Option<LedgerClaimRecord>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_status_flag() {
        let ok = ConfirmationReceipt {
            tx_ref: TxRef::new("0xabc").unwrap(),
            status: 1,
            block_ref: Some("0x10".to_string()),
        };
        assert!(ok.confirmed());

        let reverted = ConfirmationReceipt {
            status: 0,
            ..ok.clone()
        };
        assert!(!reverted.confirmed());
    }

    #[test]
    fn test_default_config() {
        let config = LedgerGatewayConfig::default();
        assert_eq!(config.confirmation_timeout_ms, 30_000);
        assert!(config.circuit_breaker.is_some());
        // The credential reference names a key, it must never hold one
        assert!(!config.credential_ref.contains("0x"));
    }
}
