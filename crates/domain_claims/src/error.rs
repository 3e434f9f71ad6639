//! Claims domain errors
//!
//! One variant per failure kind the boundary needs to distinguish; nothing
//! collapses into a generic internal error when a more specific kind applies.

use thiserror::Error;

use core_kernel::ClaimId;
use crate::claim::{ActorRole, ClaimAction, ClaimStatus};

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Bad input, fixable by the caller
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown claim id
    #[error("Claim not found: {0}")]
    NotFound(ClaimId),

    /// The requested action is not valid from the claim's current status
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: ClaimStatus,
        to: ClaimStatus,
    },

    /// The actor's role is not permitted to perform the action
    #[error("Role {role} is not permitted to {action}")]
    Unauthorized {
        action: ClaimAction,
        role: ActorRole,
    },

    /// Remote ledger call failed or the transaction reverted
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Confirmation wait exceeded its budget; the true outcome is unknown
    #[error("Ledger confirmation timed out during {operation} after {elapsed_ms}ms")]
    LedgerTimeout {
        operation: String,
        elapsed_ms: u64,
    },

    /// The claim store and the ledger disagree; operator intervention required
    #[error("Reconciliation required: {0}")]
    Reconciliation(String),

    /// The claim store failed
    #[error("Store error: {0}")]
    Store(String),
}

impl ClaimError {
    /// Stable machine-checkable kind for API envelopes and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClaimError::Validation(_) => "validation_error",
            ClaimError::NotFound(_) => "not_found",
            ClaimError::InvalidStateTransition { .. } => "invalid_state_transition",
            ClaimError::Unauthorized { .. } => "unauthorized",
            ClaimError::Ledger(_) => "ledger_error",
            ClaimError::LedgerTimeout { .. } => "ledger_timeout",
            ClaimError::Reconciliation(_) => "reconciliation_error",
            ClaimError::Store(_) => "store_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            ClaimError::Validation("x".into()),
            ClaimError::NotFound(ClaimId::new()),
            ClaimError::InvalidStateTransition {
                from: ClaimStatus::Approved,
                to: ClaimStatus::Approved,
            },
            ClaimError::Unauthorized {
                action: ClaimAction::Approve,
                role: ActorRole::Member,
            },
            ClaimError::Ledger("x".into()),
            ClaimError::LedgerTimeout {
                operation: "approve".into(),
                elapsed_ms: 1,
            },
            ClaimError::Reconciliation("x".into()),
            ClaimError::Store("x".into()),
        ];

        let mut kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }
}
