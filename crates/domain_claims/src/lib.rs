//! Claims Lifecycle Domain
//!
//! This crate implements the claim lifecycle from submission through
//! verification, adjudication, and payment, with every adjudication step
//! anchored to an external append-only ledger.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Submitted -> (Under Review) -> Verified -> Approved/Rejected -> Paid
//! ```
//!
//! The [`lifecycle::ClaimLifecycleService`] is the only writer of claim
//! state. It serializes operations per claim, refuses to touch the store for
//! any ledger transaction that was not confirmed, and appends an audit record
//! for every transition it commits.

pub mod claim;
pub mod ports;
pub mod ledger;
pub mod adapters;
pub mod audit;
pub mod lifecycle;
pub mod error;

pub use claim::{Claim, ClaimStatus, ClaimAction, Actor, ActorRole, SubmitClaim};
pub use ports::{ClaimStore, ClaimQuery, SortOrder};
pub use ports::memory::MemoryClaimStore;
pub use audit::memory::MemoryAuditSink;
pub use ledger::{
    LedgerGateway, LedgerGatewayConfig, LedgerError,
    LedgerClaimSubmission, LedgerDecision, ConfirmationReceipt,
    LedgerClaimRecord, LedgerClaimState,
};
pub use audit::{AuditRecord, AuditSink};
pub use lifecycle::{ClaimLifecycleService, ReconciliationReport};
pub use error::ClaimError;
