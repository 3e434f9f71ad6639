//! Ledger gateway adapters
//!
//! Two implementations of [`crate::ledger::LedgerGateway`]:
//!
//! - [`memory_ledger::MemoryLedger`]: deterministic in-process ledger used by
//!   tests and by deployments running without a chain node
//! - [`rpc_ledger::RpcLedgerGateway`]: JSON-RPC adapter for a real ledger node

pub mod memory_ledger;
pub mod rpc_ledger;

pub use memory_ledger::{MemoryLedger, LedgerFault};
pub use rpc_ledger::RpcLedgerGateway;
