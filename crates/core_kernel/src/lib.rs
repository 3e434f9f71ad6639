//! Core Kernel - Foundational types and utilities for the claim ledger system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers and external reference values
//! - Port abstractions shared by storage and ledger adapters

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{ClaimId, PartyId, AuditEventId, DocumentRef, TxRef, RefError};
pub use error::CoreError;
pub use ports::{
    DomainPort, PortError,
    HealthCheckable, HealthCheckResult, AdapterHealth,
    CircuitBreakerConfig,
};
