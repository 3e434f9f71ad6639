//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the claim domain's ports, built on SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: each repository implements a
//! port trait from `domain_claims`, hiding the database behind it. Queries
//! are bound at runtime so the workspace builds without a live database;
//! the schema is applied idempotently at startup via [`schema::ensure_schema`].

pub mod pool;
pub mod error;
pub mod schema;
pub mod repositories;

pub use pool::{DatabasePool, create_pool, DatabaseConfig};
pub use error::DatabaseError;
pub use schema::ensure_schema;
pub use repositories::{PgClaimStore, PgAuditSink};
