//! Schema bootstrap
//!
//! Applies the claims schema idempotently at startup. Deployments with a
//! managed migration pipeline can skip this and run the same DDL there.

use sqlx::PgPool;
use tracing::info;

use crate::error::DatabaseError;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS claims (
    claim_id UUID PRIMARY KEY,
    claimant_id UUID NOT NULL,
    provider_id UUID NOT NULL,
    amount NUMERIC(18, 2) NOT NULL CHECK (amount > 0),
    currency TEXT NOT NULL,
    description TEXT NOT NULL,
    diagnosis TEXT NOT NULL,
    treatment TEXT NOT NULL,
    status TEXT NOT NULL,
    rejection_reason TEXT,
    dispute_message TEXT,
    document_ref TEXT,
    ledger_tx_ref TEXT,
    version BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_claims_status_created
    ON claims (status, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_claims_claimant ON claims (claimant_id);
CREATE INDEX IF NOT EXISTS idx_claims_provider ON claims (provider_id);

CREATE TABLE IF NOT EXISTS claim_audit (
    event_id UUID PRIMARY KEY,
    claim_id UUID NOT NULL,
    action TEXT NOT NULL,
    actor TEXT NOT NULL,
    actor_role TEXT NOT NULL,
    resulting_status TEXT NOT NULL,
    ledger_tx_ref TEXT,
    recorded_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_claim_audit_claim
    ON claim_audit (claim_id, recorded_at);
"#;

/// Creates the claims tables and indexes if they do not exist
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::SchemaFailed(e.to_string()))?;

    info!("Database schema ready");
    Ok(())
}
