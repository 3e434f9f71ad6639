//! JSON-RPC ledger adapter
//!
//! Talks to a ledger node over JSON-RPC. Each contract function is a named
//! remote call with a fixed positional-argument schema; each state-changing
//! call returns a transaction reference that is then polled for inclusion via
//! the receipt read, whose status flag (1 = success) signals confirmation.
//!
//! The adapter carries a circuit breaker so a down node fails fast instead of
//! stacking up requests, and every confirmation wait is bounded by the
//! configured budget.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use core_kernel::{
    AdapterHealth, CircuitBreakerConfig, ClaimId, DomainPort, HealthCheckResult,
    HealthCheckable, TxRef,
};

use crate::ledger::{
    ConfirmationReceipt, LedgerClaimRecord, LedgerClaimState, LedgerClaimSubmission,
    LedgerDecision, LedgerError, LedgerGateway, LedgerGatewayConfig,
};

/// JSON-RPC error code conventionally used for contract reverts
const REVERT_ERROR_CODE: i64 = -32000;

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

/// Circuit breaker guarding the RPC endpoint
#[derive(Debug)]
struct Circuit {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitState>,
}

#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

impl Circuit {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CircuitState::default()),
        }
    }

    async fn check(&self) -> Result<(), LedgerError> {
        let state = self.inner.lock().await;
        match state.opened_at {
            None => Ok(()),
            Some(opened) => {
                // Half-open once the reset window has elapsed
                if opened.elapsed() >= Duration::from_secs(self.config.reset_timeout_secs) {
                    Ok(())
                } else {
                    Err(LedgerError::Unavailable(
                        "circuit breaker is open".to_string(),
                    ))
                }
            }
        }
    }

    async fn record_success(&self) {
        let mut state = self.inner.lock().await;
        state.consecutive_failures = 0;
        if state.opened_at.is_some() {
            state.half_open_successes += 1;
            if state.half_open_successes >= self.config.success_threshold {
                state.opened_at = None;
                state.half_open_successes = 0;
            }
        }
    }

    async fn record_failure(&self) {
        let mut state = self.inner.lock().await;
        state.half_open_successes = 0;
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.config.failure_threshold {
            state.opened_at = Some(Instant::now());
        }
    }
}

/// Ledger gateway backed by a JSON-RPC node
pub struct RpcLedgerGateway {
    config: LedgerGatewayConfig,
    client: reqwest::Client,
    circuit: Option<Circuit>,
    request_id: AtomicU64,
}

impl RpcLedgerGateway {
    /// Creates a gateway from injected configuration
    pub fn new(config: LedgerGatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.confirmation_timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let circuit = config.circuit_breaker.clone().map(Circuit::new);

        Self {
            config,
            client,
            circuit,
            request_id: AtomicU64::new(0),
        }
    }

    /// Returns the configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        if let Some(ref circuit) = self.circuit {
            circuit.check().await?;
        }

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed) + 1,
            method: method.to_string(),
            params,
        };

        let outcome = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                if let Some(ref circuit) = self.circuit {
                    circuit.record_failure().await;
                }
                return Err(LedgerError::Rpc(e.to_string()));
            }
        };

        let body: JsonRpcResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                if let Some(ref circuit) = self.circuit {
                    circuit.record_failure().await;
                }
                return Err(LedgerError::InvalidResponse(e.to_string()));
            }
        };

        if let Some(ref circuit) = self.circuit {
            circuit.record_success().await;
        }

        if let Some(error) = body.error {
            return Err(if error.code == REVERT_ERROR_CODE {
                LedgerError::Reverted(error.message)
            } else {
                LedgerError::Rpc(format!("{} (code {})", error.message, error.code))
            });
        }

        body.result
            .ok_or_else(|| LedgerError::InvalidResponse("missing result".to_string()))
    }

    /// Issues a state-changing contract call and parses the returned tx hash
    async fn send_transaction(&self, method: &str, params: Value) -> Result<TxRef, LedgerError> {
        let result = self.call(method, params).await?;
        let hash = result
            .as_str()
            .ok_or_else(|| LedgerError::InvalidResponse(format!("{} result is not a transaction hash", method)))?;
        TxRef::new(hash).map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    fn parse_receipt(&self, tx_ref: &TxRef, value: &Value) -> Result<ConfirmationReceipt, LedgerError> {
        let status = value
            .get("status")
            .and_then(parse_quantity)
            .ok_or_else(|| LedgerError::InvalidResponse("receipt missing status".to_string()))?;
        let block_ref = value
            .get("blockNumber")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(ConfirmationReceipt {
            tx_ref: tx_ref.clone(),
            status,
            block_ref,
        })
    }
}

/// Parses a JSON-RPC quantity, which arrives as a 0x-hex string or a number
fn parse_quantity(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => {
            let hex = s.strip_prefix("0x")?;
            u64::from_str_radix(hex, 16).ok()
        }
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn parse_ledger_state(value: &Value) -> Option<LedgerClaimState> {
    match value.as_str()? {
        "submitted" => Some(LedgerClaimState::Submitted),
        "verified" => Some(LedgerClaimState::Verified),
        "approved" => Some(LedgerClaimState::Approved),
        "rejected" => Some(LedgerClaimState::Rejected),
        _ => None,
    }
}

impl DomainPort for RpcLedgerGateway {}

#[async_trait]
impl HealthCheckable for RpcLedgerGateway {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let outcome = self.call("ledger_chainId", json!([])).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match outcome {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(LedgerError::Unavailable(m)) => (AdapterHealth::Degraded, Some(m)),
            Err(e) => (AdapterHealth::Unhealthy, Some(e.to_string())),
        };

        HealthCheckResult {
            adapter_id: "rpc-ledger".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerGateway for RpcLedgerGateway {
    async fn submit_claim(
        &self,
        submission: &LedgerClaimSubmission,
    ) -> Result<TxRef, LedgerError> {
        self.send_transaction(
            "claims_submit",
            json!([
                self.config.contract_ref,
                submission.claim_id.as_uuid().to_string(),
                submission.amount_minor,
                submission.description,
                submission.claimant,
                submission.provider,
                submission.document_hash,
            ]),
        )
        .await
    }

    async fn verify_claim(&self, claim_id: ClaimId) -> Result<TxRef, LedgerError> {
        self.send_transaction(
            "claims_verify",
            json!([self.config.contract_ref, claim_id.as_uuid().to_string()]),
        )
        .await
    }

    async fn approve_claim(
        &self,
        claim_id: ClaimId,
        decision: &LedgerDecision,
    ) -> Result<TxRef, LedgerError> {
        self.send_transaction(
            "claims_approve",
            json!([
                self.config.contract_ref,
                claim_id.as_uuid().to_string(),
                decision.decided_by,
                decision.note,
            ]),
        )
        .await
    }

    async fn reject_claim(&self, claim_id: ClaimId, reason: &str) -> Result<TxRef, LedgerError> {
        self.send_transaction(
            "claims_reject",
            json!([
                self.config.contract_ref,
                claim_id.as_uuid().to_string(),
                reason,
            ]),
        )
        .await
    }

    async fn wait_for_confirmation(
        &self,
        tx_ref: &TxRef,
    ) -> Result<ConfirmationReceipt, LedgerError> {
        let budget = Duration::from_millis(self.config.confirmation_timeout_ms);
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let started = Instant::now();

        let wait = async {
            loop {
                let result = self
                    .call("claims_getTransactionReceipt", json!([tx_ref.as_str()]))
                    .await?;
                if !result.is_null() {
                    return self.parse_receipt(tx_ref, &result);
                }
                tokio::time::sleep(poll).await;
            }
        };

        match tokio::time::timeout(budget, wait).await {
            Ok(receipt) => receipt,
            Err(_) => Err(LedgerError::Timeout {
                operation: "wait_for_confirmation".to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }

    async fn claim_record(
        &self,
        claim_id: ClaimId,
    ) -> Result<Option<LedgerClaimRecord>, LedgerError> {
        let result = self
            .call(
                "claims_getClaim",
                json!([self.config.contract_ref, claim_id.as_uuid().to_string()]),
            )
            .await?;

        if result.is_null() {
            return Ok(None);
        }

        let state = result
            .get("state")
            .and_then(parse_ledger_state)
            .ok_or_else(|| LedgerError::InvalidResponse("claim record missing state".to_string()))?;
        let tx_ref = result
            .get("txRef")
            .and_then(Value::as_str)
            .and_then(|s| TxRef::new(s).ok())
            .ok_or_else(|| LedgerError::InvalidResponse("claim record missing txRef".to_string()))?;
        let block_ref = result
            .get("blockRef")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Some(LedgerClaimRecord {
            claim_id,
            state,
            tx_ref,
            block_ref,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_forms() {
        assert_eq!(parse_quantity(&json!("0x1")), Some(1));
        assert_eq!(parse_quantity(&json!("0x10")), Some(16));
        assert_eq!(parse_quantity(&json!(1)), Some(1));
        assert_eq!(parse_quantity(&json!("bogus")), None);
        assert_eq!(parse_quantity(&json!(null)), None);
    }

    #[test]
    fn test_parse_ledger_state() {
        assert_eq!(
            parse_ledger_state(&json!("approved")),
            Some(LedgerClaimState::Approved)
        );
        assert_eq!(parse_ledger_state(&json!("unknown")), None);
    }

    #[tokio::test]
    async fn test_circuit_opens_after_threshold() {
        let circuit = Circuit::new(CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout_secs: 60,
            success_threshold: 1,
        });

        assert!(circuit.check().await.is_ok());
        circuit.record_failure().await;
        assert!(circuit.check().await.is_ok());
        circuit.record_failure().await;
        assert!(matches!(
            circuit.check().await,
            Err(LedgerError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_circuit_closes_after_success() {
        let circuit = Circuit::new(CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout_secs: 0,
            success_threshold: 1,
        });

        circuit.record_failure().await;
        // Reset window of zero puts the circuit straight into half-open
        assert!(circuit.check().await.is_ok());
        circuit.record_success().await;
        assert!(circuit.check().await.is_ok());
    }
}
