//! HTTP boundary tests
//!
//! Runs the full router in-process against the in-memory store and ledger,
//! exercising authentication, the lifecycle routes, and the error envelopes.

use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use domain_claims::adapters::MemoryLedger;
use domain_claims::{ClaimLifecycleService, MemoryAuditSink, MemoryClaimStore};
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::fixtures::StringFixtures;

const JWT_SECRET: &str = "test-secret";

struct TestApp {
    server: TestServer,
    ledger: Arc<MemoryLedger>,
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryClaimStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let lifecycle = Arc::new(ClaimLifecycleService::new(
        store,
        ledger.clone(),
        audit,
    ));

    let config = ApiConfig {
        jwt_secret: JWT_SECRET.to_string(),
        store_backend: "memory".to_string(),
        ledger_backend: "memory".to_string(),
        ..Default::default()
    };

    let state = AppState {
        lifecycle,
        ledger_health: ledger.clone(),
        config,
    };

    TestApp {
        server: TestServer::new(create_router(state)).expect("router builds"),
        ledger,
    }
}

fn bearer(roles: &[&str]) -> HeaderValue {
    let token = create_token(
        "user-1",
        roles.iter().map(|r| r.to_string()).collect(),
        JWT_SECRET,
        3600,
    )
    .unwrap();
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn submit_body() -> Value {
    json!({
        "claimant_id": Uuid::new_v4(),
        "provider_id": Uuid::new_v4(),
        "amount": "2500",
        "description": "Inpatient procedure",
        "diagnosis": "Knee Surgery",
        "treatment": "Arthroscopy",
        "document_ref": StringFixtures::document_hash(),
    })
}

async fn submit_claim(app: &TestApp) -> Value {
    let response = app
        .server
        .post("/api/v1/claims")
        .add_header(header::AUTHORIZATION, bearer(&["member"]))
        .json(&submit_body())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()
}

// ============================================================================
// Health and authentication
// ============================================================================

#[tokio::test]
async fn health_endpoints_are_public() {
    let app = test_app();

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app.server.get("/health/ready").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = test_app();

    let response = app.server.get("/api/v1/claims").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unrecognized_roles_are_forbidden() {
    let app = test_app();

    let response = app
        .server
        .post("/api/v1/claims")
        .add_header(header::AUTHORIZATION, bearer(&["superuser"]))
        .json(&submit_body())
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Lifecycle flow
// ============================================================================

#[tokio::test]
async fn full_lifecycle_over_http() {
    let app = test_app();

    let claim = submit_claim(&app).await;
    assert_eq!(claim["status"], "submitted");
    assert!(claim["ledger_tx_ref"].is_string());
    let id = claim["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/verify", id))
        .add_header(header::AUTHORIZATION, bearer(&["approver"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "verified");

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/approve", id))
        .add_header(header::AUTHORIZATION, bearer(&["approver"]))
        .json(&json!({ "note": "covered by the plan" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let approved = response.json::<Value>();
    assert_eq!(approved["status"], "approved");
    assert!(approved["ledger_tx_ref"].is_string());

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/pay", id))
        .add_header(header::AUTHORIZATION, bearer(&["admin"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "paid");

    let response = app
        .server
        .get(&format!("/api/v1/claims/{}/audit", id))
        .add_header(header::AUTHORIZATION, bearer(&["auditor"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let trail = response.json::<Vec<Value>>();
    let actions: Vec<_> = trail.iter().map(|r| r["action"].as_str().unwrap()).collect();
    assert_eq!(actions, vec!["submit", "verify", "approve", "pay"]);
}

#[tokio::test]
async fn listing_filters_by_status() {
    let app = test_app();

    submit_claim(&app).await;
    submit_claim(&app).await;

    let response = app
        .server
        .get("/api/v1/claims")
        .add_query_param("status", "submitted")
        .add_header(header::AUTHORIZATION, bearer(&["auditor"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Vec<Value>>().len(), 2);

    let response = app
        .server
        .get("/api/v1/claims")
        .add_query_param("status", "approved")
        .add_header(header::AUTHORIZATION, bearer(&["auditor"]))
        .await;
    assert_eq!(response.json::<Vec<Value>>().len(), 0);
}

// ============================================================================
// Error envelopes
// ============================================================================

#[tokio::test]
async fn empty_rejection_reason_is_a_validation_error() {
    let app = test_app();

    let claim = submit_claim(&app).await;
    let id = claim["id"].as_str().unwrap();

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/reject", id))
        .add_header(header::AUTHORIZATION, bearer(&["approver"]))
        .json(&json!({ "reason": "" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"], "validation_error");

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/reject", id))
        .add_header(header::AUTHORIZATION, bearer(&["approver"]))
        .json(&json!({ "reason": "Insufficient documentation" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let rejected = response.json::<Value>();
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["rejection_reason"], "Insufficient documentation");
}

#[tokio::test]
async fn premature_approval_is_a_state_conflict() {
    let app = test_app();

    let claim = submit_claim(&app).await;
    let id = claim["id"].as_str().unwrap();

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/approve", id))
        .add_header(header::AUTHORIZATION, bearer(&["approver"]))
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>()["error"],
        "invalid_state_transition"
    );
}

#[tokio::test]
async fn member_cannot_verify() {
    let app = test_app();

    let claim = submit_claim(&app).await;
    let id = claim["id"].as_str().unwrap();

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/verify", id))
        .add_header(header::AUTHORIZATION, bearer(&["member"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"], "unauthorized");
}

#[tokio::test]
async fn unknown_claim_is_not_found() {
    let app = test_app();

    let response = app
        .server
        .get(&format!("/api/v1/claims/{}", Uuid::new_v4()))
        .add_header(header::AUTHORIZATION, bearer(&["auditor"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "not_found");
}

#[tokio::test]
async fn unknown_body_fields_are_rejected() {
    let app = test_app();

    let mut body = submit_body();
    body["unexpected"] = json!(true);

    let response = app
        .server
        .post("/api/v1/claims")
        .add_header(header::AUTHORIZATION, bearer(&["member"]))
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn reconcile_reports_agreement_and_divergence() {
    let app = test_app();

    let claim = submit_claim(&app).await;
    let id = claim["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/reconcile", id))
        .add_header(header::AUTHORIZATION, bearer(&["admin"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let report = response.json::<Value>();
    assert_eq!(report["in_agreement"], true);
    assert_eq!(report["store_status"], "submitted");

    // Wipe the ledger's record to manufacture divergence
    let claim_id = id.parse::<Uuid>().unwrap();
    app.ledger.drop_record(claim_id.into()).await;

    let response = app
        .server
        .post(&format!("/api/v1/claims/{}/reconcile", id))
        .add_header(header::AUTHORIZATION, bearer(&["admin"]))
        .await;
    assert_eq!(
        response.status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(response.json::<Value>()["error"], "reconciliation_error");
}
