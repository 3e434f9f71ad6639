//! Claims handlers
//!
//! Thin translation layer: validate the request body, resolve the acting
//! identity from the token claims, delegate to the lifecycle service, and map
//! the result into the response DTOs.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, DocumentRef, Money, PartyId};
use domain_claims::claim::{Actor, SubmitClaim};
use domain_claims::ports::{ClaimQuery, SortOrder};

use crate::auth::{actor_from_claims, Claims};
use crate::dto::claims::*;
use crate::error::ApiError;
use crate::AppState;

fn actor(claims: &Claims) -> Result<Actor, ApiError> {
    actor_from_claims(claims).map_err(|e| ApiError::Forbidden(e.to_string()))
}

fn validated<T: Validate>(request: T) -> Result<T, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    Ok(request)
}

/// Submits a new claim
pub async fn submit_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<SubmitClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let request = validated(request)?;
    let actor = actor(&claims)?;

    let currency = request
        .currency
        .as_deref()
        .unwrap_or("USD")
        .parse()
        .map_err(|e| ApiError::validation(format!("currency: {}", e)))?;
    let document_ref = request
        .document_ref
        .map(DocumentRef::new)
        .transpose()
        .map_err(|e| ApiError::validation(format!("document_ref: {}", e)))?;

    let input = SubmitClaim {
        claimant_id: PartyId::from_uuid(request.claimant_id),
        provider_id: PartyId::from_uuid(request.provider_id),
        amount: Money::new(request.amount, currency),
        description: request.description,
        diagnosis: request.diagnosis,
        treatment: request.treatment,
        document_ref,
    };

    let claim = state.lifecycle.submit(input, &actor).await?;
    Ok(Json(claim.into()))
}

/// Lists claims
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<ListClaimsQuery>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let order = match query.order.as_deref() {
        None | Some("newest") => SortOrder::NewestFirst,
        Some("oldest") => SortOrder::OldestFirst,
        Some(other) => {
            return Err(ApiError::validation(format!(
                "order must be 'newest' or 'oldest', got '{}'",
                other
            )))
        }
    };

    let claims = state
        .lifecycle
        .list_claims(ClaimQuery {
            status: query.status,
            claimant_id: query.claimant_id.map(PartyId::from_uuid),
            provider_id: query.provider_id.map(PartyId::from_uuid),
            order,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;

    Ok(Json(claims.into_iter().map(ClaimResponse::from).collect()))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.lifecycle.get_claim(ClaimId::from_uuid(id)).await?;
    Ok(Json(claim.into()))
}

/// Verifies a claim against the ledger
pub async fn verify_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let actor = actor(&claims)?;
    let claim = state
        .lifecycle
        .verify(ClaimId::from_uuid(id), &actor)
        .await?;
    Ok(Json(claim.into()))
}

/// Records a claimant dispute
pub async fn dispute_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<DisputeClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let request = validated(request)?;
    let actor = actor(&claims)?;
    let claim = state
        .lifecycle
        .dispute(ClaimId::from_uuid(id), &actor, &request.message)
        .await?;
    Ok(Json(claim.into()))
}

/// Approves a claim
pub async fn approve_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApproveClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let request = validated(request)?;
    let actor = actor(&claims)?;
    let claim = state
        .lifecycle
        .approve(ClaimId::from_uuid(id), &actor, request.note.as_deref())
        .await?;
    Ok(Json(claim.into()))
}

/// Rejects a claim with a reason
pub async fn reject_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let request = validated(request)?;
    let actor = actor(&claims)?;
    let claim = state
        .lifecycle
        .reject(ClaimId::from_uuid(id), &actor, &request.reason)
        .await?;
    Ok(Json(claim.into()))
}

/// Marks an approved claim as paid
pub async fn pay_claim(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let actor = actor(&claims)?;
    let claim = state.lifecycle.pay(ClaimId::from_uuid(id), &actor).await?;
    Ok(Json(claim.into()))
}

/// Returns the audit trail for a claim
pub async fn claim_audit(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditRecordResponse>>, ApiError> {
    let trail = state.lifecycle.audit_trail(ClaimId::from_uuid(id)).await?;
    Ok(Json(
        trail.into_iter().map(AuditRecordResponse::from).collect(),
    ))
}

/// Runs the reconciliation pass for one claim
pub async fn reconcile_claim(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReconciliationResponse>, ApiError> {
    let report = state.lifecycle.reconcile(ClaimId::from_uuid(id)).await?;
    Ok(Json(report.into()))
}
