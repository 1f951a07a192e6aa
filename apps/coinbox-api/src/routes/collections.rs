//! Collection CRUD.
//!
//! ## Write Path
//! ```text
//! JSON body
//!    │  malformed JSON ─────────────────────────────► 400
//!    │  unknown id (update) ────────────────────────► 404
//!    ▼
//! validate_new / validate_patch (today from Clock)
//!    │  field errors ───────────────────────────────► 400 + details
//!    ▼
//! candidate (date, round, location)
//!    │  owned by another record ────────────────────► 409
//!    ▼
//! INSERT / UPDATE
//!    │  UNIQUE index lost a race ───────────────────► 409
//!    ▼
//! record + metrics
//! ```

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::{debug, info};

use coinbox_core::metrics::CollectionWithMetrics;
use coinbox_core::validation::{
    ensure_unique_identity, validate_list_params, validate_new, validate_patch,
};
use coinbox_core::{
    CollectionIdentity, CollectionPayload, CollectionRecord, CoreError, CoreResult, ListParams,
    Pagination,
};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// Response Bodies
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CollectionList {
    pub collections: Vec<CollectionWithMetrics>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_id(raw: &str) -> CoreResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::MalformedInput("Invalid collection ID".to_string()))
}

fn read_body<T>(body: Result<Json<T>, JsonRejection>) -> CoreResult<T> {
    body.map(|Json(payload)| payload).map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Unreadable request body");
        CoreError::MalformedInput("Invalid JSON body".to_string())
    })
}

/// Fails with 409 if another record owns `identity`.
async fn ensure_identity_free(
    state: &AppState,
    identity: &CollectionIdentity,
    exclude_id: Option<i64>,
) -> ApiResult<()> {
    let clash = state
        .db
        .collections()
        .find_by_identity(identity, exclude_id)
        .await?;

    ensure_unique_identity(identity, clash.iter(), exclude_id)?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/collections`
pub async fn list_collections(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<CollectionList>> {
    let Query(params) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = validate_list_params(&params).map_err(ApiError::invalid_query)?;

    let (records, total) = state.db.collections().list(&query).await?;

    Ok(Json(CollectionList {
        collections: records.into_iter().map(CollectionWithMetrics::from).collect(),
        pagination: Pagination::new(query.page, total),
    }))
}

/// `POST /api/collections`
pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<CollectionPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CollectionWithMetrics>)> {
    let payload = read_body(body)?;
    let fields = validate_new(&payload, state.clock.today()).map_err(ApiError::invalid_body)?;

    ensure_identity_free(&state, &fields.identity(), None).await?;

    let record = state.db.collections().insert(&fields, user.id).await?;

    info!(
        id = record.id,
        identity = %record.identity(),
        user_id = user.id,
        "Collection recorded"
    );
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// `GET /api/collections/{id}`
pub async fn get_collection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<CollectionWithMetrics>> {
    let id = parse_id(&id)?;

    let record = state
        .db
        .collections()
        .get_by_id(id)
        .await?
        .ok_or(CoreError::CollectionNotFound(id))?;

    Ok(Json(record.into()))
}

/// `PUT /api/collections/{id}`
///
/// Only the fields present in the body change. An unknown id is a 404 even
/// when the body is also invalid. When date, round or location change, the
/// merged record is checked for duplicates with this record excluded.
pub async fn update_collection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<CollectionPayload>, JsonRejection>,
) -> ApiResult<Json<CollectionWithMetrics>> {
    let id = parse_id(&id)?;
    let payload = read_body(body)?;

    let repo = state.db.collections();
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or(CoreError::CollectionNotFound(id))?;

    let patch = validate_patch(&payload, state.clock.today()).map_err(ApiError::invalid_body)?;

    let candidate = CollectionRecord {
        fields: patch.apply_to(&existing.fields),
        ..existing
    };

    if patch.touches_identity() {
        ensure_identity_free(&state, &candidate.identity(), Some(id)).await?;
    }

    let record = repo.update(&candidate).await?;

    info!(id, identity = %record.identity(), "Collection updated");
    Ok(Json(record.into()))
}

/// `DELETE /api/collections/{id}`
pub async fn delete_collection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    let id = parse_id(&id)?;

    state.db.collections().delete(id).await?;

    info!(id, "Collection deleted");
    Ok(Json(Deleted {
        message: "Collection deleted successfully",
    }))
}
