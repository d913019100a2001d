//! HTTP endpoints for the chatpool server.
//!
//! - `GET  /health` - liveness probe
//! - `GET  /org/:slug/salt` - public salt lookup for login
//! - `POST /org` - organization signup
//! - `POST /conversations` - authenticated encrypted ingest (idempotent)
//! - `GET  /conversations` - authenticated cursor-paged listing

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use pool_core::{validate_slug, ValidationError};
use pool_types::{
    encoding, CreateOrgRequest, ImportConversationRequest, OrgSummary, RemoteConversation,
    SaltResponse, SyncPage,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::authenticate;
use crate::config::Config;
use crate::error::ApiError;
use crate::storage::{InsertConversation, SqliteStorage};

/// Shared state for all handlers.
pub struct AppState {
    /// The org/conversation store.
    pub storage: SqliteStorage,
    /// Loaded configuration.
    pub config: Config,
}

/// Build the router with all endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/org", post(create_org_handler))
        .route("/org/:slug/salt", get(salt_handler))
        .route(
            "/conversations",
            post(import_handler).get(list_handler),
        )
        .layer(Extension(state))
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn salt_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let org = state
        .storage
        .get_org_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(SaltResponse {
        salt: encoding::to_base64(&org.salt),
    })
    .into_response())
}

async fn create_org_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<CreateOrgRequest>,
) -> Result<Response, ApiError> {
    if req.name.trim().is_empty() || req.slug.is_empty() || req.salt.is_empty() || req.auth_key_hash.is_empty()
    {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }
    validate_slug(&req.slug).map_err(|e: ValidationError| ApiError::BadRequest(e.to_string()))?;

    let salt = encoding::from_base64(&req.salt)
        .map_err(|_| ApiError::BadRequest("salt is not valid base64".into()))?;
    if salt.len() != 16 {
        return Err(ApiError::BadRequest("salt must be 16 bytes".into()));
    }
    if req.auth_key_hash.len() != 64 || !req.auth_key_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::BadRequest(
            "auth_key_hash must be a 256-bit hex digest".into(),
        ));
    }

    if state.storage.get_org_by_slug(&req.slug).await?.is_some() {
        return Err(ApiError::SlugTaken);
    }

    let org = state
        .storage
        .create_org(&req.name, &req.slug, &salt, &req.auth_key_hash)
        .await?;
    tracing::info!(slug = %org.slug, "organization created");

    Ok((
        StatusCode::CREATED,
        Json(OrgSummary {
            id: org.id,
            name: org.name,
            slug: org.slug,
            created_at: org.created_at,
        }),
    )
        .into_response())
}

async fn import_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ImportConversationRequest>,
) -> Result<Response, ApiError> {
    let org = authenticate(&state.storage, &headers).await?;

    if req.nonce.is_empty() || req.ciphertext.is_empty() || req.platform.is_empty() || req.external_id.is_empty()
    {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }
    let nonce = encoding::from_base64(&req.nonce)
        .map_err(|_| ApiError::BadRequest("nonce is not valid base64".into()))?;
    if nonce.len() != 24 {
        return Err(ApiError::BadRequest("nonce must be 24 bytes".into()));
    }
    let ciphertext = encoding::from_base64(&req.ciphertext)
        .map_err(|_| ApiError::BadRequest("ciphertext is not valid base64".into()))?;
    if ciphertext.len() > state.config.storage.max_ciphertext_bytes {
        return Err(ApiError::BadRequest("ciphertext too large".into()));
    }

    let inserted = state
        .storage
        .insert_conversation(InsertConversation {
            org_id: org.id,
            nonce,
            ciphertext,
            platform: req.platform,
            external_id: req.external_id,
        })
        .await?;

    match inserted {
        Some(id) => Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response()),
        None => Ok(Json(serde_json::json!({ "deduplicated": true })).into_response()),
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    after: Option<String>,
    limit: Option<u32>,
}

async fn list_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let org = authenticate(&state.storage, &headers).await?;

    let cap = state.config.storage.page_limit;
    let limit = params.limit.unwrap_or(cap).clamp(1, cap);
    let (rows, has_more) = state
        .storage
        .conversations_after(&org.id, params.after.as_deref(), limit)
        .await?;

    let conversations = rows
        .into_iter()
        .map(|row| RemoteConversation {
            id: row.id,
            nonce: encoding::to_base64(&row.nonce),
            ciphertext: encoding::to_base64(&row.ciphertext),
            platform: row.platform,
            external_id: row.external_id,
            imported_at: row.imported_at,
        })
        .collect();

    Ok(Json(SyncPage {
        conversations,
        has_more,
    })
    .into_response())
}
