//! Scheduled configuration endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::scheduled_config::{
    ConfigQueryResponse, HistoryQuery, HistoryResponse, ListLatestQuery, ListLatestResponse,
    OutdatedQuery, OutdatedResponse, ScheduledConfigResponse,
};
use domain::models::CreateScheduledConfigRequest;
use domain::ScheduledConfigError;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::middleware::metrics::record_entry_created;

/// Get the value currently in effect for a key.
///
/// GET /api/v1/configs/:key
pub async fn get_config(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ConfigQueryResponse>, ApiError> {
    let current = state.service.get(&key).await?;
    Ok(Json(current.into()))
}

/// List the most recently created entry of every key.
///
/// GET /api/v1/configs?pageIndex=<n>&pageSize=<n>&sort=<field[:dir],...>
pub async fn list_latest(
    State(state): State<AppState>,
    Query(query): Query<ListLatestQuery>,
) -> Result<Json<ListLatestResponse>, ApiError> {
    let pagination = &state.config.pagination;
    let page = query
        .page_request(pagination.default_page_size, pagination.max_page_size)
        .map_err(ScheduledConfigError::from)?;
    let sort = query
        .entry_sort()
        .map_err(ScheduledConfigError::InvalidSort)?;

    let latest = state.service.list_latest(page, &sort).await?;
    Ok(Json(latest.into()))
}

/// Schedule a new value for a key.
///
/// POST /api/v1/configs
pub async fn create_config(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateScheduledConfigRequest>,
) -> Result<(StatusCode, Json<ScheduledConfigResponse>), ApiError> {
    let entry = state.service.set(request).await?;
    record_entry_created();
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Prior revisions of a key, newest first.
///
/// GET /api/v1/configs/:key/history?before=<timestamp>
pub async fn get_history(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let history = state.service.history(&key, query.before).await?;
    Ok(Json(history.into()))
}

/// Entries superseded by a later effective entry of the same key.
///
/// GET /api/v1/outdated?at=<timestamp>
pub async fn list_outdated(
    State(state): State<AppState>,
    Query(query): Query<OutdatedQuery>,
) -> Result<Json<OutdatedResponse>, ApiError> {
    let outdated = state.service.outdated(query.at).await?;
    Ok(Json(outdated.into()))
}
