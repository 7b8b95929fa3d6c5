//! Handlers for recording, listing, charting and deleting metrics.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mtrack_core::chart::ChartQuery;
use mtrack_core::recorder::NewMetric;
use mtrack_core::service::{ListQuery, MetricLookup};
use mtrack_core::types::MetricId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, QueryParams};
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

/// Query parameters identifying the owner of a metric.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerParams {
    pub user_id: String,
}

/// POST /api/v1/metrics
///
/// Record a reading. Responds in the unit and zone it was submitted in.
pub async fn create_metric(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewMetric>,
) -> AppResult<impl IntoResponse> {
    let view = state.metrics.add_metric(input).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/metrics
///
/// All metrics of a type for a user, most recent first.
pub async fn list_metrics(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let views = state.metrics.list_metrics(params).await?;

    Ok(Json(ListResponse::new(views)))
}

/// GET /api/v1/metrics/chart
///
/// One point per calendar day in the requested zone, zero-filled.
pub async fn get_chart(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ChartQuery>,
) -> AppResult<impl IntoResponse> {
    let series = state.metrics.chart(params).await?;

    Ok(Json(DataResponse { data: series }))
}

/// GET /api/v1/metrics/{id}
pub async fn get_metric(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams<MetricLookup>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let view = state.metrics.get_metric(id, params).await?;

    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/metrics/{id}
pub async fn delete_metric(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(params): QueryParams<OwnerParams>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    state.metrics.delete_metric(id, &params.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> AppResult<MetricId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid metric id: {raw}")))
}
