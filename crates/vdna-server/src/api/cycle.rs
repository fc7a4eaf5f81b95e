use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vdna_pipeline::RunReport;

use crate::cycle::CycleRunError;
use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct PipelineRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct PipelineRunItem {
    run_id: Uuid,
    trigger_source: String,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    jobs_created: i32,
    report: Option<serde_json::Value>,
    error_message: Option<String>,
}

/// `POST /api/v1/viral-cycle/run`: run the full cycle and return its report.
pub(super) async fn trigger_cycle(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RunReport>>, ApiError> {
    match state.cycle.run("http").await {
        Ok(report) => Ok(Json(ApiResponse {
            data: report,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(CycleRunError::InProgress) => Err(ApiError::new(
            req_id.0,
            "conflict",
            "a viral cycle is already running",
        )),
        Err(CycleRunError::Pipeline(e)) => Err(ApiError::new(
            req_id.0,
            "upstream_unavailable",
            e.to_string(),
        )),
        Err(CycleRunError::Db(e)) => Err(map_db_error(req_id.0, &e)),
    }
}

/// `GET /api/v1/viral-cycle/runs`: most recent runs, newest first.
pub(super) async fn list_pipeline_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PipelineRunsQuery>,
) -> Result<Json<ApiResponse<Vec<PipelineRunItem>>>, ApiError> {
    let rows = vdna_db::list_pipeline_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| PipelineRunItem {
            run_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            jobs_created: row.jobs_created,
            report: row.report,
            error_message: row.error_message,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
