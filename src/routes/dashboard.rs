use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::dashboard_dto::TrendsQuery,
    error::Result,
    routes::extract::{ApiPath, ApiQuery},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/overview",
    responses(
        (status = 200, description = "Pipeline totals", body = Json<OverviewResponse>)
    )
)]
#[axum::debug_handler]
pub async fn overview(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.dashboard_service.overview().await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/trends",
    params(
        ("months" = Option<u32>, Query, description = "Months to include, 1 to 24, default 6")
    ),
    responses(
        (status = 200, description = "Monthly series", body = Json<TrendsResponse>),
        (status = 400, description = "months out of range")
    )
)]
#[axum::debug_handler]
pub async fn trends(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TrendsQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;
    let series = state.dashboard_service.trends(query.months).await?;
    Ok(Json(series))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/pipeline/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Candidates of the job per stage", body = Json<PipelineResponse>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn pipeline(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.dashboard_service.pipeline(job_id).await?;
    Ok(Json(view))
}
