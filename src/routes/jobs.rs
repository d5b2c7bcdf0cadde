use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    database::PageRequest,
    dto::{
        candidate_dto::JobCandidatesQuery,
        common::ListResponse,
        job_dto::{CreateJobPayload, JobListQuery, UpdateJobPayload},
    },
    error::Result,
    middleware::auth::Claims,
    routes::extract::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    responses(
        (status = 201, description = "Job created", body = Json<JobResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Recruiter role required")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(payload): ApiJson<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let job = state.job_service.create(payload, claims.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("department" = Option<String>, Query, description = "Filter by department"),
        ("employment_type" = Option<String>, Query, description = "Filter by employment type"),
        ("search" = Option<String>, Query, description = "Search title, description and location")
    ),
    responses(
        (status = 200, description = "Paginated list of jobs")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<JobListQuery>,
) -> Result<impl IntoResponse> {
    let page = PageRequest::new(query.page, query.per_page);
    let result = state.job_service.list(&query.filter(), page).await?;
    Ok(Json(ListResponse::new(result, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = Json<Job>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get(id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    patch,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job updated", body = Json<Job>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let job = state.job_service.update(id, payload).await?;
    Ok(Json(job))
}

#[utoipa::path(
    delete,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "A detached candidate would duplicate an existing one")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    state.job_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}/candidates",
    params(
        ("id" = Uuid, Path, description = "Job ID"),
        ("stage" = Option<String>, Query, description = "Filter by pipeline stage"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Candidates attached to the job"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn job_candidates(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<JobCandidatesQuery>,
) -> Result<impl IntoResponse> {
    let page = PageRequest::new(query.page, query.per_page);
    let result = state
        .candidate_service
        .list_for_job(id, query.stage, query.status, page)
        .await?;
    Ok(Json(ListResponse::new(result, page)))
}
