use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    database::PageRequest,
    dto::{
        candidate_dto::{
            AnalyzeCandidatePayload, BulkApprovePayload, CandidateListQuery,
            CreateCandidatePayload, OutreachPayload, StageChangePayload, StatusChangePayload, UpdateCandidatePayload,
        },
        common::ListResponse,
    },
    error::Result,
    middleware::auth::Claims,
    routes::extract::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/candidates",
    responses(
        (status = 201, description = "Candidate created", body = Json<Candidate>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Candidate already exists for this job")
    )
)]
#[axum::debug_handler]
pub async fn create_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(payload): ApiJson<CreateCandidatePayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let candidate = state.candidate_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

#[utoipa::path(
    get,
    path = "/api/v1/candidates",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("stage" = Option<String>, Query, description = "Filter by pipeline stage"),
        ("job_id" = Option<Uuid>, Query, description = "Filter by job"),
        ("source" = Option<String>, Query, description = "Filter by source"),
        ("search" = Option<String>, Query, description = "Search name, email and skills"),
        ("created_from" = Option<String>, Query, description = "Created at or after (RFC 3339)"),
        ("created_to" = Option<String>, Query, description = "Created at or before (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Paginated list of candidates")
    )
)]
#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CandidateListQuery>,
) -> Result<impl IntoResponse> {
    let page = PageRequest::new(query.page, query.per_page);
    let result = state.candidate_service.list(&query.filter(), page).await?;
    Ok(Json(ListResponse::new(result, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/candidates/{id}",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Candidate found", body = Json<Candidate>),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate = state.candidate_service.get(id).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    patch,
    path = "/api/v1/candidates/{id}",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Candidate updated", body = Json<Candidate>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCandidatePayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let candidate = state.candidate_service.update(id, payload).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    delete,
    path = "/api/v1/candidates/{id}",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 204, description = "Candidate deleted"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    state.candidate_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/candidates/{id}/stage",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Stage changed", body = Json<Candidate>),
        (status = 404, description = "Candidate not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
#[axum::debug_handler]
pub async fn change_stage(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<StageChangePayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let candidate = state
        .candidate_service
        .advance_stage(id, payload.stage)
        .await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    post,
    path = "/api/v1/candidates/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Status changed", body = Json<Candidate>),
        (status = 400, description = "Status is derived from the stage"),
        (status = 409, description = "Candidate is in a terminal stage")
    )
)]
#[axum::debug_handler]
pub async fn change_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<StatusChangePayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let candidate = state
        .candidate_service
        .set_status(id, payload.status)
        .await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    post,
    path = "/api/v1/candidates/{id}/analyze",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 202, description = "Analysis queued"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn analyze_candidate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    payload: Option<ApiJson<AnalyzeCandidatePayload>>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let ApiJson(payload) = payload.unwrap_or_else(|| ApiJson(AnalyzeCandidatePayload::default()));
    payload.validate()?;
    let task = state
        .candidate_service
        .request_analysis(id, payload.callback_url, claims.user_id()?)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/api/v1/candidates/{id}/interviews",
    params(
        ("id" = Uuid, Path, description = "Candidate ID"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Interviews of the candidate"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn candidate_interviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = PageRequest::new(query.page, query.per_page);
    let result = state.interview_service.list_for_candidate(id, page).await?;
    Ok(Json(ListResponse::new(result, page)))
}

#[utoipa::path(
    post,
    path = "/api/v1/candidates/{id}/outreach",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 202, description = "Outreach queued"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn send_outreach(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<OutreachPayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let (outreach, task) = state
        .outreach_service
        .request(id, payload, claims.user_id()?)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "outreach": outreach, "task": task })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/candidates/{id}/outreach",
    params(
        ("id" = Uuid, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Outreach history, newest first"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn outreach_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let items = state.outreach_service.history(id).await?;
    Ok(Json(json!({ "items": items })))
}

#[utoipa::path(
    post,
    path = "/api/v1/candidates/bulk-approve",
    responses(
        (status = 200, description = "Per-candidate approval results"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "One or more candidates not found")
    )
)]
#[axum::debug_handler]
pub async fn bulk_approve(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(payload): ApiJson<BulkApprovePayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let report = state
        .candidate_service
        .bulk_approve(payload, claims.user_id()?)
        .await?;
    Ok(Json(report))
}
