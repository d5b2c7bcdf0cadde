use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    database::PageRequest,
    dto::{
        common::ListResponse,
        interview_dto::{
            AvailabilityQuery, AvailabilityResponse, CancelInterviewPayload, FeedbackPayload,
            InterviewListQuery, RescheduleInterviewPayload, ScheduleInterviewPayload,
        },
    },
    error::Result,
    middleware::auth::Claims,
    routes::extract::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/interviews",
    responses(
        (status = 201, description = "Interview scheduled", body = Json<Interview>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Slot unavailable or candidate in a terminal stage"),
        (status = 502, description = "Calendar provider failed")
    )
)]
#[axum::debug_handler]
pub async fn schedule_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(payload): ApiJson<ScheduleInterviewPayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let interview = state.interview_service.schedule(payload).await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

#[utoipa::path(
    get,
    path = "/api/v1/interviews",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("candidate_id" = Option<Uuid>, Query, description = "Filter by candidate"),
        ("job_id" = Option<Uuid>, Query, description = "Filter by job"),
        ("interviewer_id" = Option<Uuid>, Query, description = "Filter by interviewer"),
        ("from" = Option<String>, Query, description = "Scheduled at or after (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Scheduled at or before (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Paginated list of interviews")
    )
)]
#[axum::debug_handler]
pub async fn list_interviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<InterviewListQuery>,
) -> Result<impl IntoResponse> {
    let page = PageRequest::new(query.page, query.per_page);
    let result = state.interview_service.list(&query.filter(), page).await?;
    Ok(Json(ListResponse::new(result, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/interviews/availability",
    params(
        ("interviewer_id" = Uuid, Query, description = "Interviewer"),
        ("from" = String, Query, description = "Window start (RFC 3339)"),
        ("to" = String, Query, description = "Window end (RFC 3339)"),
        ("duration_minutes" = Option<i32>, Query, description = "Slot length, default 60")
    ),
    responses(
        (status = 200, description = "Free slots", body = Json<AvailabilityResponse>),
        (status = 502, description = "Calendar provider failed")
    )
)]
#[axum::debug_handler]
pub async fn availability(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<impl IntoResponse> {
    let slots = state.interview_service.availability(&query).await?;
    Ok(Json(AvailabilityResponse {
        interviewer_id: query.interviewer_id,
        slots,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/interviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Interview found", body = Json<Interview>),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn get_interview(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let interview = state.interview_service.get(id).await?;
    Ok(Json(interview))
}

#[utoipa::path(
    post,
    path = "/api/v1/interviews/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Interview cancelled", body = Json<Interview>),
        (status = 409, description = "Interview is not scheduled")
    )
)]
#[axum::debug_handler]
pub async fn cancel_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    payload: Option<ApiJson<CancelInterviewPayload>>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let ApiJson(payload) = payload.unwrap_or_else(|| ApiJson(CancelInterviewPayload::default()));
    let interview = state.interview_service.cancel(id, payload).await?;
    Ok(Json(interview))
}

#[utoipa::path(
    post,
    path = "/api/v1/interviews/{id}/reschedule",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 201, description = "Replacement interview scheduled", body = Json<Interview>),
        (status = 409, description = "Slot unavailable or interview is not scheduled")
    )
)]
#[axum::debug_handler]
pub async fn reschedule_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RescheduleInterviewPayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    let interview = state.interview_service.reschedule(id, payload).await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

#[utoipa::path(
    post,
    path = "/api/v1/interviews/{id}/feedback",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 201, description = "Feedback recorded", body = Json<Feedback>),
        (status = 400, description = "Invalid ratings"),
        (status = 409, description = "Interview was cancelled or rescheduled")
    )
)]
#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<FeedbackPayload>,
) -> Result<impl IntoResponse> {
    let feedback = state
        .interview_service
        .record_feedback(id, payload, claims.user_id()?)
        .await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

#[utoipa::path(
    get,
    path = "/api/v1/interviews/{id}/feedback",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Feedback for the interview"),
        (status = 404, description = "Interview not found")
    )
)]
#[axum::debug_handler]
pub async fn list_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let items = state.interview_service.feedback(id).await?;
    Ok(Json(json!({ "items": items })))
}
