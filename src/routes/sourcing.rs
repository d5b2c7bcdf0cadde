use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::sourcing_dto::{ImportProfilesPayload, SearchResponse},
    error::Result,
    middleware::auth::Claims,
    routes::extract::ApiJson,
    services::sourcing_service::SourcingCriteria,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/sourcing/search",
    responses(
        (status = 200, description = "Profiles found", body = Json<SearchResponse>),
        (status = 400, description = "Invalid criteria"),
        (status = 502, description = "Sourcing provider failed")
    )
)]
#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(criteria): ApiJson<SourcingCriteria>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    criteria.validate()?;
    let profiles = state.sourcing.search(&criteria).await?;
    Ok(Json(SearchResponse {
        total: profiles.len(),
        profiles,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/sourcing/import",
    responses(
        (status = 201, description = "Profiles imported as candidates", body = Json<ImportReport>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn import(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(payload): ApiJson<ImportProfilesPayload>,
) -> Result<impl IntoResponse> {
    claims.require_recruiter()?;
    payload.validate()?;
    let report = state
        .sourcing_service
        .import(payload.job_id, payload.profiles)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}
