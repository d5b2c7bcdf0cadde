use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, RegisterPayload},
    error::Result,
    middleware::auth::Claims,
    routes::extract::ApiJson,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    responses(
        (status = 200, description = "Access token issued", body = Json<TokenResponse>),
        (status = 401, description = "Incorrect email or password")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let token = state.auth_service.login(payload).await?;
    Ok(Json(token))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    responses(
        (status = 201, description = "User registered", body = Json<User>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = Json<User>),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.me(claims.user_id()?).await?;
    Ok(Json(user))
}
