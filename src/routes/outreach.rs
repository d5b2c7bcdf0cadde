use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Json},
};

use crate::{
    dto::outreach_dto::DeliveryStatusPayload,
    error::{Error, Result},
    routes::extract::ApiPath,
    services::notification_service::SIGNATURE_HEADER,
    utils::crypto::verify_signature,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/calls/{call_id}/status",
    params(
        ("call_id" = String, Path, description = "Call id issued by the messaging provider")
    ),
    responses(
        (status = 200, description = "Latest known call progress"),
        (status = 404, description = "Call not found")
    )
)]
#[axum::debug_handler]
pub async fn call_status(
    State(state): State<AppState>,
    ApiPath(call_id): ApiPath<String>,
) -> Result<impl IntoResponse> {
    let status = state.outreach_service.call_status(&call_id).await?;
    Ok(Json(status))
}

/// Delivery reports from the messaging provider, signed like task callbacks.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/messaging",
    responses(
        (status = 200, description = "Report applied"),
        (status = 401, description = "Missing or invalid signature"),
        (status = 404, description = "Unknown provider message id")
    )
)]
#[axum::debug_handler]
pub async fn messaging_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized(format!("Missing {} header", SIGNATURE_HEADER)))?;
    if !verify_signature(&state.config.webhook_secret, &body, signature) {
        tracing::warn!("rejected messaging webhook with a bad signature");
        return Err(Error::Unauthorized("Invalid signature".to_string()));
    }
    let payload: DeliveryStatusPayload = serde_json::from_slice(&body)?;
    let outreach = state.outreach_service.record_provider_status(payload).await?;
    Ok(Json(outreach))
}
