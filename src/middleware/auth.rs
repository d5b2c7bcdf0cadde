use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::UserRole;
use crate::utils::token::decode_access_token;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: UserRole,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Token subject is not a user id".to_string()))
    }

    /// Jobs and the candidate pool are owned by admins and HR managers.
    pub fn require_recruiter(&self) -> Result<()> {
        if self.role.is_recruiter() {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "This action requires the admin or hr_manager role".to_string(),
            ))
        }
    }
}

fn bearer_token(req: &Request) -> Result<&str> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("Malformed authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("Unsupported authorization scheme".to_string()))
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = match bearer_token(&req)
        .and_then(|token| decode_access_token(token, &state.config.jwt_secret))
    {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };
    req.extensions_mut().insert(claims);
    next.run(req).await
}
