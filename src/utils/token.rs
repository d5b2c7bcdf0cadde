use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::User;

pub fn random_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn issue_access_token(
    user: &User,
    secret: &str,
    ttl_minutes: i64,
    now: DateTime<Utc>,
) -> Result<String> {
    let exp = (now + Duration::minutes(ttl_minutes)).timestamp().max(0) as usize;
    let claims = Claims {
        sub: user.id.to_string(),
        exp,
        role: user.role,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("Invalid or expired token".to_string()))
}
