use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{User, UserRole};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(custom(function = "crate::utils::validation::non_blank"), length(max = 100))]
    pub first_name: String,
    #[validate(custom(function = "crate::utils::validation::non_blank"), length(max = 100))]
    pub last_name: String,
    pub role: Option<UserRole>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}
