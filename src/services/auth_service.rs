use uuid::Uuid;

use crate::database::Repositories;
use crate::dto::auth_dto::{LoginPayload, RegisterPayload, TokenResponse};
use crate::error::{Error, Result};
use crate::models::user::{User, UserRole};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::time::now;
use crate::utils::token::issue_access_token;

#[derive(Clone)]
pub struct AuthService {
    repos: Repositories,
    jwt_secret: String,
    token_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(repos: Repositories, jwt_secret: String, token_ttl_minutes: i64) -> Self {
        Self {
            repos,
            jwt_secret,
            token_ttl_minutes,
        }
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<TokenResponse> {
        let rejected = || Error::Unauthorized("Incorrect email or password".to_string());
        let user = self
            .repos
            .users
            .find_user_by_email(payload.email.trim())
            .await?
            .ok_or_else(rejected)?;
        let matches = verify_password(&payload.password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Stored password hash is unreadable: {}", e)))?;
        if !matches {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(rejected());
        }
        if !user.is_active {
            return Err(Error::Forbidden("User account is inactive".to_string()));
        }
        self.token_for(user)
    }

    /// Self-service sign-up; admins are provisioned out of band.
    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        let role = payload.role.unwrap_or(UserRole::Interviewer);
        if role == UserRole::Admin {
            return Err(Error::Forbidden(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }
        let email = payload.email.trim().to_lowercase();
        if self.repos.users.find_user_by_email(&email).await?.is_some() {
            return Err(Error::Conflict(format!("Email {} is already registered", email)));
        }
        let password_hash = hash_password(&payload.password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
        let ts = now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            role,
            department: payload.department,
            is_active: true,
            created_at: ts,
            updated_at: ts,
        };
        let user = self.repos.users.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, role = ?user.role, "user registered");
        Ok(user)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        self.repos
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| Error::Unauthorized("User no longer exists".to_string()))
    }

    fn token_for(&self, user: User) -> Result<TokenResponse> {
        let access_token =
            issue_access_token(&user, &self.jwt_secret, self.token_ttl_minutes, now())?;
        Ok(TokenResponse {
            access_token,
            token_type: "bearer",
            expires_in: self.token_ttl_minutes * 60,
            user,
        })
    }
}
