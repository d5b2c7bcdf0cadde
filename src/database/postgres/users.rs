use async_trait::async_trait;
use uuid::Uuid;

use super::{conflict_on_unique, PgStore};
use crate::database::repository::UserRepository;
use crate::error::Result;
use crate::models::user::User;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, department, \
    is_active, created_at, updated_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &User) -> Result<User> {
        let sql = format!(
            "INSERT INTO users ({}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10) RETURNING {}",
            USER_COLUMNS, USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.role)
            .bind(&user.department)
            .bind(user.is_active)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Email already registered"))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
