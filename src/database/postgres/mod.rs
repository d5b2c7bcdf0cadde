//! sqlx-backed implementation of every repository trait.
//!
//! Queries are built at runtime (`query_as::<_, T>` and `QueryBuilder`) so the crate
//! compiles without a live database.

mod candidates;
mod interviews;
mod jobs;
mod outreach;
mod tasks;
mod users;

use sqlx::PgPool;

use crate::error::Error;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Turns a unique-constraint violation into a domain conflict.
fn conflict_on_unique(err: sqlx::Error, message: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict(message.to_string())
        }
        _ => err.into(),
    }
}

/// `ILIKE` pattern matching `search` anywhere, with its wildcards taken literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// First day of the UTC month containing `column`.
fn month_bucket(column: &str) -> String {
    format!("(date_trunc('month', {} AT TIME ZONE 'UTC'))::date", column)
}
