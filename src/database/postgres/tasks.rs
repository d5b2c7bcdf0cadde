use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use super::{conflict_on_unique, PgStore};
use crate::database::repository::TaskRepository;
use crate::error::Result;
use crate::models::task::{Task, TaskStatus, STALE_TASK_ERROR};

const TASK_COLUMNS: &str = "id, kind, payload, status, result, error, callback_url, created_by, \
    created_at, started_at, finished_at";

pub(super) async fn insert<'e, E>(executor: E, task: &Task) -> Result<Task>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "INSERT INTO tasks ({}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) RETURNING {}",
        TASK_COLUMNS, TASK_COLUMNS
    );
    sqlx::query_as::<_, Task>(&sql)
        .bind(task.id)
        .bind(task.kind)
        .bind(&task.payload)
        .bind(task.status)
        .bind(&task.result)
        .bind(&task.error)
        .bind(&task.callback_url)
        .bind(task.created_by)
        .bind(task.created_at)
        .bind(task.started_at)
        .bind(task.finished_at)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_unique(e, "Task already exists"))
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn insert_task(&self, task: &Task) -> Result<Task> {
        insert(&self.pool, task).await
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let row = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn claim_next_task(&self, now: DateTime<Utc>) -> Result<Option<Task>> {
        let sql = format!(
            r#"
            UPDATE tasks SET status = 'running', started_at = $1
            WHERE id = (
                SELECT id FROM tasks WHERE status = 'pending'
                ORDER BY created_at ASC LIMIT 1 FOR UPDATE SKIP LOCKED
            )
            RETURNING {}
            "#,
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, Task>(&sql)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn finish_task(
        &self,
        id: Uuid,
        status: TaskStatus,
        result: Option<JsonValue>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let sql = format!(
            "UPDATE tasks SET status = $2, result = $3, error = $4, finished_at = $5 \
             WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(status)
            .bind(result)
            .bind(error)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn cancel_pending_task(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET status = 'cancelled', finished_at = $2 \
             WHERE id = $1 AND status = 'pending' RETURNING {}",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn fail_stale_tasks(
        &self,
        started_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE tasks SET status = 'failed', error = $3, finished_at = $2 \
             WHERE status = 'running' AND started_at < $1",
        )
        .bind(started_before)
        .bind(now)
        .bind(STALE_TASK_ERROR)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }
}
