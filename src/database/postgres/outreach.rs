use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use super::{tasks, PgStore};
use crate::database::repository::OutreachRepository;
use crate::error::Result;
use crate::models::outreach::{DeliveryStatus, Outreach};
use crate::models::task::Task;

const OUTREACH_COLUMNS: &str = "id, candidate_id, channel, subject, body, status, \
    provider_message_id, error, created_by, created_at, sent_at, delivery_status, \
    duration_seconds, status_updated_at";

pub(super) async fn insert<'e, E>(executor: E, outreach: &Outreach) -> Result<Outreach>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "INSERT INTO outreach ({}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14) \
         RETURNING {}",
        OUTREACH_COLUMNS, OUTREACH_COLUMNS
    );
    let row = sqlx::query_as::<_, Outreach>(&sql)
        .bind(outreach.id)
        .bind(outreach.candidate_id)
        .bind(outreach.channel)
        .bind(&outreach.subject)
        .bind(&outreach.body)
        .bind(outreach.status)
        .bind(&outreach.provider_message_id)
        .bind(&outreach.error)
        .bind(outreach.created_by)
        .bind(outreach.created_at)
        .bind(outreach.sent_at)
        .bind(outreach.delivery_status)
        .bind(outreach.duration_seconds)
        .bind(outreach.status_updated_at)
        .fetch_one(executor)
        .await?;
    Ok(row)
}

#[async_trait]
impl OutreachRepository for PgStore {
    async fn insert_outreach_with_task(&self, outreach: &Outreach, task: &Task) -> Result<Outreach> {
        let mut tx = self.pool.begin().await?;
        let saved = insert(&mut *tx, outreach).await?;
        tasks::insert(&mut *tx, task).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn find_outreach(&self, id: Uuid) -> Result<Option<Outreach>> {
        let sql = format!("SELECT {} FROM outreach WHERE id = $1", OUTREACH_COLUMNS);
        let row = sqlx::query_as::<_, Outreach>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_outreach_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<Outreach>> {
        let sql = format!(
            "SELECT {} FROM outreach WHERE provider_message_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
            OUTREACH_COLUMNS
        );
        let row = sqlx::query_as::<_, Outreach>(&sql)
            .bind(provider_message_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_outreach(&self, outreach: &Outreach) -> Result<Outreach> {
        let sql = format!(
            "UPDATE outreach SET subject = $2, body = $3, status = $4, provider_message_id = $5, \
             error = $6, sent_at = $7 WHERE id = $1 RETURNING {}",
            OUTREACH_COLUMNS
        );
        let row = sqlx::query_as::<_, Outreach>(&sql)
            .bind(outreach.id)
            .bind(&outreach.subject)
            .bind(&outreach.body)
            .bind(outreach.status)
            .bind(&outreach.provider_message_id)
            .bind(&outreach.error)
            .bind(outreach.sent_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn record_delivery_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
        duration_seconds: Option<i32>,
        at: DateTime<Utc>,
    ) -> Result<Option<Outreach>> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "SELECT {} FROM outreach WHERE provider_message_id = $1 \
             ORDER BY created_at DESC LIMIT 1 FOR UPDATE",
            OUTREACH_COLUMNS
        );
        let Some(mut outreach) = sqlx::query_as::<_, Outreach>(&sql)
            .bind(provider_message_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        if !outreach.apply_delivery_status(status, duration_seconds, at) {
            tx.commit().await?;
            return Ok(Some(outreach));
        }

        let sql = format!(
            "UPDATE outreach SET delivery_status = $2, duration_seconds = $3, \
             status_updated_at = $4 WHERE id = $1 RETURNING {}",
            OUTREACH_COLUMNS
        );
        let row = sqlx::query_as::<_, Outreach>(&sql)
            .bind(outreach.id)
            .bind(outreach.delivery_status)
            .bind(outreach.duration_seconds)
            .bind(outreach.status_updated_at)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(row))
    }

    async fn list_outreach(&self, candidate_id: Uuid) -> Result<Vec<Outreach>> {
        let sql = format!(
            "SELECT {} FROM outreach WHERE candidate_id = $1 ORDER BY created_at DESC, id",
            OUTREACH_COLUMNS
        );
        let rows = sqlx::query_as::<_, Outreach>(&sql)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
