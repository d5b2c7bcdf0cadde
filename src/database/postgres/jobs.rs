use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{conflict_on_unique, like_pattern, tasks, PgStore};
use crate::database::repository::{JobFilter, JobRepository, Page, PageRequest};
use crate::error::{Error, Result};
use crate::models::job::{Job, JobStatus};
use crate::models::task::Task;

const JOB_COLUMNS: &str = "id, title, description, requirements, department, location, \
    employment_type, experience_level, salary_min, salary_max, currency, status, priority, \
    parsed_skills, deadline, created_by, created_at, updated_at";

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(employment_type) = filter.employment_type {
        qb.push(" AND employment_type = ").push_bind(employment_type);
    }
    if let Some(department) = &filter.department {
        qb.push(" AND lower(department) = lower(")
            .push_bind(department.clone())
            .push(")");
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

const DETACH_COLLISION: &str =
    "Deleting this job would duplicate candidates that already exist without a job";

async fn insert<'e, E>(executor: E, job: &Job) -> Result<Job>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "INSERT INTO jobs ({}) VALUES \
         ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18) \
         RETURNING {}",
        JOB_COLUMNS, JOB_COLUMNS
    );
    sqlx::query_as::<_, Job>(&sql)
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.department)
        .bind(&job.location)
        .bind(job.employment_type)
        .bind(&job.experience_level)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(&job.currency)
        .bind(job.status)
        .bind(job.priority)
        .bind(&job.parsed_skills)
        .bind(job.deadline)
        .bind(job.created_by)
        .bind(job.created_at)
        .bind(job.updated_at)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_unique(e, "Job already exists"))
}

#[async_trait]
impl JobRepository for PgStore {
    async fn insert_job(&self, job: &Job) -> Result<Job> {
        insert(&self.pool, job).await
    }

    async fn insert_job_with_task(&self, job: &Job, task: &Task) -> Result<Job> {
        let mut tx = self.pool.begin().await?;
        let saved = insert(&mut *tx, job).await?;
        tasks::insert(&mut *tx, task).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn update_job(&self, job: &Job) -> Result<Job> {
        let sql = format!(
            r#"UPDATE jobs SET
                title = $2, description = $3, requirements = $4, department = $5,
                location = $6, employment_type = $7, experience_level = $8,
                salary_min = $9, salary_max = $10, currency = $11, status = $12,
                priority = $13, deadline = $14, updated_at = $15
               WHERE id = $1
               RETURNING {}"#,
            JOB_COLUMNS
        );
        let updated = sqlx::query_as::<_, Job>(&sql)
            .bind(job.id)
            .bind(&job.title)
            .bind(&job.description)
            .bind(&job.requirements)
            .bind(&job.department)
            .bind(&job.location)
            .bind(job.employment_type)
            .bind(&job.experience_level)
            .bind(job.salary_min)
            .bind(job.salary_max)
            .bind(&job.currency)
            .bind(job.status)
            .bind(job.priority)
            .bind(job.deadline)
            .bind(job.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn set_job_analysis(
        &self,
        id: Uuid,
        skills: &[String],
        experience_level: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>> {
        let sql = format!(
            "UPDATE jobs SET parsed_skills = $2, \
             experience_level = COALESCE(experience_level, $3), updated_at = $4 \
             WHERE id = $1 RETURNING {}",
            JOB_COLUMNS
        );
        let row = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .bind(skills)
            .bind(experience_level)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let collisions = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM candidates c
               WHERE c.job_id = $1 AND EXISTS (
                   SELECT 1 FROM candidates p
                   WHERE p.job_id IS NULL AND lower(p.email) = lower(c.email)
               )"#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if collisions > 0 {
            return Err(Error::Conflict(format!(
                "{} ({} affected)",
                DETACH_COLLISION, collisions
            )));
        }

        // candidates.job_id is ON DELETE SET NULL, interviews cascade
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, DETACH_COLLISION))?;
        tx.commit().await?;
        Ok(true)
    }

    async fn list_jobs(&self, filter: &JobFilter, page: PageRequest) -> Result<Page<Job>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
        push_filter(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM jobs", JOB_COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = qb.build_query_as::<Job>().fetch_all(&self.pool).await?;

        Ok(Page { items, total })
    }

    async fn count_jobs_by_status(&self) -> Result<Vec<(JobStatus, i64)>> {
        let rows = sqlx::query_as::<_, (JobStatus, i64)>(
            "SELECT status, COUNT(*) FROM jobs GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
