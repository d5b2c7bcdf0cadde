use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{conflict_on_unique, like_pattern, month_bucket, outreach, tasks, PgStore};
use crate::database::repository::{CandidateFilter, CandidateRepository, Page, PageRequest};
use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateStage, CandidateStatus};
use crate::models::outreach::Outreach;
use crate::models::task::Task;

const CANDIDATE_COLUMNS: &str = "id, first_name, last_name, email, phone, linkedin_url, \
    current_title, current_company, experience_years, skills, location, source, job_id, \
    status, stage, ai_score, ai_rationale, hired_at, last_contacted_at, created_at, updated_at";

const DUPLICATE: &str = "A candidate with this email already exists for this job";

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &CandidateFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(stage) = filter.stage {
        qb.push(" AND stage = ").push_bind(stage);
    }
    if let Some(job_id) = filter.job_id {
        qb.push(" AND job_id = ").push_bind(job_id);
    }
    if let Some(source) = &filter.source {
        qb.push(" AND lower(source) = lower(")
            .push_bind(source.clone())
            .push(")");
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND ((first_name || ' ' || last_name) ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM unnest(skills) AS s WHERE s ILIKE ")
            .push_bind(pattern)
            .push("))");
    }
}

async fn transition<'e, E>(
    executor: E,
    candidate: &Candidate,
    (stage, status): (CandidateStage, CandidateStatus),
) -> Result<Option<Candidate>>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "UPDATE candidates SET stage = $2, status = $3, hired_at = $4, updated_at = $5 \
         WHERE id = $1 AND stage = $6 AND status = $7 RETURNING {}",
        CANDIDATE_COLUMNS
    );
    let row = sqlx::query_as::<_, Candidate>(&sql)
        .bind(candidate.id)
        .bind(candidate.stage)
        .bind(candidate.status)
        .bind(candidate.hired_at)
        .bind(candidate.updated_at)
        .bind(stage)
        .bind(status)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

#[async_trait]
impl CandidateRepository for PgStore {
    async fn insert_candidate(&self, candidate: &Candidate) -> Result<Candidate> {
        let sql = format!(
            "INSERT INTO candidates ({}) VALUES \
             ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21) \
             RETURNING {}",
            CANDIDATE_COLUMNS, CANDIDATE_COLUMNS
        );
        sqlx::query_as::<_, Candidate>(&sql)
            .bind(candidate.id)
            .bind(&candidate.first_name)
            .bind(&candidate.last_name)
            .bind(&candidate.email)
            .bind(&candidate.phone)
            .bind(&candidate.linkedin_url)
            .bind(&candidate.current_title)
            .bind(&candidate.current_company)
            .bind(candidate.experience_years)
            .bind(&candidate.skills)
            .bind(&candidate.location)
            .bind(&candidate.source)
            .bind(candidate.job_id)
            .bind(candidate.status)
            .bind(candidate.stage)
            .bind(candidate.ai_score)
            .bind(&candidate.ai_rationale)
            .bind(candidate.hired_at)
            .bind(candidate.last_contacted_at)
            .bind(candidate.created_at)
            .bind(candidate.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, DUPLICATE))
    }

    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let sql = format!("SELECT {} FROM candidates WHERE id = $1", CANDIDATE_COLUMNS);
        let candidate = sqlx::query_as::<_, Candidate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(candidate)
    }

    async fn find_candidate_by_email(
        &self,
        email: &str,
        job_id: Option<Uuid>,
    ) -> Result<Option<Candidate>> {
        let sql = format!(
            "SELECT {} FROM candidates WHERE lower(email) = lower($1) AND job_id IS NOT DISTINCT FROM $2",
            CANDIDATE_COLUMNS
        );
        let candidate = sqlx::query_as::<_, Candidate>(&sql)
            .bind(email)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(candidate)
    }

    async fn update_candidate(&self, candidate: &Candidate) -> Result<Candidate> {
        let sql = format!(
            r#"UPDATE candidates SET
                first_name = $2, last_name = $3, email = $4, phone = $5, linkedin_url = $6,
                current_title = $7, current_company = $8, experience_years = $9, skills = $10,
                location = $11, source = $12, job_id = $13, updated_at = $14
               WHERE id = $1
               RETURNING {}"#,
            CANDIDATE_COLUMNS
        );
        sqlx::query_as::<_, Candidate>(&sql)
            .bind(candidate.id)
            .bind(&candidate.first_name)
            .bind(&candidate.last_name)
            .bind(&candidate.email)
            .bind(&candidate.phone)
            .bind(&candidate.linkedin_url)
            .bind(&candidate.current_title)
            .bind(&candidate.current_company)
            .bind(candidate.experience_years)
            .bind(&candidate.skills)
            .bind(&candidate.location)
            .bind(&candidate.source)
            .bind(candidate.job_id)
            .bind(candidate.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, DUPLICATE))
    }

    async fn transition_candidate(
        &self,
        candidate: &Candidate,
        expected: (CandidateStage, CandidateStatus),
    ) -> Result<Option<Candidate>> {
        transition(&self.pool, candidate, expected).await
    }

    async fn approve_candidate(
        &self,
        candidate: &Candidate,
        expected: (CandidateStage, CandidateStatus),
        outreach: &Outreach,
        task: &Task,
    ) -> Result<Option<Candidate>> {
        let mut tx = self.pool.begin().await?;
        let Some(approved) = transition(&mut *tx, candidate, expected).await? else {
            return Ok(None);
        };
        outreach::insert(&mut *tx, outreach).await?;
        tasks::insert(&mut *tx, task).await?;
        tx.commit().await?;
        Ok(Some(approved))
    }

    async fn set_candidate_assessment(
        &self,
        id: Uuid,
        score: f64,
        rationale: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Candidate>> {
        let sql = format!(
            "UPDATE candidates SET ai_score = $2, ai_rationale = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {}",
            CANDIDATE_COLUMNS
        );
        let row = sqlx::query_as::<_, Candidate>(&sql)
            .bind(id)
            .bind(score)
            .bind(rationale)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn touch_last_contacted(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE candidates SET last_contacted_at = $2, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_candidates(
        &self,
        filter: &CandidateFilter,
        page: PageRequest,
    ) -> Result<Page<Candidate>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM candidates");
        push_filter(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM candidates", CANDIDATE_COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = qb.build_query_as::<Candidate>().fetch_all(&self.pool).await?;

        Ok(Page { items, total })
    }

    async fn list_candidates_for_job(&self, job_id: Uuid) -> Result<Vec<Candidate>> {
        let sql = format!(
            "SELECT {} FROM candidates WHERE job_id = $1 ORDER BY created_at DESC, id",
            CANDIDATE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Candidate>(&sql)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_candidates_by_stage(&self) -> Result<Vec<(CandidateStage, i64)>> {
        let rows = sqlx::query_as::<_, (CandidateStage, i64)>(
            "SELECT stage, COUNT(*) FROM candidates GROUP BY stage",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_candidates_by_status(&self) -> Result<Vec<(CandidateStatus, i64)>> {
        let rows = sqlx::query_as::<_, (CandidateStatus, i64)>(
            "SELECT status, COUNT(*) FROM candidates GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn monthly_applications(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>> {
        let bucket = month_bucket("created_at");
        let sql = format!(
            "SELECT {b} AS month, COUNT(*) FROM candidates WHERE created_at >= $1 GROUP BY {b} ORDER BY 1",
            b = bucket
        );
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn monthly_hires(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>> {
        let bucket = month_bucket("hired_at");
        let sql = format!(
            "SELECT {b} AS month, COUNT(*) FROM candidates WHERE hired_at >= $1 GROUP BY {b} ORDER BY 1",
            b = bucket
        );
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
