use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{month_bucket, PgStore};
use crate::database::repository::{InterviewFilter, InterviewRepository, Page, PageRequest};
use crate::error::{Error, Result};
use crate::models::feedback::Feedback;
use crate::models::interview::{Interview, InterviewStatus};

const INTERVIEW_COLUMNS: &str = "id, candidate_id, job_id, interviewer_id, title, interview_type, \
    mode, scheduled_at, duration_minutes, timezone, status, booking_ref, meeting_link, \
    rescheduled_from, reschedule_reason, cancel_reason, created_at, updated_at";

const FEEDBACK_COLUMNS: &str = "id, interview_id, submitted_by, overall_rating, technical_rating, \
    communication_rating, cultural_fit_rating, problem_solving_rating, strengths, weaknesses, \
    comments, recommendation, created_at";

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &InterviewFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(candidate_id) = filter.candidate_id {
        qb.push(" AND candidate_id = ").push_bind(candidate_id);
    }
    if let Some(job_id) = filter.job_id {
        qb.push(" AND job_id = ").push_bind(job_id);
    }
    if let Some(interviewer_id) = filter.interviewer_id {
        qb.push(" AND interviewer_id = ").push_bind(interviewer_id);
    }
    if let Some(from) = filter.from {
        qb.push(" AND scheduled_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND scheduled_at <= ").push_bind(to);
    }
}

async fn insert<'e, E>(executor: E, interview: &Interview) -> Result<Interview>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "INSERT INTO interviews ({}) VALUES \
         ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18) \
         RETURNING {}",
        INTERVIEW_COLUMNS, INTERVIEW_COLUMNS
    );
    let row = sqlx::query_as::<_, Interview>(&sql)
        .bind(interview.id)
        .bind(interview.candidate_id)
        .bind(interview.job_id)
        .bind(interview.interviewer_id)
        .bind(&interview.title)
        .bind(interview.interview_type)
        .bind(interview.mode)
        .bind(interview.scheduled_at)
        .bind(interview.duration_minutes)
        .bind(&interview.timezone)
        .bind(interview.status)
        .bind(&interview.booking_ref)
        .bind(&interview.meeting_link)
        .bind(interview.rescheduled_from)
        .bind(&interview.reschedule_reason)
        .bind(&interview.cancel_reason)
        .bind(interview.created_at)
        .bind(interview.updated_at)
        .fetch_one(executor)
        .await?;
    Ok(row)
}

/// Writes the row only while its stored status is `expected`.
async fn transition<'e, E>(
    executor: E,
    interview: &Interview,
    expected: InterviewStatus,
) -> Result<Option<Interview>>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"UPDATE interviews SET
            interviewer_id = $2, title = $3, mode = $4, scheduled_at = $5,
            duration_minutes = $6, timezone = $7, status = $8, booking_ref = $9,
            meeting_link = $10, reschedule_reason = $11, cancel_reason = $12, updated_at = $13
           WHERE id = $1 AND status = $14
           RETURNING {}"#,
        INTERVIEW_COLUMNS
    );
    let row = sqlx::query_as::<_, Interview>(&sql)
        .bind(interview.id)
        .bind(interview.interviewer_id)
        .bind(&interview.title)
        .bind(interview.mode)
        .bind(interview.scheduled_at)
        .bind(interview.duration_minutes)
        .bind(&interview.timezone)
        .bind(interview.status)
        .bind(&interview.booking_ref)
        .bind(&interview.meeting_link)
        .bind(&interview.reschedule_reason)
        .bind(&interview.cancel_reason)
        .bind(interview.updated_at)
        .bind(expected)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

#[async_trait]
impl InterviewRepository for PgStore {
    async fn insert_interview(&self, interview: &Interview) -> Result<Interview> {
        insert(&self.pool, interview).await
    }

    async fn find_interview(&self, id: Uuid) -> Result<Option<Interview>> {
        let sql = format!("SELECT {} FROM interviews WHERE id = $1", INTERVIEW_COLUMNS);
        let row = sqlx::query_as::<_, Interview>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn transition_interview(
        &self,
        interview: &Interview,
        expected: InterviewStatus,
    ) -> Result<Option<Interview>> {
        transition(&self.pool, interview, expected).await
    }

    async fn replace_interview(&self, old: &Interview, new: &Interview) -> Result<Interview> {
        let mut tx = self.pool.begin().await?;
        if transition(&mut *tx, old, InterviewStatus::Scheduled)
            .await?
            .is_none()
        {
            return Err(Error::InvalidTransition(format!(
                "Interview {} is no longer scheduled",
                old.id
            )));
        }
        let created = insert(&mut *tx, new).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn list_interviews(
        &self,
        filter: &InterviewFilter,
        page: PageRequest,
    ) -> Result<Page<Interview>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM interviews");
        push_filter(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM interviews", INTERVIEW_COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY scheduled_at ASC, id LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = qb.build_query_as::<Interview>().fetch_all(&self.pool).await?;

        Ok(Page { items, total })
    }

    async fn add_feedback(&self, feedback: &Feedback, now: DateTime<Utc>) -> Result<Feedback> {
        let mut tx = self.pool.begin().await?;
        // the row lock makes a concurrent cancel wait for this transaction
        let accepted = sqlx::query_scalar::<_, InterviewStatus>(
            r#"UPDATE interviews SET
                status = 'completed',
                updated_at = CASE WHEN status = 'scheduled' THEN $2 ELSE updated_at END
               WHERE id = $1 AND status IN ('scheduled', 'completed')
               RETURNING status"#,
        )
        .bind(feedback.interview_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;
        if accepted.is_none() {
            return Err(Error::InvalidTransition(format!(
                "Interview {} no longer accepts feedback",
                feedback.interview_id
            )));
        }

        let sql = format!(
            "INSERT INTO interview_feedback ({}) VALUES \
             ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13) RETURNING {}",
            FEEDBACK_COLUMNS, FEEDBACK_COLUMNS
        );
        let row = sqlx::query_as::<_, Feedback>(&sql)
            .bind(feedback.id)
            .bind(feedback.interview_id)
            .bind(feedback.submitted_by)
            .bind(feedback.overall_rating)
            .bind(feedback.technical_rating)
            .bind(feedback.communication_rating)
            .bind(feedback.cultural_fit_rating)
            .bind(feedback.problem_solving_rating)
            .bind(&feedback.strengths)
            .bind(&feedback.weaknesses)
            .bind(&feedback.comments)
            .bind(feedback.recommendation)
            .bind(feedback.created_at)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_feedback(&self, interview_id: Uuid) -> Result<Vec<Feedback>> {
        let sql = format!(
            "SELECT {} FROM interview_feedback WHERE interview_id = $1 ORDER BY created_at ASC",
            FEEDBACK_COLUMNS
        );
        let rows = sqlx::query_as::<_, Feedback>(&sql)
            .bind(interview_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_interviews_by_status(&self) -> Result<Vec<(InterviewStatus, i64)>> {
        let rows = sqlx::query_as::<_, (InterviewStatus, i64)>(
            "SELECT status, COUNT(*) FROM interviews GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_upcoming_interviews(&self, now: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM interviews WHERE status = 'scheduled' AND scheduled_at >= $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn monthly_interviews(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>> {
        let bucket = month_bucket("created_at");
        let sql = format!(
            "SELECT {b} AS month, COUNT(*) FROM interviews WHERE created_at >= $1 GROUP BY {b} ORDER BY 1",
            b = bucket
        );
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
