//! Storage seams for every entity.
//!
//! Services only see these traits. The binary wires in [`PgStore`](super::postgres::PgStore);
//! tests wire in [`MemoryStore`](super::memory::MemoryStore).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateStage, CandidateStatus};
use crate::models::feedback::Feedback;
use crate::models::interview::{Interview, InterviewStatus};
use crate::models::job::{EmploymentType, Job, JobStatus};
use crate::models::outreach::{DeliveryStatus, Outreach};
use crate::models::task::{Task, TaskStatus};
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: i64 = 20;
    pub const MAX_PER_PAGE: i64 = 100;
    /// Keeps `offset()` far from `i64` overflow.
    pub const MAX_PAGE: i64 = 1_000_000;

    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, Self::MAX_PAGE),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    /// Slices an already filtered and ordered collection.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as i64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(request.per_page).unwrap_or(0);
        let items = all.into_iter().skip(skip).take(take).collect();
        Self { items, total }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub department: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub search: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if self.status.is_some_and(|s| s != job.status) {
            return false;
        }
        if self.employment_type.is_some_and(|t| t != job.employment_type) {
            return false;
        }
        if let Some(department) = &self.department {
            if !job
                .department
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(department))
            {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let hit = contains_ci(&job.title, search)
                || contains_ci(&job.description, search)
                || job.location.as_deref().is_some_and(|l| contains_ci(l, search));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub status: Option<CandidateStatus>,
    pub stage: Option<CandidateStage>,
    pub job_id: Option<Uuid>,
    pub source: Option<String>,
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        if self.status.is_some_and(|s| s != candidate.status) {
            return false;
        }
        if self.stage.is_some_and(|s| s != candidate.stage) {
            return false;
        }
        if self.job_id.is_some() && self.job_id != candidate.job_id {
            return false;
        }
        if let Some(source) = &self.source {
            if !candidate.source.eq_ignore_ascii_case(source) {
                return false;
            }
        }
        if self.created_from.is_some_and(|from| candidate.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| candidate.created_at > to) {
            return false;
        }
        if let Some(search) = &self.search {
            let hit = contains_ci(&candidate.full_name(), search)
                || contains_ci(&candidate.email, search)
                || candidate.skills.iter().any(|s| contains_ci(s, search));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterviewFilter {
    pub status: Option<InterviewStatus>,
    pub candidate_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl InterviewFilter {
    pub fn matches(&self, interview: &Interview) -> bool {
        self.status.map_or(true, |s| s == interview.status)
            && self.candidate_id.map_or(true, |id| id == interview.candidate_id)
            && self.job_id.map_or(true, |id| id == interview.job_id)
            && self.interviewer_id.map_or(true, |id| id == interview.interviewer_id)
            && self.from.map_or(true, |from| interview.scheduled_at >= from)
            && self.to.map_or(true, |to| interview.scheduled_at <= to)
    }
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert_job(&self, job: &Job) -> Result<Job>;
    /// Stores the job and its queued analysis task in one transaction.
    async fn insert_job_with_task(&self, job: &Job, task: &Task) -> Result<Job>;
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>>;
    /// Writes the recruiter-editable columns; `parsed_skills` is left alone.
    async fn update_job(&self, job: &Job) -> Result<Job>;
    /// Stores an analysis result. `experience_level` only fills an empty column.
    async fn set_job_analysis(
        &self,
        id: Uuid,
        skills: &[String],
        experience_level: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>>;
    /// Detaches the job's candidates and drops its interviews. Fails with
    /// `Conflict` when a detached candidate would duplicate an unattached one.
    async fn delete_job(&self, id: Uuid) -> Result<bool>;
    async fn list_jobs(&self, filter: &JobFilter, page: PageRequest) -> Result<Page<Job>>;
    async fn count_jobs_by_status(&self) -> Result<Vec<(JobStatus, i64)>>;
}

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn insert_candidate(&self, candidate: &Candidate) -> Result<Candidate>;
    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;
    async fn find_candidate_by_email(
        &self,
        email: &str,
        job_id: Option<Uuid>,
    ) -> Result<Option<Candidate>>;
    /// Writes profile columns only. Pipeline state goes through
    /// [`transition_candidate`](Self::transition_candidate).
    async fn update_candidate(&self, candidate: &Candidate) -> Result<Candidate>;
    /// Writes stage, status and `hired_at` if the stored row still has the
    /// expected stage and status; `None` when it moved on.
    async fn transition_candidate(
        &self,
        candidate: &Candidate,
        expected: (CandidateStage, CandidateStatus),
    ) -> Result<Option<Candidate>>;
    /// [`transition_candidate`](Self::transition_candidate) plus a queued
    /// outreach and its task, all or nothing.
    async fn approve_candidate(
        &self,
        candidate: &Candidate,
        expected: (CandidateStage, CandidateStatus),
        outreach: &Outreach,
        task: &Task,
    ) -> Result<Option<Candidate>>;
    async fn set_candidate_assessment(
        &self,
        id: Uuid,
        score: f64,
        rationale: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Candidate>>;
    async fn touch_last_contacted(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
    async fn delete_candidate(&self, id: Uuid) -> Result<bool>;
    async fn list_candidates(
        &self,
        filter: &CandidateFilter,
        page: PageRequest,
    ) -> Result<Page<Candidate>>;
    async fn list_candidates_for_job(&self, job_id: Uuid) -> Result<Vec<Candidate>>;
    async fn count_candidates_by_stage(&self) -> Result<Vec<(CandidateStage, i64)>>;
    async fn count_candidates_by_status(&self) -> Result<Vec<(CandidateStatus, i64)>>;
    /// Candidates created per calendar month since `since`, keyed by the month's first day.
    async fn monthly_applications(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>>;
    async fn monthly_hires(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>>;
}

#[async_trait]
pub trait InterviewRepository: Send + Sync {
    async fn insert_interview(&self, interview: &Interview) -> Result<Interview>;
    async fn find_interview(&self, id: Uuid) -> Result<Option<Interview>>;
    /// Writes the row if its stored status is still `expected`; `None` otherwise.
    async fn transition_interview(
        &self,
        interview: &Interview,
        expected: InterviewStatus,
    ) -> Result<Option<Interview>>;
    /// Closes the still-scheduled original and inserts its replacement atomically.
    /// Fails with `InvalidTransition` when the original is no longer scheduled.
    async fn replace_interview(&self, old: &Interview, new: &Interview) -> Result<Interview>;
    async fn list_interviews(
        &self,
        filter: &InterviewFilter,
        page: PageRequest,
    ) -> Result<Page<Interview>>;
    /// Stores feedback and completes a scheduled interview in one transaction.
    /// Fails with `InvalidTransition` unless the interview is scheduled or completed.
    async fn add_feedback(&self, feedback: &Feedback, now: DateTime<Utc>) -> Result<Feedback>;
    async fn list_feedback(&self, interview_id: Uuid) -> Result<Vec<Feedback>>;
    async fn count_interviews_by_status(&self) -> Result<Vec<(InterviewStatus, i64)>>;
    async fn count_upcoming_interviews(&self, now: DateTime<Utc>) -> Result<i64>;
    async fn monthly_interviews(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<User>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert_task(&self, task: &Task) -> Result<Task>;
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>>;
    /// Moves the oldest pending task to `running` and returns it.
    async fn claim_next_task(&self, now: DateTime<Utc>) -> Result<Option<Task>>;
    async fn finish_task(
        &self,
        id: Uuid,
        status: TaskStatus,
        result: Option<JsonValue>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Task>;
    /// Cancels the task only if it has not started; `None` otherwise.
    async fn cancel_pending_task(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Task>>;
    /// Fails tasks left `running` since before `started_before`; returns how many.
    async fn fail_stale_tasks(
        &self,
        started_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64>;
}

#[async_trait]
pub trait OutreachRepository: Send + Sync {
    /// Stores the outreach and its delivery task in one transaction.
    async fn insert_outreach_with_task(&self, outreach: &Outreach, task: &Task) -> Result<Outreach>;
    async fn find_outreach(&self, id: Uuid) -> Result<Option<Outreach>>;
    async fn find_outreach_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<Outreach>>;
    async fn update_outreach(&self, outreach: &Outreach) -> Result<Outreach>;
    /// Applies a provider status report to the outreach it sent.
    async fn record_delivery_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
        duration_seconds: Option<i32>,
        at: DateTime<Utc>,
    ) -> Result<Option<Outreach>>;
    async fn list_outreach(&self, candidate_id: Uuid) -> Result<Vec<Outreach>>;
}

/// One handle per entity, all pointing at the same backing store.
#[derive(Clone)]
pub struct Repositories {
    pub jobs: Arc<dyn JobRepository>,
    pub candidates: Arc<dyn CandidateRepository>,
    pub interviews: Arc<dyn InterviewRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub outreach: Arc<dyn OutreachRepository>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_store(Arc::new(super::postgres::PgStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(super::memory::MemoryStore::default()))
    }

    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: JobRepository
            + CandidateRepository
            + InterviewRepository
            + UserRepository
            + TaskRepository
            + OutreachRepository
            + 'static,
    {
        Self {
            jobs: store.clone(),
            candidates: store.clone(),
            interviews: store.clone(),
            users: store.clone(),
            tasks: store.clone(),
            outreach: store,
        }
    }
}
