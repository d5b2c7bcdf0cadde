//! In-process store used by tests and local runs without Postgres.
//!
//! Mirrors the relational behaviour the migrations declare: unique keys, the
//! `ON DELETE` rules, and the orderings `PgStore` applies.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::repository::{
    CandidateFilter, CandidateRepository, InterviewFilter, InterviewRepository, JobFilter,
    JobRepository, OutreachRepository, Page, PageRequest, TaskRepository, UserRepository,
};
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStage, CandidateStatus};
use crate::models::feedback::Feedback;
use crate::models::interview::{Interview, InterviewStatus};
use crate::models::job::{Job, JobStatus};
use crate::models::outreach::{DeliveryStatus, Outreach};
use crate::models::task::{Task, TaskStatus, STALE_TASK_ERROR};
use crate::models::user::User;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    jobs: HashMap<Uuid, Job>,
    candidates: HashMap<Uuid, Candidate>,
    interviews: HashMap<Uuid, Interview>,
    feedback: HashMap<Uuid, Feedback>,
    outreach: HashMap<Uuid, Outreach>,
    tasks: HashMap<Uuid, Task>,
}

impl Tables {
    fn drop_interviews_where(&mut self, pred: impl Fn(&Interview) -> bool) {
        let doomed: Vec<Uuid> = self
            .interviews
            .values()
            .filter(|i| pred(*i))
            .map(|i| i.id)
            .collect();
        for id in &doomed {
            self.interviews.remove(id);
        }
        self.feedback.retain(|_, f| !doomed.contains(&f.interview_id));
    }

    fn candidate_email_taken(&self, candidate: &Candidate) -> bool {
        self.candidates.values().any(|c| {
            c.id != candidate.id
                && c.job_id == candidate.job_id
                && c.email.eq_ignore_ascii_case(&candidate.email)
        })
    }

    fn insert_task(&mut self, task: &Task) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(Error::Conflict("Task already exists".to_string()));
        }
        self.tasks.insert(task.id, task.clone());
        Ok(())
    }

    fn insert_outreach(&mut self, outreach: &Outreach) -> Result<()> {
        if !self.candidates.contains_key(&outreach.candidate_id) {
            return Err(not_found("Candidate", outreach.candidate_id));
        }
        if self.outreach.contains_key(&outreach.id) {
            return Err(Error::Conflict("Outreach already exists".to_string()));
        }
        self.outreach.insert(outreach.id, outreach.clone());
        Ok(())
    }

    fn transition_candidate(
        &mut self,
        candidate: &Candidate,
        (stage, status): (CandidateStage, CandidateStatus),
    ) -> Option<Candidate> {
        let stored = self.candidates.get_mut(&candidate.id)?;
        if stored.stage != stage || stored.status != status {
            return None;
        }
        stored.stage = candidate.stage;
        stored.status = candidate.status;
        stored.hired_at = candidate.hired_at;
        stored.updated_at = candidate.updated_at;
        Some(stored.clone())
    }

    fn transition_interview(
        &mut self,
        interview: &Interview,
        expected: InterviewStatus,
    ) -> Option<Interview> {
        let stored = self.interviews.get_mut(&interview.id)?;
        if stored.status != expected {
            return None;
        }
        *stored = interview.clone();
        Some(interview.clone())
    }

    fn outreach_by_provider_id(&mut self, provider_message_id: &str) -> Option<&mut Outreach> {
        self.outreach
            .values_mut()
            .filter(|o| o.provider_message_id.as_deref() == Some(provider_message_id))
            .max_by_key(|o| o.created_at)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

fn not_found(what: &str, id: Uuid) -> Error {
    Error::NotFound(format!("{} {} not found", what, id))
}

fn month_of(at: DateTime<Utc>) -> NaiveDate {
    NaiveDate::from_ymd_opt(at.year(), at.month(), 1).unwrap_or_else(|| at.date_naive())
}

fn monthly(stamps: impl Iterator<Item = DateTime<Utc>>) -> Vec<(NaiveDate, i64)> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for at in stamps {
        *buckets.entry(month_of(at)).or_default() += 1;
    }
    buckets.into_iter().collect()
}

fn tally<K: Eq + std::hash::Hash + Copy>(keys: impl Iterator<Item = K>) -> Vec<(K, i64)> {
    let mut counts: HashMap<K, i64> = HashMap::new();
    for k in keys {
        *counts.entry(k).or_default() += 1;
    }
    counts.into_iter().collect()
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<Job> {
        let mut t = self.tables()?;
        if t.jobs.contains_key(&job.id) {
            return Err(Error::Conflict("Job already exists".to_string()));
        }
        t.jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn insert_job_with_task(&self, job: &Job, task: &Task) -> Result<Job> {
        let mut t = self.tables()?;
        if t.jobs.contains_key(&job.id) {
            return Err(Error::Conflict("Job already exists".to_string()));
        }
        t.insert_task(task)?;
        t.jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.tables()?.jobs.get(&id).cloned())
    }

    async fn update_job(&self, job: &Job) -> Result<Job> {
        let mut t = self.tables()?;
        let slot = t.jobs.get_mut(&job.id).ok_or_else(|| not_found("Job", job.id))?;
        let parsed_skills = std::mem::take(&mut slot.parsed_skills);
        *slot = Job {
            parsed_skills,
            ..job.clone()
        };
        Ok(slot.clone())
    }

    async fn set_job_analysis(
        &self,
        id: Uuid,
        skills: &[String],
        experience_level: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>> {
        let mut t = self.tables()?;
        Ok(t.jobs.get_mut(&id).map(|job| {
            job.parsed_skills = skills.to_vec();
            if job.experience_level.is_none() {
                job.experience_level = experience_level.map(str::to_string);
            }
            job.updated_at = now;
            job.clone()
        }))
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        if !t.jobs.contains_key(&id) {
            return Ok(false);
        }
        let collisions = t
            .candidates
            .values()
            .filter(|c| c.job_id == Some(id))
            .filter(|c| {
                t.candidates
                    .values()
                    .any(|p| p.job_id.is_none() && p.email.eq_ignore_ascii_case(&c.email))
            })
            .count();
        if collisions > 0 {
            return Err(Error::Conflict(format!(
                "Deleting this job would duplicate candidates that already exist without a job ({} affected)",
                collisions
            )));
        }

        t.jobs.remove(&id);
        for c in t.candidates.values_mut().filter(|c| c.job_id == Some(id)) {
            c.job_id = None;
        }
        t.drop_interviews_where(|i| i.job_id == id);
        Ok(true)
    }

    async fn list_jobs(&self, filter: &JobFilter, page: PageRequest) -> Result<Page<Job>> {
        let t = self.tables()?;
        let mut rows: Vec<Job> = t.jobs.values().filter(|j| filter.matches(j)).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(Page::slice(rows, page))
    }

    async fn count_jobs_by_status(&self) -> Result<Vec<(JobStatus, i64)>> {
        Ok(tally(self.tables()?.jobs.values().map(|j| j.status)))
    }
}

#[async_trait]
impl CandidateRepository for MemoryStore {
    async fn insert_candidate(&self, candidate: &Candidate) -> Result<Candidate> {
        let mut t = self.tables()?;
        if t.candidate_email_taken(candidate) {
            return Err(Error::Conflict(
                "A candidate with this email already exists for this job".to_string(),
            ));
        }
        t.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate.clone())
    }

    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(self.tables()?.candidates.get(&id).cloned())
    }

    async fn find_candidate_by_email(
        &self,
        email: &str,
        job_id: Option<Uuid>,
    ) -> Result<Option<Candidate>> {
        let t = self.tables()?;
        Ok(t
            .candidates
            .values()
            .find(|c| c.job_id == job_id && c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_candidate(&self, candidate: &Candidate) -> Result<Candidate> {
        let mut t = self.tables()?;
        if !t.candidates.contains_key(&candidate.id) {
            return Err(not_found("Candidate", candidate.id));
        }
        if t.candidate_email_taken(candidate) {
            return Err(Error::Conflict(
                "A candidate with this email already exists for this job".to_string(),
            ));
        }
        let stored = t
            .candidates
            .get_mut(&candidate.id)
            .ok_or_else(|| not_found("Candidate", candidate.id))?;
        stored.first_name = candidate.first_name.clone();
        stored.last_name = candidate.last_name.clone();
        stored.email = candidate.email.clone();
        stored.phone = candidate.phone.clone();
        stored.linkedin_url = candidate.linkedin_url.clone();
        stored.current_title = candidate.current_title.clone();
        stored.current_company = candidate.current_company.clone();
        stored.experience_years = candidate.experience_years;
        stored.skills = candidate.skills.clone();
        stored.location = candidate.location.clone();
        stored.source = candidate.source.clone();
        stored.job_id = candidate.job_id;
        stored.updated_at = candidate.updated_at;
        Ok(stored.clone())
    }

    async fn transition_candidate(
        &self,
        candidate: &Candidate,
        expected: (CandidateStage, CandidateStatus),
    ) -> Result<Option<Candidate>> {
        Ok(self.tables()?.transition_candidate(candidate, expected))
    }

    async fn approve_candidate(
        &self,
        candidate: &Candidate,
        expected: (CandidateStage, CandidateStatus),
        outreach: &Outreach,
        task: &Task,
    ) -> Result<Option<Candidate>> {
        let mut t = self.tables()?;
        if t.tasks.contains_key(&task.id) {
            return Err(Error::Conflict("Task already exists".to_string()));
        }
        if t.outreach.contains_key(&outreach.id) {
            return Err(Error::Conflict("Outreach already exists".to_string()));
        }
        let Some(approved) = t.transition_candidate(candidate, expected) else {
            return Ok(None);
        };
        t.insert_outreach(outreach)?;
        t.insert_task(task)?;
        Ok(Some(approved))
    }

    async fn set_candidate_assessment(
        &self,
        id: Uuid,
        score: f64,
        rationale: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Candidate>> {
        let mut t = self.tables()?;
        Ok(t.candidates.get_mut(&id).map(|c| {
            c.ai_score = Some(score);
            c.ai_rationale = Some(rationale.to_string());
            c.updated_at = now;
            c.clone()
        }))
    }

    async fn touch_last_contacted(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(c) = self.tables()?.candidates.get_mut(&id) {
            c.last_contacted_at = Some(at);
            c.updated_at = at;
        }
        Ok(())
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables()?;
        if t.candidates.remove(&id).is_none() {
            return Ok(false);
        }
        t.drop_interviews_where(|i| i.candidate_id == id);
        t.outreach.retain(|_, o| o.candidate_id != id);
        Ok(true)
    }

    async fn list_candidates(
        &self,
        filter: &CandidateFilter,
        page: PageRequest,
    ) -> Result<Page<Candidate>> {
        let t = self.tables()?;
        let mut rows: Vec<Candidate> = t
            .candidates
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(Page::slice(rows, page))
    }

    async fn list_candidates_for_job(&self, job_id: Uuid) -> Result<Vec<Candidate>> {
        let t = self.tables()?;
        let mut rows: Vec<Candidate> = t
            .candidates
            .values()
            .filter(|c| c.job_id == Some(job_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn count_candidates_by_stage(&self) -> Result<Vec<(CandidateStage, i64)>> {
        Ok(tally(self.tables()?.candidates.values().map(|c| c.stage)))
    }

    async fn count_candidates_by_status(&self) -> Result<Vec<(CandidateStatus, i64)>> {
        Ok(tally(self.tables()?.candidates.values().map(|c| c.status)))
    }

    async fn monthly_applications(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>> {
        let t = self.tables()?;
        Ok(monthly(
            t.candidates
                .values()
                .map(|c| c.created_at)
                .filter(|at| *at >= since),
        ))
    }

    async fn monthly_hires(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>> {
        let t = self.tables()?;
        Ok(monthly(
            t.candidates
                .values()
                .filter_map(|c| c.hired_at)
                .filter(|at| *at >= since),
        ))
    }
}

#[async_trait]
impl InterviewRepository for MemoryStore {
    async fn insert_interview(&self, interview: &Interview) -> Result<Interview> {
        let mut t = self.tables()?;
        if !t.candidates.contains_key(&interview.candidate_id) {
            return Err(not_found("Candidate", interview.candidate_id));
        }
        t.interviews.insert(interview.id, interview.clone());
        Ok(interview.clone())
    }

    async fn find_interview(&self, id: Uuid) -> Result<Option<Interview>> {
        Ok(self.tables()?.interviews.get(&id).cloned())
    }

    async fn transition_interview(
        &self,
        interview: &Interview,
        expected: InterviewStatus,
    ) -> Result<Option<Interview>> {
        Ok(self.tables()?.transition_interview(interview, expected))
    }

    async fn replace_interview(&self, old: &Interview, new: &Interview) -> Result<Interview> {
        let mut t = self.tables()?;
        if t.interviews.contains_key(&new.id) {
            return Err(Error::Conflict("Interview already exists".to_string()));
        }
        if t.transition_interview(old, InterviewStatus::Scheduled).is_none() {
            return Err(Error::InvalidTransition(format!(
                "Interview {} is no longer scheduled",
                old.id
            )));
        }
        t.interviews.insert(new.id, new.clone());
        Ok(new.clone())
    }

    async fn list_interviews(
        &self,
        filter: &InterviewFilter,
        page: PageRequest,
    ) -> Result<Page<Interview>> {
        let t = self.tables()?;
        let mut rows: Vec<Interview> = t
            .interviews
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        Ok(Page::slice(rows, page))
    }

    async fn add_feedback(&self, feedback: &Feedback, now: DateTime<Utc>) -> Result<Feedback> {
        let mut t = self.tables()?;
        if t.feedback.contains_key(&feedback.id) {
            return Err(Error::Conflict("Feedback already exists".to_string()));
        }
        let interview = t
            .interviews
            .get_mut(&feedback.interview_id)
            .filter(|i| i.status.accepts_feedback())
            .ok_or_else(|| {
                Error::InvalidTransition(format!(
                    "Interview {} no longer accepts feedback",
                    feedback.interview_id
                ))
            })?;
        if interview.status == InterviewStatus::Scheduled {
            interview.status = InterviewStatus::Completed;
            interview.updated_at = now;
        }
        t.feedback.insert(feedback.id, feedback.clone());
        Ok(feedback.clone())
    }

    async fn list_feedback(&self, interview_id: Uuid) -> Result<Vec<Feedback>> {
        let t = self.tables()?;
        let mut rows: Vec<Feedback> = t
            .feedback
            .values()
            .filter(|f| f.interview_id == interview_id)
            .cloned()
            .collect();
        rows.sort_by_key(|f| f.created_at);
        Ok(rows)
    }

    async fn count_interviews_by_status(&self) -> Result<Vec<(InterviewStatus, i64)>> {
        Ok(tally(self.tables()?.interviews.values().map(|i| i.status)))
    }

    async fn count_upcoming_interviews(&self, now: DateTime<Utc>) -> Result<i64> {
        let t = self.tables()?;
        Ok(t
            .interviews
            .values()
            .filter(|i| i.status == InterviewStatus::Scheduled && i.scheduled_at >= now)
            .count() as i64)
    }

    async fn monthly_interviews(&self, since: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>> {
        let t = self.tables()?;
        Ok(monthly(
            t.interviews
                .values()
                .map(|i| i.created_at)
                .filter(|at| *at >= since),
        ))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<User> {
        let mut t = self.tables()?;
        if t.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(Error::Conflict("Email already registered".to_string()));
        }
        t.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let t = self.tables()?;
        Ok(t
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn insert_task(&self, task: &Task) -> Result<Task> {
        self.tables()?.insert_task(task)?;
        Ok(task.clone())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.tables()?.tasks.get(&id).cloned())
    }

    async fn claim_next_task(&self, now: DateTime<Utc>) -> Result<Option<Task>> {
        let mut t = self.tables()?;
        let next = t
            .tasks
            .values_mut()
            .filter(|task| task.status == TaskStatus::Pending)
            .min_by_key(|task| task.created_at);
        Ok(next.map(|task| {
            task.status = TaskStatus::Running;
            task.started_at = Some(now);
            task.clone()
        }))
    }

    async fn finish_task(
        &self,
        id: Uuid,
        status: TaskStatus,
        result: Option<JsonValue>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let mut t = self.tables()?;
        let task = t.tasks.get_mut(&id).ok_or_else(|| not_found("Task", id))?;
        task.status = status;
        task.result = result;
        task.error = error;
        task.finished_at = Some(now);
        Ok(task.clone())
    }

    async fn cancel_pending_task(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Task>> {
        let mut t = self.tables()?;
        match t.tasks.get_mut(&id) {
            Some(task) if task.status == TaskStatus::Pending => {
                task.status = TaskStatus::Cancelled;
                task.finished_at = Some(now);
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn fail_stale_tasks(
        &self,
        started_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut t = self.tables()?;
        let mut failed = 0;
        for task in t.tasks.values_mut().filter(|task| {
            task.status == TaskStatus::Running
                && task.started_at.is_some_and(|at| at < started_before)
        }) {
            task.status = TaskStatus::Failed;
            task.error = Some(STALE_TASK_ERROR.to_string());
            task.finished_at = Some(now);
            failed += 1;
        }
        Ok(failed)
    }
}

#[async_trait]
impl OutreachRepository for MemoryStore {
    async fn insert_outreach_with_task(&self, outreach: &Outreach, task: &Task) -> Result<Outreach> {
        let mut t = self.tables()?;
        if t.tasks.contains_key(&task.id) {
            return Err(Error::Conflict("Task already exists".to_string()));
        }
        t.insert_outreach(outreach)?;
        t.insert_task(task)?;
        Ok(outreach.clone())
    }

    async fn find_outreach(&self, id: Uuid) -> Result<Option<Outreach>> {
        Ok(self.tables()?.outreach.get(&id).cloned())
    }

    async fn find_outreach_by_provider_id(
        &self,
        provider_message_id: &str,
    ) -> Result<Option<Outreach>> {
        Ok(self
            .tables()?
            .outreach_by_provider_id(provider_message_id)
            .cloned())
    }

    async fn update_outreach(&self, outreach: &Outreach) -> Result<Outreach> {
        let mut t = self.tables()?;
        let slot = t
            .outreach
            .get_mut(&outreach.id)
            .ok_or_else(|| not_found("Outreach", outreach.id))?;
        *slot = Outreach {
            delivery_status: slot.delivery_status,
            duration_seconds: slot.duration_seconds,
            status_updated_at: slot.status_updated_at,
            ..outreach.clone()
        };
        Ok(slot.clone())
    }

    async fn record_delivery_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
        duration_seconds: Option<i32>,
        at: DateTime<Utc>,
    ) -> Result<Option<Outreach>> {
        let mut t = self.tables()?;
        Ok(t.outreach_by_provider_id(provider_message_id).map(|o| {
            o.apply_delivery_status(status, duration_seconds, at);
            o.clone()
        }))
    }

    async fn list_outreach(&self, candidate_id: Uuid) -> Result<Vec<Outreach>> {
        let t = self.tables()?;
        let mut rows: Vec<Outreach> = t
            .outreach
            .values()
            .filter(|o| o.candidate_id == candidate_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::Recommendation;
    use crate::models::interview::{InterviewMode, InterviewType};
    use crate::models::job::{EmploymentType, JobPriority};
    use crate::models::outreach::OutreachChannel;
    use crate::models::task::TaskPayload;
    use chrono::TimeZone;

    fn job() -> Job {
        let ts = Utc::now();
        Job {
            id: Uuid::new_v4(),
            title: "Platform Engineer".into(),
            description: "Build the platform".into(),
            requirements: None,
            department: None,
            location: None,
            employment_type: EmploymentType::FullTime,
            experience_level: None,
            salary_min: None,
            salary_max: None,
            currency: "INR".into(),
            status: JobStatus::Active,
            priority: JobPriority::Medium,
            parsed_skills: vec![],
            deadline: None,
            created_by: Uuid::new_v4(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn candidate(email: &str, job_id: Option<Uuid>) -> Candidate {
        let ts = Utc::now();
        Candidate {
            id: Uuid::new_v4(),
            first_name: "Meera".into(),
            last_name: "Iyer".into(),
            email: email.into(),
            phone: None,
            linkedin_url: None,
            current_title: None,
            current_company: None,
            experience_years: None,
            skills: vec![],
            location: None,
            source: "manual".into(),
            job_id,
            status: CandidateStatus::Active,
            stage: CandidateStage::Applied,
            ai_score: None,
            ai_rationale: None,
            hired_at: None,
            last_contacted_at: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn interview(c: &Candidate, job_id: Uuid) -> Interview {
        let ts = Utc::now();
        Interview {
            id: Uuid::new_v4(),
            candidate_id: c.id,
            job_id,
            interviewer_id: Uuid::new_v4(),
            title: "Technical Interview - Meera Iyer".into(),
            interview_type: InterviewType::Technical,
            mode: InterviewMode::Video,
            scheduled_at: ts,
            duration_minutes: 60,
            timezone: "UTC".into(),
            status: InterviewStatus::Scheduled,
            booking_ref: None,
            meeting_link: None,
            rescheduled_from: None,
            reschedule_reason: None,
            cancel_reason: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn feedback(interview_id: Uuid) -> Feedback {
        Feedback {
            id: Uuid::new_v4(),
            interview_id,
            submitted_by: Uuid::new_v4(),
            overall_rating: 4,
            technical_rating: None,
            communication_rating: None,
            cultural_fit_rating: None,
            problem_solving_rating: None,
            strengths: None,
            weaknesses: None,
            comments: None,
            recommendation: Recommendation::Hire,
            created_at: Utc::now(),
        }
    }

    fn task(payload: TaskPayload) -> Task {
        Task::new(&payload, None, None, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn deleting_job_refuses_to_duplicate_pooled_candidate() {
        let store = MemoryStore::default();
        let j = store.insert_job(&job()).await.unwrap();
        store
            .insert_candidate(&candidate("dev@example.com", None))
            .await
            .unwrap();
        let attached = store
            .insert_candidate(&candidate("DEV@example.com", Some(j.id)))
            .await
            .unwrap();

        let err = store.delete_job(j.id).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(store.find_job(j.id).await.unwrap().is_some());
        let kept = store.find_candidate(attached.id).await.unwrap().unwrap();
        assert_eq!(kept.job_id, Some(j.id));

        store.delete_candidate(attached.id).await.unwrap();
        assert!(store.delete_job(j.id).await.unwrap());
    }

    #[tokio::test]
    async fn stale_candidate_transition_is_refused() {
        let store = MemoryStore::default();
        let c = store.insert_candidate(&candidate("a@example.com", None)).await.unwrap();

        let mut hired = c.clone();
        hired.advance_to(CandidateStage::Hired, Utc::now()).unwrap();
        let mut rejected = c.clone();
        rejected.advance_to(CandidateStage::Rejected, Utc::now()).unwrap();

        let expected = (c.stage, c.status);
        assert!(store.transition_candidate(&hired, expected).await.unwrap().is_some());
        assert!(store.transition_candidate(&rejected, expected).await.unwrap().is_none());
        let stored = store.find_candidate(c.id).await.unwrap().unwrap();
        assert_eq!(stored.stage, CandidateStage::Hired);
        assert_eq!(stored.status, CandidateStatus::Hired);
    }

    #[tokio::test]
    async fn profile_update_leaves_pipeline_columns_alone() {
        let store = MemoryStore::default();
        let c = store.insert_candidate(&candidate("p@example.com", None)).await.unwrap();
        let stale = c.clone();

        let mut hired = c.clone();
        hired.advance_to(CandidateStage::Hired, Utc::now()).unwrap();
        store.transition_candidate(&hired, (c.stage, c.status)).await.unwrap();
        store.set_candidate_assessment(c.id, 0.7, "solid", Utc::now()).await.unwrap();

        let mut edit = stale;
        edit.location = Some("Pune".into());
        let saved = store.update_candidate(&edit).await.unwrap();
        assert_eq!(saved.location.as_deref(), Some("Pune"));
        assert_eq!(saved.stage, CandidateStage::Hired);
        assert!(saved.hired_at.is_some());
        assert_eq!(saved.ai_score, Some(0.7));
    }

    #[tokio::test]
    async fn second_replacement_of_same_interview_fails() {
        let store = MemoryStore::default();
        let j = store.insert_job(&job()).await.unwrap();
        let c = store.insert_candidate(&candidate("r@example.com", Some(j.id))).await.unwrap();
        let original = store.insert_interview(&interview(&c, j.id)).await.unwrap();

        let mut first_old = original.clone();
        let first = first_old
            .reschedule(original.slot(), "bk-a".into(), None, Utc::now())
            .unwrap();
        let mut second_old = original.clone();
        let second = second_old
            .reschedule(original.slot(), "bk-b".into(), None, Utc::now())
            .unwrap();

        store.replace_interview(&first_old, &first).await.unwrap();
        let err = store.replace_interview(&second_old, &second).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert!(store.find_interview(second.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn feedback_is_refused_for_cancelled_interview() {
        let store = MemoryStore::default();
        let j = store.insert_job(&job()).await.unwrap();
        let c = store.insert_candidate(&candidate("f@example.com", Some(j.id))).await.unwrap();
        let scheduled = store.insert_interview(&interview(&c, j.id)).await.unwrap();

        let mut cancelled = scheduled.clone();
        cancelled.cancel(None, Utc::now()).unwrap();
        store
            .transition_interview(&cancelled, InterviewStatus::Scheduled)
            .await
            .unwrap();

        let err = store
            .add_feedback(&feedback(scheduled.id), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert!(store.list_feedback(scheduled.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outreach_and_task_are_stored_together_or_not_at_all() {
        let store = MemoryStore::default();
        let c = store.insert_candidate(&candidate("o@example.com", None)).await.unwrap();
        let existing = store
            .insert_task(&task(TaskPayload::AnalyzeCandidate { candidate_id: c.id }))
            .await
            .unwrap();

        let outreach = Outreach::pending(c.id, OutreachChannel::Email, None, None, None, Utc::now());
        let mut clashing = task(TaskPayload::SendOutreach { outreach_id: outreach.id });
        clashing.id = existing.id;
        let err = store
            .insert_outreach_with_task(&outreach, &clashing)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(store.list_outreach(c.id).await.unwrap().is_empty());

        let fresh = task(TaskPayload::SendOutreach { outreach_id: outreach.id });
        store.insert_outreach_with_task(&outreach, &fresh).await.unwrap();
        assert_eq!(store.list_outreach(c.id).await.unwrap().len(), 1);
        assert!(store.find_task(fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn job_and_analysis_task_are_stored_together_or_not_at_all() {
        let store = MemoryStore::default();
        let j = job();
        let existing = store
            .insert_task(&task(TaskPayload::ParseJob { job_id: j.id }))
            .await
            .unwrap();
        let mut clashing = task(TaskPayload::ParseJob { job_id: j.id });
        clashing.id = existing.id;

        assert!(store.insert_job_with_task(&j, &clashing).await.is_err());
        assert!(store.find_job(j.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_running_tasks_are_failed() {
        let store = MemoryStore::default();
        let t = store
            .insert_task(&task(TaskPayload::ParseJob { job_id: Uuid::new_v4() }))
            .await
            .unwrap();
        let started = Utc::now() - chrono::Duration::hours(2);
        store.claim_next_task(started).await.unwrap();

        let reaped = store
            .fail_stale_tasks(Utc::now() - chrono::Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(reaped, 1);
        let t = store.find_task(t.id).await.unwrap().unwrap();
        assert_eq!(t.status, TaskStatus::Failed);
        assert_eq!(t.error.as_deref(), Some(STALE_TASK_ERROR));
    }

    #[test]
    fn monthly_groups_by_first_day() {
        let stamps = vec![
            Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 30, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        ];
        let series = monthly(stamps.into_iter());
        assert_eq!(
            series,
            vec![
                (NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 2),
                (NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 1),
            ]
        );
    }
}
