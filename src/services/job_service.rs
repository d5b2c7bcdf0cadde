use uuid::Uuid;

use crate::database::{JobFilter, Page, PageRequest, Repositories};
use crate::dto::job_dto::{CreateJobPayload, JobResponse, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{EmploymentType, Job, JobPriority, JobStatus};
use crate::models::task::TaskPayload;
use crate::services::queue_service::TaskQueue;
use crate::utils::time::now;
use crate::utils::validation::{check_salary_range, salary_range_error, validate_all};

const DEFAULT_CURRENCY: &str = "INR";

#[derive(Clone)]
pub struct JobService {
    repos: Repositories,
    queue: TaskQueue,
}

impl JobService {
    pub fn new(repos: Repositories, queue: TaskQueue) -> Self {
        Self { repos, queue }
    }

    pub async fn create(&self, payload: CreateJobPayload, created_by: Uuid) -> Result<JobResponse> {
        validate_all(&payload, |errors| {
            if let Some(err) = salary_range_error(payload.salary_min, payload.salary_max) {
                errors.add("salary_min", err);
            }
        })?;

        let ts = now();
        let job = Job {
            id: Uuid::new_v4(),
            title: payload.title.trim().to_string(),
            description: payload.description,
            requirements: payload.requirements,
            department: payload.department,
            location: payload.location,
            employment_type: payload.employment_type.unwrap_or(EmploymentType::FullTime),
            experience_level: payload.experience_level,
            salary_min: payload.salary_min,
            salary_max: payload.salary_max,
            currency: payload
                .currency
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            status: payload.status.unwrap_or(JobStatus::Active),
            priority: payload.priority.unwrap_or(JobPriority::Medium),
            parsed_skills: Vec::new(),
            deadline: payload.deadline,
            created_by,
            created_at: ts,
            updated_at: ts,
        };
        let (job, analysis_task_id) = if payload.analyze {
            let task = self.queue.prepare(
                TaskPayload::ParseJob { job_id: job.id },
                payload.callback_url,
                Some(created_by),
            )?;
            let job = self.repos.jobs.insert_job_with_task(&job, &task).await?;
            tracing::info!(job_id = %job.id, task_id = %task.id, "job analysis queued");
            (job, Some(task.id))
        } else {
            (self.repos.jobs.insert_job(&job).await?, None)
        };
        tracing::info!(job_id = %job.id, title = %job.title, "job created");

        let mut response = JobResponse::from(job);
        response.analysis_task_id = analysis_task_id;
        Ok(response)
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        self.repos
            .jobs
            .find_job(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))
    }

    /// Merges the patch over the stored job; the salary bounds are checked on the result.
    pub async fn update(&self, id: Uuid, payload: UpdateJobPayload) -> Result<Job> {
        validate_all(&payload, |_| {})?;
        let mut job = self.get(id).await?;

        if let Some(title) = payload.title {
            job.title = title.trim().to_string();
        }
        if let Some(description) = payload.description {
            job.description = description;
        }
        if payload.requirements.is_some() {
            job.requirements = payload.requirements;
        }
        if payload.department.is_some() {
            job.department = payload.department;
        }
        if payload.location.is_some() {
            job.location = payload.location;
        }
        if let Some(employment_type) = payload.employment_type {
            job.employment_type = employment_type;
        }
        if payload.experience_level.is_some() {
            job.experience_level = payload.experience_level;
        }
        if payload.salary_min.is_some() {
            job.salary_min = payload.salary_min;
        }
        if payload.salary_max.is_some() {
            job.salary_max = payload.salary_max;
        }
        if let Some(currency) = payload.currency {
            job.currency = currency.to_uppercase();
        }
        if let Some(status) = payload.status {
            job.status = status;
        }
        if let Some(priority) = payload.priority {
            job.priority = priority;
        }
        if payload.deadline.is_some() {
            job.deadline = payload.deadline;
        }
        check_salary_range(job.salary_min, job.salary_max)?;

        job.updated_at = now();
        let job = self.repos.jobs.update_job(&job).await?;
        tracing::info!(job_id = %job.id, "job updated");
        Ok(job)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repos.jobs.delete_job(id).await? {
            return Err(Error::NotFound(format!("Job {} not found", id)));
        }
        tracing::info!(job_id = %id, "job deleted");
        Ok(())
    }

    pub async fn list(&self, filter: &JobFilter, page: PageRequest) -> Result<Page<Job>> {
        self.repos.jobs.list_jobs(filter, page).await
    }
}
