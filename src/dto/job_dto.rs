use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::JobFilter;
use crate::models::job::{EmploymentType, Job, JobPriority, JobStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(custom(function = "crate::utils::validation::non_blank"), length(max = 200))]
    pub title: String,
    #[validate(custom(function = "crate::utils::validation::non_blank"))]
    pub description: String,
    pub requirements: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    #[validate(length(max = 50))]
    pub experience_level: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub status: Option<JobStatus>,
    pub priority: Option<JobPriority>,
    pub deadline: Option<DateTime<Utc>>,
    /// Queue AI skill extraction after creating the job.
    #[serde(default)]
    pub analyze: bool,
    #[validate(url)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(custom(function = "crate::utils::validation::non_blank"), length(max = 200))]
    pub title: Option<String>,
    #[validate(custom(function = "crate::utils::validation::non_blank"))]
    pub description: Option<String>,
    pub requirements: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    #[validate(length(max = 50))]
    pub experience_level: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub status: Option<JobStatus>,
    pub priority: Option<JobPriority>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
    pub department: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl JobListQuery {
    pub fn filter(&self) -> JobFilter {
        JobFilter {
            status: self.status,
            department: self.department.clone().filter(|d| !d.trim().is_empty()),
            employment_type: self.employment_type,
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_task_id: Option<Uuid>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            job,
            analysis_task_id: None,
        }
    }
}
