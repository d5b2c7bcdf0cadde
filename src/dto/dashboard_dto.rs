use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::candidate::{CandidateStage, CandidateStatus};
use crate::models::interview::InterviewStatus;
use crate::models::job::JobStatus;

fn default_months() -> u32 {
    6
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TrendsQuery {
    #[serde(default = "default_months")]
    #[validate(range(min = 1, max = 24))]
    pub months: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Count<K> {
    pub key: K,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewResponse {
    pub total_jobs: i64,
    pub total_candidates: i64,
    pub total_interviews: i64,
    pub upcoming_interviews: i64,
    pub jobs_by_status: Vec<Count<JobStatus>>,
    pub candidates_by_stage: Vec<Count<CandidateStage>>,
    pub candidates_by_status: Vec<Count<CandidateStatus>>,
    pub interviews_by_status: Vec<Count<InterviewStatus>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// First day of the month.
    pub month: NaiveDate,
    pub applications: i64,
    pub interviews: i64,
    pub hires: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendsResponse {
    pub months: u32,
    pub series: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStage {
    pub stage: CandidateStage,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResponse {
    pub job_id: Uuid,
    pub job_title: String,
    pub total: i64,
    pub stages: Vec<PipelineStage>,
}
