use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::InterviewFilter;
use crate::models::feedback::Recommendation;
use crate::models::interview::{InterviewMode, InterviewStatus, InterviewType, Slot};

fn default_duration() -> i32 {
    60
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduleInterviewPayload {
    pub candidate_id: Uuid,
    /// Defaults to the candidate's job.
    pub job_id: Option<Uuid>,
    pub interviewer_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default = "default_duration")]
    #[validate(range(min = 15, max = 480))]
    pub duration_minutes: i32,
    pub mode: Option<InterviewMode>,
    pub interview_type: Option<InterviewType>,
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CancelInterviewPayload {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RescheduleInterviewPayload {
    pub scheduled_at: DateTime<Utc>,
    /// Keeps the current duration when omitted.
    #[validate(range(min = 15, max = 480))]
    pub duration_minutes: Option<i32>,
    pub interviewer_id: Option<Uuid>,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeedbackPayload {
    #[validate(range(min = 1, max = 5))]
    pub overall_rating: i16,
    #[validate(range(min = 1, max = 5))]
    pub technical_rating: Option<i16>,
    #[validate(range(min = 1, max = 5))]
    pub communication_rating: Option<i16>,
    #[validate(range(min = 1, max = 5))]
    pub cultural_fit_rating: Option<i16>,
    #[validate(range(min = 1, max = 5))]
    pub problem_solving_rating: Option<i16>,
    #[validate(length(max = 5000))]
    pub strengths: Option<String>,
    #[validate(length(max = 5000))]
    pub weaknesses: Option<String>,
    #[validate(length(max = 5000))]
    pub comments: Option<String>,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewListQuery {
    pub status: Option<InterviewStatus>,
    pub candidate_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl InterviewListQuery {
    pub fn filter(&self) -> InterviewFilter {
        InterviewFilter {
            status: self.status,
            candidate_id: self.candidate_id,
            job_id: self.job_id,
            interviewer_id: self.interviewer_id,
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AvailabilityQuery {
    pub interviewer_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default = "default_duration")]
    #[validate(range(min = 15, max = 480))]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub interviewer_id: Uuid,
    pub slots: Vec<Slot>,
}
