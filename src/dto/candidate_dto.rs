use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::CandidateFilter;
use crate::models::candidate::{CandidateStage, CandidateStatus};
use crate::models::outreach::OutreachChannel;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCandidatePayload {
    #[validate(custom(function = "crate::utils::validation::non_blank"), length(max = 100))]
    pub first_name: String,
    #[validate(custom(function = "crate::utils::validation::non_blank"), length(max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(length(max = 200))]
    pub current_title: Option<String>,
    #[validate(length(max = 200))]
    pub current_company: Option<String>,
    #[validate(range(min = 0, max = 60))]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub source: Option<String>,
    pub job_id: Option<Uuid>,
    /// Initial stage; the status follows from it.
    pub stage: Option<CandidateStage>,
}

/// Profile fields only; stage and status move through their own endpoints.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCandidatePayload {
    #[validate(custom(function = "crate::utils::validation::non_blank"), length(max = 100))]
    pub first_name: Option<String>,
    #[validate(custom(function = "crate::utils::validation::non_blank"), length(max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(length(max = 200))]
    pub current_title: Option<String>,
    #[validate(length(max = 200))]
    pub current_company: Option<String>,
    #[validate(range(min = 0, max = 60))]
    pub experience_years: Option<i32>,
    pub skills: Option<Vec<String>>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageChangePayload {
    pub stage: CandidateStage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangePayload {
    pub status: CandidateStatus,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AnalyzeCandidatePayload {
    #[validate(url)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OutreachPayload {
    pub channel: OutreachChannel,
    #[validate(length(min = 1, max = 200))]
    pub subject: Option<String>,
    /// Left empty to have the message drafted by the AI provider.
    #[validate(length(min = 1, max = 5000))]
    pub body: Option<String>,
    #[validate(url)]
    pub callback_url: Option<String>,
}

/// Moves freshly applied candidates to screening and queues a first contact.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkApprovePayload {
    #[validate(length(min = 1, max = 100))]
    pub candidate_ids: Vec<Uuid>,
    /// Defaults to email.
    pub channel: Option<OutreachChannel>,
    #[validate(length(min = 1, max = 200))]
    pub subject: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub body: Option<String>,
    #[validate(url)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalOutcome {
    Approved,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalResult {
    pub candidate_id: Uuid,
    pub status: ApprovalOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outreach_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApprovalResult {
    pub fn approved(candidate_id: Uuid, outreach_id: Uuid, task_id: Uuid) -> Self {
        Self {
            candidate_id,
            status: ApprovalOutcome::Approved,
            outreach_id: Some(outreach_id),
            task_id: Some(task_id),
            reason: None,
        }
    }

    pub fn skipped(candidate_id: Uuid, reason: String) -> Self {
        Self {
            candidate_id,
            status: ApprovalOutcome::Skipped,
            outreach_id: None,
            task_id: None,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkApproveResponse {
    pub approved: usize,
    pub skipped: usize,
    pub results: Vec<ApprovalResult>,
}

impl BulkApproveResponse {
    pub fn new(results: Vec<ApprovalResult>) -> Self {
        let approved = results
            .iter()
            .filter(|r| r.status == ApprovalOutcome::Approved)
            .count();
        Self {
            approved,
            skipped: results.len() - approved,
            results,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobCandidatesQuery {
    pub stage: Option<CandidateStage>,
    pub status: Option<CandidateStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateListQuery {
    pub status: Option<CandidateStatus>,
    pub stage: Option<CandidateStage>,
    pub job_id: Option<Uuid>,
    pub source: Option<String>,
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl CandidateListQuery {
    pub fn filter(&self) -> CandidateFilter {
        CandidateFilter {
            status: self.status,
            stage: self.stage,
            job_id: self.job_id,
            source: self.source.clone().filter(|s| !s.trim().is_empty()),
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            created_from: self.created_from,
            created_to: self.created_to,
        }
    }
}
