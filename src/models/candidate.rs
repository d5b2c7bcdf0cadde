use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::utils::validation::field_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "candidate_status", rename_all = "kebab-case")]
pub enum CandidateStatus {
    Active,
    Hired,
    Rejected,
    OnHold,
}

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 4] = [
        CandidateStatus::Active,
        CandidateStatus::Hired,
        CandidateStatus::Rejected,
        CandidateStatus::OnHold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStatus::Active => "active",
            CandidateStatus::Hired => "hired",
            CandidateStatus::Rejected => "rejected",
            CandidateStatus::OnHold => "on-hold",
        }
    }

    /// Statuses a recruiter may set directly; the rest follow the stage.
    pub fn is_manual(self) -> bool {
        matches!(self, CandidateStatus::Active | CandidateStatus::OnHold)
    }
}

/// Position in the hiring funnel.
///
/// `applied → screening → interview → offer → hired` is the forward order;
/// `rejected` sits outside it and is reachable from every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "candidate_stage", rename_all = "lowercase")]
pub enum CandidateStage {
    Applied,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl CandidateStage {
    pub const ALL: [CandidateStage; 6] = [
        CandidateStage::Applied,
        CandidateStage::Screening,
        CandidateStage::Interview,
        CandidateStage::Offer,
        CandidateStage::Hired,
        CandidateStage::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStage::Applied => "applied",
            CandidateStage::Screening => "screening",
            CandidateStage::Interview => "interview",
            CandidateStage::Offer => "offer",
            CandidateStage::Hired => "hired",
            CandidateStage::Rejected => "rejected",
        }
    }

    fn rank(self) -> Option<u8> {
        match self {
            CandidateStage::Applied => Some(0),
            CandidateStage::Screening => Some(1),
            CandidateStage::Interview => Some(2),
            CandidateStage::Offer => Some(3),
            CandidateStage::Hired => Some(4),
            CandidateStage::Rejected => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CandidateStage::Hired | CandidateStage::Rejected)
    }

    /// Forward moves may skip stages; nothing leaves a terminal stage.
    pub fn can_advance_to(self, next: CandidateStage) -> bool {
        if self.is_terminal() || self == next {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(target)) => target > current,
            (None, Some(_)) => false,
        }
    }

    /// Status forced by a terminal stage.
    pub fn implied_status(self) -> Option<CandidateStatus> {
        match self {
            CandidateStage::Hired => Some(CandidateStatus::Hired),
            CandidateStage::Rejected => Some(CandidateStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    pub experience_years: Option<i32>,
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub source: String,
    pub job_id: Option<Uuid>,
    pub status: CandidateStatus,
    pub stage: CandidateStage,
    pub ai_score: Option<f64>,
    pub ai_rationale: Option<String>,
    pub hired_at: Option<DateTime<Utc>>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn advance_to(&mut self, next: CandidateStage, now: DateTime<Utc>) -> Result<()> {
        if !self.stage.can_advance_to(next) {
            return Err(Error::InvalidTransition(format!(
                "Candidate cannot move from stage '{}' to '{}'",
                self.stage.as_str(),
                next.as_str()
            )));
        }
        self.stage = next;
        if let Some(status) = next.implied_status() {
            self.status = status;
        }
        if next == CandidateStage::Hired {
            self.hired_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Applies a recruiter-chosen status, keeping stage and status consistent.
    pub fn set_status(&mut self, status: CandidateStatus, now: DateTime<Utc>) -> Result<()> {
        if !status.is_manual() {
            return Err(field_error(
                "status",
                "derived_from_stage",
                format!(
                    "status '{}' is set by moving the candidate to that stage",
                    status.as_str()
                ),
            ));
        }
        if self.stage.is_terminal() {
            return Err(Error::InvalidTransition(format!(
                "Candidate in stage '{}' keeps status '{}'",
                self.stage.as_str(),
                self.status.as_str()
            )));
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }
}
