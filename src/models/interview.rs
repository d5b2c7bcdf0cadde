use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "interview_status", rename_all = "lowercase")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl InterviewStatus {
    pub const ALL: [InterviewStatus; 4] = [
        InterviewStatus::Scheduled,
        InterviewStatus::Completed,
        InterviewStatus::Cancelled,
        InterviewStatus::Rescheduled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
            InterviewStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn accepts_feedback(self) -> bool {
        matches!(self, InterviewStatus::Scheduled | InterviewStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "interview_mode", rename_all = "kebab-case")]
pub enum InterviewMode {
    Video,
    Phone,
    InPerson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "interview_type", rename_all = "lowercase")]
pub enum InterviewType {
    Technical,
    Behavioral,
    Hr,
    Final,
}

impl InterviewType {
    pub fn label(self) -> &'static str {
        match self {
            InterviewType::Technical => "Technical",
            InterviewType::Behavioral => "Behavioral",
            InterviewType::Hr => "HR",
            InterviewType::Final => "Final",
        }
    }
}

/// A concrete time window on an interviewer's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub interviewer_id: Uuid,
    pub start: DateTime<Utc>,
    pub duration_minutes: i32,
}

impl Slot {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        self.interviewer_id == other.interviewer_id
            && self.start < other.end()
            && other.start < self.end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub interviewer_id: Uuid,
    pub title: String,
    pub interview_type: InterviewType,
    pub mode: InterviewMode,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub timezone: String,
    pub status: InterviewStatus,
    pub booking_ref: Option<String>,
    pub meeting_link: Option<String>,
    pub rescheduled_from: Option<Uuid>,
    pub reschedule_reason: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub fn slot(&self) -> Slot {
        Slot {
            interviewer_id: self.interviewer_id,
            start: self.scheduled_at,
            duration_minutes: self.duration_minutes,
        }
    }

    fn require_scheduled(&self, action: &str) -> Result<()> {
        if self.status != InterviewStatus::Scheduled {
            return Err(Error::InvalidTransition(format!(
                "Cannot {} an interview in status '{}'",
                action,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<()> {
        self.require_scheduled("cancel")?;
        self.status = InterviewStatus::Cancelled;
        self.cancel_reason = reason;
        self.updated_at = now;
        Ok(())
    }

    /// Closes this interview and returns its scheduled replacement.
    pub fn reschedule(
        &mut self,
        slot: Slot,
        booking_ref: String,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Interview> {
        self.require_scheduled("reschedule")?;
        self.status = InterviewStatus::Rescheduled;
        self.reschedule_reason = reason.clone();
        self.updated_at = now;

        Ok(Interview {
            id: Uuid::new_v4(),
            candidate_id: self.candidate_id,
            job_id: self.job_id,
            interview_type: self.interview_type,
            mode: self.mode,
            interviewer_id: slot.interviewer_id,
            scheduled_at: slot.start,
            duration_minutes: slot.duration_minutes,
            status: InterviewStatus::Scheduled,
            booking_ref: Some(booking_ref),
            meeting_link: None,
            rescheduled_from: Some(self.id),
            reschedule_reason: reason,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
            title: self.title.clone(),
            timezone: self.timezone.clone(),
        })
    }

    /// Feedback is taken while scheduled or completed; the first one completes it.
    pub fn accept_feedback(&mut self, now: DateTime<Utc>) -> Result<bool> {
        if !self.status.accepts_feedback() {
            return Err(Error::InvalidTransition(format!(
                "Cannot record feedback for an interview in status '{}'",
                self.status.as_str()
            )));
        }
        if self.status == InterviewStatus::Scheduled {
            self.status = InterviewStatus::Completed;
            self.updated_at = now;
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interview(status: InterviewStatus) -> Interview {
        let now = Utc::now();
        Interview {
            id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            interviewer_id: Uuid::new_v4(),
            title: "Technical Interview - John Doe".into(),
            interview_type: InterviewType::Technical,
            mode: InterviewMode::Video,
            scheduled_at: now,
            duration_minutes: 60,
            timezone: "Asia/Kolkata".into(),
            status,
            booking_ref: Some("bk-1".into()),
            meeting_link: None,
            rescheduled_from: None,
            reschedule_reason: None,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn completed_interview_cannot_be_cancelled() {
        let mut i = interview(InterviewStatus::Completed);
        assert!(matches!(
            i.cancel(None, Utc::now()),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn reschedule_links_replacement() {
        let mut old = interview(InterviewStatus::Scheduled);
        let slot = Slot {
            interviewer_id: old.interviewer_id,
            start: old.scheduled_at + Duration::days(1),
            duration_minutes: 45,
        };
        let new = old
            .reschedule(slot, "bk-2".into(), Some("conflict".into()), Utc::now())
            .unwrap();
        assert_eq!(old.status, InterviewStatus::Rescheduled);
        assert_eq!(new.status, InterviewStatus::Scheduled);
        assert_eq!(new.rescheduled_from, Some(old.id));
        assert_eq!(new.duration_minutes, 45);
        assert_eq!(new.candidate_id, old.candidate_id);
        assert_ne!(new.id, old.id);
    }

    #[test]
    fn first_feedback_completes_interview() {
        let mut i = interview(InterviewStatus::Scheduled);
        assert!(i.accept_feedback(Utc::now()).unwrap());
        assert_eq!(i.status, InterviewStatus::Completed);
        assert!(!i.accept_feedback(Utc::now()).unwrap());

        let mut cancelled = interview(InterviewStatus::Cancelled);
        assert!(cancelled.accept_feedback(Utc::now()).is_err());
    }

    #[test]
    fn slots_overlap_only_for_same_interviewer() {
        let start = Utc::now();
        let who = Uuid::new_v4();
        let a = Slot { interviewer_id: who, start, duration_minutes: 60 };
        let b = Slot { interviewer_id: who, start: start + Duration::minutes(30), duration_minutes: 60 };
        let c = Slot { interviewer_id: who, start: start + Duration::minutes(60), duration_minutes: 30 };
        let d = Slot { interviewer_id: Uuid::new_v4(), ..a };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&d));
    }
}
