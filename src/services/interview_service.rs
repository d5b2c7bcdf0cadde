use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::database::{InterviewFilter, Page, PageRequest, Repositories};
use crate::dto::interview_dto::{
    AvailabilityQuery, CancelInterviewPayload, FeedbackPayload, RescheduleInterviewPayload,
    ScheduleInterviewPayload,
};
use crate::error::{Error, Result};
use crate::models::feedback::Feedback;
use crate::models::interview::{Interview, InterviewMode, InterviewStatus, InterviewType, Slot};
use crate::services::calendar_service::{BookingOutcome, CalendarProvider};
use crate::utils::time::now;
use crate::utils::validation::{field_error, validate_all};

const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
const MAX_AVAILABILITY_DAYS: i64 = 62;

fn meeting_link(mode: InterviewMode, at: DateTime<Utc>) -> Option<String> {
    match mode {
        InterviewMode::Video => Some(format!("https://meet.google.com/meet-{}", at.timestamp())),
        InterviewMode::Phone | InterviewMode::InPerson => None,
    }
}

fn slot_taken(slot: &Slot) -> Error {
    Error::SlotUnavailable(format!(
        "Interviewer {} is not free at {} for {} minutes",
        slot.interviewer_id,
        slot.start.to_rfc3339(),
        slot.duration_minutes
    ))
}

#[derive(Clone)]
pub struct InterviewService {
    repos: Repositories,
    calendar: Arc<dyn CalendarProvider>,
}

impl InterviewService {
    pub fn new(repos: Repositories, calendar: Arc<dyn CalendarProvider>) -> Self {
        Self { repos, calendar }
    }

    pub async fn get(&self, id: Uuid) -> Result<Interview> {
        self.repos
            .interviews
            .find_interview(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Interview {} not found", id)))
    }

    pub async fn list(&self, filter: &InterviewFilter, page: PageRequest) -> Result<Page<Interview>> {
        self.repos.interviews.list_interviews(filter, page).await
    }

    pub async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Interview>> {
        if self.repos.candidates.find_candidate(candidate_id).await?.is_none() {
            return Err(Error::NotFound(format!("Candidate {} not found", candidate_id)));
        }
        let filter = InterviewFilter {
            candidate_id: Some(candidate_id),
            ..Default::default()
        };
        self.repos.interviews.list_interviews(&filter, page).await
    }

    async fn ensure_interviewer(&self, interviewer_id: Uuid) -> Result<()> {
        match self.repos.users.find_user(interviewer_id).await? {
            Some(user) if user.is_active => Ok(()),
            _ => Err(Error::NotFound(format!("Interviewer {} not found", interviewer_id))),
        }
    }

    async fn book(&self, slot: &Slot) -> Result<String> {
        match self.calendar.book(slot).await? {
            BookingOutcome::Confirmed(booking_ref) => Ok(booking_ref),
            BookingOutcome::Conflict => Err(slot_taken(slot)),
        }
    }

    /// Books the slot with the calendar and records the interview as `scheduled`.
    pub async fn schedule(&self, payload: ScheduleInterviewPayload) -> Result<Interview> {
        validate_all(&payload, |_| {})?;
        let candidate = self
            .repos
            .candidates
            .find_candidate(payload.candidate_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Candidate {} not found", payload.candidate_id))
            })?;
        if candidate.stage.is_terminal() {
            return Err(Error::InvalidTransition(format!(
                "Candidate in stage '{}' cannot be scheduled for interviews",
                candidate.stage.as_str()
            )));
        }
        let job_id = payload.job_id.or(candidate.job_id).ok_or_else(|| {
            field_error(
                "job_id",
                "required",
                "job_id is required when the candidate is not attached to a job".to_string(),
            )
        })?;
        if self.repos.jobs.find_job(job_id).await?.is_none() {
            return Err(Error::NotFound(format!("Job {} not found", job_id)));
        }
        self.ensure_interviewer(payload.interviewer_id).await?;

        let slot = Slot {
            interviewer_id: payload.interviewer_id,
            start: payload.scheduled_at,
            duration_minutes: payload.duration_minutes,
        };
        let booking_ref = self.book(&slot).await?;

        let interview_type = payload.interview_type.unwrap_or(InterviewType::Technical);
        let mode = payload.mode.unwrap_or(InterviewMode::Video);
        let ts = now();
        let interview = Interview {
            id: Uuid::new_v4(),
            candidate_id: candidate.id,
            job_id,
            interviewer_id: slot.interviewer_id,
            title: format!("{} Interview - {}", interview_type.label(), candidate.full_name()),
            interview_type,
            mode,
            scheduled_at: slot.start,
            duration_minutes: slot.duration_minutes,
            timezone: payload
                .timezone
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            status: InterviewStatus::Scheduled,
            booking_ref: Some(booking_ref.clone()),
            meeting_link: meeting_link(mode, ts),
            rescheduled_from: None,
            reschedule_reason: None,
            cancel_reason: None,
            created_at: ts,
            updated_at: ts,
        };

        match self.repos.interviews.insert_interview(&interview).await {
            Ok(saved) => {
                tracing::info!(
                    interview_id = %saved.id,
                    candidate_id = %saved.candidate_id,
                    interviewer_id = %saved.interviewer_id,
                    "interview scheduled"
                );
                Ok(saved)
            }
            Err(err) => {
                if let Err(release_err) = self.calendar.release(&booking_ref).await {
                    tracing::error!(booking_ref, error = %release_err, "orphaned calendar booking");
                }
                Err(err)
            }
        }
    }

    fn no_longer_scheduled(id: Uuid) -> Error {
        Error::InvalidTransition(format!("Interview {} is no longer scheduled", id))
    }

    /// Marks the interview cancelled, then frees its booking. A failed
    /// release puts the row back to `scheduled`.
    pub async fn cancel(&self, id: Uuid, payload: CancelInterviewPayload) -> Result<Interview> {
        validate_all(&payload, |_| {})?;
        let original = self.get(id).await?;
        let mut interview = original.clone();
        interview.cancel(payload.reason, now())?;
        let cancelled = self
            .repos
            .interviews
            .transition_interview(&interview, InterviewStatus::Scheduled)
            .await?
            .ok_or_else(|| Self::no_longer_scheduled(id))?;

        if let Some(booking_ref) = cancelled.booking_ref.as_deref() {
            if let Err(err) = self.calendar.release(booking_ref).await {
                if let Err(revert_err) = self
                    .repos
                    .interviews
                    .transition_interview(&original, InterviewStatus::Cancelled)
                    .await
                {
                    tracing::error!(interview_id = %id, error = %revert_err, "failed to revert cancellation");
                }
                return Err(err);
            }
        }
        tracing::info!(interview_id = %id, "interview cancelled");
        Ok(cancelled)
    }

    /// Frees the old booking, books the new slot and swaps the two rows in one
    /// transaction. When the new slot cannot be booked the old one is restored.
    pub async fn reschedule(
        &self,
        id: Uuid,
        payload: RescheduleInterviewPayload,
    ) -> Result<Interview> {
        validate_all(&payload, |_| {})?;
        let original = self.get(id).await?;
        let slot = Slot {
            interviewer_id: payload.interviewer_id.unwrap_or(original.interviewer_id),
            start: payload.scheduled_at,
            duration_minutes: payload.duration_minutes.unwrap_or(original.duration_minutes),
        };
        if slot.interviewer_id != original.interviewer_id {
            self.ensure_interviewer(slot.interviewer_id).await?;
        }

        let mut old = original.clone();
        let mut replacement = old.reschedule(slot, String::new(), payload.reason, now())?;

        if let Some(booking_ref) = original.booking_ref.as_deref() {
            self.calendar.release(booking_ref).await?;
        }
        let booking_ref = match self.book(&slot).await {
            Ok(booking_ref) => booking_ref,
            Err(err) => {
                self.restore_booking(original).await;
                return Err(err);
            }
        };
        replacement.booking_ref = Some(booking_ref.clone());
        replacement.meeting_link = meeting_link(replacement.mode, replacement.created_at);

        match self.repos.interviews.replace_interview(&old, &replacement).await {
            Ok(saved) => {
                tracing::info!(
                    interview_id = %saved.id,
                    rescheduled_from = %id,
                    "interview rescheduled"
                );
                Ok(saved)
            }
            Err(err) => {
                if let Err(release_err) = self.calendar.release(&booking_ref).await {
                    tracing::error!(booking_ref, error = %release_err, "orphaned calendar booking");
                }
                self.restore_booking(original).await;
                Err(err)
            }
        }
    }

    async fn restore_booking(&self, mut original: Interview) {
        if original.booking_ref.is_none() {
            return;
        }
        match self.calendar.book(&original.slot()).await {
            Ok(BookingOutcome::Confirmed(booking_ref)) => {
                original.booking_ref = Some(booking_ref.clone());
                match self
                    .repos
                    .interviews
                    .transition_interview(&original, InterviewStatus::Scheduled)
                    .await
                {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        tracing::warn!(interview_id = %original.id, "interview moved on before its booking was restored");
                        if let Err(err) = self.calendar.release(&booking_ref).await {
                            tracing::error!(booking_ref, error = %err, "orphaned calendar booking");
                        }
                    }
                    Err(err) => {
                        tracing::error!(interview_id = %original.id, error = %err, "failed to store restored booking");
                    }
                }
            }
            Ok(BookingOutcome::Conflict) => {
                tracing::warn!(interview_id = %original.id, "original slot was taken before it could be restored");
            }
            Err(err) => {
                tracing::error!(interview_id = %original.id, error = %err, "failed to restore original booking");
            }
        }
    }

    pub async fn record_feedback(
        &self,
        id: Uuid,
        payload: FeedbackPayload,
        submitted_by: Uuid,
    ) -> Result<Feedback> {
        validate_all(&payload, |_| {})?;
        let mut interview = self.get(id).await?;
        let ts = now();
        let completed = interview.accept_feedback(ts)?;

        let feedback = Feedback {
            id: Uuid::new_v4(),
            interview_id: id,
            submitted_by,
            overall_rating: payload.overall_rating,
            technical_rating: payload.technical_rating,
            communication_rating: payload.communication_rating,
            cultural_fit_rating: payload.cultural_fit_rating,
            problem_solving_rating: payload.problem_solving_rating,
            strengths: payload.strengths,
            weaknesses: payload.weaknesses,
            comments: payload.comments,
            recommendation: payload.recommendation,
            created_at: ts,
        };
        let feedback = self.repos.interviews.add_feedback(&feedback, ts).await?;
        if completed {
            tracing::info!(interview_id = %id, "interview completed");
        }
        Ok(feedback)
    }

    pub async fn feedback(&self, id: Uuid) -> Result<Vec<Feedback>> {
        self.get(id).await?;
        self.repos.interviews.list_feedback(id).await
    }

    pub async fn availability(&self, query: &AvailabilityQuery) -> Result<Vec<Slot>> {
        validate_all(query, |_| {})?;
        if query.to <= query.from {
            return Err(field_error(
                "to",
                "range",
                "to must be later than from".to_string(),
            ));
        }
        if query.to - query.from > Duration::days(MAX_AVAILABILITY_DAYS) {
            return Err(field_error(
                "to",
                "range_too_long",
                format!("the range may span at most {} days", MAX_AVAILABILITY_DAYS),
            ));
        }
        self.ensure_interviewer(query.interviewer_id).await?;
        self.calendar
            .available_slots(query.interviewer_id, query.from, query.to, query.duration_minutes)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{Candidate, CandidateStage, CandidateStatus};
    use crate::models::feedback::Recommendation;
    use crate::models::job::{EmploymentType, Job, JobPriority, JobStatus};
    use crate::models::user::{User, UserRole};
    use crate::services::calendar_service::MockCalendarProvider;
    use chrono::TimeZone;

    struct Fixture {
        repos: Repositories,
        candidate: Candidate,
        interviewer: User,
    }

    async fn fixture(stage: CandidateStage) -> Fixture {
        let repos = Repositories::in_memory();
        let ts = now();
        let interviewer = repos
            .users
            .insert_user(&User {
                id: Uuid::new_v4(),
                email: "iv@example.com".into(),
                password_hash: String::new(),
                first_name: "Kiran".into(),
                last_name: "Das".into(),
                role: UserRole::Interviewer,
                department: None,
                is_active: true,
                created_at: ts,
                updated_at: ts,
            })
            .await
            .unwrap();
        let job = repos
            .jobs
            .insert_job(&Job {
                id: Uuid::new_v4(),
                title: "SRE".into(),
                description: "Keep it running".into(),
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
                created_by: interviewer.id,
                created_at: ts,
                updated_at: ts,
            })
            .await
            .unwrap();
        let candidate = repos
            .candidates
            .insert_candidate(&Candidate {
                id: Uuid::new_v4(),
                first_name: "Nisha".into(),
                last_name: "Patel".into(),
                email: "nisha@example.com".into(),
                phone: None,
                linkedin_url: None,
                current_title: None,
                current_company: None,
                experience_years: None,
                skills: vec![],
                location: None,
                source: "manual".into(),
                job_id: Some(job.id),
                status: stage.implied_status().unwrap_or(CandidateStatus::Active),
                stage,
                ai_score: None,
                ai_rationale: None,
                hired_at: None,
                last_contacted_at: None,
                created_at: ts,
                updated_at: ts,
            })
            .await
            .unwrap();
        Fixture {
            repos,
            candidate,
            interviewer,
        }
    }

    fn schedule_payload(f: &Fixture) -> ScheduleInterviewPayload {
        ScheduleInterviewPayload {
            candidate_id: f.candidate.id,
            job_id: None,
            interviewer_id: f.interviewer.id,
            scheduled_at: Utc.with_ymd_and_hms(2030, 3, 4, 10, 0, 0).unwrap(),
            duration_minutes: 60,
            mode: None,
            interview_type: None,
            timezone: None,
        }
    }

    #[tokio::test]
    async fn schedule_stores_booking_reference() {
        let f = fixture(CandidateStage::Interview).await;
        let mut calendar = MockCalendarProvider::new();
        calendar
            .expect_book()
            .times(1)
            .returning(|_| Ok(BookingOutcome::Confirmed("bk-42".into())));
        let svc = InterviewService::new(f.repos.clone(), Arc::new(calendar));

        let interview = svc.schedule(schedule_payload(&f)).await.unwrap();
        assert_eq!(interview.status, InterviewStatus::Scheduled);
        assert_eq!(interview.booking_ref.as_deref(), Some("bk-42"));
        assert_eq!(interview.job_id, f.candidate.job_id.unwrap());
        assert_eq!(interview.title, "Technical Interview - Nisha Patel");
        assert_eq!(interview.timezone, "Asia/Kolkata");
        assert!(interview.meeting_link.is_some());
    }

    #[tokio::test]
    async fn calendar_conflict_is_slot_unavailable() {
        let f = fixture(CandidateStage::Screening).await;
        let mut calendar = MockCalendarProvider::new();
        calendar
            .expect_book()
            .returning(|_| Ok(BookingOutcome::Conflict));
        let svc = InterviewService::new(f.repos.clone(), Arc::new(calendar));

        let err = svc.schedule(schedule_payload(&f)).await.unwrap_err();
        assert!(matches!(err, Error::SlotUnavailable(_)));
        let page = svc
            .list(&InterviewFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn calendar_outage_is_upstream_failure() {
        let f = fixture(CandidateStage::Screening).await;
        let mut calendar = MockCalendarProvider::new();
        calendar
            .expect_book()
            .returning(|_| Err(Error::Upstream("calendar down".into())));
        let svc = InterviewService::new(f.repos.clone(), Arc::new(calendar));
        let err = svc.schedule(schedule_payload(&f)).await.unwrap_err();
        assert_eq!(err.kind(), "upstream_failure");
    }

    #[tokio::test]
    async fn terminal_candidates_are_not_scheduled() {
        let f = fixture(CandidateStage::Rejected).await;
        let svc = InterviewService::new(f.repos.clone(), Arc::new(MockCalendarProvider::new()));
        let err = svc.schedule(schedule_payload(&f)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn reschedule_releases_old_booking_and_links_rows() {
        let f = fixture(CandidateStage::Interview).await;
        let mut calendar = MockCalendarProvider::new();
        let mut refs = vec!["bk-new".to_string(), "bk-old".to_string()];
        calendar
            .expect_book()
            .times(2)
            .returning(move |_| Ok(BookingOutcome::Confirmed(refs.pop().unwrap_or_default())));
        calendar
            .expect_release()
            .withf(|r| r == "bk-old")
            .times(1)
            .returning(|_| Ok(()));
        let svc = InterviewService::new(f.repos.clone(), Arc::new(calendar));

        let old = svc.schedule(schedule_payload(&f)).await.unwrap();
        let new = svc
            .reschedule(
                old.id,
                RescheduleInterviewPayload {
                    scheduled_at: old.scheduled_at + Duration::minutes(30),
                    duration_minutes: None,
                    interviewer_id: None,
                    reason: Some("candidate request".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(new.rescheduled_from, Some(old.id));
        assert_eq!(new.booking_ref.as_deref(), Some("bk-new"));
        assert_eq!(new.duration_minutes, 60);
        let old = svc.get(old.id).await.unwrap();
        assert_eq!(old.status, InterviewStatus::Rescheduled);
    }

    #[tokio::test]
    async fn failed_reschedule_restores_original_booking() {
        let f = fixture(CandidateStage::Interview).await;
        let mut calendar = MockCalendarProvider::new();
        let mut seq = mockall::Sequence::new();
        calendar
            .expect_book()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(BookingOutcome::Confirmed("bk-1".into())));
        calendar
            .expect_book()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(BookingOutcome::Conflict));
        calendar
            .expect_book()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(BookingOutcome::Confirmed("bk-1b".into())));
        calendar.expect_release().returning(|_| Ok(()));
        let svc = InterviewService::new(f.repos.clone(), Arc::new(calendar));

        let old = svc.schedule(schedule_payload(&f)).await.unwrap();
        let err = svc
            .reschedule(
                old.id,
                RescheduleInterviewPayload {
                    scheduled_at: old.scheduled_at + Duration::days(1),
                    duration_minutes: Some(45),
                    interviewer_id: None,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SlotUnavailable(_)));

        let kept = svc.get(old.id).await.unwrap();
        assert_eq!(kept.status, InterviewStatus::Scheduled);
        assert_eq!(kept.booking_ref.as_deref(), Some("bk-1b"));
    }

    #[tokio::test]
    async fn feedback_completes_and_cancel_then_fails() {
        let f = fixture(CandidateStage::Interview).await;
        let mut calendar = MockCalendarProvider::new();
        calendar
            .expect_book()
            .returning(|_| Ok(BookingOutcome::Confirmed("bk".into())));
        let svc = InterviewService::new(f.repos.clone(), Arc::new(calendar));
        let interview = svc.schedule(schedule_payload(&f)).await.unwrap();

        svc.record_feedback(
            interview.id,
            FeedbackPayload {
                overall_rating: 4,
                technical_rating: Some(5),
                communication_rating: None,
                cultural_fit_rating: None,
                problem_solving_rating: None,
                strengths: Some("Clear thinking".into()),
                weaknesses: None,
                comments: None,
                recommendation: Recommendation::Hire,
            },
            f.interviewer.id,
        )
        .await
        .unwrap();
        assert_eq!(
            svc.get(interview.id).await.unwrap().status,
            InterviewStatus::Completed
        );
        assert_eq!(svc.feedback(interview.id).await.unwrap().len(), 1);

        let err = svc
            .cancel(interview.id, CancelInterviewPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let f = fixture(CandidateStage::Interview).await;
        let svc = InterviewService::new(f.repos.clone(), Arc::new(MockCalendarProvider::new()));
        let err = svc
            .record_feedback(
                Uuid::new_v4(),
                FeedbackPayload {
                    overall_rating: 6,
                    technical_rating: Some(0),
                    communication_rating: None,
                    cultural_fit_rating: None,
                    problem_solving_rating: None,
                    strengths: None,
                    weaknesses: None,
                    comments: None,
                    recommendation: Recommendation::Maybe,
                },
                f.interviewer.id,
            )
            .await
            .unwrap_err();
        let Error::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.field_errors().contains_key("overall_rating"));
        assert!(errors.field_errors().contains_key("technical_rating"));
    }

    #[tokio::test]
    async fn availability_range_is_capped() {
        let f = fixture(CandidateStage::Interview).await;
        let svc = InterviewService::new(f.repos.clone(), Arc::new(MockCalendarProvider::new()));
        let from = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let err = svc
            .availability(&AvailabilityQuery {
                interviewer_id: f.interviewer.id,
                from,
                to: from + Duration::days(MAX_AVAILABILITY_DAYS + 1),
                duration_minutes: 60,
            })
            .await
            .unwrap_err();
        let Error::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.field_errors().contains_key("to"));
    }

    #[tokio::test]
    async fn failed_release_keeps_interview_scheduled() {
        let f = fixture(CandidateStage::Interview).await;
        let mut calendar = MockCalendarProvider::new();
        calendar
            .expect_book()
            .returning(|_| Ok(BookingOutcome::Confirmed("bk".into())));
        calendar
            .expect_release()
            .returning(|_| Err(Error::Upstream("calendar down".into())));
        let svc = InterviewService::new(f.repos.clone(), Arc::new(calendar));
        let interview = svc.schedule(schedule_payload(&f)).await.unwrap();

        let err = svc
            .cancel(interview.id, CancelInterviewPayload::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream_failure");
        assert_eq!(
            svc.get(interview.id).await.unwrap().status,
            InterviewStatus::Scheduled
        );
    }

    /// Confirms every booking, but cancels the stored interview as soon as a
    /// different slot is requested for it.
    struct CancellingCalendar {
        repos: Repositories,
        original_start: DateTime<Utc>,
        released: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl CalendarProvider for CancellingCalendar {
        async fn available_slots(
            &self,
            _: Uuid,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
            _: i32,
        ) -> Result<Vec<Slot>> {
            Ok(vec![])
        }

        async fn book(&self, slot: &Slot) -> Result<BookingOutcome> {
            if slot.start == self.original_start {
                return Ok(BookingOutcome::Confirmed("bk-original".into()));
            }
            let page = self
                .repos
                .interviews
                .list_interviews(&InterviewFilter::default(), PageRequest::default())
                .await?;
            let mut current = page.items[0].clone();
            current.cancel(Some("withdrawn".into()), now())?;
            self.repos
                .interviews
                .transition_interview(&current, InterviewStatus::Scheduled)
                .await?;
            Ok(BookingOutcome::Confirmed("bk-moved".into()))
        }

        async fn release(&self, booking_ref: &str) -> Result<()> {
            if let Ok(mut released) = self.released.lock() {
                released.push(booking_ref.to_string());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn reschedule_loses_to_concurrent_cancel() {
        let f = fixture(CandidateStage::Interview).await;
        let start = schedule_payload(&f).scheduled_at;
        let calendar = Arc::new(CancellingCalendar {
            repos: f.repos.clone(),
            original_start: start,
            released: std::sync::Mutex::new(vec![]),
        });
        let svc = InterviewService::new(f.repos.clone(), calendar.clone());
        let interview = svc.schedule(schedule_payload(&f)).await.unwrap();

        let err = svc
            .reschedule(
                interview.id,
                RescheduleInterviewPayload {
                    scheduled_at: start + Duration::hours(2),
                    duration_minutes: None,
                    interviewer_id: None,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));

        let page = svc
            .list(&InterviewFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].status, InterviewStatus::Cancelled);
        let released = calendar.released.lock().unwrap().clone();
        assert!(released.contains(&"bk-moved".to_string()));
    }
}
