use uuid::Uuid;

use crate::database::{CandidateFilter, Page, PageRequest, Repositories};
use crate::dto::candidate_dto::{
    ApprovalResult, BulkApprovePayload, BulkApproveResponse, CreateCandidatePayload,
    UpdateCandidatePayload,
};
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStage, CandidateStatus};
use crate::models::outreach::{Outreach, OutreachChannel};
use crate::models::task::{Task, TaskPayload};
use crate::services::queue_service::TaskQueue;
use crate::utils::time::now;
use crate::utils::validation::validate_all;

const DEFAULT_SOURCE: &str = "manual";

#[derive(Clone)]
pub struct CandidateService {
    repos: Repositories,
    queue: TaskQueue,
}

impl CandidateService {
    pub fn new(repos: Repositories, queue: TaskQueue) -> Self {
        Self { repos, queue }
    }

    async fn ensure_job_exists(&self, job_id: Option<Uuid>) -> Result<()> {
        if let Some(job_id) = job_id {
            if self.repos.jobs.find_job(job_id).await?.is_none() {
                return Err(Error::NotFound(format!("Job {} not found", job_id)));
            }
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, job_id: Option<Uuid>, own_id: Option<Uuid>) -> Result<()> {
        match self.repos.candidates.find_candidate_by_email(email, job_id).await? {
            Some(existing) if Some(existing.id) != own_id => Err(Error::Conflict(format!(
                "Candidate with email {} already exists for this job",
                email
            ))),
            _ => Ok(()),
        }
    }

    pub async fn create(&self, payload: CreateCandidatePayload) -> Result<Candidate> {
        validate_all(&payload, |_| {})?;
        self.ensure_job_exists(payload.job_id).await?;
        let email = payload.email.trim().to_lowercase();
        self.ensure_email_free(&email, payload.job_id, None).await?;

        let stage = payload.stage.unwrap_or(CandidateStage::Applied);
        let ts = now();
        let candidate = Candidate {
            id: Uuid::new_v4(),
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            email,
            phone: payload.phone,
            linkedin_url: payload.linkedin_url,
            current_title: payload.current_title,
            current_company: payload.current_company,
            experience_years: payload.experience_years,
            skills: payload.skills,
            location: payload.location,
            source: payload.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            job_id: payload.job_id,
            status: stage.implied_status().unwrap_or(CandidateStatus::Active),
            stage,
            ai_score: None,
            ai_rationale: None,
            hired_at: (stage == CandidateStage::Hired).then_some(ts),
            last_contacted_at: None,
            created_at: ts,
            updated_at: ts,
        };
        let candidate = self.repos.candidates.insert_candidate(&candidate).await?;
        tracing::info!(candidate_id = %candidate.id, job_id = ?candidate.job_id, "candidate created");
        Ok(candidate)
    }

    pub async fn get(&self, id: Uuid) -> Result<Candidate> {
        self.repos
            .candidates
            .find_candidate(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)))
    }

    pub async fn update(&self, id: Uuid, payload: UpdateCandidatePayload) -> Result<Candidate> {
        validate_all(&payload, |_| {})?;
        let mut candidate = self.get(id).await?;

        if let Some(first_name) = payload.first_name {
            candidate.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = payload.last_name {
            candidate.last_name = last_name.trim().to_string();
        }
        if let Some(email) = payload.email {
            candidate.email = email.trim().to_lowercase();
        }
        if payload.phone.is_some() {
            candidate.phone = payload.phone;
        }
        if payload.linkedin_url.is_some() {
            candidate.linkedin_url = payload.linkedin_url;
        }
        if payload.current_title.is_some() {
            candidate.current_title = payload.current_title;
        }
        if payload.current_company.is_some() {
            candidate.current_company = payload.current_company;
        }
        if payload.experience_years.is_some() {
            candidate.experience_years = payload.experience_years;
        }
        if let Some(skills) = payload.skills {
            candidate.skills = skills;
        }
        if payload.location.is_some() {
            candidate.location = payload.location;
        }
        if payload.job_id.is_some() {
            self.ensure_job_exists(payload.job_id).await?;
            candidate.job_id = payload.job_id;
        }
        self.ensure_email_free(&candidate.email, candidate.job_id, Some(candidate.id))
            .await?;

        candidate.updated_at = now();
        self.repos.candidates.update_candidate(&candidate).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repos.candidates.delete_candidate(id).await? {
            return Err(Error::NotFound(format!("Candidate {} not found", id)));
        }
        tracing::info!(candidate_id = %id, "candidate deleted");
        Ok(())
    }

    pub async fn list(&self, filter: &CandidateFilter, page: PageRequest) -> Result<Page<Candidate>> {
        self.repos.candidates.list_candidates(filter, page).await
    }

    /// Candidates of one job, optionally narrowed to a stage or status.
    pub async fn list_for_job(
        &self,
        job_id: Uuid,
        stage: Option<CandidateStage>,
        status: Option<CandidateStatus>,
        page: PageRequest,
    ) -> Result<Page<Candidate>> {
        self.ensure_job_exists(Some(job_id)).await?;
        let filter = CandidateFilter {
            job_id: Some(job_id),
            stage,
            status,
            ..Default::default()
        };
        self.repos.candidates.list_candidates(&filter, page).await
    }

    /// Stores a stage/status change made on a snapshot whose pipeline state
    /// was `expected`.
    async fn commit_transition(
        &self,
        candidate: &Candidate,
        expected: (CandidateStage, CandidateStatus),
    ) -> Result<Candidate> {
        match self
            .repos
            .candidates
            .transition_candidate(candidate, expected)
            .await?
        {
            Some(saved) => Ok(saved),
            None => {
                self.get(candidate.id).await?;
                Err(Error::InvalidTransition(format!(
                    "Candidate {} changed concurrently; reload and retry",
                    candidate.id
                )))
            }
        }
    }

    pub async fn advance_stage(&self, id: Uuid, stage: CandidateStage) -> Result<Candidate> {
        let mut candidate = self.get(id).await?;
        let expected = (candidate.stage, candidate.status);
        candidate.advance_to(stage, now())?;
        let candidate = self.commit_transition(&candidate, expected).await?;
        tracing::info!(
            candidate_id = %id,
            from = expected.0.as_str(),
            to = stage.as_str(),
            "candidate stage changed"
        );
        Ok(candidate)
    }

    pub async fn set_status(&self, id: Uuid, status: CandidateStatus) -> Result<Candidate> {
        let mut candidate = self.get(id).await?;
        let expected = (candidate.stage, candidate.status);
        candidate.set_status(status, now())?;
        self.commit_transition(&candidate, expected).await
    }

    /// Approves each applied, active candidate: it moves to screening and an
    /// outreach is queued in the same write. Everyone else is skipped with a
    /// reason. Unknown ids fail the whole batch.
    pub async fn bulk_approve(
        &self,
        payload: BulkApprovePayload,
        requested_by: Uuid,
    ) -> Result<BulkApproveResponse> {
        validate_all(&payload, |_| {})?;

        let mut ids = Vec::with_capacity(payload.candidate_ids.len());
        for id in &payload.candidate_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        let mut candidates = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match self.repos.candidates.find_candidate(id).await? {
                Some(candidate) => candidates.push(candidate),
                None => missing.push(id.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(Error::NotFound(format!(
                "Candidates not found: {}",
                missing.join(", ")
            )));
        }

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            results.push(self.approve_one(candidate, &payload, requested_by).await?);
        }
        let response = BulkApproveResponse::new(results);
        tracing::info!(
            approved = response.approved,
            skipped = response.skipped,
            "bulk approval finished"
        );
        Ok(response)
    }

    async fn approve_one(
        &self,
        candidate: Candidate,
        payload: &BulkApprovePayload,
        requested_by: Uuid,
    ) -> Result<ApprovalResult> {
        let channel = payload.channel.unwrap_or(OutreachChannel::Email);
        let expected = (candidate.stage, candidate.status);
        if expected != (CandidateStage::Applied, CandidateStatus::Active) {
            return Ok(ApprovalResult::skipped(
                candidate.id,
                format!(
                    "Current stage: {}, status: {}",
                    candidate.stage.as_str(),
                    candidate.status.as_str()
                ),
            ));
        }
        if channel != OutreachChannel::Email && candidate.phone.is_none() {
            return Ok(ApprovalResult::skipped(
                candidate.id,
                format!("No phone number for {} outreach", channel.as_str()),
            ));
        }

        let ts = now();
        let mut approved = candidate;
        approved.advance_to(CandidateStage::Screening, ts)?;
        let outreach = Outreach::pending(
            approved.id,
            channel,
            payload.subject.clone(),
            payload.body.clone(),
            Some(requested_by),
            ts,
        );
        let task = self.queue.prepare(
            TaskPayload::SendOutreach {
                outreach_id: outreach.id,
            },
            payload.callback_url.clone(),
            Some(requested_by),
        )?;
        let stored = self
            .repos
            .candidates
            .approve_candidate(&approved, expected, &outreach, &task)
            .await?;
        Ok(match stored {
            Some(_) => {
                tracing::info!(candidate_id = %approved.id, task_id = %task.id, "candidate approved");
                ApprovalResult::approved(approved.id, outreach.id, task.id)
            }
            None => ApprovalResult::skipped(
                approved.id,
                "Candidate changed while being approved".to_string(),
            ),
        })
    }

    pub async fn request_analysis(
        &self,
        id: Uuid,
        callback_url: Option<String>,
        requested_by: Uuid,
    ) -> Result<Task> {
        self.get(id).await?;
        self.queue
            .enqueue(
                TaskPayload::AnalyzeCandidate { candidate_id: id },
                callback_url,
                Some(requested_by),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CandidateService {
        let repos = Repositories::in_memory();
        CandidateService::new(repos.clone(), TaskQueue::new(repos))
    }

    fn payload(email: &str) -> CreateCandidatePayload {
        CreateCandidatePayload {
            first_name: "Rahul".into(),
            last_name: "Verma".into(),
            email: email.into(),
            phone: None,
            linkedin_url: None,
            current_title: None,
            current_company: None,
            experience_years: Some(3),
            skills: vec!["Go".into()],
            location: None,
            source: None,
            job_id: None,
            stage: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_for_same_job_conflicts() {
        let svc = service();
        svc.create(payload("rahul@example.com")).await.unwrap();
        let err = svc.create(payload("RAHUL@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn initial_terminal_stage_sets_matching_status() {
        let mut p = payload("h@example.com");
        p.stage = Some(CandidateStage::Hired);
        let c = service().create(p).await.unwrap();
        assert_eq!(c.status, CandidateStatus::Hired);
        assert!(c.hired_at.is_some());
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let mut p = payload("x@example.com");
        p.job_id = Some(Uuid::new_v4());
        assert!(matches!(service().create(p).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn stage_changes_persist() {
        let svc = service();
        let c = svc.create(payload("s@example.com")).await.unwrap();
        svc.advance_stage(c.id, CandidateStage::Screening).await.unwrap();
        let hired = svc.advance_stage(c.id, CandidateStage::Hired).await.unwrap();
        assert_eq!(hired.status, CandidateStatus::Hired);

        let err = svc
            .advance_stage(c.id, CandidateStage::Offer)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert_eq!(svc.get(c.id).await.unwrap().stage, CandidateStage::Hired);
    }

    #[tokio::test]
    async fn status_change_after_terminal_stage_is_refused() {
        let svc = service();
        let c = svc.create(payload("t@example.com")).await.unwrap();
        svc.advance_stage(c.id, CandidateStage::Rejected).await.unwrap();
        let err = svc.set_status(c.id, CandidateStatus::OnHold).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert_eq!(svc.get(c.id).await.unwrap().status, CandidateStatus::Rejected);
    }

    #[tokio::test]
    async fn bulk_approve_moves_applied_and_skips_the_rest() {
        let repos = Repositories::in_memory();
        let svc = CandidateService::new(repos.clone(), TaskQueue::new(repos.clone()));
        let fresh = svc.create(payload("fresh@example.com")).await.unwrap();
        let screened = svc.create(payload("screened@example.com")).await.unwrap();
        svc.advance_stage(screened.id, CandidateStage::Screening)
            .await
            .unwrap();

        let report = svc
            .bulk_approve(
                BulkApprovePayload {
                    candidate_ids: vec![fresh.id, screened.id, fresh.id],
                    channel: None,
                    subject: Some("Next steps".into()),
                    body: None,
                    callback_url: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!((report.approved, report.skipped), (1, 1));
        let approved = &report.results[0];
        assert_eq!(approved.candidate_id, fresh.id);
        let task_id = approved.task_id.unwrap();
        assert!(repos.tasks.find_task(task_id).await.unwrap().is_some());
        let history = repos.outreach.list_outreach(fresh.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].channel, OutreachChannel::Email);
        assert_eq!(svc.get(fresh.id).await.unwrap().stage, CandidateStage::Screening);
        assert!(report.results[1]
            .reason
            .as_deref()
            .unwrap()
            .contains("screening"));
    }

    #[tokio::test]
    async fn bulk_approve_skips_phone_channels_without_a_number() {
        let svc = service();
        let c = svc.create(payload("nophone@example.com")).await.unwrap();
        let report = svc
            .bulk_approve(
                BulkApprovePayload {
                    candidate_ids: vec![c.id],
                    channel: Some(OutreachChannel::Sms),
                    subject: None,
                    body: None,
                    callback_url: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        assert_eq!(report.approved, 0);
        assert_eq!(svc.get(c.id).await.unwrap().stage, CandidateStage::Applied);
    }

    #[tokio::test]
    async fn bulk_approve_with_unknown_id_changes_nothing() {
        let svc = service();
        let c = svc.create(payload("known@example.com")).await.unwrap();
        let err = svc
            .bulk_approve(
                BulkApprovePayload {
                    candidate_ids: vec![c.id, Uuid::new_v4()],
                    channel: None,
                    subject: None,
                    body: None,
                    callback_url: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(svc.get(c.id).await.unwrap().stage, CandidateStage::Applied);
    }

    #[tokio::test]
    async fn job_listing_requires_the_job() {
        let svc = service();
        let err = svc
            .list_for_job(Uuid::new_v4(), None, None, PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
