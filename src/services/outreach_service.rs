use uuid::Uuid;

use crate::database::Repositories;
use crate::dto::candidate_dto::OutreachPayload;
use crate::dto::outreach_dto::{CallStatusResponse, DeliveryStatusPayload};
use crate::error::{Error, Result};
use crate::models::outreach::{Outreach, OutreachChannel};
use crate::models::task::{Task, TaskPayload};
use crate::services::queue_service::TaskQueue;
use crate::utils::time::now;
use crate::utils::validation::{field_error, validate_all};

/// Records outreach attempts; delivery happens on the task worker.
#[derive(Clone)]
pub struct OutreachService {
    repos: Repositories,
    queue: TaskQueue,
}

impl OutreachService {
    pub fn new(repos: Repositories, queue: TaskQueue) -> Self {
        Self { repos, queue }
    }

    pub async fn request(
        &self,
        candidate_id: Uuid,
        payload: OutreachPayload,
        requested_by: Uuid,
    ) -> Result<(Outreach, Task)> {
        validate_all(&payload, |_| {})?;
        let candidate = self
            .repos
            .candidates
            .find_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", candidate_id)))?;
        if payload.channel != OutreachChannel::Email && candidate.phone.is_none() {
            return Err(field_error(
                "channel",
                "no_phone",
                format!(
                    "Candidate has no phone number for {} outreach",
                    payload.channel.as_str()
                ),
            ));
        }

        let outreach = Outreach::pending(
            candidate_id,
            payload.channel,
            payload.subject,
            payload.body,
            Some(requested_by),
            now(),
        );
        let task = self.queue.prepare(
            TaskPayload::SendOutreach {
                outreach_id: outreach.id,
            },
            payload.callback_url,
            Some(requested_by),
        )?;
        let outreach = self
            .repos
            .outreach
            .insert_outreach_with_task(&outreach, &task)
            .await?;
        tracing::info!(
            outreach_id = %outreach.id,
            task_id = %task.id,
            candidate_id = %candidate_id,
            channel = outreach.channel.as_str(),
            "outreach queued"
        );
        Ok((outreach, task))
    }

    pub async fn history(&self, candidate_id: Uuid) -> Result<Vec<Outreach>> {
        if self.repos.candidates.find_candidate(candidate_id).await?.is_none() {
            return Err(Error::NotFound(format!("Candidate {} not found", candidate_id)));
        }
        self.repos.outreach.list_outreach(candidate_id).await
    }

    /// Progress of a voice call, looked up by the provider's call id.
    pub async fn call_status(&self, call_id: &str) -> Result<CallStatusResponse> {
        let outreach = self
            .repos
            .outreach
            .find_outreach_by_provider_id(call_id)
            .await?
            .filter(|o| o.channel == OutreachChannel::Voice)
            .ok_or_else(|| Error::NotFound(format!("Call {} not found", call_id)))?;
        Ok(CallStatusResponse::new(call_id.to_string(), outreach))
    }

    /// Applies a provider status report. Reports after a final status are
    /// accepted and ignored.
    pub async fn record_provider_status(&self, payload: DeliveryStatusPayload) -> Result<Outreach> {
        validate_all(&payload, |_| {})?;
        let outreach = self
            .repos
            .outreach
            .record_delivery_status(
                &payload.provider_message_id,
                payload.status,
                payload.duration_seconds,
                now(),
            )
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No outreach sent as {}",
                    payload.provider_message_id
                ))
            })?;
        tracing::info!(
            outreach_id = %outreach.id,
            status = ?payload.status,
            "delivery status recorded"
        );
        Ok(outreach)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{Candidate, CandidateStage, CandidateStatus};
    use crate::models::outreach::{DeliveryStatus, OutreachStatus};

    fn candidate() -> Candidate {
        let ts = now();
        Candidate {
            id: Uuid::new_v4(),
            first_name: "Nikhil".into(),
            last_name: "Das".into(),
            email: "nikhil@example.com".into(),
            phone: Some("+919812345678".into()),
            linkedin_url: None,
            current_title: None,
            current_company: None,
            experience_years: None,
            skills: vec![],
            location: None,
            source: "manual".into(),
            job_id: None,
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

    async fn sent_call(repos: &Repositories, call_id: &str) -> Outreach {
        let c = repos.candidates.insert_candidate(&candidate()).await.unwrap();
        let svc = OutreachService::new(repos.clone(), TaskQueue::new(repos.clone()));
        let (mut outreach, task) = svc
            .request(
                c.id,
                OutreachPayload {
                    channel: OutreachChannel::Voice,
                    subject: None,
                    body: Some("Hello from the hiring team".into()),
                    callback_url: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        assert!(repos.tasks.find_task(task.id).await.unwrap().is_some());
        outreach.status = OutreachStatus::Sent;
        outreach.provider_message_id = Some(call_id.into());
        outreach.sent_at = Some(now());
        repos.outreach.update_outreach(&outreach).await.unwrap()
    }

    fn report(call_id: &str, status: DeliveryStatus, duration: Option<i32>) -> DeliveryStatusPayload {
        DeliveryStatusPayload {
            provider_message_id: call_id.into(),
            status,
            duration_seconds: duration,
        }
    }

    #[tokio::test]
    async fn call_progress_is_tracked_until_final() {
        let repos = Repositories::in_memory();
        sent_call(&repos, "call-7").await;
        let svc = OutreachService::new(repos.clone(), TaskQueue::new(repos.clone()));

        svc.record_provider_status(report("call-7", DeliveryStatus::Ringing, None))
            .await
            .unwrap();
        svc.record_provider_status(report("call-7", DeliveryStatus::Completed, Some(95)))
            .await
            .unwrap();
        svc.record_provider_status(report("call-7", DeliveryStatus::Ringing, None))
            .await
            .unwrap();

        let status = svc.call_status("call-7").await.unwrap();
        assert_eq!(status.delivery_status, Some(DeliveryStatus::Completed));
        assert_eq!(status.duration_seconds, Some(95));
        assert_eq!(status.outreach_status, OutreachStatus::Sent);
    }

    #[tokio::test]
    async fn unknown_call_is_not_found() {
        let repos = Repositories::in_memory();
        let svc = OutreachService::new(repos.clone(), TaskQueue::new(repos));
        assert!(matches!(
            svc.call_status("nope").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            svc.record_provider_status(report("nope", DeliveryStatus::Failed, None))
                .await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn negative_duration_is_rejected() {
        let repos = Repositories::in_memory();
        sent_call(&repos, "call-8").await;
        let svc = OutreachService::new(repos.clone(), TaskQueue::new(repos));
        let err = svc
            .record_provider_status(report("call-8", DeliveryStatus::Completed, Some(-4)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
