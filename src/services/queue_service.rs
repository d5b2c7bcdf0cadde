use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::database::Repositories;
use crate::error::{Error, Result};
use crate::models::outreach::{Outreach, OutreachChannel, OutreachStatus};
use crate::models::task::{Task, TaskPayload, TaskStatus};
use crate::services::ai_service::{candidate_profile, job_profile, AiProvider};
use crate::services::messaging_service::{format_phone_number, MessagingProvider, OutboundMessage};
use crate::services::notification_service::CallbackNotifier;
use crate::utils::time::now;

/// Front door of the durable task table.
#[derive(Clone)]
pub struct TaskQueue {
    repos: Repositories,
}

impl TaskQueue {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn enqueue(
        &self,
        payload: TaskPayload,
        callback_url: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<Task> {
        let task = self.prepare(payload, callback_url, created_by)?;
        let task = self.repos.tasks.insert_task(&task).await?;
        tracing::info!(task_id = %task.id, kind = ?task.kind, "task enqueued");
        Ok(task)
    }

    /// Builds a pending task for callers that store it next to the rows it
    /// refers to.
    pub fn prepare(
        &self,
        payload: TaskPayload,
        callback_url: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<Task> {
        Ok(Task::new(&payload, callback_url, created_by, now())?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Task> {
        self.repos
            .tasks
            .find_task(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Task {} not found", id)))
    }

    /// Only pending tasks can be cancelled.
    pub async fn cancel(&self, id: Uuid) -> Result<Task> {
        if let Some(task) = self.repos.tasks.cancel_pending_task(id, now()).await? {
            tracing::info!(task_id = %id, "task cancelled");
            return Ok(task);
        }
        let task = self.get(id).await?;
        Err(Error::InvalidTransition(format!(
            "Task {} is {} and can no longer be cancelled",
            id,
            task.status.as_str()
        )))
    }
}

const FINISH_ATTEMPTS: u32 = 3;

/// Claims and runs queued tasks one at a time.
#[derive(Clone)]
pub struct TaskWorker {
    repos: Repositories,
    ai: Arc<dyn AiProvider>,
    messaging: Arc<dyn MessagingProvider>,
    notifier: CallbackNotifier,
}

impl TaskWorker {
    pub fn new(
        repos: Repositories,
        ai: Arc<dyn AiProvider>,
        messaging: Arc<dyn MessagingProvider>,
        notifier: CallbackNotifier,
    ) -> Self {
        Self {
            repos,
            ai,
            messaging,
            notifier,
        }
    }

    /// Returns `false` when there was nothing to claim.
    pub async fn run_once(&self) -> Result<bool> {
        let Some(task) = self.repos.tasks.claim_next_task(now()).await? else {
            return Ok(false);
        };
        tracing::info!(task_id = %task.id, kind = ?task.kind, "task started");

        let outcome = match task.decode_payload() {
            Ok(payload) => self.execute(&payload).await,
            Err(e) => Err(Error::Json(e)),
        };

        let finished = match outcome {
            Ok(result) => {
                tracing::info!(task_id = %task.id, "task succeeded");
                self.finish(task.id, TaskStatus::Succeeded, Some(result), None)
                    .await?
            }
            Err(err) => {
                tracing::error!(task_id = %task.id, error = %err, "task failed");
                self.finish(task.id, TaskStatus::Failed, None, Some(err.to_string()))
                    .await?
            }
        };

        self.notifier.notify(&finished).await;
        Ok(true)
    }

    /// Records the outcome, retrying briefly. A task whose outcome never
    /// lands stays `running` until [`reap_stale`](Self::reap_stale) fails it.
    async fn finish(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        result: Option<JsonValue>,
        error: Option<String>,
    ) -> Result<Task> {
        let mut attempt = 1;
        loop {
            match self
                .repos
                .tasks
                .finish_task(task_id, status, result.clone(), error.clone(), now())
                .await
            {
                Ok(task) => return Ok(task),
                Err(err) if attempt < FINISH_ATTEMPTS => {
                    tracing::warn!(
                        task_id = %task_id,
                        attempt,
                        error = %err,
                        "could not record task outcome, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Fails tasks that have been running for longer than `max_age`.
    pub async fn reap_stale(&self, max_age: Duration) -> Result<u64> {
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| Error::Internal(format!("Invalid task timeout: {}", e)))?;
        let current = now();
        let reaped = self
            .repos
            .tasks
            .fail_stale_tasks(current - max_age, current)
            .await?;
        if reaped > 0 {
            tracing::warn!(count = reaped, "failed stale running tasks");
        }
        Ok(reaped)
    }

    async fn execute(&self, payload: &TaskPayload) -> Result<JsonValue> {
        match payload {
            TaskPayload::ParseJob { job_id } => self.parse_job(*job_id).await,
            TaskPayload::AnalyzeCandidate { candidate_id } => {
                self.analyze_candidate(*candidate_id).await
            }
            TaskPayload::SendOutreach { outreach_id } => self.send_outreach(*outreach_id).await,
        }
    }

    async fn parse_job(&self, job_id: Uuid) -> Result<JsonValue> {
        let job = self
            .repos
            .jobs
            .find_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", job_id)))?;
        let analysis = self
            .ai
            .analyze_job(&job.description, job.requirements.as_deref().unwrap_or(""))
            .await?;
        self.repos
            .jobs
            .set_job_analysis(
                job_id,
                &analysis.skills,
                analysis.experience_level.as_deref(),
                now(),
            )
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", job_id)))?;
        Ok(serde_json::to_value(&analysis)?)
    }

    async fn analyze_candidate(&self, candidate_id: Uuid) -> Result<JsonValue> {
        let candidate = self
            .repos
            .candidates
            .find_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", candidate_id)))?;
        let job = match candidate.job_id {
            Some(job_id) => self.repos.jobs.find_job(job_id).await?,
            None => None,
        };
        let assessment = self
            .ai
            .analyze_candidate(&candidate_profile(&candidate), &job_profile(job.as_ref()))
            .await?;
        self.repos
            .candidates
            .set_candidate_assessment(candidate_id, assessment.score, &assessment.rationale, now())
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", candidate_id)))?;
        Ok(serde_json::to_value(&assessment)?)
    }

    async fn send_outreach(&self, outreach_id: Uuid) -> Result<JsonValue> {
        let mut outreach = self
            .repos
            .outreach
            .find_outreach(outreach_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Outreach {} not found", outreach_id)))?;
        let candidate = self
            .repos
            .candidates
            .find_candidate(outreach.candidate_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Candidate {} not found", outreach.candidate_id))
            })?;

        match self.deliver(&mut outreach, &candidate).await {
            Ok(provider_message_id) => {
                let sent_at = now();
                outreach.status = OutreachStatus::Sent;
                outreach.provider_message_id = Some(provider_message_id.clone());
                outreach.sent_at = Some(sent_at);
                self.repos.outreach.update_outreach(&outreach).await?;

                self.repos
                    .candidates
                    .touch_last_contacted(candidate.id, sent_at)
                    .await?;
                Ok(json!({
                    "outreach_id": outreach.id,
                    "channel": outreach.channel,
                    "provider_message_id": provider_message_id,
                }))
            }
            Err(err) => {
                outreach.status = OutreachStatus::Failed;
                outreach.error = Some(err.to_string());
                self.repos.outreach.update_outreach(&outreach).await?;
                Err(err)
            }
        }
    }

    async fn deliver(
        &self,
        outreach: &mut Outreach,
        candidate: &crate::models::candidate::Candidate,
    ) -> Result<String> {
        let recipient = match outreach.channel {
            OutreachChannel::Email => candidate.email.clone(),
            OutreachChannel::Sms | OutreachChannel::Voice => candidate
                .phone
                .as_deref()
                .map(format_phone_number)
                .ok_or_else(|| {
                    Error::BadRequest(format!(
                        "Candidate {} has no phone number for {}",
                        candidate.id,
                        outreach.channel.as_str()
                    ))
                })?,
        };

        let body = match outreach.body.clone().filter(|b| !b.trim().is_empty()) {
            Some(body) => body,
            None => {
                let job = match candidate.job_id {
                    Some(job_id) => self.repos.jobs.find_job(job_id).await?,
                    None => None,
                };
                let drafted = self
                    .ai
                    .draft_message(
                        &candidate_profile(candidate),
                        &job_profile(job.as_ref()),
                        outreach.channel,
                    )
                    .await?;
                outreach.body = Some(drafted.clone());
                drafted
            }
        };

        let subject = match outreach.channel {
            OutreachChannel::Email => Some(
                outreach
                    .subject
                    .clone()
                    .unwrap_or_else(|| "An opportunity you may like".to_string()),
            ),
            _ => None,
        };

        let receipt = self
            .messaging
            .send(&OutboundMessage {
                channel: outreach.channel,
                recipient,
                subject,
                body,
            })
            .await?;
        tracing::info!(
            outreach_id = %outreach.id,
            channel = outreach.channel.as_str(),
            "outreach delivered"
        );
        Ok(receipt.provider_message_id)
    }
}
