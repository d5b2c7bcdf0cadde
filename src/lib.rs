pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::database::Repositories;
use crate::error::Result;
use crate::services::{
    ai_service::{AiProvider, OpenAiProvider},
    auth_service::AuthService,
    calendar_service::{CalendarProvider, HttpCalendar, LocalCalendar},
    candidate_service::CandidateService,
    dashboard_service::DashboardService,
    interview_service::InterviewService,
    job_service::JobService,
    messaging_service::{HttpMessaging, MessagingProvider},
    notification_service::CallbackNotifier,
    outreach_service::OutreachService,
    queue_service::{TaskQueue, TaskWorker},
    sourcing_service::{HttpSourcing, SourcingProvider, SourcingService},
};

/// External systems the service talks to, behind their contracts.
#[derive(Clone)]
pub struct Collaborators {
    pub http_client: Client,
    pub ai: Arc<dyn AiProvider>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub messaging: Arc<dyn MessagingProvider>,
    pub sourcing: Arc<dyn SourcingProvider>,
}

impl Collaborators {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        let calendar: Arc<dyn CalendarProvider> = match &config.calendar_api_url {
            Some(url) => Arc::new(HttpCalendar::new(url.clone(), http_client.clone())),
            None => {
                tracing::warn!("CALENDAR_API_URL not set, bookings are kept in process");
                Arc::new(LocalCalendar::default())
            }
        };

        Ok(Self {
            ai: Arc::new(OpenAiProvider::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
                http_client.clone(),
            )),
            calendar,
            messaging: Arc::new(HttpMessaging::new(
                config.messaging_api_url.clone(),
                config.messaging_api_key.clone(),
                http_client.clone(),
            )),
            sourcing: Arc::new(HttpSourcing::new(
                config.sourcing_api_url.clone(),
                config.sourcing_api_key.clone(),
                http_client.clone(),
            )),
            http_client,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repos: Repositories,
    pub auth_service: AuthService,
    pub job_service: JobService,
    pub candidate_service: CandidateService,
    pub interview_service: InterviewService,
    pub dashboard_service: DashboardService,
    pub outreach_service: OutreachService,
    pub sourcing_service: SourcingService,
    pub task_queue: TaskQueue,
    pub task_worker: TaskWorker,
    pub sourcing: Arc<dyn SourcingProvider>,
}

impl AppState {
    pub fn new(config: Config, repos: Repositories, collaborators: Collaborators) -> Self {
        let config = Arc::new(config);
        let task_queue = TaskQueue::new(repos.clone());

        let auth_service = AuthService::new(
            repos.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_minutes,
        );
        let job_service = JobService::new(repos.clone(), task_queue.clone());
        let candidate_service = CandidateService::new(repos.clone(), task_queue.clone());
        let interview_service = InterviewService::new(repos.clone(), collaborators.calendar);
        let dashboard_service = DashboardService::new(repos.clone());
        let outreach_service = OutreachService::new(repos.clone(), task_queue.clone());
        let sourcing_service = SourcingService::new(repos.clone());
        let task_worker = TaskWorker::new(
            repos.clone(),
            collaborators.ai,
            collaborators.messaging,
            CallbackNotifier::new(config.webhook_secret.clone(), collaborators.http_client),
        );

        Self {
            config,
            repos,
            auth_service,
            job_service,
            candidate_service,
            interview_service,
            dashboard_service,
            outreach_service,
            sourcing_service,
            task_queue,
            task_worker,
            sourcing: collaborators.sourcing,
        }
    }
}
