#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use recruitment_api::{
    config::Config,
    database::Repositories,
    error::Result,
    models::{
        outreach::OutreachChannel,
        user::{User, UserRole},
    },
    routes,
    services::{
        ai_service::{AiProvider, CandidateAssessment, JobAnalysis},
        calendar_service::LocalCalendar,
        messaging_service::{DeliveryReceipt, MessagingProvider, OutboundMessage},
        sourcing_service::{SourcedProfile, SourcingCriteria, SourcingProvider},
    },
    utils::{crypto::hash_password, token::issue_access_token},
    AppState, Collaborators,
};

pub const JWT_SECRET: &str = "test_secret_key";

pub fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        jwt_secret: JWT_SECRET.into(),
        token_ttl_minutes: 30,
        webhook_secret: "whsec_test".into(),
        openai_api_key: None,
        openai_model: "gpt-4o".into(),
        calendar_api_url: None,
        messaging_api_url: None,
        messaging_api_key: None,
        sourcing_api_url: None,
        sourcing_api_key: None,
        api_rps: 1000,
        allowed_origins: vec![],
        json_logs: false,
        worker_poll_ms: 10,
        task_timeout_secs: 900,
    }
}

pub struct ScriptedAi;

#[async_trait]
impl AiProvider for ScriptedAi {
    async fn analyze_job(&self, _description: &str, _requirements: &str) -> Result<JobAnalysis> {
        Ok(JobAnalysis {
            skills: vec!["Rust".into(), "PostgreSQL".into()],
            requirements: vec![],
            keywords: vec!["backend".into()],
            experience_level: Some("mid".into()),
        })
    }

    async fn analyze_candidate(&self, _profile: &str, _job: &str) -> Result<CandidateAssessment> {
        Ok(CandidateAssessment {
            score: 0.7,
            rationale: "Relevant experience".into(),
        })
    }

    async fn draft_message(
        &self,
        _candidate: &str,
        _job: &str,
        _channel: OutreachChannel,
    ) -> Result<String> {
        Ok("Hello from the hiring team".into())
    }
}

#[derive(Default)]
pub struct RecordingMessaging {
    pub sent: Mutex<Vec<OutboundMessage>>,
}

#[async_trait]
impl MessagingProvider for RecordingMessaging {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(DeliveryReceipt {
            provider_message_id: format!("msg-{}", sent.len()),
        })
    }
}

pub struct FixedSourcing;

#[async_trait]
impl SourcingProvider for FixedSourcing {
    async fn search(&self, criteria: &SourcingCriteria) -> Result<Vec<SourcedProfile>> {
        Ok(vec![SourcedProfile {
            name: format!("{} Specialist", criteria.keywords.join(" ")),
            profile_url: Some("https://linkedin.com/in/specialist".into()),
            headline: Some("Engineer".into()),
            location: criteria.location.clone(),
            email: None,
            current_company: None,
            skills: criteria.keywords.clone(),
        }])
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub messaging: Arc<RecordingMessaging>,
}

impl TestApp {
    pub fn new() -> Self {
        let messaging = Arc::new(RecordingMessaging::default());
        let collaborators = Collaborators {
            http_client: Client::new(),
            ai: Arc::new(ScriptedAi),
            calendar: Arc::new(LocalCalendar::default()),
            messaging: messaging.clone(),
            sourcing: Arc::new(FixedSourcing),
        };
        let state = AppState::new(test_config(), Repositories::in_memory(), collaborators);
        Self {
            router: routes::router(state.clone()),
            state,
            messaging,
        }
    }

    pub async fn seed_user(&self, role: UserRole) -> (User, String) {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: format!("{}@example.com", id.simple()),
            password_hash: hash_password("password123").unwrap(),
            first_name: "Test".into(),
            last_name: "User".into(),
            role,
            department: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let user = self.state.repos.users.insert_user(&user).await.unwrap();
        let token = issue_access_token(&user, JWT_SECRET, 30, now).unwrap();
        (user, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, JsonValue) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Unauthenticated POST carrying an `X-Signature` header, as providers send.
    pub async fn post_signed(
        &self,
        uri: &str,
        body: &JsonValue,
        signature: &str,
    ) -> (StatusCode, JsonValue) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Signature", signature)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn create_job(&self, token: &str, title: &str) -> JsonValue {
        let (status, body) = self
            .post(
                "/api/v1/jobs",
                token,
                json!({
                    "title": title,
                    "description": "Own the hiring pipeline services",
                    "location": "Bengaluru",
                    "salary_min": 1500000,
                    "salary_max": 2500000
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    pub async fn create_candidate(&self, token: &str, email: &str, job_id: &str) -> JsonValue {
        let (status, body) = self
            .post(
                "/api/v1/candidates",
                token,
                json!({
                    "first_name": "John",
                    "last_name": "Doe",
                    "email": email,
                    "phone": "9876543210",
                    "skills": ["Rust", "SQL"],
                    "job_id": job_id
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }
}
