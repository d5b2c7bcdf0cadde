use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use crate::database::Repositories;
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStage, CandidateStatus};
use crate::utils::time::now;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SourcingCriteria {
    #[validate(length(min = 1, max = 20))]
    pub keywords: Vec<String>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    25
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedProfile {
    pub name: String,
    pub profile_url: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub current_company: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourcingProvider: Send + Sync {
    async fn search(&self, criteria: &SourcingCriteria) -> Result<Vec<SourcedProfile>>;
}

#[derive(Clone)]
pub struct HttpSourcing {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl HttpSourcing {
    pub fn new(base_url: Option<String>, api_key: Option<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            api_key,
        }
    }
}

fn str_field(profile: &JsonValue, key: &str) -> Option<String> {
    profile
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Maps one raw provider record; records without any usable name are dropped.
fn parse_profile(raw: &JsonValue) -> Option<SourcedProfile> {
    let name = str_field(raw, "name").or_else(|| {
        let first = str_field(raw, "first_name").unwrap_or_default();
        let last = str_field(raw, "last_name").unwrap_or_default();
        let joined = format!("{} {}", first, last).trim().to_string();
        (!joined.is_empty()).then_some(joined)
    })?;
    Some(SourcedProfile {
        name,
        profile_url: str_field(raw, "profile_url"),
        headline: str_field(raw, "headline"),
        location: str_field(raw, "location"),
        email: str_field(raw, "email"),
        current_company: str_field(raw, "current_company"),
        skills: raw
            .get("skills")
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|e| e.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

#[async_trait]
impl SourcingProvider for HttpSourcing {
    async fn search(&self, criteria: &SourcingCriteria) -> Result<Vec<SourcedProfile>> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Upstream("Sourcing provider is not configured".to_string()))?;

        let mut req = self
            .client
            .post(format!("{}/linkedin/search", base_url))
            .json(&serde_json::json!({
                "keywords": criteria.keywords.join(" "),
                "location": criteria.location.as_deref().unwrap_or("India"),
                "experience_level": criteria.experience_level,
                "limit": criteria.limit,
            }))
            .timeout(Duration::from_secs(30));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Sourcing provider unreachable: {}", e)))?;
        if !res.status().is_success() {
            return Err(Error::Upstream(format!(
                "Sourcing provider returned {}",
                res.status()
            )));
        }
        let body: JsonValue = res
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Malformed sourcing response: {}", e)))?;
        let profiles: Vec<SourcedProfile> = body
            .get("profiles")
            .and_then(|p| p.as_array())
            .map(|items| items.iter().filter_map(parse_profile).collect())
            .unwrap_or_default();
        tracing::info!(found = profiles.len(), "sourcing search completed");
        Ok(profiles)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedProfile {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub created: Vec<Candidate>,
    pub skipped: Vec<SkippedProfile>,
}

/// Turns sourced profiles into `sourcing` candidates attached to one job.
#[derive(Clone)]
pub struct SourcingService {
    repos: Repositories,
}

impl SourcingService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn import(&self, job_id: Uuid, profiles: Vec<SourcedProfile>) -> Result<ImportReport> {
        if self.repos.jobs.find_job(job_id).await?.is_none() {
            return Err(Error::NotFound(format!("Job {} not found", job_id)));
        }

        let mut created = Vec::new();
        let mut skipped = Vec::new();
        for profile in profiles {
            let Some(email) = profile.email.clone().filter(|e| e.validate_email()) else {
                skipped.push(SkippedProfile {
                    name: profile.name,
                    reason: "missing or invalid email".to_string(),
                });
                continue;
            };
            if self
                .repos
                .candidates
                .find_candidate_by_email(&email, Some(job_id))
                .await?
                .is_some()
            {
                skipped.push(SkippedProfile {
                    name: profile.name,
                    reason: "already a candidate for this job".to_string(),
                });
                continue;
            }

            let (first_name, last_name) = split_name(&profile.name);
            let ts = now();
            let candidate = Candidate {
                id: Uuid::new_v4(),
                first_name,
                last_name,
                email,
                phone: None,
                linkedin_url: profile.profile_url,
                current_title: profile.headline,
                current_company: profile.current_company,
                experience_years: None,
                skills: profile.skills,
                location: profile.location,
                source: "sourcing".to_string(),
                job_id: Some(job_id),
                status: CandidateStatus::Active,
                stage: CandidateStage::Applied,
                ai_score: None,
                ai_rationale: None,
                hired_at: None,
                last_contacted_at: None,
                created_at: ts,
                updated_at: ts,
            };
            created.push(self.repos.candidates.insert_candidate(&candidate).await?);
        }

        tracing::info!(
            job_id = %job_id,
            created = created.len(),
            skipped = skipped.len(),
            "sourcing import finished"
        );
        Ok(ImportReport { created, skipped })
    }
}

fn split_name(name: &str) -> (String, String) {
    let mut parts = name.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.next().unwrap_or_default().trim().to_string();
    (first, last)
}
