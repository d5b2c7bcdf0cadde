use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::outreach::OutreachChannel;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAssessment {
    /// Match score in `0.0..=1.0`.
    pub score: f64,
    pub rationale: String,
}

/// Text-generation collaborator. Inputs are pre-rendered prompts, see
/// [`candidate_profile`] and [`job_profile`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn analyze_job(&self, description: &str, requirements: &str) -> Result<JobAnalysis>;
    async fn analyze_candidate(&self, profile: &str, job: &str) -> Result<CandidateAssessment>;
    async fn draft_message(
        &self,
        candidate: &str,
        job: &str,
        channel: OutreachChannel,
    ) -> Result<String>;
}

pub fn candidate_profile(candidate: &Candidate) -> String {
    format!(
        "Name: {}\nCurrent Title: {}\nCurrent Company: {}\nExperience: {} years\nSkills: {}\nLocation: {}",
        candidate.full_name(),
        candidate.current_title.as_deref().unwrap_or(""),
        candidate.current_company.as_deref().unwrap_or(""),
        candidate.experience_years.unwrap_or(0),
        candidate.skills.join(", "),
        candidate.location.as_deref().unwrap_or(""),
    )
}

pub fn job_profile(job: Option<&Job>) -> String {
    match job {
        Some(job) => format!(
            "Title: {}\nRequired Skills: {}\nExperience Level: {}\nLocation: {}",
            job.title,
            job.parsed_skills.join(", "),
            job.experience_level.as_deref().unwrap_or(""),
            job.location.as_deref().unwrap_or(""),
        ),
        None => "No specific opening; general talent pool".to_string(),
    }
}

/// OpenAI chat-completions adapter.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    async fn chat_json(&self, prompt: String, temperature: f32) -> Result<JsonValue> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Upstream("AI provider is not configured".to_string()))?;

        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "response_format": { "type": "json_object" },
            "temperature": temperature,
        });

        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("OpenAI API error {}: {}", status, text)));
        }

        let body: JsonValue = res.json().await?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .and_then(|s| serde_json::from_str(s).ok())
            .ok_or_else(|| Error::Upstream("Invalid OpenAI response format".to_string()))
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn analyze_job(&self, description: &str, requirements: &str) -> Result<JobAnalysis> {
        let prompt = format!(
            "Analyze this job description and requirements to extract structured information \
             for candidate sourcing.\n\nJob Description:\n{}\n\nRequirements:\n{}\n\n\
             Return a JSON object with: skills (max 15 strings), requirements (list of strings), \
             keywords (max 10 search keywords), experience_level (entry/mid/senior/executive).",
            description, requirements
        );
        let value = self.chat_json(prompt, 0.1).await?;
        let analysis: JobAnalysis = serde_json::from_value(value)
            .map_err(|e| Error::Upstream(format!("Malformed job analysis: {}", e)))?;
        tracing::info!(skills = analysis.skills.len(), "job analysis completed");
        Ok(analysis)
    }

    async fn analyze_candidate(&self, profile: &str, job: &str) -> Result<CandidateAssessment> {
        let prompt = format!(
            "Analyze how well this candidate matches the job requirements.\n\n\
             Candidate Profile:\n{}\n\nJob Requirements:\n{}\n\n\
             Return JSON with: score (float 0-1, overall match) and rationale (string).",
            profile, job
        );
        let value = self.chat_json(prompt, 0.1).await?;
        let mut assessment: CandidateAssessment = serde_json::from_value(value)
            .map_err(|e| Error::Upstream(format!("Malformed candidate assessment: {}", e)))?;
        assessment.score = assessment.score.clamp(0.0, 1.0);
        Ok(assessment)
    }

    async fn draft_message(
        &self,
        candidate: &str,
        job: &str,
        channel: OutreachChannel,
    ) -> Result<String> {
        let style = match channel {
            OutreachChannel::Email => "a professional email body of at most 150 words",
            OutreachChannel::Sms => "an SMS under 300 characters",
            OutreachChannel::Voice => "a short phone-call script of at most 80 words",
        };
        let prompt = format!(
            "Write {} inviting this candidate to discuss the opportunity. Be personal and concise.\n\n\
             Candidate:\n{}\n\nJob:\n{}\n\nReturn JSON with a single field 'message'.",
            style, candidate, job
        );
        let value = self.chat_json(prompt, 0.7).await?;
        value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Upstream("AI response did not contain a message".to_string()))
    }
}
