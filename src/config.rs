use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

/// Runtime settings read once from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub webhook_secret: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub calendar_api_url: Option<String>,
    pub messaging_api_url: Option<String>,
    pub messaging_api_key: Option<String>,
    pub sourcing_api_url: Option<String>,
    pub sourcing_api_key: Option<String>,
    pub api_rps: u32,
    pub allowed_origins: Vec<String>,
    pub json_logs: bool,
    pub worker_poll_ms: u64,
    pub task_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8000"),
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            token_ttl_minutes: get_env_parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            openai_api_key: get_optional("OPENAI_API_KEY"),
            openai_model: get_env_or("OPENAI_MODEL", "gpt-4o"),
            calendar_api_url: get_optional("CALENDAR_API_URL"),
            messaging_api_url: get_optional("MESSAGING_API_URL"),
            messaging_api_key: get_optional("MESSAGING_API_KEY"),
            sourcing_api_url: get_optional("SOURCING_API_URL"),
            sourcing_api_key: get_optional("SOURCING_API_KEY"),
            api_rps: get_env_parse_or("API_RPS", 100)?,
            allowed_origins: get_optional("ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            json_logs: get_env_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            worker_poll_ms: get_env_parse_or("WORKER_POLL_MS", 750)?,
            task_timeout_secs: get_env_parse_or("TASK_TIMEOUT_SECS", 900)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_optional(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_values_fall_back_and_report_garbage() {
        std::env::remove_var("PIPELINE_TEST_RPS");
        assert_eq!(get_env_parse_or("PIPELINE_TEST_RPS", 7u32).unwrap(), 7);

        std::env::set_var("PIPELINE_TEST_RPS", "lots");
        let err = get_env_parse_or::<u32>("PIPELINE_TEST_RPS", 7).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        std::env::remove_var("PIPELINE_TEST_RPS");
    }
}
