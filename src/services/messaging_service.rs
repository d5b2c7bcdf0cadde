use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::outreach::OutreachChannel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub channel: OutreachChannel,
    /// Email address for `email`, phone number for `sms` and `voice`.
    pub recipient: String,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeliveryReceipt {
    pub provider_message_id: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// A delivery failure reported by the provider is an `Upstream` error.
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt>;
}

/// Normalises Indian mobile numbers to E.164; other input passes through trimmed.
pub fn format_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if raw.trim_start().starts_with('+') {
        return format!("+{}", digits);
    }
    match digits.len() {
        10 => format!("+91{}", digits),
        11 if digits.starts_with('0') => format!("+91{}", &digits[1..]),
        12 if digits.starts_with("91") => format!("+{}", digits),
        _ => raw.trim().to_string(),
    }
}

#[derive(Clone)]
pub struct HttpMessaging {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl HttpMessaging {
    pub fn new(base_url: Option<String>, api_key: Option<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            api_key,
        }
    }
}

#[async_trait]
impl MessagingProvider for HttpMessaging {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Upstream("Messaging provider is not configured".to_string()))?;

        let mut req = self
            .client
            .post(format!("{}/messages/{}", base_url, message.channel.as_str()))
            .json(message)
            .timeout(Duration::from_secs(30));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Messaging provider unreachable: {}", e)))?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Messaging provider rejected {} message ({}): {}",
                message.channel.as_str(),
                status,
                text
            )));
        }
        res.json::<DeliveryReceipt>()
            .await
            .map_err(|e| Error::Upstream(format!("Malformed delivery receipt: {}", e)))
    }
}
