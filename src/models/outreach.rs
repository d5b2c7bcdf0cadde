use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "outreach_channel", rename_all = "lowercase")]
pub enum OutreachChannel {
    Email,
    Sms,
    Voice,
}

impl OutreachChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            OutreachChannel::Email => "email",
            OutreachChannel::Sms => "sms",
            OutreachChannel::Voice => "voice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "outreach_status", rename_all = "lowercase")]
pub enum OutreachStatus {
    Pending,
    Sent,
    Failed,
}

/// Progress reported by the messaging provider after hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Queued,
    Ringing,
    InProgress,
    Delivered,
    Completed,
    Busy,
    NoAnswer,
    Failed,
}

impl DeliveryStatus {
    pub fn is_final(self) -> bool {
        matches!(
            self,
            DeliveryStatus::Delivered
                | DeliveryStatus::Completed
                | DeliveryStatus::Busy
                | DeliveryStatus::NoAnswer
                | DeliveryStatus::Failed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Outreach {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub channel: OutreachChannel,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub status: OutreachStatus,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivery_status: Option<DeliveryStatus>,
    pub duration_seconds: Option<i32>,
    pub status_updated_at: Option<DateTime<Utc>>,
}

impl Outreach {
    pub fn pending(
        candidate_id: Uuid,
        channel: OutreachChannel,
        subject: Option<String>,
        body: Option<String>,
        created_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate_id,
            channel,
            subject,
            body,
            status: OutreachStatus::Pending,
            provider_message_id: None,
            error: None,
            created_by,
            created_at: now,
            sent_at: None,
            delivery_status: None,
            duration_seconds: None,
            status_updated_at: None,
        }
    }

    /// Applies a provider report. Reports after a final one are ignored so
    /// late or replayed webhooks cannot reopen a finished delivery.
    pub fn apply_delivery_status(
        &mut self,
        status: DeliveryStatus,
        duration_seconds: Option<i32>,
        at: DateTime<Utc>,
    ) -> bool {
        if self.delivery_status.is_some_and(DeliveryStatus::is_final) {
            return false;
        }
        self.delivery_status = Some(status);
        if duration_seconds.is_some() {
            self.duration_seconds = duration_seconds;
        }
        self.status_updated_at = Some(at);
        true
    }
}
