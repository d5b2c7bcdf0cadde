use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::outreach::{DeliveryStatus, Outreach, OutreachStatus};

/// Status report posted by the messaging provider.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeliveryStatusPayload {
    #[validate(length(min = 1, max = 200))]
    pub provider_message_id: String,
    pub status: DeliveryStatus,
    #[validate(range(min = 0))]
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallStatusResponse {
    pub call_id: String,
    pub outreach_id: Uuid,
    pub candidate_id: Uuid,
    pub outreach_status: OutreachStatus,
    pub delivery_status: Option<DeliveryStatus>,
    pub duration_seconds: Option<i32>,
    pub sent_at: Option<DateTime<Utc>>,
    pub status_updated_at: Option<DateTime<Utc>>,
}

impl CallStatusResponse {
    pub fn new(call_id: String, outreach: Outreach) -> Self {
        Self {
            call_id,
            outreach_id: outreach.id,
            candidate_id: outreach.candidate_id,
            outreach_status: outreach.status,
            delivery_status: outreach.delivery_status,
            duration_seconds: outreach.duration_seconds,
            sent_at: outreach.sent_at,
            status_updated_at: outreach.status_updated_at,
        }
    }
}
