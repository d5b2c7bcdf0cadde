use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::sourcing_service::SourcedProfile;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImportProfilesPayload {
    pub job_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub profiles: Vec<SourcedProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub profiles: Vec<SourcedProfile>,
}
