use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "recommendation", rename_all = "snake_case")]
pub enum Recommendation {
    StrongHire,
    Hire,
    Maybe,
    NoHire,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub submitted_by: Uuid,
    pub overall_rating: i16,
    pub technical_rating: Option<i16>,
    pub communication_rating: Option<i16>,
    pub cultural_fit_rating: Option<i16>,
    pub problem_solving_rating: Option<i16>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub comments: Option<String>,
    pub recommendation: Recommendation,
    pub created_at: DateTime<Utc>,
}
