pub mod ai_service;
pub mod auth_service;
pub mod calendar_service;
pub mod candidate_service;
pub mod dashboard_service;
pub mod interview_service;
pub mod job_service;
pub mod messaging_service;
pub mod notification_service;
pub mod outreach_service;
pub mod queue_service;
pub mod sourcing_service;
