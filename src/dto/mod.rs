pub mod auth_dto;
pub mod candidate_dto;
pub mod common;
pub mod dashboard_dto;
pub mod interview_dto;
pub mod job_dto;
pub mod outreach_dto;
pub mod sourcing_dto;
