pub mod candidate;
pub mod feedback;
pub mod interview;
pub mod job;
pub mod outreach;
pub mod task;
pub mod user;
