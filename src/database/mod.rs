pub mod memory;
pub mod pool;
pub mod postgres;
pub mod repository;

pub use repository::{
    CandidateFilter, CandidateRepository, InterviewFilter, InterviewRepository, JobFilter,
    JobRepository, OutreachRepository, Page, PageRequest, Repositories, TaskRepository,
    UserRepository,
};
