use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::database::Repositories;
use crate::dto::dashboard_dto::{
    Count, OverviewResponse, PipelineResponse, PipelineStage, TrendPoint, TrendsResponse,
};
use crate::error::{Error, Result};
use crate::models::candidate::{CandidateStage, CandidateStatus};
use crate::models::interview::InterviewStatus;
use crate::models::job::JobStatus;
use crate::utils::time::{now, start_of_day, trailing_months};

/// Every key of `all` in order, missing ones reported as zero.
fn zero_filled<K: Copy + Eq + Hash>(all: &[K], counts: Vec<(K, i64)>) -> Vec<Count<K>> {
    let counts: HashMap<K, i64> = counts.into_iter().collect();
    all.iter()
        .map(|key| Count {
            key: *key,
            count: counts.get(key).copied().unwrap_or(0),
        })
        .collect()
}

fn total<K>(counts: &[Count<K>]) -> i64 {
    counts.iter().map(|c| c.count).sum()
}

fn by_month(rows: Vec<(NaiveDate, i64)>) -> HashMap<NaiveDate, i64> {
    rows.into_iter().collect()
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

/// Read-only aggregates, recomputed on every call.
#[derive(Clone)]
pub struct DashboardService {
    repos: Repositories,
}

impl DashboardService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn overview(&self) -> Result<OverviewResponse> {
        let jobs_by_status =
            zero_filled(&JobStatus::ALL, self.repos.jobs.count_jobs_by_status().await?);
        let candidates_by_stage = zero_filled(
            &CandidateStage::ALL,
            self.repos.candidates.count_candidates_by_stage().await?,
        );
        let candidates_by_status = zero_filled(
            &CandidateStatus::ALL,
            self.repos.candidates.count_candidates_by_status().await?,
        );
        let interviews_by_status = zero_filled(
            &InterviewStatus::ALL,
            self.repos.interviews.count_interviews_by_status().await?,
        );
        let upcoming_interviews = self
            .repos
            .interviews
            .count_upcoming_interviews(now())
            .await?;

        Ok(OverviewResponse {
            total_jobs: total(&jobs_by_status),
            total_candidates: total(&candidates_by_stage),
            total_interviews: total(&interviews_by_status),
            upcoming_interviews,
            jobs_by_status,
            candidates_by_stage,
            candidates_by_status,
            interviews_by_status,
        })
    }

    /// Dense series: one point per month, oldest first, the current month last.
    pub async fn trends(&self, months: u32) -> Result<TrendsResponse> {
        let buckets = trailing_months(now(), months);
        let Some(first) = buckets.first().copied() else {
            return Ok(TrendsResponse {
                months,
                series: Vec::new(),
            });
        };
        let since = start_of_day(first);

        let applications = by_month(self.repos.candidates.monthly_applications(since).await?);
        let interviews = by_month(self.repos.interviews.monthly_interviews(since).await?);
        let hires = by_month(self.repos.candidates.monthly_hires(since).await?);

        let series = buckets
            .into_iter()
            .map(|month| TrendPoint {
                month,
                applications: applications.get(&month).copied().unwrap_or(0),
                interviews: interviews.get(&month).copied().unwrap_or(0),
                hires: hires.get(&month).copied().unwrap_or(0),
            })
            .collect();
        Ok(TrendsResponse { months, series })
    }

    pub async fn pipeline(&self, job_id: Uuid) -> Result<PipelineResponse> {
        let job = self
            .repos
            .jobs
            .find_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", job_id)))?;
        let candidates = self.repos.candidates.list_candidates_for_job(job_id).await?;
        let total = candidates.len() as i64;
        let counts = zero_filled(
            &CandidateStage::ALL,
            candidates
                .iter()
                .fold(HashMap::new(), |mut acc: HashMap<CandidateStage, i64>, c| {
                    *acc.entry(c.stage).or_default() += 1;
                    acc
                })
                .into_iter()
                .collect(),
        );

        Ok(PipelineResponse {
            job_id,
            job_title: job.title,
            total,
            stages: counts
                .into_iter()
                .map(|c| PipelineStage {
                    stage: c.key,
                    count: c.count,
                    percentage: percentage(c.count, total),
                })
                .collect(),
        })
    }
}
