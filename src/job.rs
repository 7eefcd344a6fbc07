//! Job completion protocol for job-based providers.
//!
//! After a submission is accepted we poll the job's status until it reaches a terminal state:
//!
//! `SUBMITTED → IN_PROGRESS → {COMPLETED, FAILED}`
//!
//! Status queries are sleep-gated: two queries are always at least one poll interval apart,
//! and the first query happens one interval after submission.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::opts::Opts;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Submitted,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SUBMITTED" | "QUEUED" => Ok(JobStatus::Submitted),
            "IN_PROGRESS" => Ok(JobStatus::InProgress),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A point-in-time view of a transcription job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub name: String,
    pub status: JobStatus,

    /// Vendor-reported reason, set when `status` is `Failed`.
    pub failure_reason: Option<String>,
}

impl JobSnapshot {
    pub fn new(name: impl Into<String>, status: JobStatus) -> Self {
        Self {
            name: name.into(),
            status,
            failure_reason: None,
        }
    }

    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: JobStatus::Failed,
            failure_reason: Some(reason.into()),
        }
    }
}

/// Pacing for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Minimum time between two status queries.
    pub interval: Duration,

    /// Give up once this much time has passed since submission.
    pub timeout: Option<Duration>,
}

impl PollSettings {
    pub fn from_opts(opts: &Opts) -> Self {
        Self {
            interval: opts.job_check_interval(),
            timeout: opts.job_timeout(),
        }
    }
}

/// Drive `submitted` to a terminal state by calling `fetch` with the job name.
///
/// Returns the `Completed` snapshot, `Error::JobFailed` carrying the vendor reason, or
/// `Error::JobTimedOut` once the optional deadline passes. Errors from `fetch` propagate
/// unchanged.
pub async fn wait_for_completion<F, Fut>(
    submitted: JobSnapshot,
    settings: PollSettings,
    mut fetch: F,
) -> Result<JobSnapshot>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<JobSnapshot>>,
{
    let started = Instant::now();
    let deadline = settings.timeout.map(|t| started + t);
    let mut last_check = started;
    let mut job = submitted;

    loop {
        match job.status {
            JobStatus::Completed => return Ok(job),
            JobStatus::Failed => {
                return Err(Error::JobFailed {
                    reason: job
                        .failure_reason
                        .unwrap_or_else(|| "no failure reason reported".to_owned()),
                    job_name: job.name,
                });
            }
            JobStatus::Submitted | JobStatus::InProgress => {}
        }

        let next_check = last_check + settings.interval;
        if let Some(deadline) = deadline {
            if next_check > deadline {
                return Err(Error::JobTimedOut {
                    job_name: job.name,
                    waited: started.elapsed(),
                });
            }
        }

        tokio::time::sleep_until(next_check).await;
        last_check = Instant::now();

        debug!(job = %job.name, status = %job.status, "checking job status");
        job = fetch(job.name.clone()).await?;
    }
}
