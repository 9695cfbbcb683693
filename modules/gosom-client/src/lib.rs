pub mod error;
pub mod fields;
pub mod parse;
pub mod types;

pub use error::{GosomError, Result};
pub use parse::parse_records;
pub use types::{JobCreated, JobRequest, JobState, JobStatusData};

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

pub struct GosomClient {
    client: reqwest::Client,
    base_url: String,
}

impl GosomClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Submit a scrape job. Returns immediately with the job id.
    pub async fn submit_job(&self, input: &JobRequest) -> Result<String> {
        let url = format!("{}/api/v1/jobs", self.base_url);
        let resp = self.client.post(&url).json(input).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GosomError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let created: JobCreated = resp.json().await?;
        Ok(created.id)
    }

    /// Fetch current job status.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatusData> {
        let url = format!("{}/api/v1/jobs/{}", self.base_url, job_id);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GosomError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Poll until the job reaches a terminal state or `max_wait`
    /// elapses. A timed-out local wait does not cancel the remote job;
    /// the backend reclaims its own resources.
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + max_wait;
        loop {
            let status = self.job_status(job_id).await?;
            match status.state() {
                JobState::Completed => return Ok(()),
                JobState::Failed => {
                    let detail = status.error.unwrap_or_else(|| status.status.clone());
                    tracing::error!(job_id, detail = %detail, "Scrape job failed");
                    return Err(GosomError::JobFailed(detail));
                }
                JobState::Running => {
                    tracing::debug!(job_id, status = %status.status, "Job still in progress");
                }
            }

            if Instant::now() + poll_interval > deadline {
                return Err(GosomError::Timeout(max_wait.as_secs()));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Download the raw result body for a completed job.
    pub async fn download(&self, job_id: &str) -> Result<String> {
        let url = format!("{}/api/v1/jobs/{}/download", self.base_url, job_id);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GosomError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.text().await?)
    }

    /// Run a job end-to-end: submit, poll to completion, download and
    /// parse the result payload into place records.
    pub async fn run_job(
        &self,
        input: &JobRequest,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<Vec<Value>> {
        tracing::info!(name = %input.name, keywords = ?input.keywords, "Submitting scrape job");

        let job_id = self.submit_job(input).await?;
        tracing::info!(job_id, "Job created, polling for completion");

        self.wait_for_job(&job_id, max_wait, poll_interval).await?;

        let body = self.download(&job_id).await?;
        let records = parse_records(&body)?;
        tracing::info!(job_id, count = records.len(), "Fetched place records");

        Ok(records)
    }
}
