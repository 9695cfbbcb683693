use serde::{Deserialize, Serialize};

/// Input for a gosom scrape job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRequest {
    pub name: String,
    pub keywords: Vec<String>,
    pub lang: String,
    /// Number of places to collect. 1 means "single best match".
    pub depth: u32,
    /// Server-side time budget in seconds.
    pub max_time: u64,
    /// Fast mode requires lat/lon and is unsuitable for keyword queries.
    pub fast_mode: bool,
    pub json: bool,
    pub email: bool,
    /// Fetch the extended review set (up to ~300 per place).
    pub extra_reviews: bool,
}

/// Response from job submission.
#[derive(Debug, Clone, Deserialize)]
pub struct JobCreated {
    pub id: String,
}

/// Job status poll response. The backend is inconsistent about field
/// casing, so both variants are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusData {
    #[serde(rename = "status", alias = "Status", default)]
    pub status: String,
    #[serde(rename = "error", alias = "Error", default)]
    pub error: Option<String>,
}

/// Terminal-state classification of a job status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Completed,
    Failed,
    Running,
}

impl JobStatusData {
    /// Classify the status string. Matching is case-insensitive; the
    /// backend has been observed to report several spellings of each
    /// terminal state.
    pub fn state(&self) -> JobState {
        match self.status.to_lowercase().as_str() {
            "completed" | "ok" | "done" | "success" => JobState::Completed,
            "failed" | "error" => JobState::Failed,
            _ => JobState::Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: &str) -> JobStatusData {
        JobStatusData {
            status: s.to_string(),
            error: None,
        }
    }

    #[test]
    fn terminal_states_match_case_insensitively() {
        assert_eq!(status("Completed").state(), JobState::Completed);
        assert_eq!(status("OK").state(), JobState::Completed);
        assert_eq!(status("done").state(), JobState::Completed);
        assert_eq!(status("SUCCESS").state(), JobState::Completed);
        assert_eq!(status("Failed").state(), JobState::Failed);
        assert_eq!(status("ERROR").state(), JobState::Failed);
    }

    #[test]
    fn anything_else_is_running() {
        assert_eq!(status("working").state(), JobState::Running);
        assert_eq!(status("pending").state(), JobState::Running);
        assert_eq!(status("").state(), JobState::Running);
    }

    #[test]
    fn status_field_accepts_both_casings() {
        let upper: JobStatusData = serde_json::from_str(r#"{"Status": "ok"}"#).unwrap();
        assert_eq!(upper.state(), JobState::Completed);
        let lower: JobStatusData = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert_eq!(lower.state(), JobState::Completed);
    }
}
