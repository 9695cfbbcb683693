use thiserror::Error;

pub type Result<T> = std::result::Result<T, GosomError>;

#[derive(Debug, Error)]
pub enum GosomError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Job failed with status: {0}")]
    JobFailed(String),

    #[error("Job did not finish within {0}s")]
    Timeout(u64),
}

impl From<reqwest::Error> for GosomError {
    fn from(err: reqwest::Error) -> Self {
        GosomError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GosomError {
    fn from(err: serde_json::Error) -> Self {
        GosomError::Parse(err.to_string())
    }
}
