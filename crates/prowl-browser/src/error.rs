use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("script evaluation failed: {0}")]
    EvaluationError(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
