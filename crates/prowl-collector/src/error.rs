use thiserror::Error;

/// Errors raised while setting up a collection run.
///
/// Page-level failures never surface here; the collection loop turns them
/// into a [`StopReason`](crate::StopReason).
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("invalid collector settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, CollectError>;
