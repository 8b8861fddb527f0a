use prowl_browser::BrowserError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnrichError>;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("invalid lookup address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}
