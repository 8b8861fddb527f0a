use crate::error::{BrowserError, Result};
use serde_json::Value;

/// Where a navigation ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Address shown by the page once every redirect has been followed
    pub final_url: String,
    /// HTTP status of the main document, when the page reports one
    pub status: Option<u16>,
}

/// Browser actions for automation
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL and wait for the document to load
    async fn navigate(&self, url: &str) -> Result<Navigation>;

    /// Evaluate a JavaScript expression in the current page.
    ///
    /// Promises are awaited and the result is returned by value.
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    /// Inner text of every element matching `selector`, in document order
    async fn extract_texts(&self, selector: &str) -> Result<Vec<String>>;
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {e}")))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(str::to_lowercase)
}

/// Whether `domain` is `base` or one of its subdomains.
pub fn matches_domain(domain: &str, base: &str) -> bool {
    let base = base.trim().trim_start_matches('.').to_lowercase();
    if base.is_empty() {
        return false;
    }
    domain == base || domain.ends_with(&format!(".{base}"))
}

/// Expression collecting the inner text of all elements matching `selector`.
pub(crate) fn texts_expression(selector: &str) -> String {
    let quoted = Value::String(selector.to_string()).to_string();
    format!(
        "Array.from(document.querySelectorAll({quoted})).map(e => (e.innerText || '').toString())"
    )
}
