//! Plain HTTP reachability probe for hosts that do not need a browser.

use crate::error::Result;
use crate::resolve::{is_accessible_status, strip_ref_param, Resolution, UrlResolver};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

/// Resolves a link with a HEAD request, falling back to GET when HEAD fails.
///
/// Redirects are followed; the final URL is the address of the last hop.
pub struct HttpResolver {
    client: Client,
}

impl HttpResolver {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    async fn probe(&self, url: &str) -> reqwest::Result<Response> {
        match self.client.head(url).send().await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::debug!("HEAD {} failed, retrying with GET: {}", url, e);
                self.client.get(url).send().await
            }
        }
    }
}

#[async_trait]
impl UrlResolver for HttpResolver {
    async fn resolve(&self, url: &str) -> Resolution {
        match self.probe(url).await {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::trace!("{} -> {} ({})", url, response.url(), status);
                Resolution {
                    final_url: strip_ref_param(response.url().as_str()),
                    accessible: is_accessible_status(status),
                }
            }
            Err(e) => {
                tracing::debug!("{} unreachable: {}", url, e);
                Resolution::unreachable(url)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_creation() {
        let resolver = HttpResolver::new(Duration::from_secs(10), "prowl-test");
        assert!(resolver.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_unreachable() {
        let resolver = HttpResolver::new(Duration::from_secs(1), "prowl-test").unwrap();
        let resolution = resolver.resolve("not a url").await;
        assert_eq!(resolution, Resolution::unreachable("not a url"));
    }
}
