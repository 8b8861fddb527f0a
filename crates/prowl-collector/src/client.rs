//! Discovery API client.
//!
//! The collection loop only sees the [`PageSource`] trait; [`GraphQlClient`]
//! is the production implementation speaking to the Product Hunt v2
//! GraphQL endpoint.

use crate::classify::RawResponse;
use crate::error::Result;
use async_trait::async_trait;
use prowl_core::{DiscoveryConfig, DiscoveryToken, TimeWindow};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Posts ordered by votes, one page per request.
const POSTS_QUERY: &str = r"
query Posts($after: String, $postedAfter: DateTime!, $postedBefore: DateTime!) {
  posts(after: $after, postedAfter: $postedAfter, postedBefore: $postedBefore, order: VOTES) {
    pageInfo {
      endCursor
      hasNextPage
    }
    edges {
      node {
        name
        description
        votesCount
        url
        website
        createdAt
        makers {
          id
        }
      }
    }
  }
}
";

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Cursor returned by the previous page; `None` for the first page
    pub cursor: Option<String>,
    /// Collection window
    pub window: TimeWindow,
}

/// Anything that can serve pages of the discovery feed.
///
/// Implementations must not interpret the response; classification happens
/// in [`classify`](crate::classify::classify).
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Issue one page request and hand back whatever came back.
    async fn fetch_page(&self, request: &PageRequest) -> RawResponse;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for std::sync::Arc<T> {
    async fn fetch_page(&self, request: &PageRequest) -> RawResponse {
        (**self).fetch_page(request).await
    }
}

/// GraphQL client for the discovery API.
pub struct GraphQlClient {
    client: Client,
    endpoint: String,
    token: DiscoveryToken,
}

impl GraphQlClient {
    /// Create a client bound to one credential.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &DiscoveryConfig, token: DiscoveryToken) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token,
        })
    }
}

/// JSON body for one page request.
#[must_use]
pub fn request_body(request: &PageRequest) -> Value {
    json!({
        "query": POSTS_QUERY,
        "variables": {
            "after": request.cursor,
            "postedAfter": request.window.start.to_rfc3339(),
            "postedBefore": request.window.end.to_rfc3339(),
        }
    })
}

#[async_trait]
impl PageSource for GraphQlClient {
    async fn fetch_page(&self, request: &PageRequest) -> RawResponse {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.as_str())
            .header(ACCEPT, "application/json")
            .json(&request_body(request))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return RawResponse::Failed {
                    reason: format!("request failed: {e}"),
                }
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => RawResponse::Received { status, body },
            Err(e) => RawResponse::Failed {
                reason: format!("failed to read response body: {e}"),
            },
        }
    }
}
