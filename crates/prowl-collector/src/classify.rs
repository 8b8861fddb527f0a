//! Pure classification of discovery API responses.
//!
//! Every response, successful or not, is mapped to exactly one
//! [`PageOutcome`] without touching the network, so the collection loop can
//! be driven from recorded or synthetic responses.

use prowl_core::Record;
use serde::de::IgnoredAny;
use serde::Deserialize;

/// GraphQL error code the API uses for throttling.
const RATE_LIMIT_CODE: &str = "rate_limit_reached";

/// GraphQL error codes that mean the token itself was refused.
const AUTH_ERROR_CODES: &[&str] = &["invalid_oauth_token", "unauthorized_oauth"];

/// Longest body excerpt carried into a failure message.
const BODY_EXCERPT_CHARS: usize = 500;

/// What came back from one page request, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResponse {
    /// The server answered, with any status.
    Received { status: u16, body: String },
    /// The request never produced a response (DNS, TLS, timeout, ...).
    Failed { reason: String },
}

/// Classified result of one page request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Ok {
        items: Vec<RawItem>,
        next_cursor: Option<String>,
        has_more: bool,
    },
    /// `reset_seconds == 0` means the server gave no usable wait.
    RateLimited { reset_seconds: u64 },
    Unauthorized,
    Transport(String),
    Malformed(String),
}

/// One product node as returned by the posts query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub votes_count: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub makers: Option<Vec<IgnoredAny>>,
}

impl RawItem {
    #[must_use]
    pub fn maker_count(&self) -> u32 {
        self.makers
            .as_ref()
            .map_or(0, |makers| u32::try_from(makers.len()).unwrap_or(u32::MAX))
    }

    /// Map to a [`Record`]; maker identities collapse into a count.
    #[must_use]
    pub fn into_record(self) -> Record {
        let maker_count = self.maker_count();
        Record {
            name: self.name,
            description: self.description.unwrap_or_default(),
            vote_count: self.votes_count,
            website: self.website.unwrap_or_default(),
            source_url: self.url.unwrap_or_default(),
            maker_count,
            created_at: self.created_at.unwrap_or_default(),
            is_accessible: None,
            organization_url: None,
            funding_amount: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<PostsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct PostsData {
    #[serde(default)]
    posts: Option<PostConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostConnection {
    page_info: PageInfo,
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    end_cursor: Option<String>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: RawItem,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<ErrorDetails>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    reset_in: Option<f64>,
}

impl GraphQlError {
    fn code(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn describe(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// Classify a raw response into exactly one outcome.
#[must_use]
pub fn classify(raw: &RawResponse) -> PageOutcome {
    let (status, body) = match raw {
        RawResponse::Failed { reason } => return PageOutcome::Transport(reason.clone()),
        RawResponse::Received { status, body } => (*status, body.as_str()),
    };

    let parsed = serde_json::from_str::<GraphQlResponse>(body);

    if let Ok(response) = &parsed {
        if let Some(reset_seconds) = rate_limit_signal(&response.errors) {
            return PageOutcome::RateLimited { reset_seconds };
        }
        if response
            .errors
            .iter()
            .any(|e| e.code().is_some_and(|code| AUTH_ERROR_CODES.contains(&code)))
        {
            return PageOutcome::Unauthorized;
        }
    }

    match status {
        401 => PageOutcome::Unauthorized,
        429 => PageOutcome::RateLimited { reset_seconds: 0 },
        200 => match parsed {
            Ok(response) => page_from(response),
            Err(e) => PageOutcome::Malformed(format!("response is not valid JSON: {e}")),
        },
        other => PageOutcome::Transport(format!("HTTP {other}: {}", excerpt(body))),
    }
}

fn rate_limit_signal(errors: &[GraphQlError]) -> Option<u64> {
    errors
        .iter()
        .find(|e| e.code() == Some(RATE_LIMIT_CODE))
        .map(|e| {
            let reset = e.details.as_ref().and_then(|d| d.reset_in).unwrap_or(0.0);
            if reset.is_finite() && reset > 0.0 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let seconds = reset.ceil() as u64;
                seconds
            } else {
                0
            }
        })
}

fn page_from(response: GraphQlResponse) -> PageOutcome {
    let Some(posts) = response.data.and_then(|data| data.posts) else {
        let reason = if response.errors.is_empty() {
            "response has no data.posts".to_string()
        } else {
            response
                .errors
                .iter()
                .map(GraphQlError::describe)
                .collect::<Vec<_>>()
                .join("; ")
        };
        return PageOutcome::Malformed(reason);
    };

    PageOutcome::Ok {
        items: posts.edges.into_iter().map(|edge| edge.node).collect(),
        next_cursor: posts.page_info.end_cursor,
        has_more: posts.page_info.has_next_page,
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
