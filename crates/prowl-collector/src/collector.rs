//! Collection loop for the discovery feed.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//!   Fetching ──ok / continue──▶ Fetching
//!   Fetching ──rate limited───▶ Paused(wait) ──elapsed──▶ Fetching (same cursor)
//!                                            └─cancelled─▶ Stopped(Cancelled)
//!   Fetching ──cap / stagnation / exhausted / unauthorized / failure──▶ Stopped(reason)
//! ```
//!
//! Page interpretation ([`SessionState::advance`]) is synchronous and free of
//! I/O; only fetching and pausing are async.

use crate::classify::{classify, PageOutcome};
use crate::client::{PageRequest, PageSource};
use crate::error::{CollectError, Result};
use crate::filter::RecordFilter;
use prowl_core::{CollectionConfig, Record, TimeWindow};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How often a running rate-limit pause reports the remaining wait.
const PAUSE_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Guidance shown when the API refuses the token.
pub const CREDENTIAL_HINTS: &str = "\
The discovery API rejected the token. Likely causes:
  1. A Client ID or Client Secret was used instead of the Developer Token
  2. The token was copied incompletely
  3. A 'Bearer ' prefix was pasted along with it (not needed)
  4. The token expired or was revoked
Create an application at https://api.producthunt.com/v2/oauth/applications
and copy its 'Developer token'.";

/// Settings for one collection run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub window: TimeWindow,
    pub blacklist: Vec<String>,
    pub max_makers: u32,
    pub max_products: usize,
    pub max_empty_pages: u32,
    /// Pause used when a rate limit carries no positive reset time.
    pub default_rate_limit: Duration,
}

impl CollectorConfig {
    /// Build run settings from the persisted collection section.
    #[must_use]
    pub fn from_collection(config: &CollectionConfig, window: TimeWindow) -> Self {
        Self {
            window,
            blacklist: config.blacklist.clone(),
            max_makers: config.max_makers,
            max_products: config.max_products,
            max_empty_pages: config.max_empty_pages,
            default_rate_limit: Duration::from_secs(config.default_rate_limit_secs),
        }
    }
}

/// Why a collection run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The record cap was reached.
    CapReached,
    /// Too many consecutive pages produced no accepted record.
    Stagnated,
    /// The feed has no more pages.
    Exhausted,
    /// The operator interrupted a rate-limit pause.
    Cancelled,
    /// The token was refused; nothing can continue until it is fixed.
    Unauthorized,
    /// The request failed or the server answered with an unexpected status.
    Transport(String),
    /// The server answered with something that is not a posts page.
    Malformed(String),
}

impl StopReason {
    /// Only an authorization failure is fatal to the whole run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, StopReason::Unauthorized)
    }

    /// Whether the loop ended through an error rather than a normal stop.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StopReason::Unauthorized | StopReason::Transport(_) | StopReason::Malformed(_)
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::CapReached => f.write_str("record limit reached"),
            StopReason::Stagnated => f.write_str(
                "too many consecutive pages without a matching product; the filters may be too strict (try raising the maker limit)",
            ),
            StopReason::Exhausted => f.write_str("reached the end of the feed"),
            StopReason::Cancelled => f.write_str("stopped by the operator"),
            StopReason::Unauthorized => f.write_str(CREDENTIAL_HINTS),
            StopReason::Transport(reason) => write!(f, "request failed: {reason}"),
            StopReason::Malformed(reason) => write!(f, "unexpected response: {reason}"),
        }
    }
}

/// Outcome of a collection run; records are always preserved.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub records: Vec<Record>,
    /// Pages successfully ingested (rate-limited attempts not counted)
    pub pages: u32,
    pub stop: StopReason,
}

/// Loop states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Fetching,
    Paused(Duration),
    Stopped(StopReason),
}

/// Ephemeral per-run state; discarded when the run ends.
#[derive(Debug, Default)]
pub struct SessionState {
    pub cursor: Option<String>,
    pub records: Vec<Record>,
    pub empty_streak: u32,
    pub pages: u32,
}

impl SessionState {
    /// Apply one classified page and decide what the loop does next.
    pub fn advance(
        &mut self,
        outcome: PageOutcome,
        filter: &RecordFilter,
        config: &CollectorConfig,
    ) -> LoopState {
        match outcome {
            PageOutcome::Ok {
                items,
                next_cursor,
                has_more,
            } => self.ingest(items, next_cursor, has_more, filter, config),
            PageOutcome::RateLimited { reset_seconds } => {
                let wait = if reset_seconds > 0 {
                    Duration::from_secs(reset_seconds)
                } else {
                    config.default_rate_limit
                };
                LoopState::Paused(wait)
            }
            PageOutcome::Unauthorized => LoopState::Stopped(StopReason::Unauthorized),
            PageOutcome::Transport(reason) => LoopState::Stopped(StopReason::Transport(reason)),
            PageOutcome::Malformed(reason) => LoopState::Stopped(StopReason::Malformed(reason)),
        }
    }

    fn ingest(
        &mut self,
        items: Vec<crate::classify::RawItem>,
        next_cursor: Option<String>,
        has_more: bool,
        filter: &RecordFilter,
        config: &CollectorConfig,
    ) -> LoopState {
        self.pages += 1;
        let before = self.records.len();

        for item in items {
            if self.records.len() >= config.max_products {
                break;
            }
            match filter.check(&item.name, item.maker_count()) {
                Ok(()) => self.records.push(item.into_record()),
                Err(rejection) => tracing::debug!("Skipping '{}': {}", item.name, rejection),
            }
        }

        let added = self.records.len() - before;
        if added == 0 {
            self.empty_streak += 1;
        } else {
            self.empty_streak = 0;
        }

        tracing::debug!(
            "Page {}: +{} records ({} total, {} empty pages in a row)",
            self.pages,
            added,
            self.records.len(),
            self.empty_streak
        );

        let cursor_missing = next_cursor.is_none();
        if next_cursor.is_some() {
            self.cursor = next_cursor;
        }

        if self.records.len() >= config.max_products {
            LoopState::Stopped(StopReason::CapReached)
        } else if self.empty_streak >= config.max_empty_pages {
            LoopState::Stopped(StopReason::Stagnated)
        } else if !has_more {
            LoopState::Stopped(StopReason::Exhausted)
        } else if cursor_missing {
            LoopState::Stopped(StopReason::Malformed(
                "server reported more pages but returned no cursor".to_string(),
            ))
        } else {
            LoopState::Fetching
        }
    }
}

/// Drives a [`PageSource`] through the collection state machine.
pub struct Collector<S> {
    source: S,
    config: CollectorConfig,
    filter: RecordFilter,
    cancel: CancellationToken,
}

impl<S: PageSource> Collector<S> {
    /// Create a collector.
    ///
    /// # Errors
    /// Returns error if the stagnation limit is zero.
    pub fn new(source: S, config: CollectorConfig, cancel: CancellationToken) -> Result<Self> {
        if config.max_empty_pages == 0 {
            return Err(CollectError::InvalidSettings(
                "max_empty_pages must be at least 1".to_string(),
            ));
        }

        let filter = RecordFilter::new(&config.blacklist, config.max_makers);
        Ok(Self {
            source,
            config,
            filter,
            cancel,
        })
    }

    /// Run until the cap, stagnation, exhaustion, a failure, or cancellation.
    pub async fn run(&self) -> CollectionReport {
        tracing::info!(
            "Collecting products from {} to {} (blacklist: [{}], max makers: {}, limit: {})",
            self.config.window.start.format("%Y-%m-%d"),
            self.config.window.end.format("%Y-%m-%d"),
            self.config.blacklist.join(", "),
            self.config.max_makers,
            self.config.max_products
        );

        let mut session = SessionState::default();
        let mut state = if self.cancel.is_cancelled() {
            LoopState::Stopped(StopReason::Cancelled)
        } else {
            LoopState::Fetching
        };

        loop {
            state = match state {
                LoopState::Fetching => {
                    let request = PageRequest {
                        cursor: session.cursor.clone(),
                        window: self.config.window,
                    };
                    let raw = self.source.fetch_page(&request).await;
                    session.advance(classify(&raw), &self.filter, &self.config)
                }
                LoopState::Paused(wait) => self.pause(wait, session.records.len()).await,
                LoopState::Stopped(stop) => {
                    self.log_stop(&stop, session.records.len());
                    return CollectionReport {
                        records: session.records,
                        pages: session.pages,
                        stop,
                    };
                }
            };
        }
    }

    /// Block the loop for `wait`, reporting the countdown; cancellable.
    async fn pause(&self, wait: Duration, collected: usize) -> LoopState {
        tracing::warn!(
            "Rate limit reached with {} products collected; resuming automatically in {}s (interrupt to stop collecting and keep what was gathered)",
            collected,
            wait.as_secs()
        );

        let deadline = Instant::now() + wait;
        loop {
            let now = Instant::now();
            if now >= deadline {
                tracing::info!("Rate limit pause over, retrying the same page");
                return LoopState::Fetching;
            }

            let wake = deadline.min(now + PAUSE_REPORT_INTERVAL);
            tokio::select! {
                () = self.cancel.cancelled() => {
                    return LoopState::Stopped(StopReason::Cancelled);
                }
                () = tokio::time::sleep_until(wake) => {}
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if !remaining.is_zero() {
                tracing::info!("Rate limit pause: {}s remaining", remaining.as_secs());
            }
        }
    }

    fn log_stop(&self, stop: &StopReason, collected: usize) {
        match stop {
            StopReason::Unauthorized => {
                tracing::error!("Authorization failed\n{}", stop);
            }
            StopReason::Transport(_) | StopReason::Malformed(_) => {
                tracing::error!("Collection aborted: {}", stop);
            }
            StopReason::Stagnated => {
                tracing::warn!(
                    "Stopping after {} pages in a row without matching products; the filters may be too strict",
                    self.config.max_empty_pages
                );
            }
            StopReason::CapReached | StopReason::Exhausted | StopReason::Cancelled => {
                tracing::info!("Collection stopped: {}", stop);
            }
        }
        tracing::info!("Collection finished with {} products", collected);
    }
}
