//! Shared types used across the Prowl pipeline.
//!
//! This module defines the record model that flows from collection through
//! resolution and enrichment to export, plus the small newtypes the
//! collector is configured with.

use crate::error::{ProwlError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One discovered product listing.
///
/// Created by the collector, mutated by resolution (`website`,
/// `is_accessible`) and enrichment (`organization_url`, `funding_amount`),
/// finally written out by export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Product name
    pub name: String,
    /// Tagline / description, may be empty
    pub description: String,
    /// Upvotes at collection time
    pub vote_count: u64,
    /// Outbound link; the final destination once resolved
    pub website: String,
    /// Listing page on the discovery platform
    pub source_url: String,
    /// Number of makers listed on the product
    pub maker_count: u32,
    /// Creation timestamp as returned by the API
    pub created_at: String,
    /// Set by resolution; `None` before resolution ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_accessible: Option<bool>,
    /// `None` = lookup not attempted, `Some("")` = looked up, not found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_url: Option<String>,
    /// Free-text funding figure, `Some("")` when the fetch found nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_amount: Option<String>,
}

impl Record {
    /// Whether enrichment found an organization for this record.
    #[must_use]
    pub fn has_organization(&self) -> bool {
        self.organization_url
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    }

    /// Whether enrichment found a funding figure for this record.
    #[must_use]
    pub fn has_funding(&self) -> bool {
        self.funding_amount
            .as_deref()
            .is_some_and(|amount| !amount.is_empty())
    }
}

/// Half-open collection window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Inclusive lower bound
    pub start: DateTime<Utc>,
    /// Exclusive upper bound
    pub end: DateTime<Utc>,
}

/// Largest collection window, in years, that configuration accepts.
pub const MAX_YEARS: u32 = 100;

impl TimeWindow {
    /// Window reaching `years * 365` days back from `now` (no leap-year adjustment).
    ///
    /// `years` is clamped to [`MAX_YEARS`].
    #[must_use]
    pub fn last_years(years: u32, now: DateTime<Utc>) -> Self {
        let days = i64::from(years.min(MAX_YEARS)) * 365;
        Self {
            start: now
                .checked_sub_signed(Duration::days(days))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now,
        }
    }
}

/// Bearer credential for the discovery API.
///
/// The inner value is never printed; `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct DiscoveryToken(String);

impl DiscoveryToken {
    /// Create a token from user input.
    ///
    /// Surrounding whitespace is trimmed and a pasted `Bearer ` prefix is
    /// removed, since the client adds it itself.
    ///
    /// # Errors
    /// Returns error if nothing is left after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let mut token = raw.as_ref().trim();

        if let Some(stripped) = strip_prefix_ignore_case(token, "bearer ") {
            tracing::warn!("Token was pasted with a 'Bearer ' prefix; removing it");
            token = stripped.trim_start();
        }

        if token.is_empty() {
            return Err(ProwlError::Validation(
                "discovery token must not be empty".to_string(),
            ));
        }

        Ok(Self(token.to_string()))
    }

    /// Get the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DiscoveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DiscoveryToken(***)")
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> Record {
        Record {
            name: "Launchpad".to_string(),
            description: "Ship faster".to_string(),
            vote_count: 420,
            website: "https://www.producthunt.com/r/ABC123".to_string(),
            source_url: "https://www.producthunt.com/posts/launchpad".to_string(),
            maker_count: 2,
            created_at: "2024-03-01T08:01:00Z".to_string(),
            is_accessible: None,
            organization_url: None,
            funding_amount: None,
        }
    }

    #[test]
    fn test_window_spans_365_days_per_year() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let window = TimeWindow::last_years(1, now);
        assert_eq!(window.end, now);
        // 2024 is a leap year; the window deliberately ignores that.
        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2023, 3, 2, 0, 0, 0).unwrap()
        );

        let window = TimeWindow::last_years(3, now);
        assert_eq!((window.end - window.start).num_days(), 3 * 365);
    }

    #[test]
    fn test_window_clamps_huge_year_counts() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let window = TimeWindow::last_years(1_000_000, now);
        assert_eq!(window.end, now);
        assert_eq!(
            (window.end - window.start).num_days(),
            i64::from(MAX_YEARS) * 365
        );
        assert_eq!(TimeWindow::last_years(u32::MAX, now), window);
    }

    #[test]
    fn test_token_trims_and_strips_bearer() {
        let token = DiscoveryToken::new("  Bearer abc123-defGHI456 \n").expect("valid token");
        assert_eq!(token.as_str(), "abc123-defGHI456");

        let token = DiscoveryToken::new("bearer xyz").expect("valid token");
        assert_eq!(token.as_str(), "xyz");

        let token = DiscoveryToken::new("plain-token").expect("valid token");
        assert_eq!(token.as_str(), "plain-token");
    }

    #[test]
    fn test_token_rejects_empty() {
        assert!(DiscoveryToken::new("   ").is_err());
        assert!(DiscoveryToken::new("Bearer ").is_err());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = DiscoveryToken::new("super-secret").expect("valid token");
        assert!(!format!("{token:?}").contains("super-secret"));
    }

    #[test]
    fn test_record_enrichment_flags() {
        let mut record = sample_record();
        assert!(!record.has_organization());
        assert!(!record.has_funding());

        record.organization_url = Some(String::new());
        record.funding_amount = Some(String::new());
        assert!(!record.has_organization());
        assert!(!record.has_funding());

        record.organization_url = Some("https://www.crunchbase.com/organization/launchpad".into());
        record.funding_amount = Some("$12M".into());
        assert!(record.has_organization());
        assert!(record.has_funding());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_value(sample_record()).expect("serialize record");
        assert_eq!(json["voteCount"], 420);
        assert_eq!(json["makerCount"], 2);
        assert_eq!(json["sourceUrl"], "https://www.producthunt.com/posts/launchpad");
        assert!(json.get("isAccessible").is_none());
        assert!(json.get("organizationUrl").is_none());
    }
}
