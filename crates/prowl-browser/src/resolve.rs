//! Outbound link resolution.
//!
//! Every collected record carries a tracking link. Resolution follows it to
//! the final destination, records whether that destination answered, and
//! rewrites the record's `website` with the final address. Links on gated
//! hosts (which refuse plain HTTP clients) go through a real browser one at
//! a time; everything else goes through a bounded pool of HTTP probes.

use crate::actions::{extract_domain, matches_domain, BrowserActions};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use prowl_core::{Record, ResolutionConfig};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// Outcome of following one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub final_url: String,
    pub accessible: bool,
}

impl Resolution {
    /// The link could not be followed; keep the original address.
    pub fn unreachable(url: &str) -> Self {
        Self {
            final_url: url.to_string(),
            accessible: false,
        }
    }
}

/// Whether a final HTTP status counts as accessible.
///
/// 200 and 403 are accessible. A 403 usually means the site is alive but
/// refuses automated clients. Every other status is inaccessible.
pub fn is_accessible_status(status: u16) -> bool {
    matches!(status, 200 | 403)
}

/// Remove the `ref=producthunt` tracking parameter from a URL.
///
/// Other query parameters are kept in order. Unparsable input is returned
/// unchanged.
pub fn strip_ref_param(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let total = parsed.query_pairs().count();
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, value)| !(*key == "ref" && *value == "producthunt"))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.len() == total {
        return url.to_string();
    }

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.to_string()
}

/// Follows one link to its final destination.
///
/// Implementations never fail: a link that cannot be followed resolves to
/// [`Resolution::unreachable`].
#[async_trait]
pub trait UrlResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Resolution;
}

#[async_trait]
impl<T: UrlResolver + ?Sized> UrlResolver for Arc<T> {
    async fn resolve(&self, url: &str) -> Resolution {
        (**self).resolve(url).await
    }
}

/// Resolves links by loading them in a browser tab.
pub struct BrowserResolver<A> {
    actions: A,
}

impl<A: BrowserActions> BrowserResolver<A> {
    pub fn new(actions: A) -> Self {
        Self { actions }
    }

    /// Give the browser back, e.g. to close it.
    pub fn into_inner(self) -> A {
        self.actions
    }
}

#[async_trait]
impl<A: BrowserActions> UrlResolver for BrowserResolver<A> {
    async fn resolve(&self, url: &str) -> Resolution {
        match self.actions.navigate(url).await {
            Ok(navigation) => Resolution {
                final_url: strip_ref_param(&navigation.final_url),
                accessible: navigation.status.is_some_and(is_accessible_status),
            },
            Err(e) => {
                tracing::debug!("browser could not load {}: {}", url, e);
                Resolution::unreachable(url)
            }
        }
    }
}

/// Which links need a browser and how wide the probe pool is.
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    pub gated_hosts: Vec<String>,
    pub workers: usize,
}

impl ResolutionPlan {
    pub fn from_config(config: &ResolutionConfig) -> Self {
        Self {
            gated_hosts: config.gated_hosts.clone(),
            workers: config.probe_workers,
        }
    }

    /// Whether `url` points at a host that must be loaded in a browser.
    pub fn is_gated(&self, url: &str) -> bool {
        extract_domain(url).is_ok_and(|domain| {
            self.gated_hosts
                .iter()
                .any(|host| matches_domain(&domain, host))
        })
    }
}

async fn resolve_one<R: UrlResolver + ?Sized>(resolver: &R, url: String) -> (String, Resolution) {
    if url.trim().is_empty() {
        let resolution = Resolution::unreachable(&url);
        return (url, resolution);
    }
    let resolution = resolver.resolve(&url).await;
    (url, resolution)
}

/// Resolve the website of every record that has not been resolved yet.
///
/// Returns the same records in the same order. Each distinct website is
/// followed once; records sharing it share the result. Records whose
/// accessibility is already known are left untouched.
pub async fn resolve_all<G, P>(
    mut records: Vec<Record>,
    gated: &G,
    plain: &P,
    plan: &ResolutionPlan,
) -> Vec<Record>
where
    G: UrlResolver + ?Sized,
    P: UrlResolver + ?Sized,
{
    let mut seen = HashSet::new();
    let (gated_urls, plain_urls): (Vec<String>, Vec<String>) = records
        .iter()
        .filter(|record| record.is_accessible.is_none())
        .map(|record| record.website.clone())
        .filter(|website| seen.insert(website.clone()))
        .partition(|website| plan.is_gated(website));

    tracing::info!(
        "Resolving {} links ({} in browser, {} by probe)",
        gated_urls.len() + plain_urls.len(),
        gated_urls.len(),
        plain_urls.len()
    );

    let mut results: HashMap<String, Resolution> =
        HashMap::with_capacity(gated_urls.len() + plain_urls.len());

    for url in gated_urls {
        let (url, resolution) = resolve_one(gated, url).await;
        results.insert(url, resolution);
        if results.len() % 50 == 0 {
            tracing::info!("Resolved {} links", results.len());
        }
    }

    let mut queue = plain_urls.into_iter();
    let mut in_flight = FuturesUnordered::new();
    for url in queue.by_ref().take(plan.workers.max(1)) {
        in_flight.push(resolve_one(plain, url));
    }
    while let Some((url, resolution)) = in_flight.next().await {
        results.insert(url, resolution);
        if let Some(next) = queue.next() {
            in_flight.push(resolve_one(plain, next));
        }
    }

    for record in records.iter_mut().filter(|r| r.is_accessible.is_none()) {
        if let Some(resolution) = results.get(&record.website) {
            record.website.clone_from(&resolution.final_url);
            record.is_accessible = Some(resolution.accessible);
        }
    }

    records
}

/// Keep only accessible records. Returns the survivors and the number dropped.
pub fn retain_accessible(records: Vec<Record>) -> (Vec<Record>, usize) {
    let total = records.len();
    let kept: Vec<Record> = records
        .into_iter()
        .filter(|record| record.is_accessible == Some(true))
        .collect();
    let dropped = total - kept.len();

    if total > 0 && kept.is_empty() {
        tracing::warn!("All {} websites are inaccessible", total);
    } else {
        tracing::info!("{} accessible, {} dropped", kept.len(), dropped);
    }

    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessible_statuses() {
        assert!(is_accessible_status(200));
        assert!(is_accessible_status(403));
        assert!(!is_accessible_status(201));
        assert!(!is_accessible_status(301));
        assert!(!is_accessible_status(404));
        assert!(!is_accessible_status(500));
    }

    #[test]
    fn test_strip_ref_param_only_query() {
        assert_eq!(
            strip_ref_param("https://acme.io/?ref=producthunt"),
            "https://acme.io/"
        );
    }

    #[test]
    fn test_strip_ref_param_keeps_other_params() {
        assert_eq!(
            strip_ref_param("https://acme.io/pricing?plan=pro&ref=producthunt&utm=x"),
            "https://acme.io/pricing?plan=pro&utm=x"
        );
    }

    #[test]
    fn test_strip_ref_param_leaves_other_refs() {
        let url = "https://acme.io/?ref=newsletter";
        assert_eq!(strip_ref_param(url), url);
    }

    #[test]
    fn test_strip_ref_param_untouched_input() {
        assert_eq!(strip_ref_param("https://acme.io"), "https://acme.io");
        assert_eq!(strip_ref_param("not a url"), "not a url");
    }

    #[test]
    fn test_plan_gates_subdomains() {
        let plan = ResolutionPlan {
            gated_hosts: vec!["producthunt.com".to_string()],
            workers: 4,
        };
        assert!(plan.is_gated("https://www.producthunt.com/r/abc"));
        assert!(plan.is_gated("https://producthunt.com/r/abc"));
        assert!(!plan.is_gated("https://acme.io"));
        assert!(!plan.is_gated(""));
    }

    #[test]
    fn test_plan_from_config() {
        let plan = ResolutionPlan::from_config(&ResolutionConfig::default());
        assert_eq!(plan.workers, 20);
        assert!(plan.is_gated("https://www.producthunt.com/r/x"));
    }

    fn record(website: &str, accessible: Option<bool>) -> Record {
        Record {
            name: "Acme".to_string(),
            website: website.to_string(),
            is_accessible: accessible,
            ..Record::default()
        }
    }

    #[test]
    fn test_retain_accessible() {
        let records = vec![
            record("https://a.io", Some(true)),
            record("https://b.io", Some(false)),
            record("https://c.io", None),
        ];
        let (kept, dropped) = retain_accessible(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(kept[0].website, "https://a.io");
    }

    #[test]
    fn test_retain_accessible_all_dropped() {
        let (kept, dropped) = retain_accessible(vec![record("https://b.io", Some(false))]);
        assert!(kept.is_empty());
        assert_eq!(dropped, 1);
    }
}
