//! Batch enrichment passes.
//!
//! Both passes work on records in place and tolerate per-record failure: a
//! failed record gets an empty value and the pass moves on. Records that
//! were already updated keep their values if the caller drops the future.

use crate::provider::{FundingSource, OrganizationLookup};
use prowl_core::Record;
use std::collections::HashSet;

/// Counts reported after an enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Records the pass visited
    pub attempted: usize,
    /// Records that received a non-empty value
    pub found: usize,
    /// Records whose request failed
    pub failed: usize,
}

/// Look up the organization of every record.
///
/// Sets `organization_url` to the match, or to an empty string when there
/// is none or the lookup failed.
pub async fn lookup_organizations<L>(records: &mut [Record], lookup: &L) -> PassSummary
where
    L: OrganizationLookup + ?Sized,
{
    let mut summary = PassSummary::default();

    if let Err(e) = lookup.begin().await {
        tracing::warn!("Organization lookup unavailable: {}", e);
        for record in records.iter_mut() {
            record.organization_url = Some(String::new());
        }
        summary.attempted = records.len();
        summary.failed = records.len();
        return summary;
    }

    let total = records.len();
    tracing::info!("Looking up organizations for {} records", total);

    for record in records.iter_mut() {
        summary.attempted += 1;

        if record.website.trim().is_empty() {
            record.organization_url = Some(String::new());
            continue;
        }

        let organization = match lookup.lookup_organization(&record.website).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Lookup failed for {}: {}", record.website, e);
                summary.failed += 1;
                None
            }
        };

        if organization.is_some() {
            summary.found += 1;
        }
        tracing::debug!("{} -> {:?}", record.name, organization);
        record.organization_url = Some(organization.unwrap_or_default());

        if summary.attempted % 25 == 0 {
            tracing::info!(
                "Looked up {}/{} ({} found)",
                summary.attempted,
                total,
                summary.found
            );
        }
    }

    tracing::info!(
        "Found {} organizations out of {} records",
        summary.found,
        summary.attempted
    );
    summary
}

/// Keep each organization on the first record that names it.
///
/// Later records with the same non-empty `organization_url` get an empty
/// string. Returns how many were cleared.
pub fn dedup_organizations(records: &mut [Record]) -> usize {
    let mut seen = HashSet::new();
    let mut cleared = 0;

    for record in records.iter_mut() {
        let Some(url) = record.organization_url.as_deref() else {
            continue;
        };
        if url.is_empty() {
            continue;
        }
        if !seen.insert(url.to_string()) {
            tracing::debug!("{} shares organization {}, clearing", record.name, url);
            record.organization_url = Some(String::new());
            cleared += 1;
        }
    }

    cleared
}

/// Fetch the funding figure of every record that has an organization.
///
/// Deduplicates organizations first so each one is visited once. Records
/// without an organization, and records whose fetch failed, get an empty
/// string.
pub async fn fetch_funding<F>(records: &mut [Record], source: &F) -> PassSummary
where
    F: FundingSource + ?Sized,
{
    let cleared = dedup_organizations(records);
    if cleared > 0 {
        tracing::info!("Cleared {} duplicate organizations", cleared);
    }

    let mut summary = PassSummary::default();
    let total = records.iter().filter(|r| r.has_organization()).count();
    if total == 0 {
        tracing::warn!("No records with an organization, skipping funding");
    } else {
        tracing::info!("Fetching funding for {} organizations", total);
    }

    for record in records.iter_mut() {
        let Some(organization) = record
            .organization_url
            .clone()
            .filter(|url| !url.is_empty())
        else {
            record.funding_amount = Some(String::new());
            continue;
        };

        summary.attempted += 1;
        let amount = match source.fetch_funding(&organization).await {
            Ok(amount) => amount,
            Err(e) => {
                tracing::warn!("Funding fetch failed for {}: {}", organization, e);
                summary.failed += 1;
                None
            }
        };

        if amount.is_some() {
            summary.found += 1;
        }
        record.funding_amount = Some(amount.unwrap_or_default());

        if summary.attempted % 10 == 0 {
            tracing::info!("Fetched funding {}/{}", summary.attempted, total);
        }
    }

    tracing::info!(
        "Funding found for {} of {} organizations",
        summary.found,
        summary.attempted
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, organization: Option<&str>) -> Record {
        Record {
            name: name.to_string(),
            organization_url: organization.map(ToString::to_string),
            ..Record::default()
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut records = vec![
            record("A", Some("https://cb/organization/acme")),
            record("B", Some("https://cb/organization/acme")),
            record("C", Some("https://cb/organization/beta")),
            record("D", Some("https://cb/organization/acme")),
        ];

        let cleared = dedup_organizations(&mut records);

        assert_eq!(cleared, 2);
        assert_eq!(
            records[0].organization_url.as_deref(),
            Some("https://cb/organization/acme")
        );
        assert_eq!(records[1].organization_url.as_deref(), Some(""));
        assert_eq!(
            records[2].organization_url.as_deref(),
            Some("https://cb/organization/beta")
        );
        assert_eq!(records[3].organization_url.as_deref(), Some(""));
    }

    #[test]
    fn test_dedup_ignores_empty_and_missing() {
        let mut records = vec![
            record("A", Some("")),
            record("B", Some("")),
            record("C", None),
            record("D", None),
        ];

        assert_eq!(dedup_organizations(&mut records), 0);
        assert_eq!(records[0].organization_url.as_deref(), Some(""));
        assert_eq!(records[2].organization_url, None);
    }
}
