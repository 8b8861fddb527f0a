//! Capability traits for enrichment backends.

use crate::error::Result;
use async_trait::async_trait;

/// Maps a company website to an organization page.
#[async_trait]
pub trait OrganizationLookup: Send + Sync {
    /// Prepare the session before the first lookup.
    async fn begin(&self) -> Result<()> {
        Ok(())
    }

    /// Find the organization behind `website`.
    ///
    /// `Ok(None)` means the backend answered and had no match.
    async fn lookup_organization(&self, website: &str) -> Result<Option<String>>;
}

/// Reads the funding figure shown on an organization page.
#[async_trait]
pub trait FundingSource: Send + Sync {
    /// `Ok(None)` means the page loaded but shows no funding figure.
    async fn fetch_funding(&self, organization_url: &str) -> Result<Option<String>>;
}
