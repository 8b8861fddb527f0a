//! Crunchbase backend.
//!
//! Lookups call the site's autocomplete endpoint from inside an
//! authenticated browser tab, so the request carries the session cookies.
//! Funding figures are read from the rendered organization page.

use crate::error::{EnrichError, Result};
use crate::provider::{FundingSource, OrganizationLookup};
use async_trait::async_trait;
use prowl_browser::BrowserActions;
use prowl_core::EnrichmentConfig;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Links inside the funding block of an organization page.
const FUNDING_SELECTOR: &str = "#overview_funding a";

/// Wait after opening the home page before the first lookup.
const SESSION_WARM_UP: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct CrunchbaseSettings {
    /// Site root, without trailing slash
    pub base_url: String,
    /// Wait after an organization page loads before reading it
    pub settle_delay: Duration,
}

impl CrunchbaseSettings {
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }
}

/// Crunchbase enrichment driven through a browser.
pub struct Crunchbase<A> {
    actions: A,
    settings: CrunchbaseSettings,
}

impl<A: BrowserActions> Crunchbase<A> {
    pub fn new(actions: A, settings: CrunchbaseSettings) -> Self {
        Self { actions, settings }
    }

    /// Open the login page so the operator can sign in by hand.
    pub async fn open_login(&self) -> Result<()> {
        let url = self.settings.login_url();
        tracing::info!("Opening {}", url);
        self.actions.navigate(&url).await?;
        Ok(())
    }

    /// Give the browser back, e.g. to close it.
    pub fn into_inner(self) -> A {
        self.actions
    }
}

#[async_trait]
impl<A: BrowserActions> OrganizationLookup for Crunchbase<A> {
    async fn begin(&self) -> Result<()> {
        self.actions.navigate(&self.settings.base_url).await?;
        tokio::time::sleep(SESSION_WARM_UP).await;
        Ok(())
    }

    async fn lookup_organization(&self, website: &str) -> Result<Option<String>> {
        let url = autocomplete_url(&self.settings.base_url, website)?;
        let response = self.actions.evaluate(&fetch_json_expression(&url)).await?;
        parse_autocomplete(&self.settings.base_url, &response)
    }
}

#[async_trait]
impl<A: BrowserActions> FundingSource for Crunchbase<A> {
    async fn fetch_funding(&self, organization_url: &str) -> Result<Option<String>> {
        self.actions.navigate(organization_url).await?;
        tokio::time::sleep(self.settings.settle_delay).await;

        let texts = self.actions.extract_texts(FUNDING_SELECTOR).await?;
        Ok(pick_funding(&texts))
    }
}

/// Autocomplete request for one website, limited to the best organization match.
pub fn autocomplete_url(base_url: &str, website: &str) -> Result<Url> {
    let url = Url::parse_with_params(
        &format!("{base_url}/v4/data/autocompletes"),
        &[
            ("query", website),
            ("collection_ids", "organizations"),
            ("limit", "1"),
        ],
    )?;
    Ok(url)
}

fn fetch_json_expression(url: &Url) -> String {
    let quoted = Value::String(url.to_string()).to_string();
    format!(
        "(async () => {{ const response = await fetch({quoted}, {{ credentials: 'include' }}); \
         return await response.json(); }})()"
    )
}

#[derive(Debug, Default, Deserialize)]
struct Autocomplete {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    identifier: Option<Identifier>,
}

#[derive(Debug, Deserialize)]
struct Identifier {
    permalink: Option<String>,
}

/// Organization page for the first autocomplete match, if any.
pub fn parse_autocomplete(base_url: &str, response: &Value) -> Result<Option<String>> {
    if response.is_null() {
        return Err(EnrichError::UnexpectedResponse(
            "empty autocomplete response".to_string(),
        ));
    }

    let parsed: Autocomplete = serde_json::from_value(response.clone())
        .map_err(|e| EnrichError::UnexpectedResponse(e.to_string()))?;

    if parsed.count == 0 {
        return Ok(None);
    }

    let permalink = parsed
        .entities
        .into_iter()
        .next()
        .and_then(|entity| entity.identifier)
        .and_then(|identifier| identifier.permalink)
        .filter(|permalink| !permalink.is_empty());

    Ok(permalink.map(|permalink| format!("{base_url}/organization/{permalink}")))
}

/// First link text carrying a dollar amount, trimmed.
pub fn pick_funding(texts: &[String]) -> Option<String> {
    texts
        .iter()
        .find(|text| text.contains('$'))
        .map(|text| text.trim().to_string())
}
