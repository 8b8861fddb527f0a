//! Pipeline stages: collect, resolve, save, enrich, save.

use crate::cli::{CollectArgs, EnrichArgs};
use crate::console::Console;
use crate::params;
use anyhow::{Context, Result};
use chrono::Utc;
use prowl_browser::{
    resolve_all, retain_accessible, BrowserEngine, BrowserResolver, EngineSettings,
    HttpResolver, ResolutionPlan,
};
use prowl_collector::{CollectionReport, Collector, CollectorConfig, GraphQlClient, StopReason};
use prowl_core::{AppConfig, Record, TimeWindow};
use prowl_export::Imported;
use prowl_enrich::{
    fetch_funding, lookup_organizations, Crunchbase, CrunchbaseSettings, FundingSource,
    OrganizationLookup,
};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Pipeline<'a> {
    config: AppConfig,
    console: &'a Console,
    cancel: CancellationToken,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: AppConfig, console: &'a Console) -> Self {
        Self {
            config,
            console,
            cancel: CancellationToken::new(),
        }
    }

    /// Route Ctrl+C into the cancellation token from now on.
    fn arm_interrupt(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping after the current step");
                cancel.cancel();
            }
        });
    }

    /// Collect, resolve and save; then optionally enrich.
    pub async fn run_fresh(mut self, args: &CollectArgs) -> Result<ExitCode> {
        let token = params::discovery_token(self.console, &self.config, args)?;
        self.config.collection =
            params::collection_params(self.console, &self.config.collection, args)?;
        self.arm_interrupt();

        let report = self.collect(token).await?;
        self.report_collection(&report);

        if report.records.is_empty() {
            self.console
                .warning("No products matched the criteria, nothing to save");
            return Ok(exit_code(&report.stop));
        }

        if report.stop.is_fatal() || self.cancel.is_cancelled() {
            self.console
                .warning("Saving the collected records without resolving their links");
            self.save(&report.records, false)?;
            return Ok(exit_code(&report.stop));
        }

        let collected = report.records;
        let records = match self.resolve(collected.clone()).await {
            Ok(Some(records)) => records,
            Ok(None) => {
                self.console
                    .warning("Interrupted, saving the records without resolved links");
                self.save(&collected, false)?;
                return Ok(ExitCode::SUCCESS);
            }
            Err(e) => {
                self.save(&collected, false)?;
                return Err(e);
            }
        };

        let total = records.len();
        let (records, dropped) = retain_accessible(records);
        self.console.header("Link resolution finished");
        self.console
            .line(&format!("Accessible websites: {}", records.len()));
        self.console
            .line(&format!("Unreachable (dropped): {dropped} of {total}"));

        if records.is_empty() {
            self.console.warning("Every website is unreachable, nothing to save");
            return Ok(ExitCode::SUCCESS);
        }

        self.save(&records, false)?;

        let enrich = if args.enrich {
            true
        } else if args.no_enrich {
            false
        } else {
            self.console.confirm(
                "Continue with organization and funding enrichment?",
                self.console.interactive(),
            )?
        };

        if !enrich || self.cancel.is_cancelled() {
            self.console.success(&format!(
                "Done: {} records in {}",
                records.len(),
                self.config.export.path.display()
            ));
            return Ok(ExitCode::SUCCESS);
        }

        self.enrich(records, &args.session).await
    }

    /// Load the existing spreadsheet and enrich it.
    pub async fn run_resume(self, args: &EnrichArgs) -> Result<ExitCode> {
        let path = &self.config.export.path;
        let imported = prowl_export::import_records(path)
            .with_context(|| format!("failed to load {}", path.display()))?;

        if imported.records.is_empty() {
            self.console
                .warning(&format!("{} has no records to enrich", path.display()));
            return Ok(ExitCode::FAILURE);
        }
        self.console
            .success(&format!("Loaded {} records", imported.records.len()));
        if let Some(notice) = resume_notice(&imported) {
            self.console.warning(&notice);
        }

        self.arm_interrupt();
        self.enrich(imported.records, args).await
    }

    async fn collect(&self, token: prowl_core::DiscoveryToken) -> Result<CollectionReport> {
        let collection = &self.config.collection;
        let window = TimeWindow::last_years(collection.years, Utc::now());

        let client = GraphQlClient::new(&self.config.discovery, token)
            .context("failed to create the discovery API client")?;
        let collector = Collector::new(
            client,
            CollectorConfig::from_collection(collection, window),
            self.cancel.clone(),
        )?;

        Ok(collector.run().await)
    }

    fn report_collection(&self, report: &CollectionReport) {
        self.console.header("Collection finished");
        self.console
            .line(&format!("Products collected: {}", report.records.len()));
        self.console.line(&format!("Pages read: {}", report.pages));

        if report.stop.is_fatal() {
            self.console.failure(&report.stop.to_string());
        } else if report.stop.is_failure() {
            self.console
                .warning(&format!("Stopped early: {}", report.stop));
        } else {
            self.console.line(&format!("Stopped: {}", report.stop));
        }
    }

    /// Resolve every link. `None` when interrupted.
    async fn resolve(&self, records: Vec<Record>) -> Result<Option<Vec<Record>>> {
        let resolution = &self.config.resolution;
        let plan = ResolutionPlan::from_config(resolution);
        let settings = EngineSettings::from_config(
            &self.config.browser,
            None,
            Duration::from_secs(resolution.navigation_timeout_secs),
        );

        let plain = HttpResolver::new(
            Duration::from_secs(resolution.probe_timeout_secs),
            &settings.fingerprint.user_agent,
        )
        .context("failed to create the HTTP client")?;
        let engine = BrowserEngine::launch(&settings)
            .await
            .context("failed to launch Chromium; is Chrome or Chromium installed?")?;
        let gated = BrowserResolver::new(engine);

        let resolved = tokio::select! {
            () = self.cancel.cancelled() => None,
            records = resolve_all(records, &gated, &plain, &plan) => Some(records),
        };

        if let Err(e) = gated.into_inner().close().await {
            tracing::warn!("Failed to close the browser: {}", e);
        }
        Ok(resolved)
    }

    async fn enrich(&self, mut records: Vec<Record>, args: &EnrichArgs) -> Result<ExitCode> {
        let enrichment = &self.config.enrichment;
        let settings = CrunchbaseSettings::from_config(enrichment);
        let profile_dir = self
            .config
            .browser_profile_dir()
            .context("failed to locate the browser profile directory")?;
        std::fs::create_dir_all(&profile_dir)
            .with_context(|| format!("failed to create {}", profile_dir.display()))?;

        let navigation_timeout = Duration::from_secs(enrichment.navigation_timeout_secs);

        if !args.skip_login && self.console.interactive() {
            let mut login = EngineSettings::from_config(
                &self.config.browser,
                Some(profile_dir.clone()),
                navigation_timeout,
            );
            login.headless = false;
            self.login(&login, settings.clone()).await?;
        }

        let engine = EngineSettings::from_config(
            &self.config.browser,
            Some(profile_dir),
            navigation_timeout,
        );
        let crunchbase = Crunchbase::new(
            BrowserEngine::launch(&engine)
                .await
                .context("failed to launch Chromium; is Chrome or Chromium installed?")?,
            settings,
        );

        let finished = tokio::select! {
            () = self.cancel.cancelled() => false,
            () = enrichment_passes(&mut records, &crunchbase) => true,
        };

        if let Err(e) = crunchbase.into_inner().close().await {
            tracing::warn!("Failed to close the browser: {}", e);
        }

        if !finished {
            self.console
                .warning("Interrupted, saving what was enriched so far");
        }
        self.save(&records, true)?;

        let organizations = records.iter().filter(|r| r.has_organization()).count();
        let funded = records.iter().filter(|r| r.has_funding()).count();
        self.console.header("Enrichment finished");
        self.console.line(&format!("Records: {}", records.len()));
        self.console
            .line(&format!("With an organization: {organizations}"));
        self.console.line(&format!("With funding data: {funded}"));
        self.console
            .line(&format!("File: {}", self.config.export.path.display()));

        Ok(ExitCode::SUCCESS)
    }

    /// Headful session on the persistent profile so the operator can sign in.
    async fn login(&self, engine: &EngineSettings, settings: CrunchbaseSettings) -> Result<()> {
        self.console.header("Enrichment site sign-in");
        self.console.line("A browser window will open. In it:");
        self.console.line("1. Solve the captcha if one appears");
        self.console.line("2. Sign in and leave the window open");
        self.console.line("3. Come back here and press Enter");

        let crunchbase = Crunchbase::new(
            BrowserEngine::launch(engine)
                .await
                .context("failed to open the sign-in browser")?,
            settings,
        );

        let opened = crunchbase.open_login().await;
        let waited = match &opened {
            Ok(()) => self.console.wait_for_enter("Press Enter once signed in"),
            Err(_) => Ok(()),
        };

        if let Err(e) = crunchbase.into_inner().close().await {
            tracing::warn!("Failed to close the sign-in browser: {}", e);
        }

        opened.context("failed to open the sign-in page")?;
        waited?;
        self.console.success("Session saved");
        Ok(())
    }

    fn save(&self, records: &[Record], with_enrichment: bool) -> Result<()> {
        let path = &self.config.export.path;
        prowl_export::export_records(path, records, with_enrichment)
            .with_context(|| format!("failed to save {}", path.display()))?;
        self.console
            .success(&format!("Saved {} records to {}", records.len(), path.display()));
        Ok(())
    }
}

async fn enrichment_passes<S>(records: &mut [Record], source: &S)
where
    S: OrganizationLookup + FundingSource,
{
    lookup_organizations(records, source).await;
    fetch_funding(records, source).await;
}

/// Warn before enrichment values from an earlier run are replaced.
fn resume_notice(imported: &Imported) -> Option<String> {
    if !imported.has_enrichment {
        return None;
    }
    let organizations = imported
        .records
        .iter()
        .filter(|r| r.has_organization())
        .count();
    Some(format!(
        "The file is already enriched ({organizations} records with an organization); \
         every record will be looked up again"
    ))
}

fn exit_code(stop: &StopReason) -> ExitCode {
    if stop.is_fatal() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_only_fails_on_fatal_stop() {
        assert_eq!(exit_code(&StopReason::Unauthorized), ExitCode::FAILURE);
        assert_eq!(exit_code(&StopReason::Exhausted), ExitCode::SUCCESS);
        assert_eq!(exit_code(&StopReason::Cancelled), ExitCode::SUCCESS);
        assert_eq!(
            exit_code(&StopReason::Transport("reset".to_string())),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn test_resume_notice_only_for_enriched_files() {
        let mut imported = Imported {
            records: vec![
                Record {
                    organization_url: Some("https://www.crunchbase.com/organization/acme".into()),
                    ..Record::default()
                },
                Record {
                    organization_url: Some(String::new()),
                    ..Record::default()
                },
            ],
            has_enrichment: true,
        };

        let notice = resume_notice(&imported).unwrap();
        assert!(notice.contains("1 records with an organization"));

        imported.has_enrichment = false;
        assert_eq!(resume_notice(&imported), None);
    }
}
