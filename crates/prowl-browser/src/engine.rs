use crate::actions::{texts_expression, BrowserActions, Navigation};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Status of the main document as recorded by the Navigation Timing API.
const NAVIGATION_STATUS: &str = "(() => { \
    const entry = performance.getEntriesByType('navigation')[0]; \
    return entry && entry.responseStatus ? entry.responseStatus : null; \
})()";

/// How the browser process is launched.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Run without a visible window
    pub headless: bool,
    /// Persistent profile directory; sessions survive restarts when set
    pub profile_dir: Option<PathBuf>,
    pub fingerprint: FingerprintConfig,
    /// Upper bound on a single navigation
    pub navigation_timeout: Duration,
}

impl EngineSettings {
    /// Settings for the configured window, with a random user agent.
    pub fn from_config(
        config: &prowl_core::BrowserConfig,
        profile_dir: Option<PathBuf>,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            headless: config.headless,
            profile_dir,
            fingerprint: FingerprintConfig::with_viewport(
                config.window_width,
                config.window_height,
            ),
            navigation_timeout,
        }
    }

    /// Headless settings with a random fingerprint and no profile.
    pub fn headless(navigation_timeout: Duration) -> Self {
        Self {
            headless: true,
            profile_dir: None,
            fingerprint: FingerprintConfig::randomized(),
            navigation_timeout,
        }
    }
}

/// Browser automation engine.
///
/// Owns one Chromium process and a single tab. Every action runs in that
/// tab, so callers drive it one step at a time.
pub struct BrowserEngine {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chromium and open the working tab.
    pub async fn launch(settings: &EngineSettings) -> Result<Self> {
        let fingerprint = &settings.fingerprint;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .arg(format!("--user-agent={}", fingerprint.user_agent))
            .arg(format!("--lang={}", fingerprint.locale));

        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &settings.profile_dir {
            builder = builder.user_data_dir(dir);
        }

        let config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        tracing::debug!(
            headless = settings.headless,
            profile = ?settings.profile_dir,
            "browser launched"
        );

        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout: settings.navigation_timeout,
        })
    }

    /// Shut the browser down.
    pub async fn close(mut self) -> Result<()> {
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::ChromiumError(e.to_string()));
        // The profile directory stays locked until the process has exited
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("waiting for browser exit failed: {}", e);
        }
        self.handler.abort();
        tracing::debug!("browser closed");
        result
    }
}

#[async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<Navigation> {
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(url.to_string()))?
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;

        let final_url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?
            .unwrap_or_else(|| url.to_string());

        let status = match self.evaluate(NAVIGATION_STATUS).await {
            Ok(value) => value.as_u64().and_then(|s| u16::try_from(s).ok()),
            Err(e) => {
                tracing::debug!("no navigation status for {}: {}", final_url, e);
                None
            }
        };

        Ok(Navigation { final_url, status })
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::EvaluationError)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| BrowserError::EvaluationError(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn extract_texts(&self, selector: &str) -> Result<Vec<String>> {
        let value = self.evaluate(&texts_expression(selector)).await?;
        serde_json::from_value(value).map_err(|e| BrowserError::EvaluationError(e.to_string()))
    }
}
