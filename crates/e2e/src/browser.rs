//! Browser contexts the runner drives
//!
//! A context loads one page at a time and reports the text currently
//! visible on it. The runner owns the navigate/assert sequencing; contexts
//! only answer "load this" and "what does the page show now".

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::dom::visible_text;
use crate::error::{E2eError, E2eResult};

#[async_trait]
pub trait BrowserContext: Send {
    /// Load `url` and wait for it to settle. Network failures, timeouts and
    /// non-success statuses are navigation errors.
    async fn goto(&mut self, url: &str, timeout: Duration) -> E2eResult<()>;

    /// Visible text of the current page, whitespace-collapsed
    async fn visible_text(&mut self) -> E2eResult<String>;

    /// URL of the current page
    fn current_url(&self) -> Option<&str>;
}

/// Browser context for server-rendered pages: plain HTTP, no script
/// execution.
///
/// The document returned by `goto` answers the first `visible_text` call;
/// later calls re-fetch the page so that polling observes server-side
/// changes.
pub struct HttpBrowser {
    client: reqwest::Client,
    current_url: Option<String>,
    timeout: Duration,
    pending: Option<String>,
}

impl HttpBrowser {
    pub fn new() -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pagegen-e2e/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            current_url: None,
            timeout: Duration::from_secs(30),
            pending: None,
        })
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> E2eResult<String> {
        let navigation_error = |reason: String| E2eError::Navigation {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    navigation_error(format!("timed out after {} ms", timeout.as_millis()))
                } else {
                    navigation_error(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status)));
        }

        resp.text().await.map_err(|e| navigation_error(e.to_string()))
    }
}

#[async_trait]
impl BrowserContext for HttpBrowser {
    async fn goto(&mut self, url: &str, timeout: Duration) -> E2eResult<()> {
        debug!("GET {}", url);
        self.current_url = None;
        self.pending = None;

        let body = self.fetch(url, timeout).await?;
        self.current_url = Some(url.to_string());
        self.timeout = timeout;
        self.pending = Some(body);
        Ok(())
    }

    async fn visible_text(&mut self) -> E2eResult<String> {
        if let Some(body) = self.pending.take() {
            return Ok(visible_text(&body));
        }
        let url = self.current_url.clone().ok_or(E2eError::NoPageLoaded)?;
        let body = self.fetch(&url, self.timeout).await?;
        Ok(visible_text(&body))
    }

    fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }
}
