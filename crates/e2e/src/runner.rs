//! Main test runner that orchestrates the server, browser contexts and specs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::browser::{BrowserContext, HttpBrowser};
use url::Url;

use crate::dom::text_matches;
use crate::error::{E2eError, E2eResult, FailureKind};
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::server::{ServerConfig, ServerHandle};
use crate::spec::{parse_base_url, resolve_url, url_path, TestSpec, TestStep};
use crate::wait::{Poller, WaitConfig, DEFAULT_POLL_INTERVAL};

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
}

impl TestResult {
    fn finish(name: &str, start: Instant, steps: Vec<StepResult>, failure: Option<E2eError>) -> Self {
        Self {
            name: name.to_string(),
            success: failure.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: failure.as_ref().map(|e| e.to_string()),
            failure: failure.as_ref().map(E2eError::kind),
        }
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

/// Which browser context executes the steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Plain HTTP against server-rendered pages
    #[default]
    Http,
    /// Real browser through Playwright
    Playwright,
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Server under test when specs do not name one
    pub base_url: String,

    /// Spawn a server instead of using `base_url`
    pub server: Option<ServerConfig>,

    pub backend: BackendKind,
    pub playwright: PlaywrightConfig,

    /// Overrides every spec's navigation timeout
    pub navigation_timeout: Option<Duration>,

    /// Overrides every spec's assertion timeout
    pub assertion_timeout: Option<Duration>,

    /// Delay between visibility probes
    pub poll_interval: Duration,

    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3006".to_string(),
            server: None,
            backend: BackendKind::Http,
            playwright: PlaywrightConfig::default(),
            navigation_timeout: None,
            assertion_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            specs_dir: PathBuf::from("specs"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Navigation smoke-test runner
pub struct TestRunner {
    config: RunnerConfig,

    /// Base URL in effect (the spawned server's once started)
    base_url: String,

    /// Running server handle (if any)
    server: Option<ServerHandle>,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            config,
            server: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start the server if one is configured to be spawned
    pub async fn start_server(&mut self) -> E2eResult<()> {
        if self.server.is_some() {
            return Ok(()); // Already running
        }
        let Some(server_config) = self.config.server.clone() else {
            return Ok(());
        };

        let server = ServerHandle::spawn(server_config).await?;
        self.base_url = server.base_url().to_string();
        self.server = Some(server);
        Ok(())
    }

    /// Stop the server
    pub fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }
        Ok(())
    }

    /// Run all tests in the specs directory
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.config.specs_dir)?;
        self.run_specs(&specs).await
    }

    /// Run tests matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.config.specs_dir)?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_specs(&filtered).await
    }

    /// Run a specific test by name
    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.config.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        self.run_specs(std::slice::from_ref(&spec)).await
    }

    /// Run a list of test specs, one after another
    pub async fn run_specs(&mut self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        // Ensure server is running
        self.start_server().await?;

        info!("Running {} test(s) against {}...", specs.len(), self.base_url);

        for spec in specs {
            // Harness errors abort the run; step failures are recorded
            let result = self.run_spec(spec).await?;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("Test Results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        Ok(TestSuiteResult {
            started_at,
            total: specs.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run a single test spec in a fresh browser context
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<TestResult> {
        debug!("Running test: {}", spec.name);
        // An unusable base URL is a harness error, not a navigation failure
        let base = self.spec_base_url(spec)?;
        match self.config.backend {
            BackendKind::Http => {
                let mut browser = HttpBrowser::new()?;
                Ok(self.run_spec_in(&mut browser, spec).await)
            }
            BackendKind::Playwright => {
                let start = Instant::now();
                let spec = self.effective_spec(spec);
                let playwright = PlaywrightHandle::new(self.config.playwright.clone())?;
                let (steps, failure) = playwright.run_spec(&spec, &base).await?;
                Ok(TestResult::finish(&spec.name, start, steps, failure))
            }
        }
    }

    /// Run a spec in the given browser context.
    ///
    /// Steps run strictly in order; the first failing step ends the test.
    pub async fn run_spec_in<B>(&self, browser: &mut B, spec: &TestSpec) -> TestResult
    where
        B: BrowserContext + ?Sized,
    {
        let start = Instant::now();
        let spec = self.effective_spec(spec);
        let base = match self.spec_base_url(&spec) {
            Ok(base) => base,
            Err(e) => return TestResult::finish(&spec.name, start, Vec::new(), Some(e)),
        };
        let mut steps = Vec::new();
        let mut failure = None;

        for step in &spec.steps {
            let step_start = Instant::now();
            let outcome = self.execute_step(browser, &spec, &base, step).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => steps.push(StepResult {
                    success: true,
                    step_name: step.name(),
                    duration_ms,
                    error: None,
                }),
                Err(e) => {
                    steps.push(StepResult {
                        success: false,
                        step_name: step.name(),
                        duration_ms,
                        error: Some(e.to_string()),
                    });
                    failure = Some(e);
                    break; // Stop on first failure
                }
            }
        }

        TestResult::finish(&spec.name, start, steps, failure)
    }

    async fn execute_step<B>(
        &self,
        browser: &mut B,
        spec: &TestSpec,
        base: &Url,
        step: &TestStep,
    ) -> E2eResult<()>
    where
        B: BrowserContext + ?Sized,
    {
        match step {
            TestStep::Navigate { url } => {
                let url = resolve_url(base, url)?;
                browser
                    .goto(url.as_str(), Duration::from_millis(spec.navigation_timeout_ms))
                    .await
            }
            TestStep::ExpectText { text, timeout_ms } => {
                let wait = WaitConfig {
                    timeout: Duration::from_millis(timeout_ms.unwrap_or(spec.assertion_timeout_ms)),
                    poll_interval: self.config.poll_interval,
                };
                self.expect_visible(browser, text, wait).await
            }
            TestStep::ExpectNoText { text } => {
                let visible = browser.visible_text().await?;
                if text_matches(&visible, text) {
                    return Err(E2eError::UnexpectedText {
                        path: current_path(browser),
                        text: text.clone(),
                    });
                }
                Ok(())
            }
            TestStep::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(())
            }
            TestStep::Log { message } => {
                info!("[TEST LOG] {}", message);
                Ok(())
            }
        }
    }

    /// Poll the page until `expected` is visible or the wait runs out
    async fn expect_visible<B>(&self, browser: &mut B, expected: &str, wait: WaitConfig) -> E2eResult<()>
    where
        B: BrowserContext + ?Sized,
    {
        let mut poller = Poller::new(wait);

        while poller.tick().await {
            let visible = browser.visible_text().await?;
            if text_matches(&visible, expected) {
                debug!("'{}' visible after {} probe(s)", expected, poller.attempts());
                return Ok(());
            }
        }

        Err(E2eError::Assertion {
            path: current_path(browser),
            expected: expected.to_string(),
            waited_ms: poller.elapsed().as_millis() as u64,
        })
    }

    /// Spec with runner-level timeout overrides applied
    fn effective_spec(&self, spec: &TestSpec) -> TestSpec {
        let mut spec = spec.clone();
        if let Some(t) = self.config.navigation_timeout {
            spec.navigation_timeout_ms = t.as_millis() as u64;
        }
        if let Some(t) = self.config.assertion_timeout {
            spec.assertion_timeout_ms = t.as_millis() as u64;
        }
        spec
    }

    fn spec_base_url(&self, spec: &TestSpec) -> E2eResult<Url> {
        parse_base_url(spec.base_url.as_deref().unwrap_or(&self.base_url))
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        let _ = self.stop_server();
    }
}

fn current_path<B: BrowserContext + ?Sized>(browser: &B) -> String {
    browser
        .current_url()
        .map(url_path)
        .unwrap_or_else(|| "/".to_string())
}
