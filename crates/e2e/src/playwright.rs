//! Playwright browser automation
//!
//! A whole spec is compiled into one Node script so the page survives across
//! steps. The script prints one marker line per finished step; the runner
//! maps those back to [`StepResult`]s.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};
use url::Url;

use crate::error::{E2eError, E2eResult};
use crate::spec::{resolve_url, url_path, TestSpec, TestStep};

/// Prefix of the per-step report lines printed by generated scripts
const STEP_MARKER: &str = "PAGEGEN_STEP ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser '{}'", other)),
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// One marker line from a generated script
#[derive(Debug, Deserialize)]
struct StepReport {
    step: usize,
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    duration_ms: u64,
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    /// Directory whose `node_modules` provides `playwright`
    pub project_dir: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            project_dir: PathBuf::from("."),
        }
    }
}

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config)?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed(config: &PlaywrightConfig) -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(&config.project_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a spec
    pub fn build_script(&self, spec: &TestSpec, base: &Url) -> E2eResult<String> {
        let mut script = String::new();

        // Header
        script.push_str(&format!(r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

const report = (step, ok, started, error) =>
  console.log('{marker}' + JSON.stringify({{ step, ok, error, duration_ms: Date.now() - started }}));

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext();
  const page = await context.newPage();
  let step = 0;
  let started = Date.now();

  try {{
"#,
            marker = STEP_MARKER,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
        ));

        // Generate step code
        for (i, step) in spec.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
            script.push_str(&format!("    step = {}; started = Date.now();\n", i));
            script.push_str(&self.step_to_js(step, spec, base)?);
            script.push_str("\n    report(step, true, started, null);\n");
        }

        // Footer
        script.push_str(r#"
  } catch (error) {
    report(step, false, started, error.message);
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#);

        Ok(script)
    }

    /// Convert a step to JavaScript code
    ///
    /// Text steps pass `exact: false` to `getByText`, a case-insensitive
    /// substring match that the HTTP context mirrors.
    fn step_to_js(&self, step: &TestStep, spec: &TestSpec, base: &Url) -> E2eResult<String> {
        let js = match step {
            TestStep::Navigate { url } => {
                let url = resolve_url(base, url)?;
                format!(
                    r#"    {{
      const response = await page.goto({url}, {{ timeout: {timeout} }});
      if (response && !response.ok()) {{
        throw new Error('HTTP ' + response.status());
      }}
    }}"#,
                    url = js_string(url.as_str()),
                    timeout = spec.navigation_timeout_ms,
                )
            }
            TestStep::ExpectText { text, timeout_ms } => {
                format!(
                    r#"    await expect(page.getByText({}, {{ exact: false }}).first()).toBeVisible({{ timeout: {} }});"#,
                    js_string(text),
                    timeout_ms.unwrap_or(spec.assertion_timeout_ms),
                )
            }
            TestStep::ExpectNoText { text } => {
                format!(
                    r#"    if (await page.getByText({}, {{ exact: false }}).filter({{ visible: true }}).count() > 0) {{
      throw new Error('unexpected text visible');
    }}"#,
                    js_string(text),
                )
            }
            TestStep::Sleep { ms } => {
                format!(r#"    await page.waitForTimeout({});"#, ms)
            }
            TestStep::Log { message } => {
                format!(r#"    console.log('[TEST] ' + {});"#, js_string(message))
            }
        };
        Ok(js)
    }

    /// Run a spec in one browser session and collect per-step results.
    ///
    /// Returns the step results and, when a step failed, the error
    /// classifying that failure.
    pub async fn run_spec(
        &self,
        spec: &TestSpec,
        base: &Url,
    ) -> E2eResult<(Vec<StepResult>, Option<E2eError>)> {
        let script = self.build_script(spec, base)?;
        let output = self.run_script(&script).await?;
        Ok(collect_results(spec, base, &output))
    }

    /// Execute the script via node and return its stdout
    pub async fn run_script(&self, script: &str) -> E2eResult<String> {
        // Write script to temp file
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("navigation.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&self.config.project_dir)
            .env("NODE_PATH", self.config.project_dir.join("node_modules"))
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() && !stdout.contains(STEP_MARKER) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        for line in stdout.lines().filter(|l| l.starts_with("[TEST] ")) {
            info!("{}", line);
        }

        Ok(stdout)
    }
}

/// Quote a string as a JavaScript literal
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Map marker lines from script output to step results
fn collect_results(
    spec: &TestSpec,
    base: &Url,
    stdout: &str,
) -> (Vec<StepResult>, Option<E2eError>) {
    let mut results = Vec::new();
    let mut failure = None;
    let mut current_url: Option<String> = None;

    let reports = stdout
        .lines()
        .filter_map(|line| line.strip_prefix(STEP_MARKER))
        .filter_map(|json| serde_json::from_str::<StepReport>(json).ok());

    for report in reports {
        let Some(step) = spec.steps.get(report.step) else {
            continue;
        };
        if let TestStep::Navigate { url } = step {
            current_url = resolve_url(base, url).ok().map(String::from);
        }

        results.push(StepResult {
            success: report.ok,
            step_name: step.name(),
            duration_ms: report.duration_ms,
            error: report.error.clone(),
        });

        if !report.ok {
            let reason = report.error.unwrap_or_else(|| "unknown error".to_string());
            let path = current_url
                .as_deref()
                .map(url_path)
                .unwrap_or_else(|| "/".to_string());
            failure = Some(match step {
                TestStep::Navigate { .. } => E2eError::Navigation {
                    url: current_url.clone().unwrap_or_default(),
                    reason,
                },
                TestStep::ExpectText { text, timeout_ms } => E2eError::Assertion {
                    path,
                    expected: text.clone(),
                    waited_ms: timeout_ms.unwrap_or(spec.assertion_timeout_ms),
                },
                TestStep::ExpectNoText { text } => E2eError::UnexpectedText {
                    path,
                    text: text.clone(),
                },
                _ => E2eError::Playwright(reason),
            });
            break;
        }
    }

    if failure.is_none() && results.len() < spec.steps.len() {
        failure = Some(E2eError::Playwright(format!(
            "script reported {} of {} steps",
            results.len(),
            spec.steps.len()
        )));
    }

    (results, failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    fn handle() -> PlaywrightHandle {
        PlaywrightHandle {
            config: PlaywrightConfig::default(),
        }
    }

    #[test]
    fn test_script_for_dynamic_path_navigation() {
        let spec = TestSpec::dynamic_path_navigation();
        let script = handle()
            .build_script(&spec, &base("http://localhost:3006"))
            .unwrap();

        assert!(script.contains(r#"await page.goto("http://localhost:3006/about", { timeout: 30000 });"#));
        assert!(script.contains(
            r#"await expect(page.getByText("Content for path: products/item1/details", { exact: false }).first()).toBeVisible({ timeout: 5000 });"#
        ));
        assert!(script.contains("await chromium.launch({ headless: true });"));

        // Steps run strictly in order
        let first = script.find("/about").unwrap();
        let second = script.find("/products/item1/details").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_script_escapes_strings() {
        let spec = TestSpec::navigation_checks("quote", &[("/a", "it's \"quoted\"")]);
        let script = handle().build_script(&spec, &base("http://h")).unwrap();
        assert!(script.contains(r#"page.getByText("it's \"quoted\"", { exact: false })"#));
    }

    #[test]
    fn test_text_steps_match_case_insensitively() {
        let yaml = r#"
name: negative
steps:
  - action: navigate
    url: /contact
  - action: expect_no_text
    text: "Content for path: about"
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        let script = handle().build_script(&spec, &base("http://h")).unwrap();
        assert!(script.contains(
            r#"page.getByText("Content for path: about", { exact: false }).filter({ visible: true })"#
        ));
        assert!(!script.contains("exact: true"));
    }

    #[test]
    fn test_collect_results_all_passed() {
        let spec = TestSpec::dynamic_path_navigation();
        let stdout = (0..4)
            .map(|i| format!("{}{{\"step\":{},\"ok\":true,\"error\":null,\"duration_ms\":3}}", STEP_MARKER, i))
            .collect::<Vec<_>>()
            .join("\n");
        let (results, failure) = collect_results(&spec, &base("http://h"), &stdout);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.success));
        assert!(failure.is_none());
    }

    #[test]
    fn test_collect_results_assertion_failure() {
        let spec = TestSpec::dynamic_path_navigation();
        let stdout = format!(
            "{m}{{\"step\":0,\"ok\":true,\"error\":null,\"duration_ms\":3}}\n\
             [TEST] noise\n\
             {m}{{\"step\":1,\"ok\":false,\"error\":\"Timed out 5000ms\",\"duration_ms\":5001}}",
            m = STEP_MARKER
        );
        let (results, failure) = collect_results(&spec, &base("http://h"), &stdout);
        assert_eq!(results.len(), 2);
        match failure {
            Some(E2eError::Assertion { path, expected, .. }) => {
                assert_eq!(path, "/about");
                assert_eq!(expected, "Content for path: about");
            }
            other => panic!("expected assertion failure, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_results_navigation_failure() {
        let spec = TestSpec::dynamic_path_navigation();
        let stdout = format!(
            "{}{{\"step\":0,\"ok\":false,\"error\":\"HTTP 502\",\"duration_ms\":9}}",
            STEP_MARKER
        );
        let (_, failure) = collect_results(&spec, &base("http://h"), &stdout);
        assert!(matches!(
            failure,
            Some(E2eError::Navigation { ref url, ref reason }) if url == "http://h/about" && reason == "HTTP 502"
        ));
    }

    #[test]
    fn test_collect_results_truncated_output() {
        let spec = TestSpec::dynamic_path_navigation();
        let (_, failure) = collect_results(&spec, &base("http://h"), "");
        assert!(matches!(failure, Some(E2eError::Playwright(_))));
    }
}
