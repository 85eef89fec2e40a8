//! Declarative YAML test specification

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::error::{E2eError, E2eResult};

/// A complete test specification parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Server to test; the runner's base URL is used when absent
    #[serde(default)]
    pub base_url: Option<String>,

    /// Time allowed for each page load
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Time allowed for expected text to become visible
    #[serde(default = "default_assertion_timeout")]
    pub assertion_timeout_ms: u64,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_navigation_timeout() -> u64 {
    30_000
}

fn default_assertion_timeout() -> u64 {
    5_000
}

/// A single step in a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (absolute, or relative to the base URL)
    Navigate { url: String },

    /// Wait until the text is visible on the current page
    ExpectText {
        text: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Check once that the text is not visible on the current page
    ExpectNoText { text: String },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Log a message (for debugging)
    Log { message: String },
}

impl TestStep {
    /// Short label used in results and logs
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url } => format!("navigate:{}", url),
            TestStep::ExpectText { text, .. } => format!("expect_text:{}", text),
            TestStep::ExpectNoText { text } => format!("expect_no_text:{}", text),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all test specs from a directory, sorted by file path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut files: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();

        files.iter().map(|path| Self::from_file(path)).collect()
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Build a spec that visits each path and expects its text, in order
    pub fn navigation_checks(name: &str, checks: &[(&str, &str)]) -> Self {
        let steps = checks
            .iter()
            .flat_map(|(path, text)| {
                [
                    TestStep::Navigate { url: path.to_string() },
                    TestStep::ExpectText { text: text.to_string(), timeout_ms: None },
                ]
            })
            .collect();
        Self {
            name: name.to_string(),
            description: String::new(),
            tags: Vec::new(),
            base_url: None,
            navigation_timeout_ms: default_navigation_timeout(),
            assertion_timeout_ms: default_assertion_timeout(),
            steps,
        }
    }

    /// Single- and multi-level dynamic path navigation
    pub fn dynamic_path_navigation() -> Self {
        let mut spec = Self::navigation_checks(
            "dynamic-path-navigation",
            &[
                ("/about", "Content for path: about"),
                ("/products/item1/details", "Content for path: products/item1/details"),
            ],
        );
        spec.description =
            "Navigate to single and multi-level paths and verify content display".to_string();
        spec.tags = vec!["smoke".to_string(), "navigation".to_string()];
        spec
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("spec name must not be empty".to_string()));
        }
        let first_check = self.steps.iter().position(|s| {
            matches!(s, TestStep::ExpectText { .. } | TestStep::ExpectNoText { .. })
        });
        let first_nav = self
            .steps
            .iter()
            .position(|s| matches!(s, TestStep::Navigate { .. }));
        match (first_check, first_nav) {
            (Some(check), Some(nav)) if nav < check => Ok(()),
            (Some(_), _) => Err(E2eError::SpecParse(format!(
                "spec '{}' asserts text before navigating",
                self.name
            ))),
            (None, _) => Ok(()),
        }
    }
}

/// Parse the base URL a spec runs against. Only `http` and `https` URLs
/// can be navigated.
pub fn parse_base_url(base_url: &str) -> E2eResult<Url> {
    let invalid = |reason: String| E2eError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };
    let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

/// Resolve a step URL against a base URL. Absolute URLs pass through.
pub fn resolve_url(base: &Url, url: &str) -> E2eResult<Url> {
    base.join(url).map_err(|e| E2eError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Path and query of a URL, for diagnostics
pub fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_simple_spec() {
        let yaml = r#"
name: dynamic-path-navigation
description: Navigate to single and multi-level paths
tags:
  - smoke
steps:
  - action: navigate
    url: /about
  - action: expect_text
    text: "Content for path: about"
  - action: navigate
    url: /products/item1/details
  - action: expect_text
    text: "Content for path: products/item1/details"
    timeout_ms: 10000
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "dynamic-path-navigation");
        assert_eq!(spec.steps.len(), 4);
        assert_eq!(spec.navigation_timeout_ms, 30_000);
        assert_eq!(spec.assertion_timeout_ms, 5_000);
        assert_eq!(
            spec.steps[3],
            TestStep::ExpectText {
                text: "Content for path: products/item1/details".to_string(),
                timeout_ms: Some(10_000),
            }
        );
    }

    #[test]
    fn test_assertion_before_navigation_rejected() {
        let yaml = r#"
name: broken
steps:
  - action: expect_text
    text: hello
  - action: navigate
    url: /
"#;
        assert!(matches!(TestSpec::from_yaml(yaml), Err(E2eError::SpecParse(_))));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let yaml = r##"
name: broken
steps:
  - action: click
    selector: "#go"
"##;
        assert!(matches!(TestSpec::from_yaml(yaml), Err(E2eError::Yaml(_))));
    }

    #[test]
    fn test_dynamic_path_navigation_pairs() {
        let spec = TestSpec::dynamic_path_navigation();
        let names: Vec<_> = spec.steps.iter().map(TestStep::name).collect();
        assert_eq!(
            names,
            vec![
                "navigate:/about",
                "expect_text:Content for path: about",
                "navigate:/products/item1/details",
                "expect_text:Content for path: products/item1/details",
            ]
        );
    }

    #[test]
    fn test_load_all_sorted_and_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("b.yaml"),
            "name: second\ntags: [smoke]\nsteps: []\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("a.yml"), "name: first\nsteps: []\n").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let specs = TestSpec::load_all(tmp.path()).unwrap();
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);

        let smoke = TestSpec::filter_by_tag(&specs, "smoke");
        assert_eq!(smoke.len(), 1);
        assert_eq!(smoke[0].name, "second");
    }

    #[test_case("http://localhost:3006", "/about", "http://localhost:3006/about" ; "leading slash")]
    #[test_case("http://localhost:3006/", "about", "http://localhost:3006/about" ; "trailing slash on base")]
    #[test_case("http://localhost:3006", "/products/item1/details", "http://localhost:3006/products/item1/details" ; "multi level")]
    #[test_case("http://a", "https://b/x", "https://b/x" ; "absolute passes through")]
    fn test_resolve_url(base: &str, url: &str, expected: &str) {
        let base = parse_base_url(base).unwrap();
        assert_eq!(resolve_url(&base, url).unwrap().as_str(), expected);
    }

    #[test_case("localhost:3006" ; "missing scheme")]
    #[test_case("not a url" ; "garbage")]
    #[test_case("ftp://localhost/" ; "unsupported scheme")]
    fn test_parse_base_url_rejects(base: &str) {
        assert!(matches!(parse_base_url(base), Err(E2eError::InvalidUrl { .. })));
    }

    #[test_case("http://localhost:3006/products/item1/details", "/products/item1/details" ; "multi level")]
    #[test_case("http://localhost:3006", "/" ; "bare host")]
    #[test_case("http://localhost:3006/get_page_data?path=about", "/get_page_data?path=about" ; "with query")]
    fn test_url_path(url: &str, expected: &str) {
        assert_eq!(url_path(url), expected);
    }
}
