//! Error types for E2E testing

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Expected text '{expected}' to be visible at {path} (waited {waited_ms} ms)")]
    Assertion {
        path: String,
        expected: String,
        waited_ms: u64,
    },

    #[error("Text '{text}' must not be visible at {path}")]
    UnexpectedText { path: String, text: String },

    #[error("No page loaded; navigate before asserting")]
    NoPageLoaded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// How a failed test is classified in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The page did not load
    Navigation,
    /// Expected text never became visible
    Assertion,
    /// Text that must be absent was visible
    UnexpectedText,
    /// The harness itself failed
    Harness,
}

impl E2eError {
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::Navigation { .. } => FailureKind::Navigation,
            E2eError::Assertion { .. } => FailureKind::Assertion,
            E2eError::UnexpectedText { .. } => FailureKind::UnexpectedText,
            _ => FailureKind::Harness,
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
