//! Page content generation
//!
//! A [`ContentGenerator`] turns a normalized page path into the HTML snippet
//! shown in the page's main region. The rule-based generator is
//! deterministic and needs no network; the LLM generator talks to an
//! OpenAI-compatible, Ollama or vLLM endpoint.

use askama::Template;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use pagegen_common::{display_name, page_query, SiteConfig};

use crate::prompt::{system_prompt, user_request};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{backend} returned status {status}")]
    Status { backend: &'static str, status: u16 },

    #[error("{0} response did not contain any content")]
    MalformedResponse(&'static str),

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("template error: {0}")]
    Render(#[from] askama::Error),
}

/// Source of per-path page content
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Generate the main-region snippet for a normalized page path.
    ///
    /// An empty string means the backend produced nothing usable.
    async fn generate(&self, path: &str) -> Result<String, GenerateError>;
}

/// Deterministic generator: every path gets a heading naming the path
#[derive(Debug, Clone, Default)]
pub struct RuleBasedGenerator;

#[derive(Template)]
#[template(
    source = "<h1>Content for path: {{ query }}</h1>\n<p>This page belongs to the {{ section }} section.</p>",
    ext = "html"
)]
struct RuleBasedSnippet<'a> {
    query: &'a str,
    section: &'a str,
}

#[async_trait]
impl ContentGenerator for RuleBasedGenerator {
    fn name(&self) -> &'static str {
        "rule"
    }

    async fn generate(&self, path: &str) -> Result<String, GenerateError> {
        let query = page_query(path);
        let section = display_name(path);
        let snippet = RuleBasedSnippet {
            query: &query,
            section: &section,
        }
        .render()?;
        Ok(snippet)
    }
}

/// Remote model endpoints
#[derive(Debug, Clone)]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API
    OpenAI { base_url: String, api_key: String },
    /// Ollama local LLM
    Ollama { base_url: String },
    /// vLLM server
    VLLM { base_url: String },
}

impl LlmBackend {
    fn label(&self) -> &'static str {
        match self {
            LlmBackend::OpenAI { .. } => "OpenAI",
            LlmBackend::Ollama { .. } => "Ollama",
            LlmBackend::VLLM { .. } => "vLLM",
        }
    }
}

/// Generator backed by a language model and the site configuration
pub struct LlmGenerator {
    backend: LlmBackend,
    config: SiteConfig,
    client: reqwest::Client,
}

impl LlmGenerator {
    pub fn new(backend: LlmBackend, config: SiteConfig) -> Self {
        Self {
            backend,
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerateError> {
        let model = &self.config.llm_model;
        let label = self.backend.label();
        let (request, pointer) = match &self.backend {
            LlmBackend::OpenAI { base_url, api_key } => {
                if api_key.is_empty() {
                    return Err(GenerateError::MissingApiKey);
                }
                let body = serde_json::json!({
                    "model": model,
                    "messages": [
                        {"role": "system", "content": system},
                        {"role": "user", "content": user},
                    ],
                });
                let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
                (self.client.post(url).bearer_auth(api_key).json(&body), "/choices/0/message/content")
            }
            LlmBackend::VLLM { base_url } => {
                let body = serde_json::json!({
                    "model": model,
                    "messages": [
                        {"role": "system", "content": system},
                        {"role": "user", "content": user},
                    ],
                    "max_tokens": 2048,
                });
                let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
                (self.client.post(url).json(&body), "/choices/0/message/content")
            }
            LlmBackend::Ollama { base_url } => {
                let body = serde_json::json!({
                    "model": model,
                    "prompt": format!("{}\n\nUser: {}", system, user),
                    "stream": false,
                });
                let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
                (self.client.post(url).json(&body), "/response")
            }
        };

        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(GenerateError::Status {
                backend: label,
                status: resp.status().as_u16(),
            });
        }
        let json = resp.json::<serde_json::Value>().await?;
        json.pointer(pointer)
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or(GenerateError::MalformedResponse(label))
    }
}

#[async_trait]
impl ContentGenerator for LlmGenerator {
    fn name(&self) -> &'static str {
        self.backend.label()
    }

    async fn generate(&self, path: &str) -> Result<String, GenerateError> {
        let query = page_query(path);
        let system = system_prompt(&self.config, &query);
        let user = user_request(&query);

        info!("Requesting content for '{}' from {}", query, self.backend.label());
        let raw = self.complete(&system, &user).await?;
        let content = extract_main_content(&raw, &query);
        if content.is_empty() {
            info!("Content for '{}' is empty after generation/cleanup", query);
        }
        Ok(content)
    }
}

static MAIN_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<main[^>]*>(.*?)</main>").expect("main regex"));
static BODY_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").expect("body regex"));

/// Reduce model output to the inner content of the page.
///
/// Prefers the inside of `<main>`, then `<body>`. A full document with
/// neither yields an empty string. Anything else is returned trimmed.
pub fn extract_main_content(raw: &str, query: &str) -> String {
    let trimmed = raw.trim();

    let content = if let Some(caps) = MAIN_BLOCK.captures(trimmed) {
        caps[1].trim().to_string()
    } else if let Some(caps) = BODY_BLOCK.captures(trimmed) {
        warn!(
            "Model returned content with <body> but no <main> for '{}'. Extracted from <body>.",
            query
        );
        caps[1].trim().to_string()
    } else {
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("<!doctype html>") || lower.starts_with("<html>") {
            warn!(
                "Model returned a full HTML document for '{}' without <main> or <body>. Discarding.",
                query
            );
            String::new()
        } else {
            trimmed.to_string()
        }
    };

    if content.trim().is_empty() {
        debug!("No usable content for '{}'", query);
        return String::new();
    }
    content
}
