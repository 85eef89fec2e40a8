//! Prompt construction for LLM-backed generation

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::{debug, warn};

use pagegen_common::{SiteConfig, WebsiteProfile};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("placeholder regex"));

/// Fill `{name}` placeholders from `values`. `{{` and `}}` produce literal
/// braces. Returns the first unknown placeholder name as the error.
pub fn fill_template(template: &str, values: &HashMap<&str, String>) -> Result<String, String> {
    let mut missing: Option<String> = None;
    let filled = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        match caps.get(1) {
            None if &caps[0] == "{{" => "{".to_string(),
            None => "}".to_string(),
            Some(name) => match values.get(name.as_str()) {
                Some(v) => v.clone(),
                None => {
                    missing.get_or_insert_with(|| name.as_str().to_string());
                    String::new()
                }
            },
        }
    });
    match missing {
        Some(name) => Err(name),
        None => Ok(filled.into_owned()),
    }
}

fn profile_values(profile: &WebsiteProfile, query: &str) -> HashMap<&'static str, String> {
    let or = |v: &Option<String>, fallback: &str| v.clone().unwrap_or_else(|| fallback.to_string());
    HashMap::from([
        ("company_name", or(&profile.company_name, "Our Company")),
        ("business_type", or(&profile.business_type, "Our Business")),
        ("location", or(&profile.location, "Our Location")),
        ("specialties_list", profile.specialties.join(", ")),
        ("values_list", profile.values.join(", ")),
        ("target_audience", or(&profile.target_audience, "Our Customers")),
        ("site_tone", or(&profile.site_tone, "default")),
        ("current_page_path_for_llm", query.to_string()),
    ])
}

/// System prompt for the page identified by `query`.
///
/// Falls back to a minimal content-writer prompt when the configured
/// template references a field the profile does not provide.
pub fn system_prompt(config: &SiteConfig, query: &str) -> String {
    let values = profile_values(&config.website_profile, query);
    match fill_template(&config.system_prompt_template, &values) {
        Ok(prompt) => {
            debug!("System prompt for '{}': {}", query, prompt);
            prompt
        }
        Err(key) => {
            warn!(
                "Missing key in website_profile for system prompt formatting: {}. Using basic prompt.",
                key
            );
            format!(
                "You are a content writer. Generate minimal HTML main content for a page about '{}'. \
                 No images or external links. Only p, h1, h2, h3, ul, ol, li tags.",
                query
            )
        }
    }
}

/// User message asking for the page body
pub fn user_request(query: &str) -> String {
    format!(
        "Provide the main HTML content for the '{}' page, adhering to all instructions in the system prompt.",
        query
    )
}
