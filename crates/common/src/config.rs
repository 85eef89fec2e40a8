//! Site configuration
//!
//! Describes the business the generated site is for and the prompt template
//! handed to the language model. Loaded from JSON, or TOML when the file has
//! a `.toml` extension.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::{Error, Result};

/// Site-wide generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Model name passed to the LLM backend
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Facts about the business the site represents
    #[serde(default)]
    pub website_profile: WebsiteProfile,

    /// System prompt with `{placeholder}` fields filled from the profile
    #[serde(default = "default_system_prompt_template")]
    pub system_prompt_template: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            llm_model: default_llm_model(),
            website_profile: WebsiteProfile::default(),
            system_prompt_template: default_system_prompt_template(),
        }
    }
}

/// Business profile used to fill the system prompt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebsiteProfile {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub site_tone: Option<String>,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_system_prompt_template() -> String {
    "You write the main HTML content for pages of the website of {company_name}, \
     a {business_type} based in {location}. Specialties: {specialties_list}. \
     Values: {values_list}. Audience: {target_audience}. Tone: {site_tone}. \
     The current page is '{current_page_path_for_llm}'. Output only the inner \
     content of the page using p, h1, h2, h3, ul, ol and li tags. No images, \
     no external links, no html, head, body or main wrappers."
        .to_string()
}

impl SiteConfig {
    /// Parse a configuration file, failing on any error
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") | None => Ok(serde_json::from_str(&content)?),
            Some(other) => Err(Error::InvalidConfig(format!(
                "unsupported site config extension '.{}' ({})",
                other,
                path.display()
            ))),
        }
    }

    /// Load the configuration, falling back to defaults when the file is
    /// missing or unreadable
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!("{} not found. Using default configuration.", path.display());
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Error loading {}: {}. Using default configuration.", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::load(&tmp.path().join("config.json"));
        assert_eq!(config.llm_model, "gpt-4o-mini");
        assert!(config.system_prompt_template.contains("{current_page_path_for_llm}"));
    }

    #[test]
    fn test_load_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "llm_model": "gpt-4o",
                "website_profile": {
                    "company_name": "Harbor Bakery",
                    "specialties": ["sourdough", "croissants"]
                },
                "system_prompt_template": "Write for {company_name} about {current_page_path_for_llm}."
            }"#,
        )
        .unwrap();

        let config = SiteConfig::from_file(&path).unwrap();
        assert_eq!(config.llm_model, "gpt-4o");
        assert_eq!(config.website_profile.company_name.as_deref(), Some("Harbor Bakery"));
        assert_eq!(config.website_profile.specialties.len(), 2);
        assert!(config.website_profile.location.is_none());
    }

    #[test]
    fn test_load_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        std::fs::write(
            &path,
            r#"
llm_model = "llama3.2"

[website_profile]
company_name = "Harbor Bakery"
values = ["fresh", "local"]
"#,
        )
        .unwrap();

        let config = SiteConfig::from_file(&path).unwrap();
        assert_eq!(config.llm_model, "llama3.2");
        assert_eq!(config.website_profile.values, vec!["fresh", "local"]);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(SiteConfig::from_file(&path).is_err());
        let config = SiteConfig::load(&path);
        assert_eq!(config.llm_model, "gpt-4o-mini");
    }

    #[test]
    fn test_unsupported_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(matches!(
            SiteConfig::from_file(&path),
            Err(Error::InvalidConfig(_))
        ));
    }
}
