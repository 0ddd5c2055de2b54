//! Site configuration module.
//!
//! Handles loading and validating `config.toml` from the content root. All
//! options are optional — a missing file yields the stock defaults, and a
//! sparse file overrides only the values it names. Unknown keys are rejected
//! to catch typos early.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_name = "Blog"            # Used in page <title> and chrome
//! base_url = "/blog"            # Prefix for permalinks and group links
//! input = "index.md"            # Per-post source filename
//! output = "index.html"         # Generated filename per listing/rollup
//!
//! # Formats tried, in order, when normalizing a header `date:` value
//! date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site name, used as the fallback page title.
    pub site_name: String,
    /// URL prefix for permalinks and author/tag/date links. Must start
    /// with `/` and must not end with one.
    pub base_url: String,
    /// Base name of per-post source documents.
    pub input: String,
    /// Base name of generated listing and rollup files.
    pub output: String,
    /// Formats tried, in order, when normalizing a header `date:` value.
    /// Path-segment and file-mtime fallbacks apply when none match.
    pub date_formats: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Blog".to_string(),
            base_url: "/blog".to_string(),
            input: "index.md".to_string(),
            output: "index.html".to_string(),
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%d %B %Y".to_string(),
            ],
        }
    }
}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.is_empty() || self.input.contains('/') {
            return Err(ConfigError::Validation(format!(
                "input must be a bare filename, got '{}'",
                self.input
            )));
        }
        if self.output.is_empty() || self.output.contains('/') {
            return Err(ConfigError::Validation(format!(
                "output must be a bare filename, got '{}'",
                self.output
            )));
        }
        if !self.base_url.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "base_url must start with '/', got '{}'",
                self.base_url
            )));
        }
        if self.base_url.len() > 1 && self.base_url.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "base_url must not end with '/', got '{}'",
                self.base_url
            )));
        }
        if self.date_formats.is_empty() {
            return Err(ConfigError::Validation(
                "date_formats must list at least one format".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load `config.toml` from the content root, falling back to stock defaults
/// when the file doesn't exist.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let path = root.join("config.toml");

    let config = if path.exists() {
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)?
    } else {
        SiteConfig::default()
    };

    config.validate()?;
    Ok(config)
}

/// Stock `config.toml` with every option documented, for `gen-config`.
pub fn stock_config_toml() -> String {
    let defaults = SiteConfig::default();
    format!(
        r#"# blogroll site configuration
# All options are optional - defaults shown below.

# Site name, used as the fallback page title.
site_name = "{site_name}"

# URL prefix for permalinks and author/tag/date links.
# Must start with "/" and must not end with one.
base_url = "{base_url}"

# Base name of per-post source documents.
input = "{input}"

# Base name of generated listing and rollup files.
output = "{output}"

# Formats tried, in order, when normalizing a header `date:` value.
# Posts without a parseable date fall back to their /YYYY/MM/DD/ path
# segments, then to the source file's modification time.
date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y"]
"#,
        site_name = defaults.site_name,
        base_url = defaults.base_url,
        input = defaults.input,
        output = defaults.output,
    )
}
