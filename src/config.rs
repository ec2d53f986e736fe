//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives at
//! the site root and is sparse: stock defaults are the base layer and any key
//! present in the file overrides them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # base_url = "https://example.com"   # SITE_BASE_URL and --base-url win over this
//!
//! [scan]
//! skip_dirs = [".git", "scripts", "assets", "node_modules", ...]
//!
//! [blog]
//! dir = "blog"                          # Articles live under this directory
//! exclude = ["index.html", "template.html"]
//!
//! [feed]
//! title = "Blog"
//! description = ""
//! language = "en"
//!
//! [output]
//! sitemap = "sitemap.xml"
//! robots = "robots.txt"
//! feed = "blog/rss.xml"
//!
//! [generate]
//! on_missing = "skip"                   # or "fail"
//!
//! [beacon]
//! # token = "..."
//! src = "https://static.cloudflareinsights.com/beacon.min.js"
//! ```
//!
//! ## Base URL Resolution
//!
//! The base URL is the only setting with more than one source. First
//! available wins:
//!
//! ```text
//! --base-url flag  →  SITE_BASE_URL env  →  base_url in config.toml
//! ```
//!
//! The resolved value is trimmed of trailing slashes and handed to the
//! generator and linter explicitly; nothing downstream reads the environment.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable consulted for the site base URL.
pub const BASE_URL_ENV: &str = "SITE_BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("No base URL configured: pass --base-url, set {BASE_URL_ENV}, or add base_url to config.toml")]
    MissingBaseUrl,
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute site URL, e.g. `https://example.com`. Lowest-priority source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// HTML discovery settings.
    pub scan: ScanConfig,
    /// Where articles live and which files under it are not articles.
    pub blog: BlogConfig,
    /// RSS channel metadata.
    pub feed: FeedConfig,
    /// Artifact paths, relative to the site root.
    pub output: OutputConfig,
    /// Generator behavior.
    pub generate: GenerateConfig,
    /// Analytics beacon injection.
    pub beacon: BeaconConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            check_base_url(url)?;
        }
        if self.blog.dir.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation("blog.dir must not be empty".into()));
        }
        if self.feed.language.trim().is_empty() {
            return Err(ConfigError::Validation(
                "feed.language must not be empty".into(),
            ));
        }
        for (key, value) in [
            ("output.sitemap", &self.output.sitemap),
            ("output.robots", &self.output.robots),
            ("output.feed", &self.output.feed),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if value.starts_with('/') || value.split('/').any(|part| part == "..") {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a path inside the site root"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the base URL from flag, environment, then file.
    ///
    /// Returns `Ok(None)` when no source provides one; callers that cannot
    /// run without it use [`SiteConfig::require_base_url`].
    pub fn resolve_base_url(
        &self,
        flag: Option<&str>,
        env: Option<&str>,
    ) -> Result<Option<String>, ConfigError> {
        let raw = [flag, env, self.base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty());
        match raw {
            Some(url) => {
                check_base_url(url)?;
                Ok(Some(url.trim_end_matches('/').to_string()))
            }
            None => Ok(None),
        }
    }

    /// Like [`SiteConfig::resolve_base_url`], but a missing URL is fatal.
    pub fn require_base_url(
        &self,
        flag: Option<&str>,
        env: Option<&str>,
    ) -> Result<String, ConfigError> {
        self.resolve_base_url(flag, env)?
            .ok_or(ConfigError::MissingBaseUrl)
    }
}

fn check_base_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "base URL must start with http:// or https:// (got {url:?})"
        )))
    }
}

/// HTML discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Directory names never descended into. Hidden directories are always skipped.
    pub skip_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_dirs: [
                ".git",
                ".github",
                "__pycache__",
                "scripts",
                "assets",
                "prompts",
                "node_modules",
                "venv",
                ".venv",
                "env",
                "build",
                "dist",
                "target",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Blog layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlogConfig {
    /// Directory (relative to the site root) holding article pages.
    pub dir: String,
    /// File names under `dir` that are not articles.
    pub exclude: Vec<String>,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            dir: "blog".to_string(),
            exclude: vec!["index.html".to_string(), "template.html".to_string()],
        }
    }
}

/// RSS channel metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub title: String,
    pub description: String,
    pub language: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            description: String::new(),
            language: "en".to_string(),
        }
    }
}

/// Artifact paths relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub sitemap: String,
    pub robots: String,
    pub feed: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sitemap: "sitemap.xml".to_string(),
            robots: "robots.txt".to_string(),
            feed: "blog/rss.xml".to_string(),
        }
    }
}

/// What the generator does with a page missing a field its kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    /// Leave the page out of the feed and log a warning.
    #[default]
    Skip,
    /// Abort before writing anything.
    Fail,
}

/// Generator behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    pub on_missing: MissingFieldPolicy,
}

/// Analytics beacon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BeaconConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub src: String,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            token: None,
            src: "https://static.cloudflareinsights.com/beacon.min.js".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` if the file is absent.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when absent.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml`. Used by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# site-meta configuration
# ========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Absolute site URL used to build every link in sitemap.xml, robots.txt and
# the RSS feed. The --base-url flag and the SITE_BASE_URL environment
# variable take precedence over this value.
# base_url = "https://example.com"

# ---------------------------------------------------------------------------
# HTML discovery
# ---------------------------------------------------------------------------
[scan]
# Directory names that are never scanned. Hidden directories (".name") are
# always skipped.
skip_dirs = [".git", ".github", "__pycache__", "scripts", "assets", "prompts",
             "node_modules", "venv", ".venv", "env", "build", "dist", "target"]

# ---------------------------------------------------------------------------
# Blog layout
# ---------------------------------------------------------------------------
[blog]
# Pages under this directory are articles: they need og:type "article" and
# an article:published_time, and they make up the RSS feed.
dir = "blog"
# File names under the blog directory that are not articles.
exclude = ["index.html", "template.html"]

# ---------------------------------------------------------------------------
# RSS channel
# ---------------------------------------------------------------------------
[feed]
title = "Blog"
description = ""
language = "en"

# ---------------------------------------------------------------------------
# Output paths (relative to the site root)
# ---------------------------------------------------------------------------
[output]
sitemap = "sitemap.xml"
robots = "robots.txt"
feed = "blog/rss.xml"

# ---------------------------------------------------------------------------
# Generation
# ---------------------------------------------------------------------------
[generate]
# What to do with an article missing a title, description, canonical link
# or publish date:
#   "skip" - leave it out of the feed and print a warning
#   "fail" - abort without writing any file
on_missing = "skip"

# ---------------------------------------------------------------------------
# Analytics beacon (inject-beacon command)
# ---------------------------------------------------------------------------
[beacon]
# token = "your-beacon-token"
src = "https://static.cloudflareinsights.com/beacon.min.js"
"##
}
