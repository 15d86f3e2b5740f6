//! Blog configuration (_config.yml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{BlogError, Result};

/// Main blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    // Site
    pub title: String,
    pub description: String,
    pub version: String,

    // Content
    pub content_dir: String,
    pub extensions: Vec<String>,
    pub default_title: String,
    pub default_author: String,
    pub read_timeout_ms: u64,

    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub toc: TocConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            title: "Quality Playbook".to_string(),
            description: "Backend API for Quality Playbook blog".to_string(),
            version: "1.0.0".to_string(),

            content_dir: "content/blog".to_string(),
            extensions: vec!["md".to_string()],
            default_title: "Untitled".to_string(),
            default_author: "Quality Playbook".to_string(),
            read_timeout_ms: 5000,

            pagination: PaginationConfig::default(),
            highlight: HighlightConfig::default(),
            toc: TocConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl BlogConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BlogError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: BlogConfig =
            serde_yaml::from_str(&content).map_err(|e| BlogError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: &str| BlogError::Config {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        if self.extensions.is_empty() {
            return Err(invalid("extensions must not be empty"));
        }
        if self.pagination.max_limit == 0 {
            return Err(invalid("pagination.max_limit must be at least 1"));
        }
        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            return Err(invalid(
                "pagination.default_limit must be between 1 and pagination.max_limit",
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(invalid("read_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Per-file read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Pagination bounds for post listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
    pub css_class: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
            css_class: "highlight".to_string(),
        }
    }
}

/// Table of contents configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Deepest heading level listed in the TOC
    pub max_depth: u8,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self { max_depth: 6 }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
                "https://qualityplaybook.dev".to_string(),
                "https://www.qualityplaybook.dev".to_string(),
            ],
        }
    }
}
