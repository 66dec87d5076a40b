//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Project;

/// Google Workspace credentials and targets
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    /// Spreadsheet that receives automatic inventory backups
    pub backup_spreadsheet_id: Option<String>,
}

/// Documentation-search service settings
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub cache_ttl_hours: Option<u32>,
}

/// MuRP configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name recorded on activity entries and resolutions
    pub author: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Currency label used when printing money
    pub currency: Option<String>,

    pub google: GoogleConfig,

    pub docs: DocsConfig,
}

pub const DEFAULT_DOCS_URL: &str = "https://context7.com/api/v1";
pub const DEFAULT_DOCS_TTL_HOURS: u32 = 24;

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // Global user config (~/.config/murp/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // Project config (.murp/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        config.apply_env();
        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        let has_content = contents
            .lines()
            .any(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'));
        if !has_content {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(author) = std::env::var("MURP_AUTHOR") {
            self.author = Some(author);
        }
        if let Ok(token) = std::env::var("MURP_GOOGLE_TOKEN") {
            self.google.access_token = Some(token);
        }
        if let Ok(key) = std::env::var("MURP_DOCS_API_KEY") {
            self.docs.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("MURP_DOCS_URL") {
            self.docs.base_url = Some(url);
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "murp")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.currency.is_some() {
            self.currency = other.currency;
        }

        let g = other.google;
        if g.access_token.is_some() {
            self.google.access_token = g.access_token;
        }
        if g.refresh_token.is_some() {
            self.google.refresh_token = g.refresh_token;
        }
        if g.client_id.is_some() {
            self.google.client_id = g.client_id;
        }
        if g.client_secret.is_some() {
            self.google.client_secret = g.client_secret;
        }
        if g.backup_spreadsheet_id.is_some() {
            self.google.backup_spreadsheet_id = g.backup_spreadsheet_id;
        }

        let d = other.docs;
        if d.base_url.is_some() {
            self.docs.base_url = d.base_url;
        }
        if d.api_key.is_some() {
            self.docs.api_key = d.api_key;
        }
        if d.cache_ttl_hours.is_some() {
            self.docs.cache_ttl_hours = d.cache_ttl_hours;
        }
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("USD")
    }

    pub fn docs_base_url(&self) -> &str {
        self.docs.base_url.as_deref().unwrap_or(DEFAULT_DOCS_URL)
    }

    pub fn docs_cache_ttl_hours(&self) -> u32 {
        self.docs.cache_ttl_hours.unwrap_or(DEFAULT_DOCS_TTL_HOURS)
    }
}
