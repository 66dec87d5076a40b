//! Shared helper functions for CLI commands
//!
//! Opening the project, printing single records and a few text utilities
//! used by several command modules.

use chrono::NaiveDate;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, LocalStorage, Project, SqliteStore};

/// Everything a command needs from the current project
pub struct Session {
    pub project: Project,
    pub config: Config,
    pub store: SqliteStore,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project =
            Project::locate(global.project.as_deref()).map_err(|e| miette::miette!("{}", e))?;
        let config = Config::load(Some(&project));
        let store = SqliteStore::open(&project).map_err(|e| miette::miette!("{}", e))?;
        Ok(Self {
            project,
            config,
            store,
        })
    }

    pub fn local_storage(&self) -> LocalStorage {
        LocalStorage::load(&self.project.local_storage_path())
    }

    /// The requested format, with `auto` resolved through the configured default
    pub fn format(&self, global: &GlobalOpts) -> OutputFormat {
        if global.format != OutputFormat::Auto {
            return global.format;
        }
        match self.config.default_format.as_deref() {
            Some("yaml") => OutputFormat::Yaml,
            Some("json") => OutputFormat::Json,
            Some("tsv") => OutputFormat::Tsv,
            Some("csv") => OutputFormat::Csv,
            Some("md") => OutputFormat::Md,
            Some("id") => OutputFormat::Id,
            _ => OutputFormat::Auto,
        }
    }
}

/// Print a record as YAML or JSON. Returns false for formats the caller
/// renders itself.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Parse a `YYYY-MM-DD` argument
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| miette::miette!("invalid date '{}': expected YYYY-MM-DD", s))
}

/// Ask before a destructive action unless `--yes` was given
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Format a string ID for display, truncating if too long
pub fn format_short_id_str(id: &str) -> String {
    if id.len() > 16 {
        format!("{}...", &id[..13])
    } else {
        id.to_string()
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn money(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}

/// Format a quantity without trailing zeros
pub fn qty(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.3}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_id_str() {
        assert_eq!(format_short_id_str("SHORT"), "SHORT");
        assert_eq!(
            format_short_id_str("INV-01J123456789ABCDEF123456"),
            "INV-01J123456..."
        );
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_qty() {
        assert_eq!(qty(40.0), "40");
        assert_eq!(qty(2.5), "2.5");
        assert_eq!(qty(0.125), "0.125");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-10-16").unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
        );
        assert!(parse_date("16/10/2026").is_err());
    }
}
