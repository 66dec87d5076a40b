//! `murp settings` command - Auto-PO and backup preferences

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{print_structured, Session};
use crate::cli::GlobalOpts;
use crate::integrations::google::backup;
use crate::mrp::auto_po::{AutoPoSettings, AutoPoThreshold};

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show all settings
    Show,

    /// Show or change auto-PO drafting
    AutoPo(AutoPoArgs),

    /// Show or toggle the automatic Google Sheets backup
    Backup(BackupArgs),
}

#[derive(clap::Args, Debug)]
pub struct AutoPoArgs {
    #[arg(long)]
    pub enabled: Option<bool>,

    #[arg(long, value_enum)]
    pub threshold: Option<AutoPoThreshold>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(clap::Args, Debug)]
pub struct BackupArgs {
    #[arg(value_enum)]
    pub state: Option<Toggle>,
}

#[derive(Serialize)]
struct SettingsView {
    auto_po: AutoPoSettings,
    auto_backup: bool,
    last_backup: Option<chrono::DateTime<chrono::Utc>>,
    backup_spreadsheet_id: Option<String>,
}

pub fn run(cmd: SettingsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SettingsCommands::Show => run_show(global),
        SettingsCommands::AutoPo(args) => run_auto_po(args, global),
        SettingsCommands::Backup(args) => run_backup(args, global),
    }
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let storage = session.local_storage();
    let view = SettingsView {
        auto_po: AutoPoSettings::load(&session.store).map_err(|e| miette::miette!("{}", e))?,
        auto_backup: backup::auto_backup_enabled(&storage),
        last_backup: backup::last_backup(&storage),
        backup_spreadsheet_id: session.config.google.backup_spreadsheet_id.clone(),
    };
    if print_structured(&view, session.format(global))? {
        return Ok(());
    }

    println!("{}", style("Auto-PO").bold());
    println!("  enabled:   {}", view.auto_po.enabled);
    println!("  threshold: {}", view.auto_po.threshold);
    println!("{}", style("Google Sheets backup").bold());
    println!("  automatic: {}", if view.auto_backup { "on" } else { "off" });
    println!(
        "  sheet:     {}",
        view.backup_spreadsheet_id.as_deref().unwrap_or("(not configured)")
    );
    println!(
        "  last run:  {}",
        view.last_backup
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
    );
    Ok(())
}

fn run_auto_po(args: AutoPoArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut settings = AutoPoSettings::load(&session.store).map_err(|e| miette::miette!("{}", e))?;

    if args.enabled.is_none() && args.threshold.is_none() {
        if print_structured(&settings, session.format(global))? {
            return Ok(());
        }
        println!("enabled:   {}", settings.enabled);
        println!("threshold: {}", settings.threshold);
        return Ok(());
    }

    if let Some(enabled) = args.enabled {
        settings.enabled = enabled;
    }
    if let Some(threshold) = args.threshold {
        settings.threshold = threshold;
    }
    settings
        .save(&mut session.store)
        .map_err(|e| miette::miette!("{}", e))?;
    tracing::info!(enabled = settings.enabled, threshold = %settings.threshold, "auto-PO settings saved");

    if !global.quiet {
        println!(
            "{} Auto-PO {} at threshold {}",
            style("✓").green(),
            if settings.enabled { "enabled" } else { "disabled" },
            style(settings.threshold).cyan()
        );
    }
    Ok(())
}

fn run_backup(args: BackupArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut storage = session.local_storage();

    let Some(state) = args.state else {
        let on = backup::auto_backup_enabled(&storage);
        println!("{}", if on { "on" } else { "off" });
        return Ok(());
    };

    let enabled = state == Toggle::On;
    backup::set_auto_backup(&mut storage, enabled).map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Automatic backup {}",
            style("✓").green(),
            if enabled { "on" } else { "off" }
        );
        if enabled && session.config.google.backup_spreadsheet_id.is_none() {
            println!(
                "  {} set google.backup_spreadsheet_id in .murp/config.yaml to choose a sheet",
                style("!").yellow()
            );
        }
    }
    Ok(())
}
