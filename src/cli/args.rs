//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    activity::ActivityCommands, artwork::ArtworkCommands, bom::BomCommands,
    completions::CompletionsArgs, compliance::ComplianceCommands, docs::DocsCommands,
    google::GoogleCommands, heatmap::HeatmapArgs, init::InitArgs, inv::InvCommands,
    label::LabelArgs, matching::MatchCommands, po::PoCommands, reg::RegCommands,
    settings::SettingsCommands, vendor::VendorCommands,
};

#[derive(Parser)]
#[command(name = "murp")]
#[command(author, version, about = "MuRP - materials resource planning")]
#[command(long_about = "Inventory, vendors, bills of materials, purchase orders and compliance tracking for small manufacturers.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .murp/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new MuRP project
    Init(InitArgs),

    /// Inventory items and stock levels
    #[command(subcommand)]
    Inv(InvCommands),

    /// Vendor management and CSV import
    #[command(subcommand)]
    Vendor(VendorCommands),

    /// Bills of materials
    #[command(subcommand)]
    Bom(BomCommands),

    /// Purchase orders, including automatic drafts
    #[command(subcommand)]
    Po(PoCommands),

    /// Three-way match records (order / invoice / receipt)
    #[command(subcommand)]
    Match(MatchCommands),

    /// Compare label ingredients with a BOM
    Label(LabelArgs),

    /// Label artwork upload and status
    #[command(subcommand)]
    Artwork(ArtworkCommands),

    /// Seasonal demand heatmap for an item
    Heatmap(HeatmapArgs),

    /// State product registrations
    #[command(subcommand)]
    Reg(RegCommands),

    /// Ingredient compliance by state
    #[command(subcommand)]
    Compliance(ComplianceCommands),

    /// Agent activity stream
    #[command(subcommand)]
    Activity(ActivityCommands),

    /// Application settings (auto-PO, backups)
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Google Sheets, Gmail and Docs
    #[command(subcommand)]
    Google(GoogleCommands),

    /// Library documentation lookup
    #[command(subcommand)]
    Docs(DocsCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
