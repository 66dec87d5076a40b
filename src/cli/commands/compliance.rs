//! `murp compliance` command - Ingredient compliance across states

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::commands::bom::find_bom;
use crate::cli::helpers::{parse_date, print_structured, qty, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::store::RecordStoreExt;
use crate::entities::compliance::{ComplianceStatus, SdsStatus, SignalWord, StrictnessLevel};
use crate::entities::{IngredientCompliance, IngredientSds, StateRating};
use crate::mrp::compliance::{
    self, BomComplianceReport, ComplianceUpdate, IngredientIssue, OverallStatus,
};

#[derive(Subcommand, Debug)]
pub enum ComplianceCommands {
    /// Record an ingredient's status in one state
    Set(SetArgs),

    /// Check every ingredient of a BOM against target states
    Check(CheckArgs),

    /// Show one ingredient's status across states
    Ingredient(IngredientArgs),

    /// State strictness rankings
    States(StatesArgs),

    /// Ingredients prohibited (or restricted) in a state
    Flagged(FlaggedArgs),

    /// BOMs that use an ingredient and its known issues
    Impact(ImpactArgs),

    /// Load compliance records or state ratings from JSON
    Import(ImportArgs),

    /// Safety data sheets
    #[command(subcommand)]
    Sds(SdsCommands),
}

#[derive(Subcommand, Debug)]
pub enum SdsCommands {
    /// Record the primary SDS for an ingredient
    Set(SdsSetArgs),

    /// List SDS documents
    Show(SdsShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct SdsSetArgs {
    /// Ingredient SKU
    pub sku: String,

    /// Ingredient name (default: inventory name, else the SKU)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub cas: Option<String>,

    #[arg(long)]
    pub manufacturer: Option<String>,

    /// Link to the document
    #[arg(long)]
    pub url: Option<String>,

    /// uploaded, scraped, api, manual_entry
    #[arg(long, default_value = "manual_entry")]
    pub source: String,

    /// Revision date (YYYY-MM-DD)
    #[arg(long)]
    pub revised: Option<String>,

    /// Expiration date (YYYY-MM-DD)
    #[arg(long)]
    pub expires: Option<String>,

    /// Comma-separated GHS hazard codes
    #[arg(long = "hazard", value_delimiter = ',')]
    pub hazards: Vec<String>,

    /// Comma-separated GHS precautionary codes
    #[arg(long = "precaution", value_delimiter = ',')]
    pub precautions: Vec<String>,

    #[arg(long, value_enum)]
    pub signal: Option<SignalWord>,

    /// Hazard statement (repeatable)
    #[arg(long = "statement")]
    pub statements: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct SdsShowArgs {
    #[arg(long)]
    pub sku: Option<String>,

    #[arg(long)]
    pub cas: Option<String>,

    /// Only documents listing this hazard code
    #[arg(long)]
    pub hazard: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Ingredient SKU
    pub sku: String,

    /// Two-letter state code
    pub state: String,

    #[arg(value_enum)]
    pub status: ComplianceStatus,

    /// Ingredient name (default: inventory name, else the SKU)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub cas: Option<String>,

    /// banned, limited_use, special_permit, concentration_limit
    #[arg(long)]
    pub restriction: Option<String>,

    #[arg(long)]
    pub details: Option<String>,

    #[arg(long)]
    pub max_concentration: Option<f64>,

    #[arg(long)]
    pub unit: Option<String>,

    /// Legal citation
    #[arg(long)]
    pub regulation: Option<String>,

    #[arg(long, value_enum)]
    pub sds: Option<SdsStatus>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// BOM ID, unique prefix, or finished SKU
    pub bom: String,

    /// Comma-separated target states (default: every state on record)
    #[arg(long, value_delimiter = ',')]
    pub states: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct IngredientArgs {
    pub sku: String,

    #[arg(long, value_delimiter = ',')]
    pub states: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct StatesArgs {
    #[arg(long, value_enum)]
    pub level: Option<StrictnessLevel>,

    #[arg(long, value_delimiter = ',')]
    pub states: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct FlaggedArgs {
    pub state: String,

    /// Also list restricted and conditional ingredients
    #[arg(long)]
    pub include_restricted: bool,
}

#[derive(clap::Args, Debug)]
pub struct ImpactArgs {
    pub sku: String,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// JSON array of records
    pub file: PathBuf,

    /// The file holds state ratings rather than ingredient records
    #[arg(long)]
    pub ratings: bool,
}

pub fn run(cmd: ComplianceCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ComplianceCommands::Set(args) => run_set(args, global),
        ComplianceCommands::Check(args) => run_check(args, global),
        ComplianceCommands::Ingredient(args) => run_ingredient(args, global),
        ComplianceCommands::States(args) => run_states(args, global),
        ComplianceCommands::Flagged(args) => run_flagged(args, global),
        ComplianceCommands::Impact(args) => run_impact(args, global),
        ComplianceCommands::Import(args) => run_import(args, global),
        ComplianceCommands::Sds(SdsCommands::Set(args)) => run_sds_set(args, global),
        ComplianceCommands::Sds(SdsCommands::Show(args)) => run_sds_show(args, global),
    }
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    if args.sku.trim().is_empty() || args.state.trim().is_empty() {
        return Err(miette::miette!("SKU and state are required"));
    }
    let name = match args.name {
        Some(n) => n,
        None => session
            .store
            .list::<crate::entities::InventoryItem>()
            .map_err(|e| miette::miette!("{}", e))?
            .into_iter()
            .find(|i| i.sku.eq_ignore_ascii_case(args.sku.trim()))
            .map_or_else(|| args.sku.trim().to_string(), |i| i.name),
    };

    let record = compliance::set_status(
        &mut session.store,
        ComplianceUpdate {
            ingredient_sku: args.sku,
            ingredient_name: name,
            state_code: args.state,
            status: args.status,
            cas_number: args.cas,
            restriction_type: args.restriction,
            restriction_details: args.details,
            max_concentration: args.max_concentration,
            concentration_unit: args.unit,
            regulation_code: args.regulation,
            sds_status: args.sds,
        },
    )
    .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} {} in {} is {} (SDS {})",
            style("✓").green(),
            style(&record.ingredient_sku).cyan(),
            record.state_code,
            style(record.status).yellow(),
            record.sds_status
        );
    }
    Ok(())
}

fn print_issues(title: &str, issues: &[IngredientIssue]) {
    if issues.is_empty() {
        return;
    }
    println!();
    println!("{} ({}):", style(title).bold(), issues.len());
    for issue in issues {
        let mut line = format!("  • {} {}", style(&issue.sku).cyan(), issue.name);
        if let Some(ref state) = issue.state {
            line.push_str(&format!(" [{}]", state));
        }
        if let Some(ref r) = issue.restriction {
            line.push_str(&format!(" {}", r));
        }
        if let Some(max) = issue.max_concentration {
            line.push_str(&format!(" max {}", qty(max)));
        }
        println!("{}", line);
        if let Some(ref details) = issue.details {
            println!("    {}", style(details).dim());
        }
    }
}

fn print_report(report: &BomComplianceReport) {
    let overall = match report.overall_status {
        OverallStatus::NonCompliant => style(report.overall_status.to_string()).red().bold(),
        OverallStatus::NeedsAttention => style(report.overall_status.to_string()).yellow(),
        OverallStatus::PendingReview => style(report.overall_status.to_string()).dim(),
        OverallStatus::Compliant => style(report.overall_status.to_string()).green(),
    };
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {} ({})", style("BOM").bold(), style(&report.bom_name).yellow(), report.finished_sku);
    let states = if report.target_states.is_empty() {
        "all on record".to_string()
    } else {
        report.target_states.join(", ")
    };
    println!("{}: {}", style("States").bold(), states);
    println!("{}: {}", style("Ingredients").bold(), report.total_ingredients);
    println!("{}: {}", style("Overall").bold(), overall);
    println!("{}", style("─".repeat(60)).dim());

    print_issues("Prohibited", &report.issues.prohibited);
    print_issues("Restricted", &report.issues.restricted);
    print_issues("Missing SDS", &report.issues.missing_sds);
    print_issues("No status on record", &report.issues.unknown_status);

    if !report.recommendations.is_empty() {
        println!();
        println!("{}:", style("Recommendations").bold());
        for r in &report.recommendations {
            println!("  → {}", r);
        }
    }
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let bom = find_bom(&session.store, &args.bom)?;
    let report = compliance::check_bom(&session.store, &bom, &args.states)
        .map_err(|e| miette::miette!("{}", e))?;
    if print_structured(&report, session.format(global))? {
        return Ok(());
    }
    print_report(&report);
    Ok(())
}

fn run_ingredient(args: IngredientArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let report = compliance::ingredient_status(&session.store, &args.sku, &args.states)
        .map_err(|e| miette::miette!("{}", e))?;
    if print_structured(&report, session.format(global))? {
        return Ok(());
    }
    if report.total_states_checked == 0 {
        println!("No compliance records for {}.", style(&report.ingredient_sku).cyan());
        return Ok(());
    }

    println!(
        "{} {}{}",
        style(&report.ingredient_sku).cyan(),
        report.ingredient_name.as_deref().unwrap_or(""),
        report
            .cas_number
            .as_deref()
            .map(|c| format!(" (CAS {})", c))
            .unwrap_or_default()
    );
    for (status, records) in &report.by_status {
        if records.is_empty() {
            continue;
        }
        let states: Vec<&str> = records.iter().map(|r| r.state_code.as_str()).collect();
        println!("  {:<12} {}", status, states.join(", "));
    }
    if report.has_issues {
        println!("{} restricted or prohibited somewhere", style("!").yellow());
    }
    Ok(())
}

fn run_states(args: StatesArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let groups = compliance::state_rankings(&session.store, args.level, &args.states)
        .map_err(|e| miette::miette!("{}", e))?;
    let format = session.format(global);
    if print_structured(&groups, format)? {
        return Ok(());
    }
    if groups.iter().all(|(_, g)| g.is_empty()) {
        if !global.quiet {
            println!("No state ratings found. Load them with 'murp compliance import --ratings'.");
        }
        return Ok(());
    }
    for (level, ratings) in groups.iter().filter(|(_, g)| !g.is_empty()) {
        println!("{} ({})", style(level).bold(), ratings.len());
        for r in ratings {
            let reg = if r.registration_required { " registration required" } else { "" };
            println!(
                "  {} {:<20} {:>5.1}{}",
                style(&r.state_code).cyan(),
                r.state_name,
                r.strictness_score,
                style(reg).dim()
            );
        }
    }
    Ok(())
}

const FLAGGED_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("sku", "SKU", 16),
    ColumnDef::new("name", "INGREDIENT", 28),
    ColumnDef::new("status", "STATUS", 12),
    ColumnDef::new("restriction", "RESTRICTION", 20),
    ColumnDef::new("regulation", "REGULATION", 18),
];

fn run_flagged(args: FlaggedArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let flagged = compliance::flagged_ingredients(&session.store, &args.state, args.include_restricted)
        .map_err(|e| miette::miette!("{}", e))?;
    let format = session.format(global);
    if print_structured(&flagged, format)? {
        return Ok(());
    }
    if flagged.is_empty() {
        if !global.quiet {
            println!("No flagged ingredients in {}.", args.state.to_uppercase());
        }
        return Ok(());
    }
    let rows = flagged
        .iter()
        .map(|r| {
            TableRow::new(r.ingredient_sku.clone())
                .cell("sku", CellValue::Text(r.ingredient_sku.clone()))
                .cell("name", CellValue::Text(r.ingredient_name.clone()))
                .cell("status", CellValue::Status(r.status.to_string()))
                .cell("restriction", CellValue::opt_text(r.restriction_type.as_deref()))
                .cell("regulation", CellValue::opt_text(r.regulation_code.as_deref()))
        })
        .collect();
    TableFormatter::new(FLAGGED_COLUMNS, "ingredient").output(rows, format)
}

fn run_impact(args: ImpactArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let impact = compliance::boms_using(&session.store, &args.sku).map_err(|e| miette::miette!("{}", e))?;
    if print_structured(&impact, session.format(global))? {
        return Ok(());
    }

    if impact.boms.is_empty() {
        println!("{} is not used by any BOM.", style(&impact.ingredient_sku).cyan());
    } else {
        println!(
            "{} is used by {} BOM(s):",
            style(&impact.ingredient_sku).cyan(),
            impact.boms.len()
        );
        for usage in &impact.boms {
            println!(
                "  • {} ({}) {} {}",
                style(&usage.bom_name).yellow(),
                usage.finished_sku,
                qty(usage.quantity_used),
                usage.unit
            );
        }
    }
    if !impact.compliance_issues.is_empty() {
        println!();
        println!("{}:", style("Known issues").bold());
        for r in &impact.compliance_issues {
            println!("  {} {} in {}", style("!").yellow(), r.status, r.state_code);
        }
    }
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let json = fs::read_to_string(&args.file).into_diagnostic()?;

    let count = if args.ratings {
        let ratings: Vec<StateRating> = serde_json::from_str(&json)
            .map_err(|e| miette::miette!("invalid ratings file: {}", e))?;
        for r in &ratings {
            session.store.upsert(r).map_err(|e| miette::miette!("{}", e))?;
        }
        ratings.len()
    } else {
        let records: Vec<IngredientCompliance> = serde_json::from_str(&json)
            .map_err(|e| miette::miette!("invalid compliance file: {}", e))?;
        for r in &records {
            session.store.upsert(r).map_err(|e| miette::miette!("{}", e))?;
        }
        records.len()
    };

    if !global.quiet {
        let what = if args.ratings { "state rating(s)" } else { "compliance record(s)" };
        println!("{} Imported {} {}", style("✓").green(), style(count).cyan(), what);
    }
    Ok(())
}

fn run_sds_set(args: SdsSetArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let sku = args.sku.trim().to_string();
    if sku.is_empty() {
        return Err(miette::miette!("SKU is required"));
    }
    let revision_date = args.revised.as_deref().map(parse_date).transpose()?;
    let expiration_date = args.expires.as_deref().map(parse_date).transpose()?;
    if let (Some(r), Some(e)) = (revision_date, expiration_date) {
        if e < r {
            return Err(miette::miette!("expiration {} is before revision {}", e, r));
        }
    }
    let name = match args.name.filter(|n| !n.trim().is_empty()) {
        Some(n) => n.trim().to_string(),
        None => session
            .store
            .list::<crate::entities::InventoryItem>()
            .map_err(|e| miette::miette!("{}", e))?
            .into_iter()
            .find(|i| i.sku.eq_ignore_ascii_case(&sku))
            .map_or_else(|| sku.clone(), |i| i.name),
    };

    let stored = compliance::store_sds(
        &mut session.store,
        IngredientSds {
            ingredient_sku: sku,
            ingredient_name: name,
            cas_number: args.cas,
            manufacturer: args.manufacturer,
            file_url: args.url,
            source: args.source,
            revision_date,
            expiration_date,
            signal_word: args.signal,
            hazard_codes: args.hazards,
            precautionary_codes: args.precautions,
            hazard_statements: args.statements,
            updated: chrono::Utc::now(),
        },
    )
    .map_err(|e| miette::miette!("{}", e))?;

    if print_structured(&stored, session.format(global))? {
        return Ok(());
    }
    if !global.quiet {
        println!(
            "{} SDS {} for {} ({} state record(s) marked on file)",
            style("✓").green(),
            stored.action,
            style(&stored.document.ingredient_sku).cyan(),
            stored.states_marked
        );
        if stored.has_hazards {
            println!("  {} hazards: {}", style("!").yellow(), stored.document.hazard_codes.join(", "));
        }
    }
    Ok(())
}

const SDS_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("sku", "SKU", 16),
    ColumnDef::new("name", "INGREDIENT", 24),
    ColumnDef::new("cas", "CAS", 12),
    ColumnDef::new("signal", "SIGNAL", 8),
    ColumnDef::new("hazards", "HAZARDS", 24),
    ColumnDef::new("expires", "EXPIRES", 11),
];

fn run_sds_show(args: SdsShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let docs = compliance::find_sds(
        &session.store,
        args.sku.as_deref(),
        args.cas.as_deref(),
        args.hazard.as_deref(),
    )
    .map_err(|e| miette::miette!("{}", e))?;
    let format = session.format(global);
    if print_structured(&docs, format)? {
        return Ok(());
    }
    if docs.is_empty() {
        if !global.quiet {
            println!("No SDS documents found.");
        }
        return Ok(());
    }
    let rows = docs
        .iter()
        .map(|d| {
            TableRow::new(d.ingredient_sku.clone())
                .cell("sku", CellValue::Text(d.ingredient_sku.clone()))
                .cell("name", CellValue::Text(d.ingredient_name.clone()))
                .cell("cas", CellValue::opt_text(d.cas_number.as_deref()))
                .cell("signal", CellValue::opt_text(d.signal_word.map(|w| w.to_string()).as_deref()))
                .cell("hazards", CellValue::Text(d.hazard_codes.join(",")))
                .cell(
                    "expires",
                    d.expiration_date.map_or(CellValue::Empty, CellValue::Day),
                )
        })
        .collect();
    TableFormatter::new(SDS_COLUMNS, "document").output(rows, format)
}
