//! `murp match` command - Three-way match review

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::commands::po::find_po;
use crate::cli::helpers::{money, print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::store::{RecordStore, RecordStoreExt};
use crate::entities::three_way_match::{Resolution, ThreeWayMatch};
use crate::mrp::three_way::{import_matches, MatchView, ResolveAction};

#[derive(Subcommand, Debug)]
pub enum MatchCommands {
    /// List match records
    List(ListArgs),

    /// Load precomputed match records from a JSON file
    Import(ImportArgs),

    /// Show order, invoice and receipt totals with discrepancies
    Show(MatchRef),

    /// Record a resolution for a match
    Resolve(ResolveArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only records without a resolution
    #[arg(long)]
    pub pending: bool,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// JSON array of match records (or a single object)
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct MatchRef {
    /// PO ID or order number
    pub po: String,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    pub po: String,

    #[arg(value_enum)]
    pub action: ResolveAction,

    #[arg(long)]
    pub notes: Option<String>,
}

pub fn run(cmd: MatchCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MatchCommands::List(args) => run_list(args, global),
        MatchCommands::Import(args) => run_import(args, global),
        MatchCommands::Show(args) => run_show(args, global),
        MatchCommands::Resolve(args) => run_resolve(args, global),
    }
}

/// Load the view for a PO, accepting the raw match key or anything that
/// resolves to a purchase order
fn load_view<S: RecordStore + ?Sized>(store: &S, query: &str) -> MatchView {
    let direct = MatchView::load(store, query.trim());
    if direct.record().is_some() {
        return direct;
    }
    match find_po(store, query) {
        Ok(po) => MatchView::load(store, &po.id.to_string()),
        Err(_) => direct,
    }
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("po", "PO", 28),
    ColumnDef::new("order", "ORDER", 12),
    ColumnDef::new("invoice", "INVOICE", 12),
    ColumnDef::new("receipt", "RECEIPT", 12),
    ColumnDef::new("issues", "ISSUES", 7),
    ColumnDef::new("status", "STATUS", 12),
    ColumnDef::new("resolution", "RESOLUTION", 12),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut records: Vec<ThreeWayMatch> =
        session.store.list().map_err(|e| miette::miette!("{}", e))?;
    if args.pending {
        records.retain(|r| !r.is_resolved());
    }
    records.sort_by(|a, b| a.po_id.cmp(&b.po_id));

    let format = session.format(global);
    if print_structured(&records, format)? {
        return Ok(());
    }
    if records.is_empty() {
        if !global.quiet {
            println!("No match records found.");
        }
        return Ok(());
    }

    let rows = records
        .iter()
        .map(|r| {
            TableRow::new(r.po_id.clone())
                .cell("po", CellValue::Text(r.po_id.clone()))
                .cell("order", CellValue::Money(r.order_total))
                .cell("invoice", CellValue::opt_money(r.invoice_total))
                .cell("receipt", CellValue::opt_money(r.receipt_total))
                .cell("issues", CellValue::Int(r.discrepancies.len() as i64))
                .cell("status", CellValue::Status(r.match_status.to_string()))
                .cell("resolution", CellValue::Status(r.resolution.to_string()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "match record").output(rows, format)
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let json = fs::read_to_string(&args.file).into_diagnostic()?;
    let result = import_matches(&mut session.store, &json).map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Imported {} match record(s) from {}",
            style("✓").green(),
            style(result.imported).cyan(),
            args.file.display()
        );
        if result.kept_resolved > 0 {
            println!(
                "  {} kept the existing resolution on {} record(s)",
                style("!").yellow(),
                result.kept_resolved
            );
        }
    }
    Ok(())
}

fn print_record(record: &ThreeWayMatch, currency: &str) {
    let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |t| money(t, currency));

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("PO").bold(), style(&record.po_id).cyan());
    println!("{}: {}", style("Match").bold(), record.match_status);
    println!("{}", style("─".repeat(60)).dim());
    println!("{:<16} {:<16} {:<16}", "ORDER", "INVOICE", "RECEIPT");
    println!(
        "{:<16} {:<16} {:<16}",
        money(record.order_total, currency),
        cell(record.invoice_total),
        cell(record.receipt_total)
    );

    if let Some(v) = record.invoice_variance().filter(|v| v.abs() > f64::EPSILON) {
        println!("{}: {:+.2}", style("Invoice variance").bold(), v);
    }
    if let Some(v) = record.receipt_variance().filter(|v| v.abs() > f64::EPSILON) {
        println!("{}: {:+.2}", style("Receipt variance").bold(), v);
    }

    if !record.discrepancies.is_empty() {
        println!();
        println!("{} ({}):", style("Discrepancies").bold(), record.discrepancies.len());
        for d in &record.discrepancies {
            let sku = d.sku.as_deref().map(|s| format!(" {}", s)).unwrap_or_default();
            println!("  {} [{}]{} {}", style("•").red(), d.kind, style(sku).cyan(), d.message);
        }
    }

    println!();
    if record.resolution == Resolution::Pending {
        println!(
            "{}: pending ({})",
            style("Resolution").bold(),
            style("approve | reject | backorder | dispute").dim()
        );
    } else {
        println!("{}: {}", style("Resolution").bold(), style(record.resolution).yellow());
        if let (Some(by), Some(at)) = (&record.resolved_by, record.resolved_at) {
            println!("  by {} at {}", by, at.format("%Y-%m-%d %H:%M"));
        }
        if let Some(ref notes) = record.resolution_notes {
            println!("  {}", notes);
        }
    }
}

fn run_show(args: MatchRef, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let view = load_view(&session.store, &args.po);

    let record = match &view {
        MatchView::Loaded(record) => record,
        MatchView::Error(message) => return Err(miette::miette!("{}", message)),
        MatchView::Loading => return Err(miette::miette!("match record is still loading")),
    };

    if print_structured(record, session.format(global))? {
        return Ok(());
    }
    print_record(record, session.config.currency());
    Ok(())
}

fn run_resolve(args: ResolveArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut view = load_view(&session.store, &args.po);
    if let MatchView::Error(message) = &view {
        return Err(miette::miette!("{}", message));
    }

    let author = session.config.author();
    let record = view
        .resolve(&mut session.store, args.action, args.notes, &author)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Match for {} marked {}",
            style("✓").green(),
            style(&record.po_id).cyan(),
            style(record.resolution).yellow()
        );
    }
    Ok(())
}
