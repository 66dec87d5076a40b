//! `murp vendor` command - Vendor management and CSV import

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::commands::inv::find_vendor;
use crate::cli::helpers::{confirm, print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::RecordStoreExt;
use crate::entities::{InventoryItem, Vendor};
use crate::mrp::csv::{committable, export_vendors_csv, parse_vendor_rows, vendor_template, ImportStats};

#[derive(Subcommand, Debug)]
pub enum VendorCommands {
    /// List vendors
    List(ListArgs),

    /// Create a new vendor
    New(NewArgs),

    /// Show a vendor's details and supplied items
    Show(ShowArgs),

    /// Import vendors from a CSV file
    Import(ImportArgs),

    /// Export vendors to CSV
    Export(ExportArgs),

    /// Print a CSV template with the expected columns
    Template,

    /// Delete a vendor
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in name, email and notes
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    pub name: String,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub website: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub lead_time: Option<u32>,

    #[arg(long)]
    pub payment_terms: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Vendor ID or unique prefix
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file with a header row
    pub file: PathBuf,

    /// Validate only; write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Import the valid rows even when some rows are invalid
    #[arg(long)]
    pub skip_errors: bool,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Vendor ID or unique prefix
    pub id: String,

    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: VendorCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        VendorCommands::List(args) => run_list(args, global),
        VendorCommands::New(args) => run_new(args, global),
        VendorCommands::Show(args) => run_show(args, global),
        VendorCommands::Import(args) => run_import(args, global),
        VendorCommands::Export(args) => run_export(args, global),
        VendorCommands::Template => {
            print!("{}", vendor_template());
            Ok(())
        }
        VendorCommands::Delete(args) => run_delete(args, global),
    }
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("email", "EMAIL", 30),
    ColumnDef::new("lead_time", "LEAD DAYS", 10),
    ColumnDef::new("terms", "TERMS", 14),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut vendors: Vec<Vendor> = session.store.list().map_err(|e| miette::miette!("{}", e))?;

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        vendors.retain(|v| {
            v.name.to_lowercase().contains(&needle)
                || v.contact_email
                    .as_ref()
                    .is_some_and(|e| e.to_lowercase().contains(&needle))
                || v.notes
                    .as_ref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
        });
    }
    vendors.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    if args.count {
        println!("{}", vendors.len());
        return Ok(());
    }
    let format = session.format(global);
    if print_structured(&vendors, format)? {
        return Ok(());
    }
    if vendors.is_empty() {
        if !global.quiet {
            println!("No vendors found.");
        }
        return Ok(());
    }

    let rows = vendors
        .iter()
        .map(|v| {
            TableRow::new(v.id.to_string())
                .cell("id", CellValue::Id(v.id.to_string()))
                .cell("name", CellValue::Text(v.name.clone()))
                .cell("email", CellValue::opt_text(v.contact_email.as_deref()))
                .cell(
                    "lead_time",
                    v.lead_time_days
                        .map_or(CellValue::Empty, |d| CellValue::Int(i64::from(d))),
                )
                .cell("terms", CellValue::opt_text(v.payment_terms.as_deref()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "vendor").output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    if args.name.trim().is_empty() {
        return Err(miette::miette!("vendor name is required"));
    }

    let mut vendor = Vendor::new(args.name.trim());
    vendor.contact_email = args.email;
    vendor.phone = args.phone;
    vendor.website = args.website;
    vendor.address = args.address;
    vendor.lead_time_days = args.lead_time;
    vendor.payment_terms = args.payment_terms;
    vendor.notes = args.notes;

    session
        .store
        .insert(&vendor)
        .map_err(|e| miette::miette!("{}", e))?;
    tracing::info!(id = %vendor.id, name = %vendor.name, "created vendor");

    if global.format == OutputFormat::Id {
        println!("{}", vendor.id);
    } else if !global.quiet {
        println!(
            "{} Created vendor {} ({})",
            style("✓").green(),
            style(&vendor.name).cyan(),
            style(&vendor.id).dim()
        );
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let vendor = find_vendor(&session.store, &args.id)?;

    let format = session.format(global);
    if print_structured(&vendor, format)? {
        return Ok(());
    }
    if format == OutputFormat::Id {
        println!("{}", vendor.id);
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&vendor.id).cyan());
    println!("{}: {}", style("Name").bold(), style(&vendor.name).yellow());
    println!("{}", style("─".repeat(60)).dim());
    let fields = [
        ("Email", vendor.contact_email.as_deref()),
        ("Phone", vendor.phone.as_deref()),
        ("Website", vendor.website.as_deref()),
        ("Address", vendor.address.as_deref()),
        ("Payment terms", vendor.payment_terms.as_deref()),
        ("Notes", vendor.notes.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(v) = value {
            println!("{}: {}", style(label).bold(), v);
        }
    }
    if let Some(days) = vendor.lead_time_days {
        println!("{}: {} day(s)", style("Lead time").bold(), days);
    }

    let items: Vec<InventoryItem> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let supplied: Vec<&InventoryItem> = items
        .iter()
        .filter(|i| i.vendor_id.as_ref() == Some(&vendor.id))
        .collect();
    if !supplied.is_empty() {
        println!();
        println!("{} ({}):", style("Supplies").bold(), supplied.len());
        for item in supplied {
            println!("  • {} {}", style(&item.sku).cyan(), item.name);
        }
    }
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let file = fs::File::open(&args.file)
        .map_err(|e| miette::miette!("cannot open {}: {}", args.file.display(), e))?;
    let rows = parse_vendor_rows(file).map_err(|e| miette::miette!("{}", e))?;

    let mut stats = ImportStats {
        rows_processed: rows.len(),
        ..Default::default()
    };
    for row in rows.iter().filter(|r| !r.is_valid()) {
        stats.errors += 1;
        eprintln!(
            "{} row {}: {}",
            style("✗").red(),
            row.row,
            row.errors.join("; ")
        );
    }
    if stats.errors > 0 && !args.skip_errors {
        return Err(miette::miette!(
            "{} invalid row(s); fix them or pass --skip-errors to import the rest",
            stats.errors
        ));
    }

    let existing: Vec<Vendor> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    for vendor in committable(rows) {
        if existing.iter().any(|v| v.name.eq_ignore_ascii_case(&vendor.name)) {
            stats.skipped += 1;
            continue;
        }
        if !args.dry_run {
            session
                .store
                .insert(&vendor)
                .map_err(|e| miette::miette!("{}", e))?;
        }
        stats.entities_created += 1;
    }

    if !global.quiet {
        let verb = if args.dry_run { "Would import" } else { "Imported" };
        println!(
            "{} {} {} vendor(s); {} skipped (already present), {} invalid",
            style("✓").green(),
            verb,
            style(stats.entities_created).cyan(),
            stats.skipped,
            stats.errors
        );
    }
    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut vendors: Vec<Vendor> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    vendors.sort_by(|a, b| a.name.cmp(&b.name));

    match args.output {
        Some(path) => {
            let file = fs::File::create(&path).into_diagnostic()?;
            export_vendors_csv(&vendors, file).map_err(|e| miette::miette!("{}", e))?;
            if !global.quiet {
                println!(
                    "{} Wrote {} vendor(s) to {}",
                    style("✓").green(),
                    vendors.len(),
                    style(path.display()).cyan()
                );
            }
        }
        None => export_vendors_csv(&vendors, std::io::stdout()).map_err(|e| miette::miette!("{}", e))?,
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let vendor = find_vendor(&session.store, &args.id)?;

    let items: Vec<InventoryItem> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let linked = items
        .iter()
        .filter(|i| i.vendor_id.as_ref() == Some(&vendor.id))
        .count();
    let prompt = if linked > 0 {
        format!("Delete {}? {} item(s) still reference it", vendor.name, linked)
    } else {
        format!("Delete {}?", vendor.name)
    };
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    session
        .store
        .delete::<Vendor>(&vendor.id.to_string())
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Deleted {}", style("✓").green(), style(&vendor.name).cyan());
    }
    Ok(())
}
