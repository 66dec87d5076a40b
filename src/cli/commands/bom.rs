//! `murp bom` command - Bills of materials

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::commands::google::google_auth;
use crate::cli::helpers::{confirm, print_structured, qty, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::{RecordStore, RecordStoreExt};
use crate::core::template::TemplateGenerator;
use crate::entities::{BillOfMaterials, InventoryItem};
use crate::integrations::google::{DocsApi, HttpDocs};
use crate::mrp::csv::{bom_template, export_bom_csv, import_bom_csv};
use crate::mrp::validation::bom_line;

#[derive(Subcommand, Debug)]
pub enum BomCommands {
    /// List BOMs
    List,

    /// Create an empty BOM for a finished SKU
    New(NewArgs),

    /// Show a BOM with its components
    Show(BomRef),

    /// Add a component line
    Add(AddArgs),

    /// Remove a component line by SKU or line ID
    Remove(RemoveArgs),

    /// Import component lines from CSV (sku,name,quantity,unit)
    Import(ImportArgs),

    /// Export component lines as CSV
    Export(ExportArgs),

    /// Print a component CSV template
    Template,

    /// Render the BOM as a document, optionally into Google Docs
    Doc(DocArgs),

    /// Delete a BOM
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct BomRef {
    /// BOM ID, unique prefix, or finished SKU
    pub bom: String,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// SKU of the finished good
    #[arg(long)]
    pub sku: String,

    #[arg(long)]
    pub name: String,

    /// Finished units per batch
    #[arg(long, default_value_t = 1.0)]
    pub yield_qty: f64,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// BOM ID, unique prefix, or finished SKU
    pub bom: String,

    /// Component SKU
    pub sku: String,

    /// Quantity per batch
    pub quantity: f64,

    /// Component name (default: the inventory item's name)
    #[arg(long)]
    pub name: Option<String>,

    /// Unit (default: the inventory item's unit, else ea)
    #[arg(long)]
    pub unit: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    pub bom: String,

    /// Component SKU or line ID
    pub line: String,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    pub bom: String,

    pub file: PathBuf,

    /// Replace existing lines instead of appending
    #[arg(long)]
    pub replace: bool,

    /// Validate only; write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Import the valid rows even when some rows are invalid
    #[arg(long)]
    pub skip_errors: bool,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    pub bom: String,

    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DocArgs {
    pub bom: String,

    /// Create a Google Doc and print its URL
    #[arg(long)]
    pub google: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    pub bom: String,

    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: BomCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BomCommands::List => run_list(global),
        BomCommands::New(args) => run_new(args, global),
        BomCommands::Show(args) => run_show(args, global),
        BomCommands::Add(args) => run_add(args, global),
        BomCommands::Remove(args) => run_remove(args, global),
        BomCommands::Import(args) => run_import(args, global),
        BomCommands::Export(args) => run_export(args, global),
        BomCommands::Template => {
            print!("{}", bom_template());
            Ok(())
        }
        BomCommands::Doc(args) => run_doc(args, global),
        BomCommands::Delete(args) => run_delete(args, global),
    }
}

/// Resolve a BOM by finished SKU, then by id or id prefix
pub fn find_bom<S: RecordStore + ?Sized>(store: &S, query: &str) -> Result<BillOfMaterials> {
    let boms: Vec<BillOfMaterials> = store.list().map_err(|e| miette::miette!("{}", e))?;
    if let Some(bom) = boms
        .iter()
        .find(|b| b.finished_sku.eq_ignore_ascii_case(query.trim()))
    {
        return Ok(bom.clone());
    }
    store
        .find::<BillOfMaterials>(&query.trim().to_uppercase())
        .map_err(|e| miette::miette!("{}", e))
}

fn warn_duplicates(bom: &BillOfMaterials) {
    for sku in bom.duplicate_skus() {
        eprintln!(
            "{} {} appears on more than one line",
            style("warning:").yellow().bold(),
            style(sku).cyan()
        );
    }
}

fn save(session: &mut Session, bom: &mut BillOfMaterials) -> Result<()> {
    bom.updated = Utc::now();
    session
        .store
        .update(bom)
        .map_err(|e| miette::miette!("{}", e))
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("sku", "FINISHED SKU", 16),
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("lines", "LINES", 6),
    ColumnDef::new("yield", "YIELD", 8),
];

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut boms: Vec<BillOfMaterials> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    boms.sort_by(|a, b| a.finished_sku.cmp(&b.finished_sku));

    let format = session.format(global);
    if print_structured(&boms, format)? {
        return Ok(());
    }
    if boms.is_empty() {
        if !global.quiet {
            println!("No BOMs found.");
        }
        return Ok(());
    }
    let rows = boms
        .iter()
        .map(|b| {
            TableRow::new(b.id.to_string())
                .cell("id", CellValue::Id(b.id.to_string()))
                .cell("sku", CellValue::Text(b.finished_sku.clone()))
                .cell("name", CellValue::Text(b.name.clone()))
                .cell("lines", CellValue::Int(b.components.len() as i64))
                .cell("yield", CellValue::Qty(b.yield_quantity))
        })
        .collect();
    TableFormatter::new(COLUMNS, "BOM").output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    if args.sku.trim().is_empty() || args.name.trim().is_empty() {
        return Err(miette::miette!("finished SKU and name are required"));
    }
    if !(args.yield_qty.is_finite() && args.yield_qty > 0.0) {
        return Err(miette::miette!("yield must be positive"));
    }

    let mut bom = BillOfMaterials::new(args.sku.trim(), args.name.trim());
    bom.yield_quantity = args.yield_qty;
    bom.notes = args.notes;
    session
        .store
        .insert(&bom)
        .map_err(|e| miette::miette!("{}", e))?;

    if global.format == OutputFormat::Id {
        println!("{}", bom.id);
    } else if !global.quiet {
        println!(
            "{} Created BOM {} for {}",
            style("✓").green(),
            style(&bom.id).cyan(),
            style(&bom.finished_sku).yellow()
        );
    }
    Ok(())
}

fn run_show(args: BomRef, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let bom = find_bom(&session.store, &args.bom)?;

    let format = session.format(global);
    if print_structured(&bom, format)? {
        return Ok(());
    }
    if format == OutputFormat::Id {
        println!("{}", bom.id);
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&bom.id).cyan());
    println!("{}: {}", style("Name").bold(), style(&bom.name).yellow());
    println!("{}: {}", style("Finished SKU").bold(), bom.finished_sku);
    println!("{}: {}", style("Yield").bold(), qty(bom.yield_quantity));
    println!("{}", style("─".repeat(60)).dim());

    if bom.components.is_empty() {
        println!("No components yet. Add one with {}", style("murp bom add").yellow());
    }
    let last = bom.components.len().saturating_sub(1);
    for (i, c) in bom.components.iter().enumerate() {
        let branch = if i == last { "└─ " } else { "├─ " };
        println!(
            "{}{} {} ({} {})",
            branch,
            style(&c.sku).cyan(),
            c.name,
            qty(c.quantity),
            c.unit
        );
    }
    if let Some(ref notes) = bom.notes {
        println!();
        println!("{}: {}", style("Notes").bold(), notes);
    }
    warn_duplicates(&bom);
    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut bom = find_bom(&session.store, &args.bom)?;

    let items: Vec<InventoryItem> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let stocked = items
        .iter()
        .find(|i| i.sku.eq_ignore_ascii_case(args.sku.trim()));
    let name = args
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| stocked.map(|i| i.name.clone()))
        .unwrap_or_default();
    let unit = args
        .unit
        .filter(|u| !u.trim().is_empty())
        .or_else(|| stocked.map(|i| i.unit.clone()))
        .unwrap_or_default();

    let line = bom_line(&args.sku, &name, args.quantity, &unit).map_err(|e| miette::miette!("{}", e))?;
    bom.components.push(line.clone());
    save(&mut session, &mut bom)?;

    if !global.quiet {
        println!(
            "{} Added {} x {} {} to {}",
            style("✓").green(),
            style(&line.sku).cyan(),
            qty(line.quantity),
            line.unit,
            bom.name
        );
        if stocked.is_none() {
            println!("  {} {} is not in inventory", style("!").yellow(), line.sku);
        }
    }
    warn_duplicates(&bom);
    Ok(())
}

fn run_remove(args: RemoveArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut bom = find_bom(&session.store, &args.bom)?;
    let removed = bom
        .remove_component(args.line.trim())
        .ok_or_else(|| miette::miette!("no line matching '{}' in {}", args.line, bom.name))?;
    save(&mut session, &mut bom)?;
    if !global.quiet {
        println!(
            "{} Removed {} from {}",
            style("✓").green(),
            style(&removed.sku).cyan(),
            bom.name
        );
    }
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut bom = find_bom(&session.store, &args.bom)?;
    let file = fs::File::open(&args.file)
        .map_err(|e| miette::miette!("cannot open {}: {}", args.file.display(), e))?;
    let imported = import_bom_csv(file).map_err(|e| miette::miette!("{}", e))?;

    for err in &imported.errors {
        eprintln!("{} row {}: {}", style("✗").red(), err.row, err.message);
    }
    if !imported.errors.is_empty() && !args.skip_errors {
        return Err(miette::miette!(
            "{} invalid row(s); fix them or pass --skip-errors to import the rest",
            imported.errors.len()
        ));
    }

    let count = imported.components.len();
    if args.replace {
        bom.components = imported.components;
    } else {
        bom.components.extend(imported.components);
    }
    if !args.dry_run {
        save(&mut session, &mut bom)?;
    }

    if !global.quiet {
        let verb = if args.dry_run { "Would import" } else { "Imported" };
        println!(
            "{} {} {} line(s) into {}",
            style("✓").green(),
            verb,
            style(count).cyan(),
            bom.name
        );
    }
    warn_duplicates(&bom);
    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let bom = find_bom(&session.store, &args.bom)?;
    match args.output {
        Some(path) => {
            let file = fs::File::create(&path).into_diagnostic()?;
            export_bom_csv(&bom, file).map_err(|e| miette::miette!("{}", e))?;
            if !global.quiet {
                println!(
                    "{} Wrote {} line(s) to {}",
                    style("✓").green(),
                    bom.components.len(),
                    style(path.display()).cyan()
                );
            }
        }
        None => export_bom_csv(&bom, std::io::stdout()).map_err(|e| miette::miette!("{}", e))?,
    }
    Ok(())
}

fn run_doc(args: DocArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let bom = find_bom(&session.store, &args.bom)?;
    let body = TemplateGenerator::new()
        .and_then(|t| t.bom_doc(&bom))
        .map_err(|e| miette::miette!("{}", e))?;

    if !args.google {
        print!("{}", body);
        return Ok(());
    }

    let auth = google_auth(&session)?;
    let docs = HttpDocs::connect(&auth).map_err(|e| miette::miette!("{}", e))?;
    let title = format!("BOM - {} ({})", bom.name, bom.finished_sku);
    let doc = docs
        .create_document(&title, &body)
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Created document {}", style("✓").green(), style(&doc.document_id).dim());
    }
    println!("{}", doc.url);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let bom = find_bom(&session.store, &args.bom)?;
    if !confirm(&format!("Delete BOM {} ({})?", bom.name, bom.finished_sku), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    session
        .store
        .delete::<BillOfMaterials>(&bom.id.to_string())
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Deleted {}", style("✓").green(), style(&bom.name).cyan());
    }
    Ok(())
}
