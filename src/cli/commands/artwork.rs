//! `murp artwork` command - Label artwork upload and ingredient lists

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::cli::commands::bom::find_bom;
use crate::cli::helpers::{confirm, print_structured, truncate_str, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::store::{RecordStore, RecordStoreExt};
use crate::entities::artwork::UploadStatus;
use crate::entities::Artwork;
use crate::mrp::artwork::{upload_files, SidecarScanner};

#[derive(Subcommand, Debug)]
pub enum ArtworkCommands {
    /// Upload one or more label files
    Upload(UploadArgs),

    /// List uploaded artwork
    List(ListArgs),

    /// Show an artwork record and its ingredient list
    Show(ArtRef),

    /// Replace the extracted ingredient list by hand
    SetIngredients(SetIngredientsArgs),

    /// Delete an artwork record and its stored copy
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Files to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// BOM the labels belong to (ID, prefix, or finished SKU)
    #[arg(long)]
    pub bom: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only artwork for this BOM
    #[arg(long)]
    pub bom: Option<String>,

    /// Only failed uploads
    #[arg(long)]
    pub failed: bool,
}

#[derive(clap::Args, Debug)]
pub struct ArtRef {
    /// Artwork ID or unique prefix
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SetIngredientsArgs {
    pub id: String,

    /// Comma-separated ingredients in label order
    #[arg(long, conflicts_with = "file")]
    pub list: Option<String>,

    /// Text file with one ingredient per line
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    pub id: String,

    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: ArtworkCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ArtworkCommands::Upload(args) => run_upload(args, global),
        ArtworkCommands::List(args) => run_list(args, global),
        ArtworkCommands::Show(args) => run_show(args, global),
        ArtworkCommands::SetIngredients(args) => run_set_ingredients(args, global),
        ArtworkCommands::Delete(args) => run_delete(args, global),
    }
}

pub fn find_artwork<S: RecordStore + ?Sized>(store: &S, query: &str) -> Result<Artwork> {
    store
        .find::<Artwork>(&query.trim().to_uppercase())
        .map_err(|e| miette::miette!("{}", e))
}

fn status_mark(status: UploadStatus) -> console::StyledObject<&'static str> {
    match status {
        UploadStatus::Completed => style("✓").green(),
        UploadStatus::Failed => style("✗").red(),
        _ => style("…").yellow(),
    }
}

fn run_upload(args: UploadArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let bom_id = match args.bom {
        Some(ref q) => Some(find_bom(&session.store, q)?.id),
        None => None,
    };
    let dest = session.project.artwork_dir();
    fs::create_dir_all(&dest).into_diagnostic()?;

    // Sidecar ingredient files live next to their source, so scan per directory
    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in args.files {
        let dir = file
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        by_dir.entry(dir).or_default().push(file);
    }

    let mut results = Vec::new();
    for (dir, files) in by_dir {
        let scanner = SidecarScanner::new(dir);
        let uploaded = upload_files(&mut session.store, &scanner, &files, &dest, bom_id.as_ref())
            .map_err(|e| miette::miette!("{}", e))?;
        results.extend(uploaded);
    }

    let failed = results
        .iter()
        .filter(|a| a.status == UploadStatus::Failed)
        .count();
    if !global.quiet {
        for art in &results {
            let detail = match (&art.error, art.extracted_ingredients.len()) {
                (Some(err), _) => err.clone(),
                (None, 0) => "no ingredients found".to_string(),
                (None, n) => format!("{} ingredient(s)", n),
            };
            println!(
                "{} {} {} {}",
                status_mark(art.status),
                style(&art.id).dim(),
                art.file_name,
                style(detail).dim()
            );
        }
        println!();
        println!(
            "{} uploaded, {} failed",
            style(results.len() - failed).green(),
            style(failed).red()
        );
    }
    if failed > 0 {
        return Err(miette::miette!("{} of {} file(s) failed", failed, results.len()));
    }
    Ok(())
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("file", "FILE", 32),
    ColumnDef::new("status", "STATUS", 10),
    ColumnDef::new("ingredients", "INGREDIENTS", 11),
    ColumnDef::new("created", "UPLOADED", 16),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut artworks: Vec<Artwork> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    if let Some(ref q) = args.bom {
        let bom = find_bom(&session.store, q)?;
        artworks.retain(|a| a.bom_id.as_ref() == Some(&bom.id));
    }
    if args.failed {
        artworks.retain(|a| a.status == UploadStatus::Failed);
    }
    artworks.sort_by(|a, b| b.created.cmp(&a.created));

    let format = session.format(global);
    if print_structured(&artworks, format)? {
        return Ok(());
    }
    if artworks.is_empty() {
        if !global.quiet {
            println!("No artwork found.");
        }
        return Ok(());
    }
    let rows = artworks
        .iter()
        .map(|a| {
            TableRow::new(a.id.to_string())
                .cell("id", CellValue::Id(a.id.to_string()))
                .cell("file", CellValue::Text(truncate_str(&a.file_name, 32)))
                .cell("status", CellValue::Status(a.status.to_string()))
                .cell("ingredients", CellValue::Int(a.extracted_ingredients.len() as i64))
                .cell("created", CellValue::Date(a.created))
        })
        .collect();
    TableFormatter::new(COLUMNS, "artwork").output(rows, format)
}

fn run_show(args: ArtRef, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let art = find_artwork(&session.store, &args.id)?;
    if print_structured(&art, session.format(global))? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&art.id).cyan());
    println!("{}: {}", style("File").bold(), style(&art.file_name).yellow());
    println!("{}: {}", style("Status").bold(), art.status);
    if let Some(ref err) = art.error {
        println!("{}: {}", style("Error").bold(), style(err).red());
    }
    if let Some(ref bom_id) = art.bom_id {
        println!("{}: {}", style("BOM").bold(), bom_id);
    }
    if let Some(ref sha) = art.sha256 {
        println!("{}: {}", style("SHA-256").bold(), style(sha).dim());
    }
    println!("{}", style("─".repeat(60)).dim());
    if art.extracted_ingredients.is_empty() {
        println!("No ingredients recorded.");
    }
    for (i, name) in art.extracted_ingredients.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, name);
    }
    Ok(())
}

fn run_set_ingredients(args: SetIngredientsArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut art = find_artwork(&session.store, &args.id)?;

    let ingredients: Vec<String> = match (args.list, args.file) {
        (Some(list), _) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        (None, Some(path)) => fs::read_to_string(&path)
            .into_diagnostic()?
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        (None, None) => return Err(miette::miette!("pass --list or --file")),
    };

    art.extracted_ingredients = ingredients;
    session
        .store
        .update(&art)
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} {} now lists {} ingredient(s)",
            style("✓").green(),
            style(&art.file_name).cyan(),
            art.extracted_ingredients.len()
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let art = find_artwork(&session.store, &args.id)?;
    if !confirm(&format!("Delete artwork {}?", art.file_name), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    if let Some(ref stored) = art.stored_path {
        if let Err(e) = fs::remove_file(stored) {
            tracing::warn!(path = %stored, error = %e, "could not remove stored artwork");
        }
    }
    session
        .store
        .delete::<Artwork>(&art.id.to_string())
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Deleted {}", style("✓").green(), style(&art.file_name).cyan());
    }
    Ok(())
}
