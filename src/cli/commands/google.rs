//! `murp google` command - Sheets, Gmail and Docs

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::{confirm, Session};
use crate::cli::GlobalOpts;
use crate::core::local_storage::keys;
use crate::core::store::RecordStoreExt;
use crate::entities::InventoryItem;
use crate::integrations::google::backup::{self, BackupOutcome, BACKUP_SHEET};
use crate::integrations::google::sheets::{export_inventory, import_inventory};
use crate::integrations::google::{
    Attachment, DocsApi, EmailMessage, GmailApi, GoogleAuth, HttpDocs, HttpGmail, HttpSheets,
    MergeStrategy, SheetsApi,
};

#[derive(Subcommand, Debug)]
pub enum GoogleCommands {
    /// Show which Google features are configured
    Status,

    /// Write all inventory to a sheet
    Export(SheetArgs),

    /// Read inventory rows from a sheet
    Import(ImportArgs),

    /// Create a new spreadsheet
    CreateSheet(CreateSheetArgs),

    /// Back up inventory to the configured spreadsheet now
    Backup,

    /// Send an email
    Email(EmailArgs),

    /// Create a document from a text file
    Doc(DocArgs),
}

#[derive(clap::Args, Debug)]
pub struct SheetArgs {
    /// Spreadsheet ID (default: google.backup_spreadsheet_id)
    #[arg(long)]
    pub spreadsheet: Option<String>,

    #[arg(long, default_value = BACKUP_SHEET)]
    pub sheet: String,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub target: SheetArgs,

    #[arg(long, value_enum, default_value_t = MergeStrategy::Append)]
    pub strategy: MergeStrategy,

    /// Validate and count only; write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation for --strategy replace
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct CreateSheetArgs {
    pub title: String,

    /// Export inventory into the new sheet
    #[arg(long)]
    pub export: bool,
}

#[derive(clap::Args, Debug)]
pub struct EmailArgs {
    #[arg(long, required = true)]
    pub to: Vec<String>,

    #[arg(long)]
    pub cc: Vec<String>,

    #[arg(long)]
    pub subject: String,

    /// Body text, or @path to read it from a file
    #[arg(long)]
    pub body: String,

    /// Files to attach
    #[arg(long)]
    pub attach: Vec<PathBuf>,

    /// Print the message instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct DocArgs {
    pub title: String,

    /// Text file with the document body
    pub file: PathBuf,
}

pub fn run(cmd: GoogleCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        GoogleCommands::Status => run_status(global),
        GoogleCommands::Export(args) => run_export(args, global),
        GoogleCommands::Import(args) => run_import(args, global),
        GoogleCommands::CreateSheet(args) => run_create_sheet(args, global),
        GoogleCommands::Backup => run_backup(global),
        GoogleCommands::Email(args) => run_email(args, global),
        GoogleCommands::Doc(args) => run_doc(args, global),
    }
}

/// Credentials from config, or an error naming the keys to set
pub fn google_auth(session: &Session) -> Result<GoogleAuth> {
    let auth = GoogleAuth::from_config(&session.config.google);
    if !auth.is_configured() {
        return Err(miette::miette!(
            help = "set google.access_token, or google.refresh_token with client_id and client_secret, in .murp/config.yaml (or MURP_GOOGLE_TOKEN)",
            "Google is not configured"
        ));
    }
    Ok(auth)
}

fn sheets(session: &Session) -> Result<HttpSheets> {
    HttpSheets::connect(&google_auth(session)?).map_err(|e| miette::miette!("{}", e))
}

fn spreadsheet_id(session: &Session, explicit: Option<String>) -> Result<String> {
    explicit
        .or_else(|| session.config.google.backup_spreadsheet_id.clone())
        .ok_or_else(|| {
            miette::miette!("no spreadsheet given; pass --spreadsheet or set google.backup_spreadsheet_id")
        })
}

/// Run the automatic backup after inventory changes. Failures are printed as
/// warnings; the change itself has already been saved.
pub fn backup_after_change(session: &Session, global: &GlobalOpts) {
    let mut storage = session.local_storage();
    if !backup::auto_backup_enabled(&storage) {
        return;
    }
    let Some(id) = session.config.google.backup_spreadsheet_id.as_deref() else {
        tracing::debug!("automatic backup on but no spreadsheet configured");
        return;
    };

    let result = HttpSheets::connect(&GoogleAuth::from_config(&session.config.google))
        .and_then(|api| backup::maybe_backup(&api, &session.store, &mut storage, Some(id)));
    match result {
        Ok(BackupOutcome::Exported { rows, .. }) => {
            if !global.quiet {
                println!("  {} backed up {} row(s) to Google Sheets", style("↑").dim(), rows);
            }
        }
        Ok(BackupOutcome::Skipped(reason)) => tracing::debug!(reason, "backup skipped"),
        Err(e) => eprintln!("{} automatic backup failed: {}", style("warning:").yellow().bold(), e),
    }
}

fn run_status(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let storage = session.local_storage();
    let auth = GoogleAuth::from_config(&session.config.google);
    let mark = |ok: bool| if ok { style("✓").green() } else { style("✗").red() };

    println!("{} credentials", mark(auth.is_configured()));
    println!(
        "{} backup spreadsheet {}",
        mark(session.config.google.backup_spreadsheet_id.is_some()),
        style(session.config.google.backup_spreadsheet_id.as_deref().unwrap_or("")).dim()
    );
    println!(
        "{} automatic backup",
        mark(backup::auto_backup_enabled(&storage))
    );
    if let Some(at) = backup::last_backup(&storage) {
        println!("  last backup {}", at.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

fn run_export(args: SheetArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = spreadsheet_id(&session, args.spreadsheet)?;
    let api = sheets(&session)?;
    let items: Vec<InventoryItem> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let rows = export_inventory(&api, &id, &args.sheet, &items).map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Wrote {} row(s) to {}!{}",
            style("✓").green(),
            style(rows).cyan(),
            id,
            args.sheet
        );
    }
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let id = spreadsheet_id(&session, args.target.spreadsheet)?;
    if args.strategy == MergeStrategy::Replace
        && !args.dry_run
        && !confirm("Replace deletes every inventory item first. Continue?", args.yes)?
    {
        println!("Cancelled.");
        return Ok(());
    }
    let api = sheets(&session)?;
    let result = import_inventory(
        &api,
        &mut session.store,
        &id,
        &args.target.sheet,
        args.strategy,
        args.dry_run,
    )
    .map_err(|e| miette::miette!("{}", e))?;

    for err in &result.errors {
        eprintln!("{} row {}: {}", style("✗").red(), err.row, err.message);
    }
    if !global.quiet {
        let verb = if args.dry_run { "Would import" } else { "Imported" };
        println!(
            "{} {} {} row(s): {} created, {} updated, {} skipped, {} invalid",
            style("✓").green(),
            verb,
            result.stats.rows_processed,
            style(result.stats.entities_created).cyan(),
            result.stats.entities_updated,
            result.stats.skipped,
            result.stats.errors
        );
    }
    if !args.dry_run {
        backup_after_change(&session, global);
    }
    Ok(())
}

fn run_create_sheet(args: CreateSheetArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let api = sheets(&session)?;
    let created = api
        .create_spreadsheet(&args.title)
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Created spreadsheet {}",
            style("✓").green(),
            style(&created.spreadsheet_id).cyan()
        );
    }
    println!("{}", created.url);

    if args.export {
        let items: Vec<InventoryItem> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
        let rows = export_inventory(&api, &created.spreadsheet_id, BACKUP_SHEET, &items)
            .map_err(|e| miette::miette!("{}", e))?;
        if !global.quiet {
            println!("{} Wrote {} row(s)", style("✓").green(), rows);
        }
    }
    Ok(())
}

fn run_backup(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let id = spreadsheet_id(&session, None)?;
    let api = sheets(&session)?;
    let items: Vec<InventoryItem> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let rows = export_inventory(&api, &id, BACKUP_SHEET, &items).map_err(|e| miette::miette!("{}", e))?;

    let mut storage = session.local_storage();
    storage
        .set(keys::SHEETS_LAST_BACKUP, &Utc::now())
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Backed up {} row(s)", style("✓").green(), style(rows).cyan());
    }
    Ok(())
}

fn mime_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => "text/csv",
        Some("txt") | Some("md") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn run_email(args: EmailArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let body = match args.body.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).into_diagnostic()?,
        None => args.body,
    };

    let mut recipients = args.to.into_iter();
    let first = recipients
        .next()
        .ok_or_else(|| miette::miette!("at least one --to is required"))?;
    let mut message = EmailMessage::new(first, args.subject, body);
    message.to.extend(recipients);
    for cc in args.cc {
        message = message.with_cc(cc);
    }
    for path in &args.attach {
        let data = fs::read(path)
            .map_err(|e| miette::miette!("cannot read {}: {}", path.display(), e))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "attachment".to_string());
        message = message.with_attachment(Attachment {
            filename,
            mime_type: mime_for(path).to_string(),
            data,
        });
    }

    if args.dry_run {
        print!("{}", message.to_rfc2822());
        return Ok(());
    }

    let gmail = HttpGmail::connect(&google_auth(&session)?).map_err(|e| miette::miette!("{}", e))?;
    let sent = gmail.send(&message).map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Sent (message {}, thread {})",
            style("✓").green(),
            style(&sent.message_id).cyan(),
            style(&sent.thread_id).dim()
        );
    }
    Ok(())
}

fn run_doc(args: DocArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let body = fs::read_to_string(&args.file).into_diagnostic()?;
    let docs = HttpDocs::connect(&google_auth(&session)?).map_err(|e| miette::miette!("{}", e))?;
    let doc = docs
        .create_document(&args.title, &body)
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Created document {}", style("✓").green(), style(&doc.document_id).dim());
    }
    println!("{}", doc.url);
    Ok(())
}
