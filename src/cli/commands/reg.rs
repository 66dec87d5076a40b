//! `murp reg` command - State product registrations

use chrono::{Local, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::bom::find_bom;
use crate::cli::helpers::{confirm, parse_date, print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::{RecordStore, RecordStoreExt};
use crate::entities::registration::RegistrationStatus;
use crate::entities::ProductRegistration;

#[derive(Subcommand, Debug)]
pub enum RegCommands {
    /// List registrations with their expiry status
    List(ListArgs),

    /// Record a new registration
    New(NewArgs),

    /// Record a renewal with a new expiry date
    Renew(RenewArgs),

    /// Delete a registration
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only registrations that are expiring or expired
    #[arg(long)]
    pub attention: bool,

    /// Filter by state code
    #[arg(long)]
    pub state: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[arg(long)]
    pub product: String,

    /// Two-letter state code
    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub number: String,

    /// Expiry date (YYYY-MM-DD)
    #[arg(long)]
    pub expires: String,

    /// Issue date (YYYY-MM-DD)
    #[arg(long)]
    pub issued: Option<String>,

    /// BOM of the registered product
    #[arg(long)]
    pub bom: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RenewArgs {
    /// Registration ID or unique prefix
    pub id: String,

    /// New expiry date (YYYY-MM-DD)
    #[arg(long)]
    pub expires: String,

    /// Replacement registration number
    #[arg(long)]
    pub number: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    pub id: String,

    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: RegCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RegCommands::List(args) => run_list(args, global),
        RegCommands::New(args) => run_new(args, global),
        RegCommands::Renew(args) => run_renew(args, global),
        RegCommands::Delete(args) => run_delete(args, global),
    }
}

fn find_registration<S: RecordStore + ?Sized>(store: &S, query: &str) -> Result<ProductRegistration> {
    store
        .find::<ProductRegistration>(&query.trim().to_uppercase())
        .map_err(|e| miette::miette!("{}", e))
}

fn state_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(miette::miette!("state must be a two-letter code, got '{}'", raw));
    }
    Ok(code)
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("product", "PRODUCT", 26),
    ColumnDef::new("state", "STATE", 6),
    ColumnDef::new("number", "NUMBER", 16),
    ColumnDef::new("expires", "EXPIRES", 11),
    ColumnDef::new("days", "DAYS", 6),
    ColumnDef::new("status", "STATUS", 9),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let today = Local::now().date_naive();
    let mut regs: Vec<ProductRegistration> =
        session.store.list().map_err(|e| miette::miette!("{}", e))?;

    if let Some(ref state) = args.state {
        let code = state_code(state)?;
        regs.retain(|r| r.state_code == code);
    }
    if args.attention {
        regs.retain(|r| r.status(today) != RegistrationStatus::Active);
    }
    regs.sort_by_key(|r| r.expires);

    let format = session.format(global);
    if print_structured(&regs, format)? {
        return Ok(());
    }
    if regs.is_empty() {
        if !global.quiet {
            println!("No registrations found.");
        }
        return Ok(());
    }
    let rows = regs
        .iter()
        .map(|r| {
            TableRow::new(r.id.to_string())
                .cell("id", CellValue::Id(r.id.to_string()))
                .cell("product", CellValue::Text(r.product_name.clone()))
                .cell("state", CellValue::Text(r.state_code.clone()))
                .cell("number", CellValue::Text(r.registration_number.clone()))
                .cell("expires", CellValue::Day(r.expires))
                .cell("days", CellValue::Int(r.days_until_expiry(today)))
                .cell("status", CellValue::Status(r.status(today).to_string()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "registration").output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    if args.product.trim().is_empty() || args.number.trim().is_empty() {
        return Err(miette::miette!("product and registration number are required"));
    }
    let bom_id = match args.bom {
        Some(ref q) => Some(find_bom(&session.store, q)?.id),
        None => None,
    };
    let expires = parse_date(&args.expires)?;
    let issued = args.issued.as_deref().map(parse_date).transpose()?;
    if issued.is_some_and(|d| d > expires) {
        return Err(miette::miette!("issue date is after the expiry date"));
    }

    let reg = ProductRegistration {
        id: EntityId::new(EntityPrefix::Reg),
        product_name: args.product.trim().to_string(),
        bom_id,
        state_code: state_code(&args.state)?,
        registration_number: args.number.trim().to_string(),
        issued,
        expires,
        notes: args.notes,
        created: Utc::now(),
    };
    session
        .store
        .insert(&reg)
        .map_err(|e| miette::miette!("{}", e))?;

    if global.format == OutputFormat::Id {
        println!("{}", reg.id);
    } else if !global.quiet {
        println!(
            "{} Registered {} in {} until {}",
            style("✓").green(),
            style(&reg.product_name).cyan(),
            reg.state_code,
            reg.expires
        );
    }
    Ok(())
}

fn run_renew(args: RenewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut reg = find_registration(&session.store, &args.id)?;
    let expires = parse_date(&args.expires)?;
    if expires <= reg.expires {
        return Err(miette::miette!(
            "new expiry {} is not after the current one ({})",
            expires,
            reg.expires
        ));
    }
    reg.issued = Some(Local::now().date_naive());
    reg.expires = expires;
    if let Some(number) = args.number {
        reg.registration_number = number;
    }
    session
        .store
        .update(&reg)
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Renewed {} ({}) until {}",
            style("✓").green(),
            style(&reg.product_name).cyan(),
            reg.state_code,
            reg.expires
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let reg = find_registration(&session.store, &args.id)?;
    if !confirm(
        &format!("Delete {} registration for {}?", reg.state_code, reg.product_name),
        args.yes,
    )? {
        println!("Cancelled.");
        return Ok(());
    }
    session
        .store
        .delete::<ProductRegistration>(&reg.id.to_string())
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Deleted registration {}", style("✓").green(), style(&reg.id).cyan());
    }
    Ok(())
}
