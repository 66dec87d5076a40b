//! `murp po` command - Purchase orders and auto-PO drafting

use chrono::{Local, Utc};
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::google::google_auth;
use crate::cli::commands::inv::{find_item, find_vendor};
use crate::cli::helpers::{confirm, money, parse_date, print_structured, qty, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::{RecordStore, RecordStoreExt};
use crate::core::template::TemplateGenerator;
use crate::entities::activity::Severity;
use crate::entities::purchase_order::{PoLine, PoStatus};
use crate::entities::{InventoryItem, PurchaseOrder, Vendor};
use crate::integrations::google::{Attachment, EmailMessage, GmailApi, HttpGmail};
use crate::mrp::activity;
use crate::mrp::auto_po::{self, AutoPoSettings, AutoPoThreshold};

#[derive(Subcommand, Debug)]
pub enum PoCommands {
    /// List purchase orders
    List(ListArgs),

    /// Create an empty draft PO for a vendor
    New(NewArgs),

    /// Show a PO with its lines
    Show(PoRef),

    /// Add a line to a draft PO
    AddLine(AddLineArgs),

    /// Move a PO to a new status
    Status(StatusArgs),

    /// Draft POs for items that need reordering
    Auto(AutoArgs),

    /// Email a PO to its vendor through Gmail
    Email(EmailArgs),

    /// Delete a draft PO
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[arg(long, value_enum)]
    pub status: Option<PoStatus>,

    /// Only draft, sent and partial orders
    #[arg(long)]
    pub open: bool,

    /// Filter by vendor ID or prefix
    #[arg(long)]
    pub vendor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Vendor ID or unique prefix
    pub vendor: String,

    /// Expected delivery date (YYYY-MM-DD)
    #[arg(long)]
    pub expected: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PoRef {
    /// Order number, PO ID, or unique ID prefix
    pub po: String,
}

#[derive(clap::Args, Debug)]
pub struct AddLineArgs {
    pub po: String,

    /// Inventory SKU
    pub sku: String,

    pub quantity: f64,

    /// Unit price (default: the item's unit cost)
    #[arg(long)]
    pub price: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    pub po: String,

    #[arg(value_enum)]
    pub status: PoStatus,
}

#[derive(clap::Args, Debug)]
pub struct AutoArgs {
    /// Override the saved threshold for this run
    #[arg(long, value_enum)]
    pub threshold: Option<AutoPoThreshold>,

    /// Run even when auto-PO is switched off in settings
    #[arg(long)]
    pub force: bool,

    /// Show the plan without creating drafts
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct EmailArgs {
    pub po: String,

    /// Recipient (default: the vendor's contact email)
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long)]
    pub cc: Vec<String>,

    /// Print the message instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    pub po: String,

    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: PoCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PoCommands::List(args) => run_list(args, global),
        PoCommands::New(args) => run_new(args, global),
        PoCommands::Show(args) => run_show(args, global),
        PoCommands::AddLine(args) => run_add_line(args, global),
        PoCommands::Status(args) => run_status(args, global),
        PoCommands::Auto(args) => run_auto(args, global),
        PoCommands::Email(args) => run_email(args, global),
        PoCommands::Delete(args) => run_delete(args, global),
    }
}

/// Resolve a PO by order number, then by id or id prefix
pub fn find_po<S: RecordStore + ?Sized>(store: &S, query: &str) -> Result<PurchaseOrder> {
    let orders: Vec<PurchaseOrder> = store.list().map_err(|e| miette::miette!("{}", e))?;
    if let Some(po) = orders
        .iter()
        .find(|p| p.order_number.eq_ignore_ascii_case(query.trim()))
    {
        return Ok(po.clone());
    }
    store
        .find::<PurchaseOrder>(&query.trim().to_uppercase())
        .map_err(|e| miette::miette!("{}", e))
}

fn vendor_name(vendors: &[Vendor], po: &PurchaseOrder) -> String {
    vendors
        .iter()
        .find(|v| v.id == po.vendor_id)
        .map(|v| v.name.clone())
        .unwrap_or_else(|| po.vendor_id.to_string())
}

fn save(session: &mut Session, po: &mut PurchaseOrder) -> Result<()> {
    po.updated = Utc::now();
    session
        .store
        .update(po)
        .map_err(|e| miette::miette!("{}", e))
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "NUMBER", 14),
    ColumnDef::new("vendor", "VENDOR", 24),
    ColumnDef::new("status", "STATUS", 10),
    ColumnDef::new("lines", "LINES", 6),
    ColumnDef::new("total", "TOTAL", 14),
    ColumnDef::new("expected", "EXPECTED", 11),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut orders: Vec<PurchaseOrder> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let vendors: Vec<Vendor> = session.store.list().map_err(|e| miette::miette!("{}", e))?;

    if let Some(status) = args.status {
        orders.retain(|p| p.status == status);
    }
    if args.open {
        orders.retain(|p| p.status.is_open());
    }
    if let Some(ref vendor) = args.vendor {
        let vendor = find_vendor(&session.store, vendor)?;
        orders.retain(|p| p.vendor_id == vendor.id);
    }
    orders.sort_by(|a, b| b.order_number.cmp(&a.order_number));

    let format = session.format(global);
    if print_structured(&orders, format)? {
        return Ok(());
    }
    if orders.is_empty() {
        if !global.quiet {
            println!("No purchase orders found.");
        }
        return Ok(());
    }

    let rows = orders
        .iter()
        .map(|p| {
            TableRow::new(p.id.to_string())
                .cell("number", CellValue::Text(p.order_number.clone()))
                .cell("vendor", CellValue::Text(vendor_name(&vendors, p)))
                .cell("status", CellValue::Status(p.status.to_string()))
                .cell("lines", CellValue::Int(p.lines.len() as i64))
                .cell("total", CellValue::Money(p.total()))
                .cell(
                    "expected",
                    p.expected_date.map_or(CellValue::Empty, CellValue::Day),
                )
        })
        .collect();
    TableFormatter::new(COLUMNS, "purchase order").output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let vendor = find_vendor(&session.store, &args.vendor)?;
    let existing: Vec<PurchaseOrder> = session.store.list().map_err(|e| miette::miette!("{}", e))?;

    let number = PurchaseOrder::next_order_number(&existing, Local::now().date_naive());
    let mut po = PurchaseOrder::new(number, vendor.id.clone());
    po.expected_date = args.expected.as_deref().map(parse_date).transpose()?;
    po.notes = args.notes;
    session
        .store
        .insert(&po)
        .map_err(|e| miette::miette!("{}", e))?;
    tracing::info!(order = %po.order_number, vendor = %vendor.name, "created purchase order");

    if global.format == OutputFormat::Id {
        println!("{}", po.id);
    } else if !global.quiet {
        println!(
            "{} Created {} for {}",
            style("✓").green(),
            style(&po.order_number).cyan(),
            style(&vendor.name).yellow()
        );
    }
    Ok(())
}

fn run_show(args: PoRef, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let po = find_po(&session.store, &args.po)?;

    let format = session.format(global);
    if print_structured(&po, format)? {
        return Ok(());
    }
    if format == OutputFormat::Id {
        println!("{}", po.id);
        return Ok(());
    }

    let vendors: Vec<Vendor> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let currency = session.config.currency();

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Order").bold(), style(&po.order_number).cyan());
    println!("{}: {}", style("ID").bold(), style(&po.id).dim());
    println!("{}: {}", style("Vendor").bold(), style(vendor_name(&vendors, &po)).yellow());
    println!("{}: {}", style("Status").bold(), po.status);
    if let Some(date) = po.expected_date {
        println!("{}: {}", style("Expected").bold(), date);
    }
    if po.auto_generated {
        println!("{}: auto-PO", style("Drafted by").bold());
    }
    println!("{}", style("─".repeat(60)).dim());

    for line in &po.lines {
        println!(
            "  {:<14} {:<28} {:>8} x {:>10} = {}",
            style(&line.sku).cyan(),
            line.name,
            qty(line.quantity),
            format!("{:.2}", line.unit_price),
            money(line.total(), currency)
        );
    }
    println!();
    println!("{}: {}", style("Total").bold(), money(po.total(), currency));
    if let Some(ref notes) = po.notes {
        println!("{}: {}", style("Notes").bold(), notes);
    }
    Ok(())
}

fn run_add_line(args: AddLineArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut po = find_po(&session.store, &args.po)?;
    if po.status != PoStatus::Draft {
        return Err(miette::miette!(
            "{} is {}; only draft orders can be edited",
            po.order_number,
            po.status
        ));
    }
    if !(args.quantity.is_finite() && args.quantity > 0.0) {
        return Err(miette::miette!("quantity must be positive"));
    }
    let item = find_item(&session.store, &args.sku)?;

    let line = PoLine {
        sku: item.sku.clone(),
        name: item.name.clone(),
        quantity: args.quantity,
        unit_price: args.price.or(item.unit_cost).unwrap_or(0.0),
    };
    po.lines.push(line.clone());
    save(&mut session, &mut po)?;

    if !global.quiet {
        println!(
            "{} Added {} x {} to {} (total {})",
            style("✓").green(),
            style(&line.sku).cyan(),
            qty(line.quantity),
            po.order_number,
            money(po.total(), session.config.currency())
        );
    }
    Ok(())
}

fn run_status(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut po = find_po(&session.store, &args.po)?;
    if !po.status.can_transition_to(args.status) {
        return Err(miette::miette!(
            "cannot move {} from {} to {}",
            po.order_number,
            po.status,
            args.status
        ));
    }
    let previous = po.status;
    po.status = args.status;
    save(&mut session, &mut po)?;
    activity::log(
        &mut session.store,
        &session.config.author(),
        &format!("{} {} -> {}", po.order_number, previous, po.status),
        None,
        Severity::Info,
    )
    .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} {} is now {}",
            style("✓").green(),
            style(&po.order_number).cyan(),
            style(po.status).yellow()
        );
    }
    Ok(())
}

fn run_auto(args: AutoArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let settings = AutoPoSettings::load(&session.store).map_err(|e| miette::miette!("{}", e))?;
    if !settings.enabled && !args.force && !args.dry_run {
        return Err(miette::miette!(
            "auto-PO is off; enable it with 'murp settings auto-po --enabled true' or pass --force"
        ));
    }
    let threshold = args.threshold.unwrap_or(settings.threshold);

    let items: Vec<InventoryItem> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let orders: Vec<PurchaseOrder> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
    let candidates = auto_po::excluding_on_order(&items, &orders);
    let plan = auto_po::plan_drafts(candidates, threshold);

    for skipped in &plan.skipped {
        eprintln!(
            "{} {} skipped: {}",
            style("!").yellow(),
            style(&skipped.sku).cyan(),
            skipped.reason
        );
    }
    if plan.drafts.is_empty() {
        if !global.quiet {
            println!("Nothing to order at threshold '{}'.", threshold);
        }
        return Ok(());
    }

    if args.dry_run {
        let vendors: Vec<Vendor> = session.store.list().map_err(|e| miette::miette!("{}", e))?;
        println!("Would draft {} PO(s) at threshold '{}':", plan.drafts.len(), threshold);
        for draft in &plan.drafts {
            let name = vendors
                .iter()
                .find(|v| v.id == draft.vendor_id)
                .map_or(draft.vendor_id.to_string(), |v| v.name.clone());
            println!("  {}", style(name).yellow());
            for line in &draft.lines {
                println!("    {} x {}", style(&line.sku).cyan(), qty(line.quantity));
            }
        }
        return Ok(());
    }

    let created = auto_po::create_drafts(&mut session.store, &plan, Local::now().date_naive())
        .map_err(|e| miette::miette!("{}", e))?;
    if global.format == OutputFormat::Id {
        for po in &created {
            println!("{}", po.id);
        }
    } else if !global.quiet {
        for po in &created {
            println!(
                "{} Drafted {} ({} line(s), {})",
                style("✓").green(),
                style(&po.order_number).cyan(),
                po.lines.len(),
                money(po.total(), session.config.currency())
            );
        }
    }
    Ok(())
}

/// Order lines as a CSV attachment
fn lines_csv(po: &PurchaseOrder) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["sku", "name", "quantity", "unit_price", "total"])
        .into_diagnostic()?;
    for line in &po.lines {
        wtr.write_record([
            line.sku.clone(),
            line.name.clone(),
            qty(line.quantity),
            format!("{:.2}", line.unit_price),
            format!("{:.2}", line.total()),
        ])
        .into_diagnostic()?;
    }
    wtr.into_inner().map_err(|e| miette::miette!("{}", e))
}

fn run_email(args: EmailArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut po = find_po(&session.store, &args.po)?;
    if po.lines.is_empty() {
        return Err(miette::miette!("{} has no lines", po.order_number));
    }
    let vendor: Vendor = session
        .store
        .get(&po.vendor_id.to_string())
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("vendor {} not found", po.vendor_id))?;
    let to = args
        .to
        .or_else(|| vendor.contact_email.clone())
        .ok_or_else(|| miette::miette!("{} has no contact email; pass --to", vendor.name))?;

    let author = session.config.author();
    let body = TemplateGenerator::new()
        .and_then(|t| t.po_email(&po, &vendor, session.config.currency(), &author))
        .map_err(|e| miette::miette!("{}", e))?;
    let mut message = EmailMessage::new(to, format!("Purchase order {}", po.order_number), body)
        .with_attachment(Attachment {
            filename: format!("{}.csv", po.order_number),
            mime_type: "text/csv".to_string(),
            data: lines_csv(&po)?,
        });
    for cc in args.cc {
        message = message.with_cc(cc);
    }

    if args.dry_run {
        print!("{}", message.to_rfc2822());
        return Ok(());
    }

    let auth = google_auth(&session)?;
    let gmail = HttpGmail::connect(&auth).map_err(|e| miette::miette!("{}", e))?;
    let sent = gmail.send(&message).map_err(|e| miette::miette!("{}", e))?;

    if po.status == PoStatus::Draft {
        po.status = PoStatus::Sent;
        save(&mut session, &mut po)?;
    }
    activity::log(
        &mut session.store,
        &author,
        &format!("emailed {} to {}", po.order_number, vendor.name),
        Some(&format!("message {}", sent.message_id)),
        Severity::Info,
    )
    .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Sent {} to {} (message {})",
            style("✓").green(),
            style(&po.order_number).cyan(),
            message.to.join(", "),
            style(&sent.message_id).dim()
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let po = find_po(&session.store, &args.po)?;
    if po.status != PoStatus::Draft {
        return Err(miette::miette!(
            "{} is {}; cancel it instead of deleting",
            po.order_number,
            po.status
        ));
    }
    if !confirm(&format!("Delete {}?", po.order_number), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    session
        .store
        .delete::<PurchaseOrder>(&po.id.to_string())
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Deleted {}", style("✓").green(), style(&po.order_number).cyan());
    }
    Ok(())
}
