//! `murp inv` command - Inventory items and stock levels

use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;

use crate::cli::commands::google::backup_after_change;
use crate::cli::helpers::{money, print_structured, qty, Session};
use crate::cli::table::{status_style, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::core::store::{RecordStore, RecordStoreExt};
use crate::entities::inventory::StockStatus;
use crate::entities::{InventoryItem, Vendor};
use crate::mrp::validation::{create_inventory_item, NewInventoryItem};

#[derive(Subcommand, Debug)]
pub enum InvCommands {
    /// List inventory items
    List(ListArgs),

    /// Create a new inventory item
    New(NewArgs),

    /// Show an item's details
    Show(ShowArgs),

    /// Change the quantity on hand
    Adjust(AdjustArgs),

    /// Update reorder settings, vendor, cost or seasonal factors
    Set(SetArgs),

    /// Delete an item
    Delete(DeleteArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StatusFilter {
    OutOfStock,
    Critical,
    Low,
    Ok,
    All,
}

impl StatusFilter {
    fn matches(&self, status: StockStatus) -> bool {
        match self {
            StatusFilter::OutOfStock => status == StockStatus::OutOfStock,
            StatusFilter::Critical => status == StockStatus::Critical,
            StatusFilter::Low => status == StockStatus::Low,
            StatusFilter::Ok => status == StockStatus::Ok,
            StatusFilter::All => true,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by stock status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Only items that need reordering (anything but ok)
    #[arg(long)]
    pub low: bool,

    /// Filter by category (case-insensitive)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Search in SKU and name
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[arg(long)]
    pub sku: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub category: Option<String>,

    /// Quantity on hand
    #[arg(long, default_value_t = 0.0)]
    pub qty: f64,

    #[arg(long, default_value_t = 0.0)]
    pub reorder_point: f64,

    #[arg(long, default_value_t = 0.0)]
    pub reorder_qty: f64,

    /// Vendor minimum order quantity
    #[arg(long)]
    pub moq: Option<f64>,

    /// Unit of measure (default: ea)
    #[arg(long)]
    pub unit: Option<String>,

    #[arg(long)]
    pub unit_cost: Option<f64>,

    /// Vendor ID or unique prefix
    #[arg(long)]
    pub vendor: Option<String>,

    #[arg(long)]
    pub lead_time: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// SKU, item ID or unique ID prefix
    pub item: String,
}

#[derive(clap::Args, Debug)]
pub struct AdjustArgs {
    /// SKU, item ID or unique ID prefix
    pub item: String,

    /// Add (positive) or remove (negative) stock
    #[arg(long, allow_hyphen_values = true, conflicts_with = "to")]
    pub by: Option<f64>,

    /// Set the quantity on hand outright
    #[arg(long)]
    pub to: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// SKU, item ID or unique ID prefix
    pub item: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub reorder_point: Option<f64>,

    #[arg(long)]
    pub reorder_qty: Option<f64>,

    #[arg(long)]
    pub moq: Option<f64>,

    #[arg(long)]
    pub unit_cost: Option<f64>,

    /// Vendor ID or unique prefix
    #[arg(long)]
    pub vendor: Option<String>,

    #[arg(long)]
    pub lead_time: Option<u32>,

    /// Twelve monthly demand factors, Jan..Dec
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub seasonal: Option<Vec<f64>>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// SKU, item ID or unique ID prefix
    pub item: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: InvCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        InvCommands::List(args) => run_list(args, global),
        InvCommands::New(args) => run_new(args, global),
        InvCommands::Show(args) => run_show(args, global),
        InvCommands::Adjust(args) => run_adjust(args, global),
        InvCommands::Set(args) => run_set(args, global),
        InvCommands::Delete(args) => run_delete(args, global),
    }
}

/// Look an item up by SKU first, then by id or id prefix
pub fn find_item<S: RecordStore + ?Sized>(store: &S, query: &str) -> Result<InventoryItem> {
    let items: Vec<InventoryItem> = store.list().map_err(|e| miette::miette!("{}", e))?;
    if let Some(item) = items.iter().find(|i| i.sku.eq_ignore_ascii_case(query.trim())) {
        return Ok(item.clone());
    }
    store
        .find::<InventoryItem>(&query.trim().to_uppercase())
        .map_err(|e| miette::miette!("{}", e))
}

pub fn find_vendor<S: RecordStore + ?Sized>(store: &S, query: &str) -> Result<Vendor> {
    store
        .find::<Vendor>(&query.trim().to_uppercase())
        .map_err(|e| miette::miette!("{}", e))
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("sku", "SKU", 16),
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("category", "CATEGORY", 16),
    ColumnDef::new("on_hand", "ON HAND", 10),
    ColumnDef::new("reorder_point", "REORDER AT", 11),
    ColumnDef::new("unit", "UNIT", 6),
    ColumnDef::new("status", "STATUS", 14),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut items: Vec<InventoryItem> = session
        .store
        .list()
        .map_err(|e| miette::miette!("{}", e))?;

    items.retain(|i| args.status.matches(i.stock_status()));
    if args.low {
        items.retain(|i| i.stock_status().needs_reorder());
    }
    if let Some(ref category) = args.category {
        items.retain(|i| {
            i.category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category))
        });
    }
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        items.retain(|i| {
            i.sku.to_lowercase().contains(&needle) || i.name.to_lowercase().contains(&needle)
        });
    }

    // Most urgent first, then by SKU
    items.sort_by(|a, b| {
        a.stock_status()
            .cmp(&b.stock_status())
            .then_with(|| a.sku.cmp(&b.sku))
    });
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }

    let format = session.format(global);
    if print_structured(&items, format)? {
        return Ok(());
    }
    if items.is_empty() {
        if !global.quiet {
            println!("No inventory items found.");
        }
        return Ok(());
    }

    let rows = items
        .iter()
        .map(|i| {
            TableRow::new(i.id.to_string())
                .cell("sku", CellValue::Text(i.sku.clone()))
                .cell("name", CellValue::Text(i.name.clone()))
                .cell("category", CellValue::opt_text(i.category.as_deref()))
                .cell("on_hand", CellValue::Qty(i.quantity_on_hand))
                .cell("reorder_point", CellValue::Qty(i.reorder_point))
                .cell("unit", CellValue::Text(i.unit.clone()))
                .cell("status", CellValue::Status(i.stock_status().to_string()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "item").output(rows, format)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let vendor_id = match args.vendor.as_deref() {
        Some(v) => Some(find_vendor(&session.store, v)?.id),
        None => None,
    };

    let form = NewInventoryItem {
        sku: args.sku,
        name: args.name,
        category: args.category,
        quantity_on_hand: args.qty,
        reorder_point: args.reorder_point,
        reorder_quantity: args.reorder_qty,
        moq: args.moq,
        unit: args.unit,
        unit_cost: args.unit_cost,
        vendor_id,
        lead_time_days: args.lead_time,
    };
    let item = create_inventory_item(&mut session.store, &form)
        .map_err(|e| miette::miette!("{}", e))?;

    if global.format == OutputFormat::Id {
        println!("{}", item.id);
    } else if !global.quiet {
        println!(
            "{} Created item {} ({})",
            style("✓").green(),
            style(&item.sku).cyan(),
            style(&item.id).dim()
        );
    }
    backup_after_change(&session, global);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let item = find_item(&session.store, &args.item)?;

    let format = session.format(global);
    if print_structured(&item, format)? {
        return Ok(());
    }
    if format == OutputFormat::Id {
        println!("{}", item.id);
        return Ok(());
    }

    let currency = session.config.currency();
    let status = item.stock_status().to_string();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(&item.id).cyan());
    println!("{}: {}", style("SKU").bold(), style(&item.sku).yellow());
    println!("{}: {}", style("Name").bold(), item.name);
    if let Some(ref c) = item.category {
        println!("{}: {}", style("Category").bold(), c);
    }
    println!("{}: {}", style("Status").bold(), status_style(&status));
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "On hand: {} {}   Reorder at: {}   Reorder qty: {}",
        qty(item.quantity_on_hand),
        item.unit,
        qty(item.reorder_point),
        qty(item.reorder_quantity)
    );
    if let Some(moq) = item.moq {
        println!("MOQ: {}", qty(moq));
    }
    if let Some(cost) = item.unit_cost {
        print!("Unit cost: {}", money(cost, currency));
        if let Some(value) = item.stock_value() {
            print!("   Stock value: {}", money(value, currency));
        }
        println!();
    }
    if let Some(ref vendor_id) = item.vendor_id {
        let label = session
            .store
            .get::<Vendor>(&vendor_id.to_string())
            .ok()
            .flatten()
            .map(|v| v.name)
            .unwrap_or_else(|| vendor_id.to_string());
        println!("Vendor: {}", label);
    }
    if let Some(days) = item.lead_time_days {
        println!("Lead time: {} day(s)", days);
    }
    if item.seasonal_factors.is_some() {
        println!("Seasonal factors: set (see `murp heatmap {}`)", item.sku);
    }
    println!(
        "{}",
        style(format!("Updated {}", item.updated.format("%Y-%m-%d %H:%M"))).dim()
    );
    Ok(())
}

fn run_adjust(args: AdjustArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut item = find_item(&session.store, &args.item)?;

    let new_qty = match (args.by, args.to) {
        (Some(delta), None) => item.quantity_on_hand + delta,
        (None, Some(to)) => to,
        _ => return Err(miette::miette!("give either --by or --to")),
    };
    if new_qty < 0.0 {
        return Err(miette::miette!(
            "quantity on hand cannot go below zero (would be {})",
            qty(new_qty)
        ));
    }

    let before = item.stock_status();
    item.quantity_on_hand = new_qty;
    item.updated = Utc::now();
    session
        .store
        .update(&item)
        .map_err(|e| miette::miette!("{}", e))?;
    tracing::info!(sku = %item.sku, quantity = new_qty, "stock adjusted");

    if !global.quiet {
        let after = item.stock_status();
        println!(
            "{} {} now at {} {} ({})",
            style("✓").green(),
            style(&item.sku).cyan(),
            qty(new_qty),
            item.unit,
            status_style(&after.to_string())
        );
        if after != before && after.needs_reorder() {
            println!(
                "  {} consider {}",
                style("!").yellow(),
                style("murp po auto").yellow()
            );
        }
    }
    backup_after_change(&session, global);
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let mut item = find_item(&session.store, &args.item)?;

    if let Some(name) = args.name {
        if name.trim().is_empty() {
            return Err(miette::miette!("name cannot be empty"));
        }
        item.name = name.trim().to_string();
    }
    if let Some(category) = args.category {
        item.category = Some(category).filter(|c| !c.trim().is_empty());
    }
    for (field, value) in [
        ("reorder_point", args.reorder_point),
        ("reorder_qty", args.reorder_qty),
        ("moq", args.moq),
        ("unit_cost", args.unit_cost),
    ] {
        if value.is_some_and(|v| v < 0.0) {
            return Err(miette::miette!("{} cannot be negative", field));
        }
    }
    if let Some(v) = args.reorder_point {
        item.reorder_point = v;
    }
    if let Some(v) = args.reorder_qty {
        item.reorder_quantity = v;
    }
    if args.moq.is_some() {
        item.moq = args.moq;
    }
    if args.unit_cost.is_some() {
        item.unit_cost = args.unit_cost;
    }
    if let Some(v) = args.vendor.as_deref() {
        let vendor: EntityId = find_vendor(&session.store, v)?.id;
        item.vendor_id = Some(vendor);
    }
    if args.lead_time.is_some() {
        item.lead_time_days = args.lead_time;
    }
    if let Some(factors) = args.seasonal {
        crate::mrp::heatmap::SeasonalHeatmap::new(&factors)
            .map_err(|e| miette::miette!("{}", e))?;
        item.seasonal_factors = Some(factors);
    }

    item.updated = Utc::now();
    session
        .store
        .update(&item)
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Updated {}", style("✓").green(), style(&item.sku).cyan());
    }
    backup_after_change(&session, global);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    let item = find_item(&session.store, &args.item)?;

    if !crate::cli::helpers::confirm(&format!("Delete {} ({})?", item.sku, item.name), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }
    session
        .store
        .delete::<InventoryItem>(&item.id.to_string())
        .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Deleted {}", style("✓").green(), style(&item.sku).cyan());
    }
    backup_after_change(&session, global);
    Ok(())
}
