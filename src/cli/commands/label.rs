//! `murp label` command - Compare label ingredients against a BOM

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::commands::artwork::find_artwork;
use crate::cli::commands::bom::find_bom;
use crate::cli::helpers::{print_structured, Session};
use crate::cli::GlobalOpts;
use crate::mrp::label::{compare, NormalizedComparator};

#[derive(clap::Args, Debug)]
pub struct LabelArgs {
    /// BOM ID, unique prefix, or finished SKU
    pub bom: String,

    /// Use the ingredients extracted from this artwork
    #[arg(long, conflicts_with_all = ["file", "ingredients"])]
    pub artwork: Option<String>,

    /// Text file with one label ingredient per line
    #[arg(long, conflicts_with = "ingredients")]
    pub file: Option<PathBuf>,

    /// Label ingredients in printed order
    #[arg(value_delimiter = ',')]
    pub ingredients: Vec<String>,
}

pub fn run(args: LabelArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let bom = find_bom(&session.store, &args.bom)?;

    let label: Vec<String> = if let Some(ref id) = args.artwork {
        find_artwork(&session.store, id)?.extracted_ingredients
    } else if let Some(ref path) = args.file {
        fs::read_to_string(path)
            .into_diagnostic()?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        args.ingredients
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };
    if label.is_empty() {
        return Err(miette::miette!(
            "no label ingredients; pass them as arguments, --file or --artwork"
        ));
    }

    let result = compare(&NormalizedComparator, &label, &bom.components);
    if print_structured(&result, session.format(global))? {
        return Ok(());
    }

    println!(
        "{} vs {} ({} label / {} BOM)",
        style("Label").bold(),
        style(&bom.name).yellow(),
        label.len(),
        bom.components.len()
    );
    println!("{}", style("─".repeat(60)).dim());
    for m in &result.matched {
        println!(
            "  {} {} {}",
            style("✓").green(),
            m.label_name,
            style(format!("= {} ({})", m.component_name, m.sku)).dim()
        );
    }
    for name in &result.missing_from_label {
        println!("  {} {} {}", style("✗").red(), name, style("missing from label").red());
    }
    for name in &result.missing_from_bom {
        println!("  {} {} {}", style("?").yellow(), name, style("not in BOM").yellow());
    }
    println!();
    if result.order_matches {
        println!("{} Label matches the BOM, in order", style("✓").green());
    } else if result.missing_from_label.is_empty() && result.missing_from_bom.is_empty() {
        println!("{} Same ingredients, different order", style("!").yellow());
    } else {
        println!("{} Label and BOM differ", style("✗").red());
    }
    Ok(())
}
