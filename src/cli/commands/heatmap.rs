//! `murp heatmap` command - Seasonal demand grid

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::commands::inv::find_item;
use crate::cli::helpers::{print_structured, Session};
use crate::cli::GlobalOpts;
use crate::core::store::RecordStoreExt;
use crate::entities::InventoryItem;
use crate::mrp::heatmap::SeasonalHeatmap;

#[derive(clap::Args, Debug)]
pub struct HeatmapArgs {
    /// Item SKU or ID whose stored factors to draw
    #[arg(conflicts_with = "factors")]
    pub item: Option<String>,

    /// Twelve comma-separated monthly factors, January first
    #[arg(long, value_delimiter = ',')]
    pub factors: Vec<f64>,
}

#[derive(Serialize)]
struct HeatmapView<'a> {
    label: &'a str,
    months: Vec<MonthCell>,
    peak_months: Vec<&'static str>,
}

#[derive(Serialize)]
struct MonthCell {
    month: &'static str,
    factor: f64,
    intensity: String,
}

fn draw(label: &str, heatmap: &SeasonalHeatmap, global: &GlobalOpts, session: Option<&Session>) -> Result<()> {
    let format = match session {
        Some(s) => s.format(global),
        None => global.format,
    };
    let view = HeatmapView {
        label,
        months: heatmap
            .cells()
            .map(|(month, factor, intensity)| MonthCell {
                month,
                factor,
                intensity: intensity.to_string(),
            })
            .collect(),
        peak_months: heatmap.peak_months(),
    };
    if print_structured(&view, format)? {
        return Ok(());
    }

    println!("{}", style(label).bold());
    println!("{}", heatmap.render());
    let peaks = heatmap.peak_months();
    if !peaks.is_empty() {
        println!("{}: {}", style("Peak").dim(), peaks.join(", "));
    }
    Ok(())
}

pub fn run(args: HeatmapArgs, global: &GlobalOpts) -> Result<()> {
    if !args.factors.is_empty() {
        let heatmap = SeasonalHeatmap::new(&args.factors).map_err(|e| miette::miette!("{}", e))?;
        return draw("Seasonal factors", &heatmap, global, None);
    }

    let session = Session::open(global)?;
    let items: Vec<InventoryItem> = match args.item {
        Some(ref q) => vec![find_item(&session.store, q)?],
        None => session.store.list().map_err(|e| miette::miette!("{}", e))?,
    };

    let mut drawn = 0;
    for item in &items {
        let Some(ref factors) = item.seasonal_factors else {
            if args.item.is_some() {
                return Err(miette::miette!(
                    "{} has no seasonal factors; set them with 'murp inv set {} --seasonal ...'",
                    item.sku,
                    item.sku
                ));
            }
            continue;
        };
        let heatmap = SeasonalHeatmap::new(factors).map_err(|e| miette::miette!("{}: {}", item.sku, e))?;
        if drawn > 0 {
            println!();
        }
        draw(&format!("{} {}", item.sku, item.name), &heatmap, global, Some(&session))?;
        drawn += 1;
    }
    if drawn == 0 && !global.quiet {
        println!("No items have seasonal factors.");
    }
    Ok(())
}
