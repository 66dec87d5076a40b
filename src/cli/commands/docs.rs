//! `murp docs` command - Library documentation lookup

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{print_structured, truncate_str, Session};
use crate::cli::GlobalOpts;
use crate::integrations::docs_search::{self, CachedDocs, HttpDocsService};

#[derive(Subcommand, Debug)]
pub enum DocsCommands {
    /// Find libraries by name
    Search(SearchArgs),

    /// Fetch documentation for a library
    Get(GetArgs),

    /// Recent lookups, newest first
    History,

    /// Drop cached documentation
    ClearCache,

    /// Forget the lookup history
    ClearHistory,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    pub library: String,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Library name, or an ID starting with '/'
    pub library: String,

    /// Narrow to a topic
    #[arg(long)]
    pub topic: Option<String>,
}

pub fn run(cmd: DocsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DocsCommands::Search(args) => run_search(args, global),
        DocsCommands::Get(args) => run_get(args, global),
        DocsCommands::History => run_history(global),
        DocsCommands::ClearCache => {
            let session = Session::open(global)?;
            let mut storage = session.local_storage();
            docs_search::clear_cache(&mut storage).map_err(|e| miette::miette!("{}", e))?;
            if !global.quiet {
                println!("{} Documentation cache cleared", style("✓").green());
            }
            Ok(())
        }
        DocsCommands::ClearHistory => {
            let session = Session::open(global)?;
            let mut storage = session.local_storage();
            docs_search::clear_history(&mut storage).map_err(|e| miette::miette!("{}", e))?;
            if !global.quiet {
                println!("{} Lookup history cleared", style("✓").green());
            }
            Ok(())
        }
    }
}

fn run_search(args: SearchArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let service = HttpDocsService::from_config(&session.config).map_err(|e| miette::miette!("{}", e))?;
    let mut storage = session.local_storage();
    let docs = CachedDocs::new(&service, &mut storage, session.config.docs_cache_ttl_hours());
    let matches = docs.search(&args.library).map_err(|e| miette::miette!("{}", e))?;

    if print_structured(&matches, session.format(global))? {
        return Ok(());
    }
    if matches.is_empty() {
        println!("No libraries match '{}'.", args.library);
        return Ok(());
    }
    for m in &matches {
        let trust = m
            .trust_score
            .map(|t| format!(" trust {:.1}", t))
            .unwrap_or_default();
        println!("{} {}{}", style(&m.id).cyan(), m.title, style(trust).dim());
        if let Some(ref d) = m.description {
            println!("    {}", style(truncate_str(d, 90)).dim());
        }
    }
    Ok(())
}

fn run_get(args: GetArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let service = HttpDocsService::from_config(&session.config).map_err(|e| miette::miette!("{}", e))?;
    let mut storage = session.local_storage();
    let mut docs = CachedDocs::new(&service, &mut storage, session.config.docs_cache_ttl_hours());
    let lookup = docs
        .lookup(&args.library, args.topic.as_deref())
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        let source = if lookup.from_cache { "cached" } else { "fetched" };
        eprintln!("{} {} ({})", style("#").dim(), style(&lookup.library_id).cyan(), source);
    }
    println!("{}", lookup.content);
    Ok(())
}

fn run_history(global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let storage = session.local_storage();
    let entries = docs_search::history(&storage);

    if print_structured(&entries, session.format(global))? {
        return Ok(());
    }
    if entries.is_empty() {
        println!("No lookups yet.");
        return Ok(());
    }
    for e in &entries {
        let topic = e.topic.as_deref().map(|t| format!(" #{}", t)).unwrap_or_default();
        println!(
            "{} {} {}{}",
            style(e.at.format("%Y-%m-%d %H:%M")).dim(),
            e.library,
            style(&e.library_id).cyan(),
            topic
        );
    }
    Ok(())
}
