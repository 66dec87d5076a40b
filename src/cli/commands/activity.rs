//! `murp activity` command - The activity stream

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{print_structured, Session};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::activity::Severity;
use crate::entities::AgentActivity;
use crate::mrp::activity::{self, ActivityPoller, DEFAULT_POLL_INTERVAL};

#[derive(Subcommand, Debug)]
pub enum ActivityCommands {
    /// Show the most recent entries
    List(ListArgs),

    /// Add an entry
    Log(LogArgs),

    /// Print new entries as they arrive
    Watch(WatchArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,

    /// Only this severity
    #[arg(long, value_enum)]
    pub severity: Option<Severity>,
}

#[derive(clap::Args, Debug)]
pub struct LogArgs {
    pub action: String,

    /// Agent name (default: configured author)
    #[arg(long)]
    pub agent: Option<String>,

    #[arg(long)]
    pub details: Option<String>,

    #[arg(long, value_enum, default_value_t = Severity::Info)]
    pub severity: Severity,
}

#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    /// Replay the last N entries before waiting for new ones
    #[arg(long, default_value_t = 5)]
    pub backlog: usize,

    /// Stop after this many polls (0 = run until interrupted)
    #[arg(long, default_value_t = 0)]
    pub polls: usize,
}

pub fn run(cmd: ActivityCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ActivityCommands::List(args) => run_list(args, global),
        ActivityCommands::Log(args) => run_log(args, global),
        ActivityCommands::Watch(args) => run_watch(args, global),
    }
}

fn print_entry(entry: &AgentActivity) {
    let sev = match entry.severity {
        Severity::Info => style("info").dim(),
        Severity::Warning => style("warn").yellow(),
        Severity::Error => style("error").red().bold(),
    };
    println!(
        "{} {:<5} {} {}",
        style(entry.created.format("%Y-%m-%d %H:%M:%S")).dim(),
        sev,
        style(&entry.agent).cyan(),
        entry.action
    );
    if let Some(ref details) = entry.details {
        println!("{}{}", " ".repeat(26), style(details).dim());
    }
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("created", "WHEN", 16),
    ColumnDef::new("severity", "SEVERITY", 8),
    ColumnDef::new("agent", "AGENT", 14),
    ColumnDef::new("action", "ACTION", 40),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let mut entries = match args.severity {
        None => activity::recent(&session.store, args.limit),
        Some(_) => activity::recent(&session.store, usize::MAX),
    }
    .map_err(|e| miette::miette!("{}", e))?;
    if let Some(sev) = args.severity {
        entries.retain(|e| e.severity == sev);
        entries.truncate(args.limit);
    }

    let format = session.format(global);
    if print_structured(&entries, format)? {
        return Ok(());
    }
    if entries.is_empty() {
        if !global.quiet {
            println!("No activity yet.");
        }
        return Ok(());
    }
    if format == OutputFormat::Auto {
        for entry in &entries {
            print_entry(entry);
        }
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|e| {
            TableRow::new(e.id.to_string())
                .cell("created", CellValue::Date(e.created))
                .cell("severity", CellValue::Status(e.severity.to_string()))
                .cell("agent", CellValue::Text(e.agent.clone()))
                .cell("action", CellValue::Text(e.action.clone()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "entry").output(rows, format)
}

fn run_log(args: LogArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;
    if args.action.trim().is_empty() {
        return Err(miette::miette!("action text is required"));
    }
    let agent = args.agent.unwrap_or_else(|| session.config.author());
    let entry = activity::log(
        &mut session.store,
        &agent,
        args.action.trim(),
        args.details.as_deref(),
        args.severity,
    )
    .map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!("{} Logged {}", style("✓").green(), style(&entry.id).dim());
    }
    Ok(())
}

fn run_watch(args: WatchArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;

    let backlog = activity::recent(&session.store, args.backlog).map_err(|e| miette::miette!("{}", e))?;
    for entry in backlog.iter().rev() {
        print_entry(entry);
    }
    let mut poller = ActivityPoller::new(DEFAULT_POLL_INTERVAL);
    if backlog.is_empty() {
        poller = poller.starting_after(chrono::Utc::now());
    } else {
        poller.mark_seen(&backlog);
    }

    if !global.quiet {
        eprintln!(
            "{}",
            style(format!(
                "Watching for new activity every {}s (Ctrl-C to stop)",
                poller.interval().as_secs()
            ))
            .dim()
        );
    }

    let mut polls = 0;
    loop {
        std::thread::sleep(poller.interval());
        // A failed poll is reported and the next tick tries again
        match poller.poll(&session.store) {
            Ok(fresh) => fresh.iter().for_each(print_entry),
            Err(e) => eprintln!("{} {}", style("error:").red(), e),
        }
        polls += 1;
        if args.polls > 0 && polls >= args.polls {
            break;
        }
    }
    Ok(())
}
