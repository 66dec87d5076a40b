//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod helpers;
pub mod table;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};

use miette::Result;

/// Dispatch a parsed command
pub fn run(command: Commands, global: &GlobalOpts) -> Result<()> {
    use commands::*;

    match command {
        Commands::Init(args) => init::run(args),
        Commands::Inv(cmd) => inv::run(cmd, global),
        Commands::Vendor(cmd) => vendor::run(cmd, global),
        Commands::Bom(cmd) => bom::run(cmd, global),
        Commands::Po(cmd) => po::run(cmd, global),
        Commands::Match(cmd) => matching::run(cmd, global),
        Commands::Label(args) => label::run(args, global),
        Commands::Artwork(cmd) => artwork::run(cmd, global),
        Commands::Heatmap(args) => heatmap::run(args, global),
        Commands::Reg(cmd) => reg::run(cmd, global),
        Commands::Compliance(cmd) => compliance::run(cmd, global),
        Commands::Activity(cmd) => activity::run(cmd, global),
        Commands::Settings(cmd) => settings::run(cmd, global),
        Commands::Google(cmd) => google::run(cmd, global),
        Commands::Docs(cmd) => docs::run(cmd, global),
        Commands::Completions(args) => completions::run(args),
    }
}
