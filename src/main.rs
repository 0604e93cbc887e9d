mod cli;
mod commands;
mod config;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use fleetkit::PowerAction;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub profile: Option<String>,
    pub region: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        profile: cli.profile.clone(),
        region: cli.region.clone(),
    };

    match cli.command {
        Command::List(args) => commands::list::run(&ctx, args),
        Command::Start(args) => commands::power::run(&ctx, PowerAction::Start, args),
        Command::Stop(args) => commands::power::run(&ctx, PowerAction::Stop, args),
        Command::Doctor => commands::doctor::run(&ctx),
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "corral", &mut io::stdout());
            Ok(())
        }
    }
}
