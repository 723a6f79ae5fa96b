//! Main entry point for the rigkit CLI

mod cli;
mod commands;
mod utils;

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use std::io;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set verbosity
    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    let settings = utils::load_settings(cli.config.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Info { file } => commands::info::execute(&file, &settings),
        Commands::Tree {
            file,
            depth,
            no_color,
            metadata,
        } => commands::tree::execute(&file, depth, no_color, metadata, &settings),
        Commands::Pose {
            file,
            time,
            end_policy,
            json,
        } => commands::pose::execute(&file, time, end_policy, json, &settings),
        Commands::Validate { file } => commands::validate::execute(&file, &settings),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
