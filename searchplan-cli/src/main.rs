use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod overrides;

use commands::SearchArgs;
use config::Config;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "searchplan")]
#[command(about = "searchplan - Multi-stage sequence search planner")]
#[command(version)]
#[command(long_about = "
searchplan classifies the query and target databases, picks the matching search
pipeline (plain, target-profile, sliced target-profile, iterative profile, or a
translated wrapper around one of them), derives every stage's parameters and
runs the generated workflow script in a per-invocation working directory.

Examples:
  searchplan search queryDB targetDB resultDB tmp -s 7.5
  searchplan search queryDB profileDB resultDB tmp --slice-search
  searchplan plan queryDB targetDB resultDB tmp --num-iterations 3 --output plan.json
  searchplan config --example > searchplan.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan the search and run the generated workflow in place of this process
    Search(SearchArgs),

    /// Prepare the working directory and print the execution plan as JSON
    Plan {
        #[command(flatten)]
        args: SearchArgs,

        /// Write the plan to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print or write an example configuration file
    Config {
        /// Print the example configuration
        #[arg(long)]
        example: bool,

        /// Write the example configuration to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Search(args) => commands::search::execute(&config, args)?,
        Commands::Plan { args, output } => commands::plan::execute(&config, args, output)?,
        Commands::Config { example, output } => commands::config::execute(example, output)?,
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => print_error_and_exit(cli_err),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}
