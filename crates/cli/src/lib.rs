pub mod commands;
pub mod http;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::submit::SubmitArgs;
use crate::commands::{DatasetArgs, FilterArgs};

#[derive(Debug, Parser)]
#[command(
    name = "rfmgrid",
    about = "RFM segmentation operator CLI",
    long_about = "Score customer datasets, inspect the 5x5 frequency/monetary grid, and submit selections.",
    after_help = "Examples:\n  rfmgrid score --source synthetic --seed 7\n  rfmgrid grid --frequency-max 20\n  rfmgrid submit --cell 5-5 --offline"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Score every customer of a data source")]
    Score {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Show customer counts per frequency/monetary grid cell")]
    Grid {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Select customers by id or grid cell and submit them to the selection endpoint")]
    Submit(SubmitArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Score { dataset, json } => commands::score::run(&dataset, json),
        Command::Grid { dataset, filters, json } => commands::grid::run(&dataset, &filters, json),
        Command::Submit(args) => commands::submit::run(&args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
