//! CLI interface for flow-tape
//!
//! Provides subcommands for:
//! - `run`: Stream flow into the table and the CSV tape
//! - `export`: Write the current CSV tape to a file or stdout
//! - `tail`: Show the last rows of the CSV tape
//! - `config`: Show configuration

mod export;
mod run;
mod tail;
mod view;

pub use export::ExportArgs;
pub use run::RunArgs;
pub use tail::TailArgs;
pub use view::render_rows;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "flow-tape")]
#[command(about = "Real-time options flow recorder")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream flow into the table and the CSV tape
    Run(RunArgs),
    /// Export the CSV tape
    Export(ExportArgs),
    /// Show the last rows of the CSV tape
    Tail(TailArgs),
    /// Show configuration
    Config,
}
