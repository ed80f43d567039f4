//! linetiles CLI
//!
//! Shows hit-count gutters for a recorded run, fetched tile by tile.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::annotate::AnnotateArgs;
use commands::config::ConfigCommands;
use commands::sources::SourcesArgs;

#[derive(Parser)]
#[command(name = "linetiles")]
#[command(version = linetiles::VERSION)]
#[command(about = "Hit-count gutters for recorded runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the gutter marks of a source's lines
    Annotate(AnnotateArgs),

    /// List the sources of a recording
    Sources(SourcesArgs),

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Annotate(args) => commands::annotate::run(args),
        Commands::Sources(args) => commands::sources::run(args),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
