//! sqlc2proto CLI - Protocol Buffer generator for sqlc projects
//!
//! Commands:
//! - `sqlc2proto generate` - Generate `.proto` schemas, mappers and services
//! - `sqlc2proto init` - Write a commented `sqlc2proto.yaml`
//! - `sqlc2proto getincludes` - Write an includes file listing every model and query
//! - `sqlc2proto check` - Verify the generated files and the protoc output exist

use clap::{Parser, Subcommand};
use sqlc2proto_logging::{LogLevel, init_logging};
use std::path::PathBuf;

mod check;
mod generate;
mod getincludes;
mod init;
mod settings;

#[derive(Parser)]
#[command(name = "sqlc2proto")]
#[command(author, version, about = "Generate Protocol Buffers from sqlc models", long_about = None)]
struct Cli {
    /// Config file (default: sqlc2proto.yaml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Protocol Buffer definitions from sqlc models
    Generate(generate::GenerateArgs),

    /// Create a commented sqlc2proto.yaml
    Init {
        /// Output path
        #[arg(short, long, default_value = "sqlc2proto.yaml")]
        output: PathBuf,
    },

    /// Write an includes file listing every model and query, commented out
    Getincludes {
        /// Output path (default: includeFile from the config, else sqlc2proto.includes.yaml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Check that the mappers, models.proto and models.pb.go exist
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LogLevel::from_flags(cli.verbose, cli.quiet));

    let cwd = std::env::current_dir()?;
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Generate(args) => {
            generate::run(&cwd, config, &args)?;
        }
        Commands::Init { output } => {
            init::run(&cwd, &output)?;
        }
        Commands::Getincludes { output, force } => {
            getincludes::run(&cwd, config, output, force)?;
        }
        Commands::Check => {
            check::run(&cwd, config)?;
        }
    }

    Ok(())
}
