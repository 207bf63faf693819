//! Generate command implementation

use crate::settings;
use anyhow::{Context, Result};
use clap::Args;
use sqlc2proto_core::{FieldStyle, GenerationReport, Generator, GeneratorConfig, detect_go_module};
use std::path::{Path, PathBuf};

/// Flags of `sqlc2proto generate`. Each one overrides the config file.
#[derive(Debug, Default, Args)]
pub struct GenerateArgs {
    /// Directory containing the sqlc-generated Go code
    #[arg(long)]
    pub sqlc_dir: Option<PathBuf>,

    /// Output directory for the generated files
    #[arg(long)]
    pub proto_dir: Option<PathBuf>,

    /// Protobuf package name (e.g. api.v1)
    #[arg(long)]
    pub package: Option<String>,

    /// go_package option of the generated files
    #[arg(long)]
    pub go_package: Option<String>,

    /// Go module path (default: read from go.mod)
    #[arg(long)]
    pub module: Option<String>,

    /// Import path of the protoc-generated Go code used by the mappers
    #[arg(long)]
    pub proto_go_import: Option<String>,

    /// Generate Go mapper functions
    #[arg(long)]
    pub with_mappers: bool,

    /// Generate service definitions from the Querier interface
    #[arg(long)]
    pub with_services: bool,

    /// Field naming style: original, snake_case or json
    #[arg(long)]
    pub field_style: Option<String>,

    /// Includes file selecting models and queries
    #[arg(long)]
    pub include_file: Option<PathBuf>,

    /// Show what would be written without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut GeneratorConfig) -> Result<()> {
        if let Some(dir) = &self.sqlc_dir {
            config.sqlc_dir = dir.clone();
        }
        if let Some(dir) = &self.proto_dir {
            config.proto_dir = dir.clone();
        }
        if let Some(package) = &self.package {
            config.proto_package = package.clone();
        }
        if let Some(go_package) = &self.go_package {
            config.go_package = Some(go_package.clone());
        }
        if let Some(module) = &self.module {
            config.module_name = Some(module.clone());
        }
        if let Some(import) = &self.proto_go_import {
            config.proto_go_import = Some(import.clone());
        }
        if self.with_mappers {
            config.with_mappers = true;
        }
        if self.with_services {
            config.with_services = true;
        }
        if let Some(style) = &self.field_style {
            config.field_style = style.parse::<FieldStyle>()?;
        }
        if let Some(file) = &self.include_file {
            config.include_file = Some(file.clone());
        }
        Ok(())
    }
}

pub fn run(dir: &Path, config_path: Option<&Path>, args: &GenerateArgs) -> Result<GenerationReport> {
    let mut config = settings::load(dir, config_path)?.config;
    args.apply(&mut config)?;
    let go_module = detect_go_module(dir)?;

    println!("Generating from {}", config.sqlc_dir.display());

    let generator = Generator::new(config)
        .context("Invalid configuration")?
        .with_go_module(go_module)
        .with_dry_run(args.dry_run);
    let report = generator.run().context("Generation failed")?;

    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &GenerationReport) {
    let verb = if report.dry_run { "Would write" } else { "Wrote" };
    for path in &report.written {
        println!("{verb} {}", path.display());
    }

    println!(
        "\nMessages: {}  Queries: {}  Services: {}",
        report.messages, report.queries, report.services
    );
    if !report.dependency_additions.is_empty() {
        println!(
            "Included as dependencies: {}",
            report.dependency_additions.join(", ")
        );
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}
