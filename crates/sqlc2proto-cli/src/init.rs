//! Init command implementation

use anyhow::{Context, Result};
use sqlc2proto_core::emit::writer::write_atomic;
use sqlc2proto_core::{GeneratorConfig, detect_go_module};
use std::path::{Path, PathBuf};

/// Write the commented default config to `output`, resolved against `dir`.
pub fn run(dir: &Path, output: &Path) -> Result<PathBuf> {
    let path = dir.join(output);
    if path.exists() {
        anyhow::bail!(
            "Config file already exists: {} (remove it or pick another --output)",
            path.display()
        );
    }

    let module = detect_go_module(dir)?;
    let config = GeneratorConfig::for_init(module.as_deref());
    let text = config.render_commented()?;
    write_atomic(&path, &text)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;

    println!("Created {}", path.display());
    match module {
        Some(module) => println!("Go module: {module}"),
        None => println!("No go.mod found; set moduleName and goPackage before generating"),
    }
    println!("\nNext steps:");
    println!("  1. Review the settings in {}", output.display());
    println!("  2. Run: sqlc2proto generate");

    Ok(path)
}
