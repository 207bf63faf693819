//! Config file lookup shared by every command

use anyhow::{Context, Result};
use sqlc2proto_core::GeneratorConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A loaded config and the file it came from, if any.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: GeneratorConfig,
    pub source: Option<PathBuf>,
}

/// Load `explicit`, else the first config file found in `dir`, else the defaults.
///
/// An explicit path that does not exist is an error; a missing discovered
/// file is not.
pub fn load(dir: &Path, explicit: Option<&Path>) -> Result<LoadedConfig> {
    let source = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => GeneratorConfig::discover(dir),
    };

    let Some(path) = source else {
        debug!(dir = %dir.display(), "no config file found, using defaults");
        return Ok(LoadedConfig {
            config: GeneratorConfig::default(),
            source: None,
        });
    };

    let config = GeneratorConfig::load(&path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    info!(path = %path.display(), "using config file");

    Ok(LoadedConfig {
        config,
        source: Some(path),
    })
}
