//! Getincludes command implementation
//!
//! Lists every model (and every query when services are enabled) in an
//! includes file with each entry commented out, ready for hand-picking.

use crate::settings;
use anyhow::{Context, Result};
use sqlc2proto_core::config::DEFAULT_INCLUDES_FILE;
use sqlc2proto_core::includes::write_template;
use sqlc2proto_core::{GeneratorConfig, WalkOptions, parse_querier, walk_models};
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn run(
    dir: &Path,
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    force: bool,
) -> Result<PathBuf> {
    let config = settings::load(dir, config_path)?.config;
    let output = output
        .or_else(|| config.include_file().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INCLUDES_FILE));
    let path = dir.join(output);

    if path.exists() && !force {
        anyhow::bail!(
            "Includes file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    let (models, queries) = collect_names(&config)?;
    write_template(&path, &models, &queries, true)
        .with_context(|| format!("Failed to write includes file: {}", path.display()))?;

    println!("Created {}", path.display());
    println!("Models: {}  Queries: {}", models.len(), queries.len());
    println!("\nUncomment the entries to generate, then point includeFile at this file.");

    Ok(path)
}

/// Message and query names found in the sqlc directory.
fn collect_names(config: &GeneratorConfig) -> Result<(Vec<String>, Vec<String>)> {
    let table = config.type_table();
    let options = WalkOptions {
        style: config.field_style,
        proto_package: &config.proto_package,
        table: &table,
    };
    let models = walk_models(&config.sqlc_dir, &options)?
        .into_iter()
        .map(|m| m.name)
        .collect();

    let mut queries = Vec::new();
    if config.with_services {
        match parse_querier(&config.sqlc_dir) {
            Ok(found) => queries = found.into_iter().map(|q| q.name).collect(),
            Err(e) if e.is_recoverable() => warn!("{e}; listing models only"),
            Err(e) => return Err(e.into()),
        }
    }

    Ok((models, queries))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use sqlc2proto_core::IncludesSet;
    use tempfile::TempDir;

    const MODELS: &str = r#"package db

type Author struct {
	ID int64
}

type Book struct {
	ID       int64
	AuthorID int64
}
"#;

    const QUERIER: &str = r#"package db

import "context"

type Querier interface {
	GetAuthor(ctx context.Context, id int64) (Author, error)
	ListBooks(ctx context.Context) ([]Book, error)
}
"#;

    fn project(with_services: bool) -> TempDir {
        let dir = TempDir::new().unwrap();
        let sqlc = dir.path().join("db");
        std::fs::create_dir_all(&sqlc).unwrap();
        std::fs::write(sqlc.join("models.go"), MODELS).unwrap();
        std::fs::write(sqlc.join("querier.go"), QUERIER).unwrap();
        let config = format!(
            "sqlcDir: \"{}\"\nwithServices: {with_services}\n",
            sqlc.display()
        );
        std::fs::write(dir.path().join("sqlc2proto.yaml"), config).unwrap();
        dir
    }

    #[test]
    fn run___lists_models_and_queries_commented() {
        let dir = project(true);

        let path = run(dir.path(), None, None, false).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(path, dir.path().join(DEFAULT_INCLUDES_FILE));
        assert_eq!(
            text,
            "models:\n# - Author\n# - Book\n\nqueries:\n# - GetAuthor\n# - ListBooks\n"
        );
        assert!(IncludesSet::from_yaml(&text).unwrap().is_empty());
    }

    #[test]
    fn run___services_disabled___models_only() {
        let dir = project(false);

        let path = run(dir.path(), None, Some(PathBuf::from("picked.yaml")), false).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "models:\n# - Author\n# - Book\n\nqueries:\n");
    }

    #[test]
    fn run___existing_file___needs_force() {
        let dir = project(false);
        let existing = dir.path().join(DEFAULT_INCLUDES_FILE);
        std::fs::write(&existing, "models:\n- Author\n").unwrap();

        let err = run(dir.path(), None, None, false).unwrap_err();
        assert!(err.to_string().contains("--force"));

        run(dir.path(), None, None, true).unwrap();
        let text = std::fs::read_to_string(&existing).unwrap();
        assert!(text.contains("# - Book"));
    }
}
