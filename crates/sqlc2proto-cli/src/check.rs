//! Check command implementation

use crate::settings;
use anyhow::Result;
use sqlc2proto_core::pipeline::{MAPPERS_DIR, MAPPERS_FILE, MODELS_FILE};
use sqlc2proto_core::{GeneratorConfig, detect_go_module};
use std::path::Path;

/// protoc-gen-go output for `models.proto`.
const MODELS_PB_GO: &str = "models.pb.go";

/// Verify that the mappers can import the protoc output.
///
/// Returns the import path the mappers use.
pub fn verify(config: &GeneratorConfig, go_module: Option<&str>) -> Result<String> {
    if !config.with_mappers {
        anyhow::bail!(
            "Mapper generation is not enabled; pass --with-mappers or set `withMappers: true`"
        );
    }

    let proto_dir = &config.proto_dir;
    let required = [
        (
            proto_dir.join(MAPPERS_DIR).join(MAPPERS_FILE),
            "Run `sqlc2proto generate` first",
        ),
        (proto_dir.join(MODELS_FILE), "Run `sqlc2proto generate` first"),
        (
            proto_dir.join(MODELS_PB_GO),
            "Run `buf generate` (or protoc) to produce the Go code",
        ),
    ];
    for (path, hint) in &required {
        if !path.is_file() {
            anyhow::bail!("{} not found. {hint}", path.display());
        }
        println!("✓ {}", path.display());
    }

    Ok(config.proto_import(&config.resolve_go_package(go_module)))
}

pub fn run(dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = settings::load(dir, config_path)?.config;
    let go_module = detect_go_module(dir)?;

    let import = verify(&config, go_module.as_deref())?;

    println!("\nVerification successful!");
    println!("Import path: {import}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use tempfile::TempDir;

    fn config(dir: &Path) -> GeneratorConfig {
        GeneratorConfig {
            proto_dir: dir.join("proto"),
            with_mappers: true,
            ..GeneratorConfig::default()
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn verify___mappers_disabled___error() {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path());
        config.with_mappers = false;

        let err = verify(&config, None).unwrap_err();

        assert!(err.to_string().contains("withMappers"));
    }

    #[test]
    fn verify___missing_pb_go___points_at_buf() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("proto/mappers/mappers.go"));
        touch(&dir.path().join("proto/models.proto"));

        let err = verify(&config(dir.path()), None).unwrap_err();

        assert!(err.to_string().contains("models.pb.go not found"));
        assert!(err.to_string().contains("buf generate"));
    }

    #[test]
    fn verify___all_present___import_path() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("proto/mappers/mappers.go"));
        touch(&dir.path().join("proto/models.proto"));
        touch(&dir.path().join("proto/models.pb.go"));
        let mut config = config(dir.path());

        assert_eq!(
            verify(&config, Some("example.com/shop")).unwrap(),
            "example.com/shop/proto"
        );
        config.proto_go_import = Some("example.com/shop/gen/pb".to_string());
        assert_eq!(
            verify(&config, Some("example.com/shop")).unwrap(),
            "example.com/shop/gen/pb"
        );
    }
}
