//! Integration tests for the sqlc2proto binary
//!
//! Each test runs the compiled binary in a scratch project directory.

#![allow(non_snake_case)]

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const MODELS: &str = r#"package db

import "database/sql"

type Author struct {
	ID   int64          `json:"id"`
	Name string         `json:"name"`
	Bio  sql.NullString `json:"bio"`
}
"#;

const QUERIER: &str = r#"package db

import "context"

type Querier interface {
	GetAuthor(ctx context.Context, id int64) (Author, error)
	ListAuthors(ctx context.Context) ([]Author, error)
}
"#;

fn sqlc2proto(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlc2proto"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let sqlc = dir.path().join("db/sqlc");
    std::fs::create_dir_all(&sqlc).unwrap();
    std::fs::write(sqlc.join("models.go"), MODELS).unwrap();
    std::fs::write(sqlc.join("querier.go"), QUERIER).unwrap();
    std::fs::write(dir.path().join("go.mod"), "module example.com/shop\n").unwrap();
    dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ============================================================================
// init
// ============================================================================

mod init {
    use super::*;

    #[test]
    fn init___writes_config_then_refuses_second_run() {
        let dir = project();

        let first = sqlc2proto(dir.path(), &["init"]);
        let second = sqlc2proto(dir.path(), &["init"]);

        assert!(first.status.success());
        let text = std::fs::read_to_string(dir.path().join("sqlc2proto.yaml")).unwrap();
        assert!(text.contains("moduleName: \"example.com/shop\""));
        assert!(!second.status.success());
        assert!(String::from_utf8_lossy(&second.stderr).contains("already exists"));
    }
}

// ============================================================================
// generate
// ============================================================================

mod generate {
    use super::*;

    #[test]
    fn generate___init_config___models_mappers_and_services() {
        let dir = project();
        assert!(sqlc2proto(dir.path(), &["init"]).status.success());

        let output = sqlc2proto(
            dir.path(),
            &["generate", "--with-mappers", "--with-services", "--package", "shop.v1"],
        );

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let proto_dir = dir.path().join("proto/gen");
        let models = std::fs::read_to_string(proto_dir.join("models.proto")).unwrap();
        let service = std::fs::read_to_string(proto_dir.join("service.proto")).unwrap();
        assert!(models.contains("package shop.v1;"));
        assert!(models.contains("option go_package = \"example.com/shop/proto\";"));
        assert!(service.contains("service AuthorService {"));
        assert!(proto_dir.join("mappers/mappers.go").is_file());
        assert!(stdout(&output).contains("Services: 1"));
    }

    #[test]
    fn generate___dry_run___reports_paths_only() {
        let dir = project();

        let output = sqlc2proto(dir.path(), &["generate", "--dry-run"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("Would write"));
        assert!(!dir.path().join("proto").exists());
    }

    #[test]
    fn generate___bad_field_style___fails() {
        let dir = project();

        let output = sqlc2proto(dir.path(), &["generate", "--field-style", "kebab"]);

        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("unknown field style"));
    }

    #[test]
    fn generate___explicit_config_flag() {
        let dir = project();
        std::fs::write(dir.path().join("other.yaml"), "protoPackage: other.v9\nprotoDir: out\n").unwrap();

        let output = sqlc2proto(dir.path(), &["--config", "other.yaml", "generate"]);

        assert!(output.status.success());
        let models = std::fs::read_to_string(dir.path().join("out/models.proto")).unwrap();
        assert!(models.contains("package other.v9;"));
    }
}

// ============================================================================
// getincludes / check
// ============================================================================

mod includes_and_check {
    use super::*;

    #[test]
    fn getincludes___commented_template() {
        let dir = project();
        std::fs::write(dir.path().join("sqlc2proto.yaml"), "withServices: true\n").unwrap();

        let output = sqlc2proto(dir.path(), &["getincludes"]);

        assert!(output.status.success());
        let text = std::fs::read_to_string(dir.path().join("sqlc2proto.includes.yaml")).unwrap();
        assert_eq!(
            text,
            "models:\n# - Author\n\nqueries:\n# - GetAuthor\n# - ListAuthors\n"
        );
    }

    #[test]
    fn check___missing_pb_go___fails() {
        let dir = project();
        std::fs::write(dir.path().join("sqlc2proto.yaml"), "withMappers: true\n").unwrap();
        assert!(sqlc2proto(dir.path(), &["generate"]).status.success());

        let output = sqlc2proto(dir.path(), &["check"]);

        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("models.pb.go not found"));
    }

    #[test]
    fn check___all_present___prints_import_path() {
        let dir = project();
        std::fs::write(dir.path().join("sqlc2proto.yaml"), "withMappers: true\n").unwrap();
        assert!(sqlc2proto(dir.path(), &["generate"]).status.success());
        std::fs::write(dir.path().join("proto/gen/models.pb.go"), "package proto\n").unwrap();

        let output = sqlc2proto(dir.path(), &["check"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("Import path: example.com/shop/proto"));
    }
}
