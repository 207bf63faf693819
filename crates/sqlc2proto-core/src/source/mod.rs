//! Go source reader.
//!
//! sqlc emits plain, gofmt-ed Go, so only the declaration layer is parsed:
//! struct types with their field names, types, tags and doc comments, and
//! interface method signatures. Everything else is skipped.
//!
//! # Example
//!
//! ```
//! use sqlc2proto_core::source::parse_source;
//! use std::path::Path;
//!
//! let file = parse_source(
//!     Path::new("models.go"),
//!     "package db\n\ntype Author struct {\n\tID int64 `json:\"id\"`\n}\n",
//! )
//! .unwrap();
//!
//! let (decl, fields) = file.structs().next().unwrap();
//! assert_eq!(decl.name, "Author");
//! assert_eq!(fields[0].names, vec!["ID"]);
//! ```

pub mod ast;
mod lexer;
mod parser;

pub use ast::{InterfaceMethod, Param, SourceFile, StructField, TypeDecl, TypeExpr};

use crate::error::{GenerateError, GenerateResult};
use std::path::Path;

/// Parse Go source text. `path` is only used for error messages.
pub fn parse_source(path: &Path, text: &str) -> GenerateResult<SourceFile> {
    let to_error = |err: lexer::LexError| GenerateError::Parse {
        path: path.to_path_buf(),
        line: err.line,
        message: err.message,
    };

    let tokens = lexer::tokenize(text).map_err(to_error)?;
    parser::Parser::new(tokens).parse_file().map_err(to_error)
}

/// Read and parse a Go file.
pub fn read_source(path: &Path) -> GenerateResult<SourceFile> {
    let text = std::fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;
    parse_source(path, &text)
}
