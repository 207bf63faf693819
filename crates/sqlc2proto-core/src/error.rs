//! Error types for sqlc2proto generation

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for generation operations
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Error type for generation operations
///
/// Only structural failures surface here. Unknown types, malformed tags and
/// unrecognised type shapes are absorbed by the extractor with a fallback.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// File system error with the path that caused it
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Go source could not be tokenized or parsed
    #[error("failed to parse {}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// YAML config or includes file could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Template text is malformed
    #[error("template {template}: syntax error at byte {offset}: {message}")]
    TemplateSyntax {
        template: String,
        offset: usize,
        message: String,
    },

    /// Template references a placeholder with no value
    #[error("template {template}: unresolved placeholder `{placeholder}`")]
    UnresolvedPlaceholder {
        template: String,
        placeholder: String,
    },

    /// No `Querier` interface in the sqlc directory
    #[error("querier interface not found in {}", .0.display())]
    QuerierNotFound(PathBuf),

    /// The sqlc source directory does not exist
    #[error("source directory not found: {}", .0.display())]
    SourceDirMissing(PathBuf),
}

impl GenerateError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the run can continue after this error
    ///
    /// Only a missing querier is recoverable: service generation is skipped
    /// and the models are still emitted.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GenerateError::QuerierNotFound(_))
    }
}
