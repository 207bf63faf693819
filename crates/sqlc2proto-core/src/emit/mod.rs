//! Artifact rendering.
//!
//! Each artifact is a file template filled with blocks rendered from block
//! templates:
//!
//! ```text
//! MessageDescriptor[] ──> message block ──> models.proto
//!                     └─> mapper block  ──> mappers/mappers.go
//! ServiceDescriptor[] ──> message + service blocks ──> service.proto
//! ```
//!
//! The embedded templates can be replaced per file by placing a file with
//! the same name in a configured template directory.

pub mod mapper;
pub mod proto;
pub mod service;
pub mod template;
pub mod writer;

pub use template::{Template, Values};

use crate::error::{GenerateError, GenerateResult};
use std::path::Path;
use tracing::debug;

// ============================================================================
// Embedded Templates
// ============================================================================

mod embedded {
    pub const MODELS_PROTO: &str = include_str!("../../templates/proto/models.proto.tmpl");
    pub const MESSAGE: &str = include_str!("../../templates/proto/message.proto.tmpl");
    pub const SERVICE_PROTO: &str = include_str!("../../templates/proto/service.proto.tmpl");
    pub const SERVICE_BLOCK: &str =
        include_str!("../../templates/proto/service_block.proto.tmpl");
    pub const MAPPERS_GO: &str = include_str!("../../templates/go/mappers.go.tmpl");
    pub const MAPPER: &str = include_str!("../../templates/go/mapper.go.tmpl");
}

/// The overridable templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    ModelsProto,
    Message,
    ServiceProto,
    ServiceBlock,
    MappersGo,
    Mapper,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        TemplateKind::ModelsProto,
        TemplateKind::Message,
        TemplateKind::ServiceProto,
        TemplateKind::ServiceBlock,
        TemplateKind::MappersGo,
        TemplateKind::Mapper,
    ];

    /// File name looked up in a template directory.
    pub fn file_name(self) -> &'static str {
        match self {
            TemplateKind::ModelsProto => "models.proto.tmpl",
            TemplateKind::Message => "message.proto.tmpl",
            TemplateKind::ServiceProto => "service.proto.tmpl",
            TemplateKind::ServiceBlock => "service_block.proto.tmpl",
            TemplateKind::MappersGo => "mappers.go.tmpl",
            TemplateKind::Mapper => "mapper.go.tmpl",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            TemplateKind::ModelsProto => embedded::MODELS_PROTO,
            TemplateKind::Message => embedded::MESSAGE,
            TemplateKind::ServiceProto => embedded::SERVICE_PROTO,
            TemplateKind::ServiceBlock => embedded::SERVICE_BLOCK,
            TemplateKind::MappersGo => embedded::MAPPERS_GO,
            TemplateKind::Mapper => embedded::MAPPER,
        }
    }
}

/// Parsed templates for one run.
#[derive(Debug, Clone)]
pub struct Templates {
    pub models_proto: Template,
    pub message: Template,
    pub service_proto: Template,
    pub service_block: Template,
    pub mappers_go: Template,
    pub mapper: Template,
}

impl Templates {
    /// The templates built into the binary.
    pub fn embedded() -> GenerateResult<Self> {
        Self::load(None)
    }

    /// Embedded templates, each replaced by `<dir>/<file name>` when present.
    pub fn load(dir: Option<&Path>) -> GenerateResult<Self> {
        let get = |kind: TemplateKind| -> GenerateResult<Template> {
            if let Some(dir) = dir {
                let path = dir.join(kind.file_name());
                if path.is_file() {
                    debug!(path = %path.display(), "using template override");
                    let text =
                        std::fs::read_to_string(&path).map_err(|e| GenerateError::io(&path, e))?;
                    return Template::parse(kind.file_name(), &text);
                }
            }
            Template::parse(kind.file_name(), kind.embedded())
        };

        Ok(Self {
            models_proto: get(TemplateKind::ModelsProto)?,
            message: get(TemplateKind::Message)?,
            service_proto: get(TemplateKind::ServiceProto)?,
            service_block: get(TemplateKind::ServiceBlock)?,
            mappers_go: get(TemplateKind::MappersGo)?,
            mapper: get(TemplateKind::Mapper)?,
        })
    }
}

/// `// text\n` with the given indent, or nothing.
pub(crate) fn comment_line(indent: &str, text: Option<&str>) -> String {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => format!("{indent}// {text}\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn Templates___embedded___all_parse() {
        let templates = Templates::embedded().unwrap();

        assert!(templates.models_proto.placeholders().contains(&"messages"));
        assert!(templates.mapper.placeholders().contains(&"to_fields"));
    }

    #[test]
    fn Templates___load___override_by_file_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("message.proto.tmpl"), "msg {{name}}\n").unwrap();

        let templates = Templates::load(Some(dir.path())).unwrap();

        assert_eq!(templates.message.placeholders(), vec!["name"]);
        assert_eq!(
            templates.models_proto,
            Template::parse("models.proto.tmpl", embedded::MODELS_PROTO).unwrap()
        );
    }

    #[test]
    fn Templates___load___broken_override___syntax_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("mapper.go.tmpl"), "func {{struct").unwrap();

        let err = Templates::load(Some(dir.path())).unwrap_err();

        assert!(matches!(err, GenerateError::TemplateSyntax { .. }));
    }

    #[test]
    fn TemplateKind___file_names_unique() {
        let mut names: Vec<_> = TemplateKind::ALL.iter().map(|k| k.file_name()).collect();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), TemplateKind::ALL.len());
    }

    #[test]
    fn comment_line___blank_text___nothing() {
        assert_eq!(comment_line("  ", Some("  ")), "");
        assert_eq!(comment_line("  ", None), "");
        assert_eq!(comment_line("", Some("An author")), "// An author\n");
    }
}
