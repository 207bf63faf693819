//! `models.proto` rendering.

use super::{Templates, Values, comment_line};
use crate::error::GenerateResult;
use crate::ir::{FieldDescriptor, MessageDescriptor};
use crate::typemap::well_known_import;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// File-level settings shared by every `.proto` artifact.
#[derive(Debug, Clone)]
pub struct ProtoFile<'a> {
    pub package: &'a str,
    pub go_package: &'a str,
}

/// One field line, e.g. `repeated Tag tags = 3;`.
pub fn field_line(field: &FieldDescriptor) -> String {
    let mut line = String::new();
    if field.repeated {
        line.push_str("repeated ");
    }
    let _ = write!(line, "{} {} = {}", field.wire_type, field.name, field.number);
    if let Some(alias) = field.json_alias() {
        let _ = write!(line, " [json_name = \"{alias}\"]");
    }
    line.push(';');
    line
}

/// Render one message block.
pub fn render_message(message: &MessageDescriptor, templates: &Templates) -> GenerateResult<String> {
    let mut fields = String::new();
    for field in &message.fields {
        fields.push_str(&comment_line("  ", field.doc.as_deref()));
        let _ = writeln!(fields, "  {}", field_line(field));
    }

    templates.message.render(
        &Values::new()
            .set("doc", comment_line("", message.doc.as_deref()))
            .set("name", message.name.as_str())
            .set("fields", fields),
    )
}

/// `import "...";` lines for the well-known types used by `wire_types`.
pub fn import_block<'a>(wire_types: impl IntoIterator<Item = &'a str>) -> String {
    let imports: BTreeSet<&str> = wire_types
        .into_iter()
        .filter_map(well_known_import)
        .collect();
    if imports.is_empty() {
        return String::new();
    }

    let mut block = String::from("\n");
    for import in imports {
        let _ = writeln!(block, "import \"{import}\";");
    }
    block
}

/// Render `models.proto`.
pub fn render_models(
    messages: &[MessageDescriptor],
    file: &ProtoFile<'_>,
    templates: &Templates,
) -> GenerateResult<String> {
    let imports = import_block(
        messages
            .iter()
            .flat_map(|m| m.fields.iter().map(|f| f.wire_type.as_str())),
    );

    let mut blocks = String::new();
    for message in messages {
        blocks.push('\n');
        blocks.push_str(&render_message(message, templates)?);
    }

    templates.models_proto.render(
        &Values::new()
            .set("package", file.package)
            .set("go_package", file.go_package)
            .set("imports", imports)
            .set("messages", blocks),
    )
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::field::{FieldInput, FieldStyle, extract_field};
    use crate::typemap::{LocalTypes, TypeMappingConfig, TypeShape};
    use std::path::PathBuf;

    fn field(name: &str, ty: &str, tag: Option<&str>, number: u32) -> FieldDescriptor {
        let input = FieldInput {
            name: Some(name),
            ty: TypeShape::parse(ty),
            tag,
            doc: &[],
        };
        extract_field(
            &input,
            number,
            FieldStyle::SnakeCase,
            &TypeMappingConfig::default(),
            &LocalTypes::default(),
        )
        .unwrap()
    }

    fn author() -> MessageDescriptor {
        MessageDescriptor {
            name: "Author".to_string(),
            fields: vec![
                field("ID", "int64", Some(r#"json:"id""#), 1),
                field("AuthorName", "string", Some(r#"json:"authorName""#), 2),
                field("CreatedAt", "time.Time", None, 3),
                field("Avatars", "[][]byte", None, 4),
            ],
            doc: Some("An author of books.".to_string()),
            source_struct: "Author".to_string(),
            package: "api.v1".to_string(),
            source_file: PathBuf::from("models.go"),
        }
    }

    fn file() -> ProtoFile<'static> {
        ProtoFile {
            package: "api.v1",
            go_package: "example.com/app/proto",
        }
    }

    #[test]
    fn field_line___json_alias_only_when_different() {
        let message = author();

        assert_eq!(field_line(&message.fields[0]), "int64 id = 1;");
        assert_eq!(
            field_line(&message.fields[1]),
            r#"string author_name = 2 [json_name = "authorName"];"#
        );
        assert_eq!(field_line(&message.fields[3]), "repeated bytes avatars = 4;");
    }

    #[test]
    fn render_models___full_file() {
        let templates = Templates::embedded().unwrap();

        let out = render_models(&[author()], &file(), &templates).unwrap();

        let expected = r#"// Code generated by sqlc2proto. DO NOT EDIT.

syntax = "proto3";

package api.v1;

option go_package = "example.com/app/proto";

import "google/protobuf/timestamp.proto";

// An author of books.
message Author {
  int64 id = 1;
  string author_name = 2 [json_name = "authorName"];
  google.protobuf.Timestamp created_at = 3;
  repeated bytes avatars = 4;
}
"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn render_models___no_well_known_types___no_imports() {
        let templates = Templates::embedded().unwrap();
        let mut message = author();
        message.fields.truncate(2);
        message.doc = None;

        let out = render_models(&[message], &file(), &templates).unwrap();

        assert!(!out.contains("import"));
        assert!(out.contains("option go_package = \"example.com/app/proto\";\n\nmessage Author {\n"));
    }

    #[test]
    fn render_message___field_docs_and_empty_message() {
        let templates = Templates::embedded().unwrap();
        let mut message = author();
        message.fields.truncate(1);
        message.fields[0].doc = Some("Primary key".to_string());
        let mut empty = author();
        empty.fields.clear();
        empty.doc = None;

        let out = render_message(&message, &templates).unwrap();
        let empty_out = render_message(&empty, &templates).unwrap();

        assert!(out.contains("  // Primary key\n  int64 id = 1;\n"));
        assert_eq!(empty_out, "message Author {\n}\n");
    }

    #[test]
    fn import_block___deduplicated_and_sorted() {
        let block = import_block([
            "google.protobuf.Timestamp",
            "string",
            "google.protobuf.Duration",
            "google.protobuf.Timestamp",
        ]);

        assert_eq!(
            block,
            "\nimport \"google/protobuf/duration.proto\";\nimport \"google/protobuf/timestamp.proto\";\n"
        );
    }
}
