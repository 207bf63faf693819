//! `service.proto` rendering.

use super::proto::{ProtoFile, import_block};
use super::{Templates, Values, comment_line};
use crate::error::GenerateResult;
use crate::ir::{ServiceDescriptor, ServiceField, ServiceMethod};
use crate::naming::to_snake_case;
use std::fmt::Write as _;

fn field_line(field: &ServiceField) -> String {
    let repeated = if field.repeated { "repeated " } else { "" };
    format!(
        "{repeated}{} {} = {};",
        field.wire_type, field.name, field.number
    )
}

fn render_fields(name: &str, fields: &[ServiceField], templates: &Templates) -> GenerateResult<String> {
    let mut body = String::new();
    for field in fields {
        body.push_str(&comment_line("  ", field.comment.as_deref()));
        let _ = writeln!(body, "  {}", field_line(field));
    }

    templates.message.render(
        &Values::new()
            .set("doc", "")
            .set("name", name)
            .set("fields", body),
    )
}

/// Request and response messages of one method.
fn render_method_messages(method: &ServiceMethod, templates: &Templates) -> GenerateResult<String> {
    let mut out = String::from("\n");
    out.push_str(&render_fields(
        &method.request_type,
        &method.request_fields,
        templates,
    )?);
    out.push('\n');
    out.push_str(&render_fields(
        &method.response_type,
        &method.response_fields,
        templates,
    )?);
    Ok(out)
}

/// `rpc` line of one method, e.g. `rpc ListAuthors(ListAuthorsRequest) returns (stream ListAuthorsResponse);`.
pub fn rpc_line(method: &ServiceMethod) -> String {
    let stream = if method.server_streaming { "stream " } else { "" };
    format!(
        "rpc {}({}) returns ({stream}{});",
        method.name, method.request_type, method.response_type
    )
}

/// Render one `service` block.
pub fn render_service_block(service: &ServiceDescriptor, templates: &Templates) -> GenerateResult<String> {
    let mut methods = String::new();
    for method in &service.methods {
        methods.push_str(&comment_line("  ", Some(&method.description)));
        let _ = writeln!(methods, "  {}", rpc_line(method));
    }

    templates.service_block.render(
        &Values::new()
            .set("doc", comment_line("", Some(&service.description)))
            .set("name", service.name.as_str())
            .set("methods", methods),
    )
}

/// Render one `.proto` file holding `services`.
pub fn render_services(
    services: &[ServiceDescriptor],
    file: &ProtoFile<'_>,
    models_import: &str,
    templates: &Templates,
) -> GenerateResult<String> {
    let methods = services.iter().flat_map(|s| &s.methods);
    let imports = import_block(
        methods
            .clone()
            .flat_map(|m| m.request_fields.iter().chain(&m.response_fields))
            .map(|f| f.wire_type.as_str()),
    );

    let mut messages = String::new();
    for method in methods {
        messages.push_str(&render_method_messages(method, templates)?);
    }

    let mut blocks = String::new();
    for service in services {
        blocks.push('\n');
        blocks.push_str(&render_service_block(service, templates)?);
    }

    templates.service_proto.render(
        &Values::new()
            .set("package", file.package)
            .set("go_package", file.go_package)
            .set("models_import", models_import)
            .set("imports", imports)
            .set("messages", messages)
            .set("services", blocks),
    )
}

/// File name of a service rendered on its own, e.g. `author_service.proto`.
pub fn split_file_name(service: &ServiceDescriptor) -> String {
    format!("{}.proto", to_snake_case(&service.name))
}

/// One `(file name, contents)` pair per service.
pub fn render_split(
    services: &[ServiceDescriptor],
    file: &ProtoFile<'_>,
    models_import: &str,
    templates: &Templates,
) -> GenerateResult<Vec<(String, String)>> {
    services
        .iter()
        .map(|service| {
            let text =
                render_services(std::slice::from_ref(service), file, models_import, templates)?;
            Ok((split_file_name(service), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::ir::PaginationRole;

    fn field(name: &str, wire_type: &str, number: u32, repeated: bool) -> ServiceField {
        ServiceField {
            name: name.to_string(),
            wire_type: wire_type.to_string(),
            number,
            repeated,
            comment: None,
            pagination: None,
        }
    }

    fn list_authors() -> ServiceMethod {
        let mut token = field("page_token", "string", 1, false);
        token.pagination = Some(PaginationRole::PageToken);
        token.comment = Some("Page token for pagination".to_string());
        ServiceMethod {
            name: "ListAuthors".to_string(),
            description: "ListAuthors returns every author.".to_string(),
            request_type: "ListAuthorsRequest".to_string(),
            response_type: "ListAuthorsResponse".to_string(),
            request_fields: vec![token],
            response_fields: vec![field("authors", "Author", 1, true)],
            server_streaming: false,
        }
    }

    fn author_service() -> ServiceDescriptor {
        ServiceDescriptor {
            name: "AuthorService".to_string(),
            description: "Service for Author operations".to_string(),
            entity: "Author".to_string(),
            methods: vec![list_authors()],
        }
    }

    fn file() -> ProtoFile<'static> {
        ProtoFile {
            package: "api.v1",
            go_package: "example.com/app/proto",
        }
    }

    #[test]
    fn rpc_line___streaming_marks_response() {
        let mut method = list_authors();

        assert_eq!(
            rpc_line(&method),
            "rpc ListAuthors(ListAuthorsRequest) returns (ListAuthorsResponse);"
        );
        method.server_streaming = true;
        assert_eq!(
            rpc_line(&method),
            "rpc ListAuthors(ListAuthorsRequest) returns (stream ListAuthorsResponse);"
        );
    }

    #[test]
    fn render_services___full_file() {
        let templates = Templates::embedded().unwrap();

        let out = render_services(&[author_service()], &file(), "models.proto", &templates).unwrap();

        let expected = r#"// Code generated by sqlc2proto. DO NOT EDIT.

syntax = "proto3";

package api.v1;

option go_package = "example.com/app/proto";

import "models.proto";

message ListAuthorsRequest {
  // Page token for pagination
  string page_token = 1;
}

message ListAuthorsResponse {
  repeated Author authors = 1;
}

// Service for Author operations
service AuthorService {
  // ListAuthors returns every author.
  rpc ListAuthors(ListAuthorsRequest) returns (ListAuthorsResponse);
}
"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn render_services___well_known_field___imported() {
        let templates = Templates::embedded().unwrap();
        let mut service = author_service();
        service.methods[0]
            .response_fields
            .push(field("as_of", "google.protobuf.Timestamp", 2, false));

        let out = render_services(&[service], &file(), "models.proto", &templates).unwrap();

        assert!(out.contains(
            "import \"models.proto\";\n\nimport \"google/protobuf/timestamp.proto\";\n"
        ));
    }

    #[test]
    fn render_services___empty_description___no_comment() {
        let templates = Templates::embedded().unwrap();
        let mut service = author_service();
        service.methods[0].description.clear();

        let out = render_service_block(&service, &templates).unwrap();

        assert!(out.contains("service AuthorService {\n  rpc ListAuthors("));
    }

    #[test]
    fn render_split___one_file_per_service() {
        let templates = Templates::embedded().unwrap();
        let mut book = author_service();
        book.name = "BookService".to_string();
        book.methods[0].name = "ListBooks".to_string();
        book.methods[0].request_type = "ListBooksRequest".to_string();
        book.methods[0].response_type = "ListBooksResponse".to_string();

        let files = render_split(&[author_service(), book], &file(), "models.proto", &templates).unwrap();

        let names: Vec<_> = files.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["author_service.proto", "book_service.proto"]);
        assert!(files[0].1.contains("service AuthorService"));
        assert!(!files[0].1.contains("ListBooksRequest"));
        assert!(files[1].1.contains("message ListBooksRequest"));
    }
}
