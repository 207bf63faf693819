//! `{{name}}` placeholder templates.
//!
//! A template is parsed once into literal and placeholder segments. Parsing
//! rejects unclosed or malformed placeholders; rendering rejects
//! placeholders the caller did not supply a value for.

use crate::error::{GenerateError, GenerateResult};
use std::collections::BTreeMap;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `text`. `name` identifies the template in errors.
    pub fn parse(name: &str, text: &str) -> GenerateResult<Self> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + OPEN.len()..];
            let Some(end) = after_open.find(CLOSE) else {
                return Err(syntax_error(name, offset + start, "unclosed placeholder"));
            };
            let key = after_open[..end].trim();
            if !is_placeholder_name(key) {
                return Err(syntax_error(
                    name,
                    offset + start,
                    &format!("invalid placeholder name `{key}`"),
                ));
            }
            segments.push(Segment::Placeholder(key.to_string()));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            segments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder names in order of first use.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(key) = segment
                && !names.contains(&key.as_str())
            {
                names.push(key);
            }
        }
        names
    }

    /// Substitute every placeholder from `values`.
    pub fn render(&self, values: &Values) -> GenerateResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(key) => {
                    let value = values.get(key).ok_or_else(|| {
                        GenerateError::UnresolvedPlaceholder {
                            template: self.name.clone(),
                            placeholder: key.clone(),
                        }
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn syntax_error(template: &str, offset: usize, message: &str) -> GenerateError {
    GenerateError::TemplateSyntax {
        template: template.to_string(),
        offset,
        message: message.to_string(),
    }
}

fn is_placeholder_name(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Placeholder values for one render.
#[derive(Debug, Clone, Default)]
pub struct Values {
    entries: BTreeMap<String, String>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn Template___render___substitutes_repeated_placeholders() {
        let template = Template::parse("t", "{{name}}ToProto(in *db.{{name}}) {{ kind }}").unwrap();

        let out = template
            .render(&Values::new().set("name", "Author").set("kind", "one"))
            .unwrap();

        assert_eq!(out, "AuthorToProto(in *db.Author) one");
        assert_eq!(template.placeholders(), vec!["name", "kind"]);
    }

    #[test]
    fn Template___parse___braces_outside_placeholders_are_literal() {
        let template = Template::parse("t", "return &pb.{{name}}{\n}\n}}").unwrap();

        let out = template.render(&Values::new().set("name", "Tag")).unwrap();

        assert_eq!(out, "return &pb.Tag{\n}\n}}");
    }

    #[test]
    fn Template___parse___unclosed___syntax_error_with_offset() {
        let err = Template::parse("models.proto", "syntax = \"proto3\";\n{{package").unwrap_err();

        match err {
            GenerateError::TemplateSyntax {
                template, offset, ..
            } => {
                assert_eq!(template, "models.proto");
                assert_eq!(offset, 19);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn Template___parse___invalid_name___syntax_error() {
        let err = Template::parse("t", "a {{two words}} b").unwrap_err();

        assert!(matches!(err, GenerateError::TemplateSyntax { offset: 2, .. }));
    }

    #[test]
    fn Template___render___missing_value___unresolved_placeholder() {
        let template = Template::parse("service.proto", "package {{package}};").unwrap();

        let err = template.render(&Values::new()).unwrap_err();

        match err {
            GenerateError::UnresolvedPlaceholder {
                template,
                placeholder,
            } => {
                assert_eq!(template, "service.proto");
                assert_eq!(placeholder, "package");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn Template___render___no_placeholders___text_unchanged() {
        let template = Template::parse("t", "plain text\n").unwrap();

        assert_eq!(template.render(&Values::new()).unwrap(), "plain text\n");
        assert!(template.placeholders().is_empty());
    }
}
