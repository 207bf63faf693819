//! Struct field extraction.
//!
//! Turns one Go struct field into a [`FieldDescriptor`]: wire name from the
//! naming style, wire type and conversion from the type table, optionality
//! from the type and the struct tag.

use crate::error::GenerateError;
use crate::ir::FieldDescriptor;
use crate::naming::{go_camel_case, is_exported, to_snake_case};
use crate::typemap::{LocalTypes, TypeMappingConfig, TypeShape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// How proto field names are derived from Go fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldStyle {
    /// Go field name unchanged.
    #[serde(rename = "original")]
    Original,
    /// Go field name converted to snake_case.
    #[serde(rename = "snake_case")]
    SnakeCase,
    /// `json` tag name, else snake_case.
    #[default]
    #[serde(rename = "json", alias = "tag_preferred", alias = "tag-preferred")]
    TagPreferred,
}

impl FieldStyle {
    /// Wire name for a Go field with an optional `json` tag name.
    pub fn field_name(self, go_name: &str, json_name: Option<&str>) -> String {
        match self {
            FieldStyle::Original => go_name.to_string(),
            FieldStyle::SnakeCase => to_snake_case(go_name),
            FieldStyle::TagPreferred => match json_name {
                Some(name) => name.to_string(),
                None => to_snake_case(go_name),
            },
        }
    }
}

impl FromStr for FieldStyle {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(FieldStyle::Original),
            "snake_case" => Ok(FieldStyle::SnakeCase),
            "json" | "tag_preferred" | "tag-preferred" => Ok(FieldStyle::TagPreferred),
            other => Err(GenerateError::Config(format!(
                "unknown field style `{other}` (expected original, snake_case or json)"
            ))),
        }
    }
}

impl fmt::Display for FieldStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldStyle::Original => "original",
            FieldStyle::SnakeCase => "snake_case",
            FieldStyle::TagPreferred => "json",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Struct tags
// ============================================================================

/// A Go struct tag, read with `reflect.StructTag` rules.
///
/// Parsing stops at the first malformed pair; pairs before it stay usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructTag {
    pairs: Vec<(String, String)>,
}

impl StructTag {
    pub fn parse(tag: &str) -> Self {
        let mut pairs = Vec::new();
        let mut rest = tag;

        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }

            let key_len = rest
                .bytes()
                .position(|b| b <= b' ' || b == b':' || b == b'"' || b == 0x7f)
                .unwrap_or(rest.len());
            let bytes = rest.as_bytes();
            if key_len == 0
                || key_len + 1 >= rest.len()
                || bytes[key_len] != b':'
                || bytes[key_len + 1] != b'"'
            {
                break;
            }
            let key = &rest[..key_len];
            rest = &rest[key_len + 1..];

            // Quoted value, backslash escapes the next byte.
            let bytes = rest.as_bytes();
            let mut i = 1;
            while i < bytes.len() && bytes[i] != b'"' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            let value = unquote(&rest[1..i]);
            pairs.push((key.to_string(), value));
            rest = &rest[i + 1..];
        }

        Self { pairs }
    }

    /// Value for `key`, like `reflect.StructTag.Lookup`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Name part of the `json` tag, unless absent, empty or `-`.
    pub fn json_name(&self) -> Option<&str> {
        let value = self.lookup("json")?;
        let name = value.split(',').next().unwrap_or_default();
        (!name.is_empty() && name != "-").then_some(name)
    }

    /// Whether any key lists `option` after its name (`json:"x,omitempty"`).
    pub fn has_option(&self, option: &str) -> bool {
        self.pairs
            .iter()
            .any(|(_, value)| value.split(',').skip(1).any(|o| o == option))
    }
}

fn unquote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

// ============================================================================
// Extraction
// ============================================================================

/// One declared struct field, as read from source.
#[derive(Debug, Clone)]
pub struct FieldInput<'a> {
    /// `None` for embedded fields.
    pub name: Option<&'a str>,
    pub ty: TypeShape,
    pub tag: Option<&'a str>,
    pub doc: &'a [String],
}

/// Build a field descriptor, or `None` for unexported and embedded fields.
pub fn extract_field(
    input: &FieldInput<'_>,
    number: u32,
    style: FieldStyle,
    table: &TypeMappingConfig,
    locals: &LocalTypes,
) -> Option<FieldDescriptor> {
    let go_name = input.name?;
    if !is_exported(go_name) {
        return None;
    }

    let tag = input.tag.map(StructTag::parse).unwrap_or_default();
    let json_name = tag.json_name().map(str::to_string);
    let name = style.field_name(go_name, json_name.as_deref());

    let resolution = table.resolve_shape(&input.ty, locals);
    if !resolution.conversion.is_supported() {
        warn!(field = go_name, ty = %input.ty, "no Go conversion for type, mappers leave it unset");
    } else if !resolution.matched {
        debug!(field = go_name, ty = %input.ty, "unmapped type, using string");
    }

    let optional = resolution.optional || tag.has_option("omitempty");
    let to_proto = resolution
        .conversion
        .render_to_wire(&format!("in.{go_name}"));
    let from_proto = resolution
        .conversion
        .render_from_wire(&format!("in.{}", go_camel_case(&name)));

    let doc = (!input.doc.is_empty()).then(|| input.doc.join(" "));

    Some(FieldDescriptor {
        name,
        wire_type: resolution.wire_type,
        number,
        repeated: resolution.repeated,
        optional,
        source_name: go_name.to_string(),
        doc,
        json_name,
        conversion: resolution.conversion,
        to_proto,
        from_proto,
        matched: resolution.matched,
    })
}

#[cfg(test)]
#[path = "field/field_tests.rs"]
mod field_tests;
