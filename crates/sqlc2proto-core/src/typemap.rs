//! Go type to protobuf type mapping table.
//!
//! The table is assembled once with [`TypeMappingBuilder`] (built-ins plus
//! user mappings) and frozen into a [`TypeMappingConfig`] that is only ever
//! read for the rest of the run.
//!
//! # Lookup Order
//!
//! 1. Nullable wrappers (`sql.NullString`, ...), always optional
//! 2. Standard types (`int64`, `time.Time`, ...)
//! 3. Types declared in the walked package ([`LocalTypes`])
//! 4. `string`, flagged as unmatched
//!
//! Type shapes (`*T`, `[]T`, `[]byte`) are handled by
//! [`TypeMappingConfig::resolve_shape`] before the table lookup.

use crate::conversion::{Conversion, Helper, go_wire_type};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Wire type used for anything the table cannot map.
pub const FALLBACK_WIRE_TYPE: &str = "string";

/// Key under which byte slices are looked up.
const BYTES_KEY: &str = "[]byte";

const STANDARD_TYPES: &[(&str, &str)] = &[
    ("string", "string"),
    ("int", "int32"),
    ("int16", "int32"),
    ("int32", "int32"),
    ("int64", "int64"),
    ("float32", "float"),
    ("float64", "double"),
    ("bool", "bool"),
    ("[]byte", "bytes"),
    ("time.Time", "google.protobuf.Timestamp"),
    ("pgtype.Date", "google.protobuf.Timestamp"),
    ("pgtype.Timestamptz", "google.protobuf.Timestamp"),
    ("pgtype.Text", "string"),
    ("pgtype.Numeric", "string"),
    ("uuid.UUID", "string"),
    ("json.RawMessage", "string"),
    ("pgtype.Interval", "int64"),
];

const NULLABLE_TYPES: &[(&str, &str)] = &[
    ("sql.NullString", "string"),
    ("sql.NullInt16", "int32"),
    ("sql.NullInt32", "int32"),
    ("sql.NullInt64", "int64"),
    ("sql.NullFloat64", "double"),
    ("sql.NullBool", "bool"),
    ("sql.NullTime", "google.protobuf.Timestamp"),
    ("uuid.NullUUID", "string"),
];

const PROTO_SCALARS: &[&str] = &[
    "double", "float", "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32",
    "fixed64", "sfixed32", "sfixed64", "bool", "string", "bytes",
];

/// Whether a wire type is a proto scalar or a `google.protobuf` well-known type.
pub fn is_wire_primitive(wire_type: &str) -> bool {
    PROTO_SCALARS.contains(&wire_type) || wire_type.starts_with("google.protobuf.")
}

/// `.proto` import path for a well-known wire type.
pub fn well_known_import(wire_type: &str) -> Option<&'static str> {
    let name = wire_type.strip_prefix("google.protobuf.")?;
    let path = match name {
        "Timestamp" => "google/protobuf/timestamp.proto",
        "Duration" => "google/protobuf/duration.proto",
        "Struct" | "Value" | "ListValue" | "NullValue" => "google/protobuf/struct.proto",
        "Any" => "google/protobuf/any.proto",
        "Empty" => "google/protobuf/empty.proto",
        "FieldMask" => "google/protobuf/field_mask.proto",
        n if n.ends_with("Value") => "google/protobuf/wrappers.proto",
        _ => return None,
    };
    Some(path)
}

// ============================================================================
// Type shapes
// ============================================================================

/// Structural classification of a Go type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// `Book`, `int64`
    Named(String),
    /// `pgtype.Text`
    Qualified { package: String, name: String },
    /// `*T`
    Pointer(Box<TypeShape>),
    /// `[]T` and `[N]T`
    Slice(Box<TypeShape>),
    /// Maps, channels, functions, inline structs and anything unrecognised.
    Other(String),
}

impl TypeShape {
    /// Classify Go type text such as `*pgtype.Text` or `[][]byte`.
    pub fn parse(text: &str) -> TypeShape {
        let text = text.trim();

        if let Some(rest) = text.strip_prefix('*') {
            return TypeShape::Pointer(Box::new(TypeShape::parse(rest)));
        }
        if let Some(rest) = text.strip_prefix("[]") {
            return TypeShape::Slice(Box::new(TypeShape::parse(rest)));
        }
        if let Some(rest) = text.strip_prefix('[')
            && let Some((len, elem)) = rest.split_once(']')
            && !len.is_empty()
            && len.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return TypeShape::Slice(Box::new(TypeShape::parse(elem)));
        }

        match text.split_once('.') {
            Some((package, name)) if is_identifier(package) && is_identifier(name) => {
                TypeShape::Qualified {
                    package: package.to_string(),
                    name: name.to_string(),
                }
            }
            None if is_identifier(text) => TypeShape::Named(text.to_string()),
            _ => TypeShape::Other(text.to_string()),
        }
    }

    /// Base type name with pointers and slices removed, if it has one.
    pub fn base_name(&self) -> Option<String> {
        match self {
            TypeShape::Named(name) => Some(name.clone()),
            TypeShape::Qualified { package, name } => Some(format!("{package}.{name}")),
            TypeShape::Pointer(inner) | TypeShape::Slice(inner) => inner.base_name(),
            TypeShape::Other(_) => None,
        }
    }

    fn is_byte(&self) -> bool {
        matches!(self, TypeShape::Named(n) if n == "byte" || n == "uint8")
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Named(name) => write!(f, "{name}"),
            TypeShape::Qualified { package, name } => write!(f, "{package}.{name}"),
            TypeShape::Pointer(inner) => write!(f, "*{inner}"),
            TypeShape::Slice(inner) => write!(f, "[]{inner}"),
            TypeShape::Other(text) => write!(f, "{text}"),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Types declared in the walked Go package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalTypes {
    /// Struct type names, each emitted as a message of the same name.
    pub messages: BTreeSet<String>,
    /// Named non-struct types and their underlying Go type text.
    pub aliases: BTreeMap<String, String>,
}

impl LocalTypes {
    pub fn is_message(&self, name: &str) -> bool {
        self.messages.contains(name)
    }
}

// ============================================================================
// Table
// ============================================================================

/// Outcome of mapping one Go type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub wire_type: String,
    pub repeated: bool,
    pub optional: bool,
    pub conversion: Conversion,
    /// False when the fallback wire type was used.
    pub matched: bool,
}

impl Resolution {
    fn fallback() -> Self {
        Self {
            wire_type: FALLBACK_WIRE_TYPE.to_string(),
            repeated: false,
            optional: false,
            conversion: Conversion::Identity,
            matched: false,
        }
    }

    /// Fallback wire type for a shape no Go expression can convert.
    fn unsupported() -> Self {
        Self {
            conversion: Conversion::Unsupported,
            ..Self::fallback()
        }
    }
}

/// Assembles a [`TypeMappingConfig`].
///
/// # Example
///
/// ```
/// use sqlc2proto_core::typemap::TypeMappingBuilder;
///
/// let table = TypeMappingBuilder::new()
///     .merge([("pgtype.Int4".to_string(), "int32".to_string())], [])
///     .build();
///
/// assert_eq!(table.resolve("pgtype.Int4").wire_type, "int32");
/// ```
#[derive(Debug, Clone)]
pub struct TypeMappingBuilder {
    standard: BTreeMap<String, String>,
    nullable: BTreeMap<String, String>,
    converters: BTreeMap<String, Conversion>,
}

impl Default for TypeMappingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMappingBuilder {
    /// Builder preloaded with the built-in sqlc mappings and converters.
    pub fn new() -> Self {
        let mut converters: BTreeMap<String, Conversion> = Helper::TYPED
            .iter()
            .filter_map(|h| Some((h.go_type()?.to_string(), h.conversion())))
            .collect();
        converters.insert("time.Time".to_string(), Conversion::Timestamp);
        converters.insert(
            "int16".to_string(),
            Conversion::Cast {
                source: "int16".to_string(),
                wire: "int32".to_string(),
            },
        );

        Self {
            standard: to_map(STANDARD_TYPES),
            nullable: to_map(NULLABLE_TYPES),
            converters,
        }
    }

    /// Builder with no mappings at all.
    pub fn empty() -> Self {
        Self {
            standard: BTreeMap::new(),
            nullable: BTreeMap::new(),
            converters: BTreeMap::new(),
        }
    }

    /// Overwrite or extend both tables, last write wins per key.
    pub fn merge(
        mut self,
        standard: impl IntoIterator<Item = (String, String)>,
        nullable: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.standard.extend(standard);
        self.nullable.extend(nullable);
        self
    }

    /// Register the conversion used for a Go type.
    pub fn with_converter(mut self, go_type: impl Into<String>, conversion: Conversion) -> Self {
        self.converters.insert(go_type.into(), conversion);
        self
    }

    pub fn build(self) -> TypeMappingConfig {
        TypeMappingConfig {
            standard: self.standard,
            nullable: self.nullable,
            converters: self.converters,
        }
    }
}

fn to_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Frozen type mapping table.
#[derive(Debug, Clone)]
pub struct TypeMappingConfig {
    standard: BTreeMap<String, String>,
    nullable: BTreeMap<String, String>,
    converters: BTreeMap<String, Conversion>,
}

impl Default for TypeMappingConfig {
    fn default() -> Self {
        TypeMappingBuilder::new().build()
    }
}

impl TypeMappingConfig {
    pub fn standard(&self) -> &BTreeMap<String, String> {
        &self.standard
    }

    pub fn nullable(&self) -> &BTreeMap<String, String> {
        &self.nullable
    }

    /// Whether the nullable or standard table has an exact entry.
    pub fn contains(&self, type_name: &str) -> bool {
        self.nullable.contains_key(type_name) || self.standard.contains_key(type_name)
    }

    /// Map an exact Go type name through the tables.
    pub fn resolve(&self, type_name: &str) -> Resolution {
        let conversion = || {
            self.converters
                .get(type_name)
                .cloned()
                .unwrap_or(Conversion::Identity)
        };

        if let Some(wire) = self.nullable.get(type_name) {
            return Resolution {
                wire_type: wire.clone(),
                repeated: false,
                optional: true,
                conversion: conversion(),
                matched: true,
            };
        }
        if let Some(wire) = self.standard.get(type_name) {
            return Resolution {
                wire_type: wire.clone(),
                repeated: false,
                optional: false,
                conversion: conversion(),
                matched: true,
            };
        }
        Resolution::fallback()
    }

    /// Map a Go type shape, using the walked package's own declarations
    /// for names the tables do not know.
    pub fn resolve_shape(&self, shape: &TypeShape, locals: &LocalTypes) -> Resolution {
        match shape {
            TypeShape::Slice(elem) => self.resolve_slice(elem, locals),
            TypeShape::Pointer(inner) => {
                let mut resolution = self.resolve_shape(inner, locals);
                if !resolution.repeated {
                    resolution.conversion = resolution.conversion.deref();
                }
                resolution.optional = true;
                resolution
            }
            TypeShape::Qualified { .. } => self.resolve(&shape.to_string()),
            TypeShape::Named(name) => self.resolve_named(name, locals),
            TypeShape::Other(_) => Resolution::unsupported(),
        }
    }

    fn resolve_named(&self, name: &str, locals: &LocalTypes) -> Resolution {
        if self.contains(name) {
            return self.resolve(name);
        }
        if locals.is_message(name) {
            return Resolution {
                wire_type: name.to_string(),
                repeated: false,
                optional: false,
                conversion: Conversion::Message {
                    name: name.to_string(),
                    pointer: false,
                },
                matched: true,
            };
        }
        if let Some(underlying) = locals.aliases.get(name) {
            let base = TypeShape::parse(underlying);
            // Only aliases of table types; alias chains and composite aliases fall through.
            if let Some(base_name) = base.base_name()
                && matches!(base, TypeShape::Named(_) | TypeShape::Qualified { .. })
                && self.contains(&base_name)
            {
                let resolved = self.resolve(&base_name);
                let conversion = match resolved.conversion {
                    Conversion::Identity => Conversion::Cast {
                        source: format!("db.{name}"),
                        wire: go_wire_type(&resolved.wire_type).to_string(),
                    },
                    other => other,
                };
                return Resolution {
                    conversion,
                    ..resolved
                };
            }
        }
        self.resolve(name)
    }

    fn resolve_slice(&self, elem: &TypeShape, locals: &LocalTypes) -> Resolution {
        if elem.is_byte() {
            return self.resolve(BYTES_KEY);
        }

        let mut resolution = match elem {
            TypeShape::Slice(inner) if inner.is_byte() => self.resolve(BYTES_KEY),
            TypeShape::Slice(_) => Resolution::unsupported(),
            TypeShape::Pointer(inner) if !is_local_message(inner, locals) => {
                self.resolve_pointer_element(inner, locals)
            }
            other => self.resolve_shape(other, locals),
        };

        resolution.conversion = resolution.conversion.repeated();
        resolution.repeated = true;
        resolution.optional = false;
        resolution
    }

    /// `*T` inside a slice: `mapSlice` needs a closure typed on both sides.
    fn resolve_pointer_element(&self, inner: &TypeShape, locals: &LocalTypes) -> Resolution {
        let resolved = self.resolve_shape(inner, locals);
        let source = match inner {
            TypeShape::Named(name) if locals.aliases.contains_key(name) => format!("*db.{name}"),
            TypeShape::Named(_) | TypeShape::Qualified { .. } => format!("*{inner}"),
            _ => return Resolution::unsupported(),
        };
        let wire = match go_element_type(&resolved.wire_type) {
            Some(wire) if resolved.matched && !resolved.repeated => wire,
            _ => return Resolution::unsupported(),
        };

        Resolution {
            conversion: Conversion::Element {
                inner: Box::new(resolved.conversion.deref()),
                source,
                wire,
            },
            ..resolved
        }
    }
}

/// Go type protoc-gen-go generates for one element of a repeated field.
fn go_element_type(wire_type: &str) -> Option<String> {
    if PROTO_SCALARS.contains(&wire_type) {
        return Some(go_wire_type(wire_type).to_string());
    }
    match wire_type {
        "google.protobuf.Timestamp" => Some("*timestamppb.Timestamp".to_string()),
        _ => None,
    }
}

fn is_local_message(shape: &TypeShape, locals: &LocalTypes) -> bool {
    matches!(shape, TypeShape::Named(name) if locals.is_message(name))
}
