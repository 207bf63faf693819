//! Intermediate representation shared by the walker, the synthesizers and
//! the emitters.
//!
//! # Structure
//!
//! - [`MessageDescriptor`]: one sqlc struct, as a protobuf message
//! - [`FieldDescriptor`]: one struct field with its wire type and conversions
//! - [`QueryDescriptor`]: one `Querier` method
//! - [`ServiceDescriptor`]: an RPC service synthesized from queries
//!
//! Descriptors are built once and not modified afterwards, except by the
//! service augmentation passes.

use crate::conversion::Conversion;
use std::path::PathBuf;

/// A message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Wire name after the field naming style was applied.
    pub name: String,
    pub wire_type: String,
    /// 1-based, unique within the message.
    pub number: u32,
    pub repeated: bool,
    pub optional: bool,
    /// Go field name in the sqlc struct.
    pub source_name: String,
    pub doc: Option<String>,
    /// Name from the `json` tag, if any.
    pub json_name: Option<String>,
    pub conversion: Conversion,
    /// Expression building the proto field from `in`.
    pub to_proto: String,
    /// Expression building the sqlc field from `in`.
    pub from_proto: String,
    /// False when the Go type fell back to `string`.
    pub matched: bool,
}

impl FieldDescriptor {
    /// `[json_name = "..."]` is only rendered when it changes the default.
    pub fn json_alias(&self) -> Option<&str> {
        self.json_name
            .as_deref()
            .filter(|alias| *alias != self.name)
    }
}

/// A protobuf message built from one Go struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub doc: Option<String>,
    /// Go struct the message was read from.
    pub source_struct: String,
    pub package: String,
    pub source_file: PathBuf,
}

/// Result shape of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// `:one`
    One,
    /// `:many`
    Many,
    /// `:exec` and friends
    Exec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    /// Go type text, e.g. `*pgtype.Text`.
    pub go_type: String,
}

/// A method of the sqlc `Querier` interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub name: String,
    pub kind: QueryKind,
    pub params: Vec<QueryParam>,
    /// Element type for slices, pointer stripped.
    pub return_type: Option<String>,
    pub returns_slice: bool,
    pub doc: Option<String>,
}

/// Which pagination field a synthesized field is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationRole {
    PageSize,
    PageToken,
    NextPageToken,
    TotalSize,
}

impl PaginationRole {
    /// Name used before configured names are applied.
    pub fn default_name(self) -> &'static str {
        match self {
            PaginationRole::PageSize => "limit",
            PaginationRole::PageToken => "page_token",
            PaginationRole::NextPageToken => "next_page_token",
            PaginationRole::TotalSize => "total_size",
        }
    }
}

/// A field of a synthesized request or response message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceField {
    pub name: String,
    pub wire_type: String,
    pub number: u32,
    pub repeated: bool,
    pub comment: Option<String>,
    pub pagination: Option<PaginationRole>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMethod {
    pub name: String,
    pub description: String,
    pub request_type: String,
    pub response_type: String,
    pub request_fields: Vec<ServiceField>,
    pub response_fields: Vec<ServiceField>,
    pub server_streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub description: String,
    pub entity: String,
    pub methods: Vec<ServiceMethod>,
}
