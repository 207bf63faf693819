//! Conversion strategies between sqlc Go values and protoc-gen-go values.
//!
//! Every field carries one [`Conversion`]. The mapper emitter renders it in
//! both directions over a field access expression, and collects the Go
//! helper functions and imports it references so only those are emitted.
//!
//! Rendered code assumes the mapper file imports the sqlc package as `db`
//! and the generated protobuf package as `pb`.
//!
//! # Strategies
//!
//! | Strategy | To proto | From proto |
//! |----------|----------|------------|
//! | `Identity` | `x` | `x` |
//! | `Call` | `f(x)` | `g(x)` |
//! | `Cast` | `int32(x)` | `int16(x)` |
//! | `Timestamp` | `timestamppb.New(x)` | `x.AsTime()` |
//! | `Message` | `BookToProto(&x)` | `valueOf(BookFromProto(x))` |
//! | `Deref` | `f(valueOf(x))` | `ptrOf(g(x))` |
//! | `Repeated` | `mapSlice(x, f)` | `mapSlice(x, g)` |

use std::collections::BTreeSet;

mod helpers {
    pub const NULL_STRING: &str = include_str!("../templates/go/helpers/null_string.go.tmpl");
    pub const NULL_INT16: &str = include_str!("../templates/go/helpers/null_int16.go.tmpl");
    pub const NULL_INT32: &str = include_str!("../templates/go/helpers/null_int32.go.tmpl");
    pub const NULL_INT64: &str = include_str!("../templates/go/helpers/null_int64.go.tmpl");
    pub const NULL_FLOAT64: &str = include_str!("../templates/go/helpers/null_float64.go.tmpl");
    pub const NULL_BOOL: &str = include_str!("../templates/go/helpers/null_bool.go.tmpl");
    pub const NULL_TIME: &str = include_str!("../templates/go/helpers/null_time.go.tmpl");
    pub const PG_DATE: &str = include_str!("../templates/go/helpers/pg_date.go.tmpl");
    pub const PG_TIMESTAMPTZ: &str = include_str!("../templates/go/helpers/pg_timestamptz.go.tmpl");
    pub const PG_TEXT: &str = include_str!("../templates/go/helpers/pg_text.go.tmpl");
    pub const PG_NUMERIC: &str = include_str!("../templates/go/helpers/pg_numeric.go.tmpl");
    pub const UUID: &str = include_str!("../templates/go/helpers/uuid.go.tmpl");
    pub const NULL_UUID: &str = include_str!("../templates/go/helpers/null_uuid.go.tmpl");
    pub const JSON: &str = include_str!("../templates/go/helpers/json.go.tmpl");
    pub const INTERVAL: &str = include_str!("../templates/go/helpers/interval.go.tmpl");
    pub const MAP_SLICE: &str = include_str!("../templates/go/helpers/map_slice.go.tmpl");
    pub const VALUE_OF: &str = include_str!("../templates/go/helpers/value_of.go.tmpl");
    pub const PTR_OF: &str = include_str!("../templates/go/helpers/ptr_of.go.tmpl");
}

/// A Go import a helper or conversion depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GoImport {
    DatabaseSql,
    EncodingJson,
    Time,
    Uuid,
    Pgtype,
    Timestamppb,
}

impl GoImport {
    /// Import path as written in a Go import block.
    pub fn path(self) -> &'static str {
        match self {
            GoImport::DatabaseSql => "database/sql",
            GoImport::EncodingJson => "encoding/json",
            GoImport::Time => "time",
            GoImport::Uuid => "github.com/google/uuid",
            GoImport::Pgtype => "github.com/jackc/pgx/v5/pgtype",
            GoImport::Timestamppb => "google.golang.org/protobuf/types/known/timestamppb",
        }
    }

    /// Standard library imports are grouped first.
    pub fn is_std(self) -> bool {
        matches!(
            self,
            GoImport::DatabaseSql | GoImport::EncodingJson | GoImport::Time
        )
    }
}

/// A Go helper function pair emitted into the mapper file on demand.
///
/// Variant order is the emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Helper {
    NullString,
    NullInt16,
    NullInt32,
    NullInt64,
    NullFloat64,
    NullBool,
    NullTime,
    PgDate,
    PgTimestamptz,
    PgText,
    PgNumeric,
    Uuid,
    NullUuid,
    Json,
    Interval,
    MapSlice,
    ValueOf,
    PtrOf,
}

impl Helper {
    /// Helpers that convert one specific Go type.
    pub const TYPED: [Helper; 15] = [
        Helper::NullString,
        Helper::NullInt16,
        Helper::NullInt32,
        Helper::NullInt64,
        Helper::NullFloat64,
        Helper::NullBool,
        Helper::NullTime,
        Helper::PgDate,
        Helper::PgTimestamptz,
        Helper::PgText,
        Helper::PgNumeric,
        Helper::Uuid,
        Helper::NullUuid,
        Helper::Json,
        Helper::Interval,
    ];

    /// The Go type this helper converts, `None` for the generic helpers.
    pub fn go_type(self) -> Option<&'static str> {
        let ty = match self {
            Helper::NullString => "sql.NullString",
            Helper::NullInt16 => "sql.NullInt16",
            Helper::NullInt32 => "sql.NullInt32",
            Helper::NullInt64 => "sql.NullInt64",
            Helper::NullFloat64 => "sql.NullFloat64",
            Helper::NullBool => "sql.NullBool",
            Helper::NullTime => "sql.NullTime",
            Helper::PgDate => "pgtype.Date",
            Helper::PgTimestamptz => "pgtype.Timestamptz",
            Helper::PgText => "pgtype.Text",
            Helper::PgNumeric => "pgtype.Numeric",
            Helper::Uuid => "uuid.UUID",
            Helper::NullUuid => "uuid.NullUUID",
            Helper::Json => "json.RawMessage",
            Helper::Interval => "pgtype.Interval",
            Helper::MapSlice | Helper::ValueOf | Helper::PtrOf => return None,
        };
        Some(ty)
    }

    /// `(to proto, from proto)` function names, `None` for the generic helpers.
    pub fn function_names(self) -> Option<(&'static str, &'static str)> {
        let names = match self {
            Helper::NullString => ("nullStringToString", "stringToNullString"),
            Helper::NullInt16 => ("nullInt16ToInt32", "int32ToNullInt16"),
            Helper::NullInt32 => ("nullInt32ToInt32", "int32ToNullInt32"),
            Helper::NullInt64 => ("nullInt64ToInt64", "int64ToNullInt64"),
            Helper::NullFloat64 => ("nullFloat64ToFloat64", "float64ToNullFloat64"),
            Helper::NullBool => ("nullBoolToBool", "boolToNullBool"),
            Helper::NullTime => ("nullTimeToTimestamp", "timestampToNullTime"),
            Helper::PgDate => ("dateToTimestamp", "timestampToDate"),
            Helper::PgTimestamptz => ("timestamptzToTimestamp", "timestampToTimestamptz"),
            Helper::PgText => ("pgtypeTextToString", "stringToPgtypeText"),
            Helper::PgNumeric => ("numericToString", "stringToNumeric"),
            Helper::Uuid => ("uuidToString", "stringToUUID"),
            Helper::NullUuid => ("nullUUIDToString", "stringToNullUUID"),
            Helper::Json => ("jsonToString", "stringToJSON"),
            Helper::Interval => ("intervalToInt64", "int64ToInterval"),
            Helper::MapSlice | Helper::ValueOf | Helper::PtrOf => return None,
        };
        Some(names)
    }

    /// Go source of the helper.
    pub fn source(self) -> &'static str {
        match self {
            Helper::NullString => helpers::NULL_STRING,
            Helper::NullInt16 => helpers::NULL_INT16,
            Helper::NullInt32 => helpers::NULL_INT32,
            Helper::NullInt64 => helpers::NULL_INT64,
            Helper::NullFloat64 => helpers::NULL_FLOAT64,
            Helper::NullBool => helpers::NULL_BOOL,
            Helper::NullTime => helpers::NULL_TIME,
            Helper::PgDate => helpers::PG_DATE,
            Helper::PgTimestamptz => helpers::PG_TIMESTAMPTZ,
            Helper::PgText => helpers::PG_TEXT,
            Helper::PgNumeric => helpers::PG_NUMERIC,
            Helper::Uuid => helpers::UUID,
            Helper::NullUuid => helpers::NULL_UUID,
            Helper::Json => helpers::JSON,
            Helper::Interval => helpers::INTERVAL,
            Helper::MapSlice => helpers::MAP_SLICE,
            Helper::ValueOf => helpers::VALUE_OF,
            Helper::PtrOf => helpers::PTR_OF,
        }
    }

    /// Go imports the helper source needs.
    pub fn imports(self) -> &'static [GoImport] {
        match self {
            Helper::NullString
            | Helper::NullInt16
            | Helper::NullInt32
            | Helper::NullInt64
            | Helper::NullFloat64
            | Helper::NullBool => &[GoImport::DatabaseSql],
            Helper::NullTime => &[GoImport::DatabaseSql, GoImport::Timestamppb],
            Helper::PgDate => &[GoImport::Time, GoImport::Pgtype, GoImport::Timestamppb],
            Helper::PgTimestamptz => &[GoImport::Pgtype, GoImport::Timestamppb],
            Helper::PgText | Helper::PgNumeric | Helper::Interval => &[GoImport::Pgtype],
            Helper::Uuid | Helper::NullUuid => &[GoImport::Uuid],
            Helper::Json => &[GoImport::EncodingJson],
            Helper::MapSlice | Helper::ValueOf | Helper::PtrOf => &[],
        }
    }

    /// The conversion that calls this helper pair.
    pub fn conversion(self) -> Conversion {
        match self.function_names() {
            Some((to_wire, from_wire)) => Conversion::Call {
                to_wire: to_wire.to_string(),
                from_wire: from_wire.to_string(),
                helper: Some(self),
            },
            None => Conversion::Identity,
        }
    }
}

/// How a value moves between its sqlc Go type and its protobuf Go type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// Same Go type on both sides.
    Identity,

    /// A pair of single-argument functions.
    Call {
        to_wire: String,
        from_wire: String,
        helper: Option<Helper>,
    },

    /// A Go type conversion between two scalar types.
    Cast { source: String, wire: String },

    /// `time.Time` to `*timestamppb.Timestamp`.
    Timestamp,

    /// A struct of the walked package, converted by its generated mapper pair.
    Message { name: String, pointer: bool },

    /// A pointer to a scalar. Nil converts to the zero value.
    Deref(Box<Conversion>),

    /// A slice whose elements need converting.
    Repeated(Box<Conversion>),

    /// A slice element converted through a closure typed `func(source) wire`.
    Element {
        inner: Box<Conversion>,
        source: String,
        wire: String,
    },

    /// No Go expression converts the value. Mappers leave the field unset.
    Unsupported,
}

impl Conversion {
    pub fn is_identity(&self) -> bool {
        matches!(self, Conversion::Identity)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Conversion::Unsupported)
    }

    /// Wrap as a pointer conversion.
    ///
    /// A message value becomes a message pointer, since the generated mappers
    /// already take and return pointers.
    pub fn deref(self) -> Conversion {
        match self {
            Conversion::Message { name, .. } => Conversion::Message {
                name,
                pointer: true,
            },
            Conversion::Deref(inner) => Conversion::Deref(inner),
            Conversion::Unsupported => Conversion::Unsupported,
            other => Conversion::Deref(Box::new(other)),
        }
    }

    /// Wrap as a slice conversion. Identity stays identity.
    ///
    /// Elements without a function value (pointers, nested slices) need an
    /// [`Conversion::Element`] first; on their own they are unsupported.
    pub fn repeated(self) -> Conversion {
        match self {
            Conversion::Identity => Conversion::Identity,
            Conversion::Deref(_) | Conversion::Repeated(_) | Conversion::Unsupported => {
                Conversion::Unsupported
            }
            other => Conversion::Repeated(Box::new(other)),
        }
    }

    /// Render the sqlc to protobuf expression for `access`.
    pub fn render_to_wire(&self, access: &str) -> String {
        match self {
            Conversion::Identity => access.to_string(),
            Conversion::Call { to_wire, .. } => format!("{to_wire}({access})"),
            Conversion::Cast { wire, .. } => format!("{wire}({access})"),
            Conversion::Timestamp => format!("timestamppb.New({access})"),
            Conversion::Message {
                name,
                pointer: true,
            } => format!("{name}ToProto({access})"),
            Conversion::Message {
                name,
                pointer: false,
            } => format!("{name}ToProto(&{access})"),
            Conversion::Deref(inner) => inner.render_to_wire(&format!("valueOf({access})")),
            Conversion::Repeated(inner) => {
                format!("mapSlice({access}, {})", inner.to_wire_func())
            }
            Conversion::Element { inner, .. } => inner.render_to_wire(access),
            Conversion::Unsupported => access.to_string(),
        }
    }

    /// Render the protobuf to sqlc expression for `access`.
    pub fn render_from_wire(&self, access: &str) -> String {
        match self {
            Conversion::Identity => access.to_string(),
            Conversion::Call { from_wire, .. } => format!("{from_wire}({access})"),
            Conversion::Cast { source, .. } => format!("{source}({access})"),
            Conversion::Timestamp => format!("{access}.AsTime()"),
            Conversion::Message {
                name,
                pointer: true,
            } => format!("{name}FromProto({access})"),
            Conversion::Message {
                name,
                pointer: false,
            } => format!("valueOf({name}FromProto({access}))"),
            Conversion::Deref(inner) => format!("ptrOf({})", inner.render_from_wire(access)),
            Conversion::Repeated(inner) => {
                format!("mapSlice({access}, {})", inner.from_wire_func())
            }
            Conversion::Element { inner, .. } => inner.render_from_wire(access),
            Conversion::Unsupported => access.to_string(),
        }
    }

    /// Function value usable as a `mapSlice` argument, sqlc to protobuf.
    fn to_wire_func(&self) -> String {
        match self {
            Conversion::Call { to_wire, .. } => to_wire.clone(),
            Conversion::Timestamp => "timestamppb.New".to_string(),
            Conversion::Message {
                name,
                pointer: true,
            } => format!("{name}ToProto"),
            Conversion::Message {
                name,
                pointer: false,
            } => format!("func(v db.{name}) *pb.{name} {{ return {name}ToProto(&v) }}"),
            Conversion::Cast { source, wire } => {
                format!("func(v {source}) {wire} {{ return {wire}(v) }}")
            }
            Conversion::Element {
                inner,
                source,
                wire,
            } => format!(
                "func(v {source}) {wire} {{ return {} }}",
                inner.render_to_wire("v")
            ),
            // Not built by `repeated()`.
            Conversion::Identity
            | Conversion::Deref(_)
            | Conversion::Repeated(_)
            | Conversion::Unsupported => "nil".to_string(),
        }
    }

    /// Function value usable as a `mapSlice` argument, protobuf to sqlc.
    fn from_wire_func(&self) -> String {
        match self {
            Conversion::Call { from_wire, .. } => from_wire.clone(),
            Conversion::Timestamp => "(*timestamppb.Timestamp).AsTime".to_string(),
            Conversion::Message {
                name,
                pointer: true,
            } => format!("{name}FromProto"),
            Conversion::Message {
                name,
                pointer: false,
            } => format!("func(v *pb.{name}) db.{name} {{ return valueOf({name}FromProto(v)) }}"),
            Conversion::Cast { source, wire } => {
                format!("func(v {wire}) {source} {{ return {source}(v) }}")
            }
            Conversion::Element {
                inner,
                source,
                wire,
            } => format!(
                "func(v {wire}) {source} {{ return {} }}",
                inner.render_from_wire("v")
            ),
            // Not built by `repeated()`.
            Conversion::Identity
            | Conversion::Deref(_)
            | Conversion::Repeated(_)
            | Conversion::Unsupported => "nil".to_string(),
        }
    }

    /// Record the helpers and imports this conversion references.
    pub fn collect_requirements(
        &self,
        helpers: &mut BTreeSet<Helper>,
        imports: &mut BTreeSet<GoImport>,
    ) {
        match self {
            Conversion::Identity | Conversion::Cast { .. } | Conversion::Unsupported => {}
            Conversion::Call { helper, .. } => {
                if let Some(helper) = helper {
                    helpers.insert(*helper);
                    imports.extend(helper.imports().iter().copied());
                }
            }
            Conversion::Timestamp => {
                imports.insert(GoImport::Timestamppb);
            }
            Conversion::Message { pointer, .. } => {
                if !pointer {
                    helpers.insert(Helper::ValueOf);
                }
            }
            Conversion::Deref(inner) => {
                helpers.insert(Helper::ValueOf);
                helpers.insert(Helper::PtrOf);
                inner.collect_requirements(helpers, imports);
            }
            Conversion::Repeated(inner) => {
                helpers.insert(Helper::MapSlice);
                inner.collect_requirements(helpers, imports);
            }
            Conversion::Element { inner, .. } => inner.collect_requirements(helpers, imports),
        }
    }
}

/// Go type protoc-gen-go uses for a proto scalar type.
///
/// Non-scalar wire types are returned unchanged.
pub fn go_wire_type(wire_type: &str) -> &str {
    match wire_type {
        "double" => "float64",
        "float" => "float32",
        "int32" | "sint32" | "sfixed32" => "int32",
        "int64" | "sint64" | "sfixed64" => "int64",
        "uint32" | "fixed32" => "uint32",
        "uint64" | "fixed64" => "uint64",
        "bool" => "bool",
        "string" => "string",
        "bytes" => "[]byte",
        other => other,
    }
}
