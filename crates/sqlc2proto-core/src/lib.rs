//! sqlc2proto-core - Protocol Buffer synthesis from sqlc-generated Go code
//!
//! This crate provides:
//! - [`TypeMappingConfig`] mapping Go types to proto wire types and conversions
//! - [`walk_models`] and [`parse_querier`] reading a sqlc package
//! - [`resolve_dependencies`] expanding an includes selection
//! - [`synthesize`] building RPC services from query methods
//! - [`Generator`] running the whole pipeline from a [`GeneratorConfig`]

pub mod config;
pub mod conversion;
pub mod emit;
pub mod error;
pub mod field;
pub mod includes;
pub mod ir;
pub mod naming;
pub mod pipeline;
pub mod service;
pub mod source;
pub mod typemap;
pub mod walker;

pub use config::{CustomConverter, GeneratorConfig, ServiceOptions, detect_go_module};
pub use conversion::{Conversion, GoImport, Helper};
pub use error::{GenerateError, GenerateResult};
pub use field::{FieldInput, FieldStyle, extract_field};
pub use includes::{IncludesSet, dependency_additions, resolve_dependencies};
pub use ir::{
    FieldDescriptor, MessageDescriptor, PaginationRole, QueryDescriptor, QueryKind, QueryParam,
    ServiceDescriptor, ServiceField, ServiceMethod,
};
pub use pipeline::{GenerationReport, Generator};
pub use service::{PaginationNames, ServiceNaming, infer_entity, synthesize};
pub use typemap::{LocalTypes, Resolution, TypeMappingBuilder, TypeMappingConfig, TypeShape};
pub use walker::{WalkOptions, parse_querier, walk_models};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        FieldStyle, GenerateError, GenerateResult, GenerationReport, Generator, GeneratorConfig,
        IncludesSet, MessageDescriptor, QueryDescriptor, ServiceDescriptor, TypeMappingConfig,
    };
}
