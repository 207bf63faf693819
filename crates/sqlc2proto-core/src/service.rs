//! RPC service synthesis from `Querier` methods.
//!
//! Methods are grouped by an entity name inferred from the method name.
//! Each method gets a request message built from its parameters and a
//! response message built from its result shape. Streaming and pagination
//! renaming run as separate passes over the synthesized services.

use crate::ir::{
    MessageDescriptor, PaginationRole, QueryDescriptor, QueryKind, ServiceDescriptor,
    ServiceField, ServiceMethod,
};
use crate::naming::to_snake_case;
use crate::typemap::{LocalTypes, TypeMappingConfig, TypeShape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Verb prefixes, tried in order.
const ENTITY_PREFIXES: [&str; 10] = [
    "Get", "List", "Create", "Update", "Delete", "Find", "Search", "Count", "Lookup", "Add",
];

/// Suffixes removed after the prefix, each in turn.
const ENTITY_SUFFIXES: [&str; 4] = ["ByID", "ById", "WithDetails", "WithRelations"];

/// Entity used when nothing usable is left of a method name.
pub const FALLBACK_ENTITY: &str = "Resource";

const DEFAULT_SERVICE_SUFFIX: &str = "Service";

/// Entity a query method operates on, e.g. `ListAuthors` -> `Author`.
pub fn infer_entity(method: &str) -> String {
    for prefix in ENTITY_PREFIXES {
        let Some(mut entity) = method.strip_prefix(prefix) else {
            continue;
        };
        for suffix in ENTITY_SUFFIXES {
            entity = entity.strip_suffix(suffix).unwrap_or(entity);
        }
        if prefix == "List" {
            entity = entity.strip_suffix('s').unwrap_or(entity);
        }
        if !entity.is_empty() {
            return entity.to_string();
        }
    }

    warn!(method, entity = FALLBACK_ENTITY, "could not infer entity from method name");
    FALLBACK_ENTITY.to_string()
}

fn is_list(method: &str) -> bool {
    method.starts_with("List")
}

// ============================================================================
// Options
// ============================================================================

/// Configured names of the four pagination fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationNames {
    pub page_size: String,
    pub page_token: String,
    pub next_page_token: String,
    pub total_size: String,
}

impl Default for PaginationNames {
    fn default() -> Self {
        Self {
            page_size: PaginationRole::PageSize.default_name().to_string(),
            page_token: PaginationRole::PageToken.default_name().to_string(),
            next_page_token: PaginationRole::NextPageToken.default_name().to_string(),
            total_size: PaginationRole::TotalSize.default_name().to_string(),
        }
    }
}

impl PaginationNames {
    pub fn name(&self, role: PaginationRole) -> &str {
        match role {
            PaginationRole::PageSize => &self.page_size,
            PaginationRole::PageToken => &self.page_token,
            PaginationRole::NextPageToken => &self.next_page_token,
            PaginationRole::TotalSize => &self.total_size,
        }
    }
}

/// How service names are derived from the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceNaming {
    /// `<Entity>Service`
    #[default]
    Entity,
    /// Same as `Entity`; kept for configuration compatibility.
    Flat,
    /// Configured prefix and suffix around the entity.
    Custom,
}

/// Inputs shared by every synthesized method.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub table: &'a TypeMappingConfig,
    pub locals: &'a LocalTypes,
    pub pagination: &'a PaginationNames,
}

// ============================================================================
// Synthesis
// ============================================================================

/// Build one service per inferred entity, in order of first appearance.
pub fn synthesize(
    queries: &[QueryDescriptor],
    messages: &[MessageDescriptor],
    ctx: &SynthesisContext<'_>,
) -> Vec<ServiceDescriptor> {
    let known: BTreeSet<&str> = messages.iter().map(|m| m.name.as_str()).collect();
    let mut services: Vec<ServiceDescriptor> = Vec::new();

    for query in queries {
        let entity = infer_entity(&query.name);
        let method = synthesize_method(query, &entity, &known, ctx);

        match services.iter_mut().find(|s| s.entity == entity) {
            Some(service) => service.methods.push(method),
            None => services.push(ServiceDescriptor {
                name: format!("{entity}{DEFAULT_SERVICE_SUFFIX}"),
                description: format!("Service for {entity} operations"),
                entity,
                methods: vec![method],
            }),
        }
    }

    debug!(services = services.len(), queries = queries.len(), "synthesized services");
    services
}

fn synthesize_method(
    query: &QueryDescriptor,
    entity: &str,
    known: &BTreeSet<&str>,
    ctx: &SynthesisContext<'_>,
) -> ServiceMethod {
    ServiceMethod {
        name: query.name.clone(),
        description: query.doc.clone().unwrap_or_default(),
        request_type: format!("{}Request", query.name),
        response_type: format!("{}Response", query.name),
        request_fields: request_fields(query, entity, known, ctx),
        response_fields: response_fields(query, known, ctx),
        server_streaming: false,
    }
}

/// Sequential field builder.
#[derive(Default)]
struct Fields(Vec<ServiceField>);

impl Fields {
    fn push(&mut self, name: String, wire_type: &str, repeated: bool, comment: String) {
        self.push_role(name, wire_type, repeated, comment, None);
    }

    fn push_role(
        &mut self,
        name: String,
        wire_type: &str,
        repeated: bool,
        comment: String,
        pagination: Option<PaginationRole>,
    ) {
        let number = self.0.len() as u32 + 1;
        self.0.push(ServiceField {
            name,
            wire_type: wire_type.to_string(),
            number,
            repeated,
            comment: Some(comment),
            pagination,
        });
    }

    fn push_pagination(&mut self, role: PaginationRole, wire_type: &str, comment: &str) {
        self.push_role(
            role.default_name().to_string(),
            wire_type,
            false,
            comment.to_string(),
            Some(role),
        );
    }

    /// Whether a field carries the configured or default name of `role`.
    fn has_role(&self, role: PaginationRole, names: &PaginationNames) -> bool {
        self.0
            .iter()
            .any(|f| f.name == names.name(role) || f.name == role.default_name())
    }
}

fn request_fields(
    query: &QueryDescriptor,
    entity: &str,
    known: &BTreeSet<&str>,
    ctx: &SynthesisContext<'_>,
) -> Vec<ServiceField> {
    let mut fields = Fields::default();

    for param in &query.params {
        let shape = TypeShape::parse(&param.go_type);
        let message = match &shape {
            TypeShape::Named(name) if known.contains(name.as_str()) => Some(name.clone()),
            TypeShape::Pointer(inner) => match inner.as_ref() {
                TypeShape::Named(name) if known.contains(name.as_str()) => Some(name.clone()),
                _ => None,
            },
            _ => None,
        };

        match message {
            Some(name) => fields.push(
                to_snake_case(&name),
                &name,
                false,
                format!("{name} to process"),
            ),
            None => {
                let resolved = ctx.table.resolve_shape(&shape, ctx.locals);
                fields.push(
                    to_snake_case(&param.name),
                    &resolved.wire_type,
                    resolved.repeated,
                    format!("{} parameter", param.name),
                );
            }
        }
    }

    if query.params.is_empty()
        && (query.name.starts_with("Get") || query.name.starts_with("Delete"))
    {
        fields.push(
            format!("{}_id", to_snake_case(entity)),
            "int32",
            false,
            format!("ID of the {entity}"),
        );
    }

    if is_list(&query.name) {
        if !fields.has_role(PaginationRole::PageSize, ctx.pagination) {
            fields.push_pagination(
                PaginationRole::PageSize,
                "int32",
                "Maximum number of results to return",
            );
        }
        if !fields.has_role(PaginationRole::PageToken, ctx.pagination) {
            fields.push_pagination(
                PaginationRole::PageToken,
                "string",
                "Page token for pagination",
            );
        }
    }

    fields.0
}

fn response_fields(
    query: &QueryDescriptor,
    known: &BTreeSet<&str>,
    ctx: &SynthesisContext<'_>,
) -> Vec<ServiceField> {
    let mut fields = Fields::default();

    match &query.return_type {
        Some(return_type) => {
            let wire_type = if known.contains(return_type.as_str()) {
                return_type.clone()
            } else {
                ctx.table
                    .resolve_shape(&TypeShape::parse(return_type), ctx.locals)
                    .wire_type
            };
            let base = to_snake_case(return_type.rsplit('.').next().unwrap_or(return_type));

            if query.returns_slice {
                fields.push(
                    format!("{base}s"),
                    &wire_type,
                    true,
                    format!("List of {return_type} results"),
                );
                if is_list(&query.name) {
                    fields.push_pagination(
                        PaginationRole::NextPageToken,
                        "string",
                        "Token for retrieving the next page of results",
                    );
                    fields.push_pagination(
                        PaginationRole::TotalSize,
                        "int32",
                        "Total number of results available",
                    );
                }
            } else {
                fields.push(base, &wire_type, false, format!("The {return_type} result"));
            }
        }
        None if query.kind == QueryKind::Exec => {
            fields.push(
                "success".to_string(),
                "bool",
                false,
                "Whether the operation was successful".to_string(),
            );
            fields.push(
                "affected_rows".to_string(),
                "int32",
                false,
                "Number of rows affected by the operation".to_string(),
            );
        }
        None => {}
    }

    fields.0
}

// ============================================================================
// Passes
// ============================================================================

/// Rename services according to the configured strategy.
pub fn apply_naming(
    services: &mut [ServiceDescriptor],
    naming: ServiceNaming,
    prefix: &str,
    suffix: &str,
) {
    if naming != ServiceNaming::Custom {
        return;
    }

    for service in services {
        let mut name = format!("{prefix}{}", service.name);
        if !suffix.is_empty() && suffix != DEFAULT_SERVICE_SUFFIX {
            name = match name.strip_suffix(DEFAULT_SERVICE_SUFFIX) {
                Some(base) => format!("{base}{suffix}"),
                None => format!("{name}{suffix}"),
            };
        }
        service.name = name;
    }
}

/// Mark `List` methods as server-streaming.
pub fn apply_streaming(services: &mut [ServiceDescriptor]) {
    for method in services.iter_mut().flat_map(|s| s.methods.iter_mut()) {
        if is_list(&method.name) {
            method.server_streaming = true;
        }
    }
}

/// Rename synthesized pagination fields of `List` methods to the configured
/// names. Only fields still carrying their default name are touched, so
/// running the pass again changes nothing.
pub fn apply_pagination_names(services: &mut [ServiceDescriptor], names: &PaginationNames) {
    let methods = services
        .iter_mut()
        .flat_map(|s| s.methods.iter_mut())
        .filter(|m| is_list(&m.name));

    for method in methods {
        let fields = method
            .request_fields
            .iter_mut()
            .chain(method.response_fields.iter_mut());
        for field in fields {
            if let Some(role) = field.pagination
                && field.name == role.default_name()
            {
                field.name = names.name(role).to_string();
            }
        }
    }
}
