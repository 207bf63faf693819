//! Source tree walker.
//!
//! Reads a sqlc output directory and produces message descriptors for its
//! struct types, and query descriptors for its `Querier` interface.

use crate::error::{GenerateError, GenerateResult};
use crate::field::{FieldInput, FieldStyle, extract_field};
use crate::ir::{MessageDescriptor, QueryDescriptor, QueryKind, QueryParam};
use crate::source::{self, InterfaceMethod, SourceFile, TypeExpr};
use crate::typemap::{LocalTypes, TypeMappingConfig};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Struct emitted by sqlc to hold the database handle.
const QUERIES_STRUCT: &str = "Queries";

/// Files searched for the `Querier` interface before any other `.go` file.
const QUERIER_FILES: [&str; 3] = ["querier.go", "db.go", "interface.go"];

const QUERIER_INTERFACE: &str = "Querier";

/// sqlc output that holds query plumbing rather than models.
const NON_MODEL_FILES: [&str; 4] = ["db.go", "querier.go", "copyfrom.go", "batch.go"];

/// Settings for [`walk_models`].
#[derive(Debug, Clone)]
pub struct WalkOptions<'a> {
    pub style: FieldStyle,
    pub proto_package: &'a str,
    pub table: &'a TypeMappingConfig,
}

/// Everything read from the model files of one package.
#[derive(Debug, Clone, Default)]
pub struct WalkedPackage {
    pub messages: Vec<MessageDescriptor>,
    pub locals: LocalTypes,
}

/// Walk `dir` and return one message per struct, in file-name order.
pub fn walk_models(dir: &Path, options: &WalkOptions<'_>) -> GenerateResult<Vec<MessageDescriptor>> {
    scan_package(dir, options).map(|package| package.messages)
}

/// Walk `dir`, keeping the package's declared types alongside the messages.
pub fn scan_package(dir: &Path, options: &WalkOptions<'_>) -> GenerateResult<WalkedPackage> {
    if !dir.is_dir() {
        return Err(GenerateError::SourceDirMissing(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            GenerateError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && is_model_file(entry.path()) {
            let path = entry.path().to_path_buf();
            debug!(file = %path.display(), "parsing model file");
            let parsed = source::read_source(&path)?;
            files.push((path, parsed));
        }
    }

    let locals = collect_local_types(files.iter().map(|(_, file)| file));

    let mut messages = Vec::new();
    for (path, file) in &files {
        messages.extend(file_messages(path, file, options, &locals));
    }

    Ok(WalkedPackage { messages, locals })
}

fn is_model_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.ends_with(".sql.go")
        && !NON_MODEL_FILES.contains(&name)
}

/// First pass: struct names become messages, other named types are aliases.
fn collect_local_types<'a>(files: impl Iterator<Item = &'a SourceFile>) -> LocalTypes {
    let mut locals = LocalTypes::default();

    for file in files {
        for decl in &file.decls {
            if decl.generic {
                continue;
            }
            match &decl.ty {
                TypeExpr::Struct(_) if !decl.alias && decl.name != QUERIES_STRUCT => {
                    locals.messages.insert(decl.name.clone());
                }
                TypeExpr::Struct(_) | TypeExpr::Interface(_) => {}
                other => {
                    locals.aliases.insert(decl.name.clone(), other.to_string());
                }
            }
        }
    }

    locals
}

/// Second pass over one file.
fn file_messages(
    path: &Path,
    file: &SourceFile,
    options: &WalkOptions<'_>,
    locals: &LocalTypes,
) -> Vec<MessageDescriptor> {
    let mut messages = Vec::new();

    for (decl, fields) in file.structs() {
        if decl.generic || decl.name == QUERIES_STRUCT {
            continue;
        }

        let mut descriptors = Vec::new();
        for field in fields {
            // Each name of `A, B int64` is its own field. Embedded fields have no names.
            let names: Vec<Option<&str>> = if field.names.is_empty() {
                vec![None]
            } else {
                field.names.iter().map(|n| Some(n.as_str())).collect()
            };

            for name in names {
                let input = FieldInput {
                    name,
                    ty: field.ty.shape(),
                    tag: field.tag.as_deref(),
                    doc: &field.doc,
                };
                let number = descriptors.len() as u32 + 1;
                if let Some(descriptor) =
                    extract_field(&input, number, options.style, options.table, locals)
                {
                    descriptors.push(descriptor);
                }
            }
        }

        debug!(
            message = %decl.name,
            fields = descriptors.len(),
            file = %path.display(),
            "extracted message"
        );

        messages.push(MessageDescriptor {
            name: decl.name.clone(),
            fields: descriptors,
            doc: (!decl.doc.is_empty()).then(|| decl.doc.join(" ")),
            source_struct: decl.name.clone(),
            package: options.proto_package.to_string(),
            source_file: path.to_path_buf(),
        });
    }

    messages
}

// ============================================================================
// Querier
// ============================================================================

/// Read the methods of the sqlc `Querier` interface in `dir`.
pub fn parse_querier(dir: &Path) -> GenerateResult<Vec<QueryDescriptor>> {
    if !dir.is_dir() {
        return Err(GenerateError::SourceDirMissing(dir.to_path_buf()));
    }

    for path in querier_candidates(dir)? {
        let file = source::read_source(&path)?;
        if let Some(methods) = file.interface(QUERIER_INTERFACE) {
            debug!(file = %path.display(), methods = methods.len(), "found Querier interface");
            return Ok(methods.iter().map(query_descriptor).collect());
        }
    }

    Err(GenerateError::QuerierNotFound(dir.to_path_buf()))
}

/// Preferred file names first, then the remaining `.go` files by name.
fn querier_candidates(dir: &Path) -> GenerateResult<Vec<PathBuf>> {
    let mut candidates: Vec<PathBuf> = QUERIER_FILES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .collect();

    let mut rest = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| GenerateError::io(dir, e.into()))?;
        let path = entry.path();
        let is_go = path.extension().is_some_and(|ext| ext == "go");
        if entry.file_type().is_file() && is_go && !candidates.iter().any(|c| c == path) {
            rest.push(path.to_path_buf());
        }
    }

    candidates.extend(rest);
    Ok(candidates)
}

fn query_descriptor(method: &InterfaceMethod) -> QueryDescriptor {
    let params = method
        .params
        .iter()
        .filter(|param| !is_context(&param.ty))
        .filter_map(|param| {
            Some(QueryParam {
                name: param.name.clone()?,
                go_type: param.ty.to_string(),
            })
        })
        .collect();

    let mut kind = QueryKind::Exec;
    let mut return_type = None;
    let mut returns_slice = false;

    if let Some(result) = method.results.iter().find(|r| !r.ty.is_error()) {
        match &result.ty {
            TypeExpr::Slice(elem) => {
                kind = QueryKind::Many;
                returns_slice = true;
                return_type = Some(strip_pointer(elem).to_string());
            }
            other => {
                kind = QueryKind::One;
                return_type = Some(strip_pointer(other).to_string());
            }
        }
    }

    if kind == QueryKind::Exec {
        kind = kind_from_name(&method.name);
    }

    QueryDescriptor {
        name: method.name.clone(),
        kind,
        params,
        return_type,
        returns_slice,
        doc: (!method.doc.is_empty()).then(|| method.doc.join(" ")),
    }
}

fn is_context(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Qualified { package, name } if package == "context" && name == "Context")
}

fn strip_pointer(ty: &TypeExpr) -> &TypeExpr {
    match ty {
        TypeExpr::Pointer(inner) => strip_pointer(inner),
        other => other,
    }
}

/// Kind for methods whose results carry no value.
fn kind_from_name(name: &str) -> QueryKind {
    const ONE: [&str; 3] = ["Get", "Find", "Lookup"];
    const MANY: [&str; 3] = ["List", "Search", "Query"];

    if ONE.iter().any(|p| name.starts_with(p)) {
        QueryKind::One
    } else if MANY.iter().any(|p| name.starts_with(p)) {
        QueryKind::Many
    } else {
        QueryKind::Exec
    }
}
