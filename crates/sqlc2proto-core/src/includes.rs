//! Includes file: a user-selected subset of models and queries.
//!
//! The file is YAML with two lists:
//!
//! ```yaml
//! models:
//! - Author
//! # - Book
//!
//! queries:
//! - GetAuthor
//! ```
//!
//! Commented entries are plain YAML comments, so only active entries are
//! read back.

use crate::emit::writer::write_atomic;
use crate::error::{GenerateError, GenerateResult};
use crate::ir::{MessageDescriptor, QueryDescriptor};
use crate::typemap::{TypeShape, is_wire_primitive};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

/// Selected model and query names, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludesSet {
    pub models: Vec<String>,
    pub queries: Vec<String>,
}

/// On-disk shape. Lists whose entries are all commented out read as null.
#[derive(Debug, Default, Deserialize)]
struct IncludesFile {
    #[serde(default)]
    models: Option<Vec<String>>,
    #[serde(default)]
    queries: Option<Vec<String>>,
}

impl IncludesSet {
    /// Parse includes YAML. Empty or comment-only text is an empty set.
    pub fn from_yaml(text: &str) -> GenerateResult<Self> {
        let has_content = text
            .lines()
            .map(str::trim)
            .any(|line| !line.is_empty() && !line.starts_with('#'));
        if !has_content {
            return Ok(Self::default());
        }

        let file: IncludesFile = serde_yaml::from_str(text)?;
        Ok(Self {
            models: file.models.unwrap_or_default(),
            queries: file.queries.unwrap_or_default(),
        })
    }

    /// Read and parse an includes file.
    pub fn load(path: &Path) -> GenerateResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;
        Self::from_yaml(&text)
    }

    /// True when neither list selects anything.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.queries.is_empty()
    }

    pub fn includes_model(&self, name: &str) -> bool {
        self.models.iter().any(|m| m == name)
    }

    pub fn includes_query(&self, name: &str) -> bool {
        self.queries.iter().any(|q| q == name)
    }
}

/// Render an includes file listing every name, all active or all commented.
pub fn render_template(models: &[String], queries: &[String], commented: bool) -> String {
    let prefix = if commented { "# - " } else { "- " };
    let mut out = String::from("models:\n");
    for model in models {
        let _ = writeln!(out, "{prefix}{model}");
    }
    out.push_str("\nqueries:\n");
    for query in queries {
        let _ = writeln!(out, "{prefix}{query}");
    }
    out
}

/// Write the includes template to `path`.
pub fn write_template(
    path: &Path,
    models: &[String],
    queries: &[String],
    commented: bool,
) -> GenerateResult<()> {
    write_atomic(path, &render_template(models, queries, commented))
}

// ============================================================================
// Dependency closure
// ============================================================================

/// Expand the model list with every message reachable from the explicit
/// models and from the parameter and return types of the included queries.
///
/// Explicit models keep their order and come first; additions follow in
/// discovery order. Query names are returned as given.
pub fn resolve_dependencies(
    includes: &IncludesSet,
    queries: &[QueryDescriptor],
    messages: &[MessageDescriptor],
) -> IncludesSet {
    let known: BTreeMap<&str, &MessageDescriptor> =
        messages.iter().map(|m| (m.name.as_str(), m)).collect();

    let mut closure = Closure {
        known,
        present: includes.models.iter().cloned().collect(),
        order: includes.models.clone(),
    };

    for model in &includes.models {
        closure.visit_fields(model);
    }

    for name in &includes.queries {
        let Some(query) = queries.iter().find(|q| &q.name == name) else {
            debug!(query = %name, "included query not found");
            continue;
        };
        for param in &query.params {
            if let Some(base) = TypeShape::parse(&param.go_type).base_name() {
                closure.add(&base);
            }
        }
        if let Some(return_type) = &query.return_type {
            closure.add(return_type);
        }
    }

    IncludesSet {
        models: closure.order,
        queries: includes.queries.clone(),
    }
}

/// Model names present in `resolved` but not in `original`, in resolved order.
pub fn dependency_additions(original: &IncludesSet, resolved: &IncludesSet) -> Vec<String> {
    resolved
        .models
        .iter()
        .filter(|model| !original.includes_model(model))
        .cloned()
        .collect()
}

struct Closure<'a> {
    known: BTreeMap<&'a str, &'a MessageDescriptor>,
    present: BTreeSet<String>,
    order: Vec<String>,
}

impl Closure<'_> {
    fn add(&mut self, name: &str) {
        if !self.known.contains_key(name) || self.present.contains(name) {
            return;
        }
        self.present.insert(name.to_string());
        self.order.push(name.to_string());
        self.visit_fields(name);
    }

    fn visit_fields(&mut self, name: &str) {
        let Some(message) = self.known.get(name).copied() else {
            return;
        };
        for field in &message.fields {
            if !is_wire_primitive(&field.wire_type) {
                self.add(&field.wire_type);
            }
        }
    }
}
