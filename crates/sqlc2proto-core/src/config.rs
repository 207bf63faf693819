//! Generator configuration (`sqlc2proto.yaml`).

use crate::conversion::Conversion;
use crate::emit::{Template, Values};
use crate::error::{GenerateError, GenerateResult};
use crate::field::FieldStyle;
use crate::service::{PaginationNames, ServiceNaming};
use crate::typemap::{TypeMappingBuilder, TypeMappingConfig};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file names looked up in the working directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "sqlc2proto.yaml",
    "sqlc2proto.yml",
    ".sqlc2proto.yaml",
    ".sqlc2proto.yml",
];

/// Default includes file written by `getincludes`.
pub const DEFAULT_INCLUDES_FILE: &str = "sqlc2proto.includes.yaml";

/// Module path used when neither the config nor `go.mod` names one.
pub const PLACEHOLDER_MODULE: &str = "github.com/yourusername/yourproject";

mod embedded {
    pub const CONFIG: &str = include_str!("../templates/config/sqlc2proto.yaml.tmpl");
}

/// Treat an explicit `null` (a key with only commented entries) as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Go functions converting one type, named in `customConverters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConverter {
    pub to_proto: String,
    pub from_proto: String,
}

/// Service generation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceOptions {
    /// Rename the synthesized pagination fields to the names below
    pub include_pagination: bool,

    /// One `.proto` file per service instead of `service.proto`
    pub split_services: bool,

    /// Server-streaming `List` methods
    pub enable_streaming: bool,

    pub page_size_field: String,
    pub page_token_field: String,
    pub next_page_token_field: String,
    pub total_size_field: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        let names = PaginationNames::default();
        Self {
            include_pagination: true,
            split_services: false,
            enable_streaming: false,
            page_size_field: names.page_size,
            page_token_field: names.page_token,
            next_page_token_field: names.next_page_token,
            total_size_field: names.total_size,
        }
    }
}

impl ServiceOptions {
    pub fn pagination_names(&self) -> PaginationNames {
        PaginationNames {
            page_size: self.page_size_field.clone(),
            page_token: self.page_token_field.clone(),
            next_page_token: self.next_page_token_field.clone(),
            total_size: self.total_size_field.clone(),
        }
    }
}

/// Everything one generation run needs to know.
///
/// Keys are camelCase in YAML. Missing keys take their defaults, and empty
/// strings for the optional paths count as unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Directory of the sqlc-generated Go package
    pub sqlc_dir: PathBuf,

    /// Output directory
    pub proto_dir: PathBuf,

    /// `package` of the generated `.proto` files
    pub proto_package: String,

    /// `option go_package`; derived when unset
    pub go_package: Option<String>,

    /// Go module path used to derive import paths
    pub module_name: Option<String>,

    /// Import path of the protoc-gen-go output, used by the mappers
    pub proto_go_import: Option<String>,

    pub with_mappers: bool,
    pub with_services: bool,
    pub field_style: FieldStyle,
    pub service_naming: ServiceNaming,
    pub service_prefix: String,
    pub service_suffix: String,
    pub service_options: ServiceOptions,

    #[serde(deserialize_with = "null_as_default")]
    pub type_mappings: BTreeMap<String, String>,

    #[serde(deserialize_with = "null_as_default")]
    pub nullable_type_mappings: BTreeMap<String, String>,

    #[serde(deserialize_with = "null_as_default")]
    pub custom_converters: BTreeMap<String, CustomConverter>,

    /// YAML file selecting models and queries
    pub include_file: Option<PathBuf>,

    /// Directory of template overrides
    pub template_dir: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sqlc_dir: PathBuf::from("./db/sqlc"),
            proto_dir: PathBuf::from("./proto/gen"),
            proto_package: "api.v0".to_string(),
            go_package: None,
            module_name: None,
            proto_go_import: None,
            with_mappers: false,
            with_services: false,
            field_style: FieldStyle::default(),
            service_naming: ServiceNaming::default(),
            service_prefix: String::new(),
            service_suffix: "Service".to_string(),
            service_options: ServiceOptions::default(),
            type_mappings: BTreeMap::new(),
            nullable_type_mappings: BTreeMap::new(),
            custom_converters: BTreeMap::new(),
            include_file: None,
            template_dir: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `./db/sqlc` -> `db/sqlc`, with `/` separators.
fn import_suffix(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    let mut rest = text.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.trim_matches('/').to_string()
}

fn join_import(base: &str, suffix: &str) -> String {
    if suffix.is_empty() || suffix == "." {
        base.to_string()
    } else {
        format!("{}/{suffix}", base.trim_end_matches('/'))
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl GeneratorConfig {
    /// The config `init` writes: `api.v1`, with module paths from `go.mod`.
    pub fn for_init(go_mod_module: Option<&str>) -> Self {
        Self {
            proto_package: "api.v1".to_string(),
            module_name: go_mod_module.map(str::to_string),
            go_package: go_mod_module.map(|m| format!("{m}/proto")),
            ..Self::default()
        }
    }

    /// Parse YAML text. Blank or comment-only text is the default config.
    pub fn from_yaml(text: &str) -> GenerateResult<Self> {
        let meaningful = text
            .lines()
            .any(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'));
        if !meaningful {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> GenerateResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GenerateError::io(path, e))?;
        debug!(path = %path.display(), "loading config");
        Self::from_yaml(&text)
    }

    /// First of [`CONFIG_FILE_NAMES`] present in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Check values that would otherwise produce a broken schema.
    pub fn validate(&self) -> GenerateResult<()> {
        let package = self.proto_package.trim();
        if package.is_empty() {
            return Err(GenerateError::Config("protoPackage cannot be empty".into()));
        }
        if !package.split('.').all(is_identifier) {
            return Err(GenerateError::Config(format!(
                "protoPackage `{package}` must be dot-separated identifiers"
            )));
        }

        let options = &self.service_options;
        let names = [
            ("pageSizeField", &options.page_size_field),
            ("pageTokenField", &options.page_token_field),
            ("nextPageTokenField", &options.next_page_token_field),
            ("totalSizeField", &options.total_size_field),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(GenerateError::Config(format!(
                    "serviceOptions.{key} cannot be empty"
                )));
            }
        }

        for (go_type, converter) in &self.custom_converters {
            if converter.to_proto.trim().is_empty() || converter.from_proto.trim().is_empty() {
                return Err(GenerateError::Config(format!(
                    "customConverters.{go_type} needs both toProto and fromProto"
                )));
            }
        }
        Ok(())
    }

    /// Built-in mappings overlaid with the configured ones.
    ///
    /// Remapping a built-in type to a different wire type drops its built-in
    /// converter unless `customConverters` names one.
    pub fn type_table(&self) -> TypeMappingConfig {
        let builtin = TypeMappingConfig::default();
        let mut builder = TypeMappingBuilder::new().merge(
            self.type_mappings.clone(),
            self.nullable_type_mappings.clone(),
        );

        let remapped = self
            .type_mappings
            .iter()
            .filter(|(k, v)| builtin.standard().get(*k).is_some_and(|b| b != *v))
            .chain(
                self.nullable_type_mappings
                    .iter()
                    .filter(|(k, v)| builtin.nullable().get(*k).is_some_and(|b| b != *v)),
            );
        for (go_type, wire_type) in remapped {
            debug!(go_type = %go_type, wire_type = %wire_type, "built-in type remapped, converter reset");
            builder = builder.with_converter(go_type.clone(), Conversion::Identity);
        }

        for (go_type, converter) in &self.custom_converters {
            builder = builder.with_converter(
                go_type.clone(),
                Conversion::Call {
                    to_wire: converter.to_proto.clone(),
                    from_wire: converter.from_proto.clone(),
                    helper: None,
                },
            );
        }

        builder.build()
    }

    /// Module path: configured, else from `go.mod`.
    pub fn module<'a>(&'a self, go_mod_module: Option<&'a str>) -> Option<&'a str> {
        non_empty(&self.module_name).or(go_mod_module.filter(|m| !m.is_empty()))
    }

    /// `option go_package`: explicit, else `<moduleName>/<protoDir>`, else
    /// `<go.mod module>/proto`, else a placeholder.
    pub fn resolve_go_package(&self, go_mod_module: Option<&str>) -> String {
        if let Some(explicit) = non_empty(&self.go_package) {
            return explicit.to_string();
        }
        if let Some(module) = non_empty(&self.module_name) {
            return join_import(module, &import_suffix(&self.proto_dir));
        }
        if let Some(module) = go_mod_module.filter(|m| !m.is_empty()) {
            return format!("{module}/proto");
        }
        format!("{PLACEHOLDER_MODULE}/gen/{}", self.proto_package)
    }

    /// Import path of the protobuf Go package used by the mappers.
    pub fn proto_import(&self, go_package: &str) -> String {
        non_empty(&self.proto_go_import)
            .unwrap_or(go_package)
            .to_string()
    }

    /// Import path of the sqlc package used by the mappers.
    pub fn db_import(&self, go_mod_module: Option<&str>) -> String {
        let module = self.module(go_mod_module).unwrap_or(PLACEHOLDER_MODULE);
        join_import(module, &import_suffix(&self.sqlc_dir))
    }

    /// The configured includes file, if any.
    pub fn include_file(&self) -> Option<&Path> {
        self.include_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// The config as commented YAML, as written by `init`.
    pub fn render_commented(&self) -> GenerateResult<String> {
        let template = Template::parse("sqlc2proto.yaml.tmpl", embedded::CONFIG)?;
        let options = &self.service_options;

        let values = Values::new()
            .set("sqlc_dir", quote(&self.sqlc_dir.to_string_lossy()))
            .set("proto_dir", quote(&self.proto_dir.to_string_lossy()))
            .set("proto_package", quote(&self.proto_package))
            .set(
                "go_package",
                optional_line(
                    "goPackage",
                    non_empty(&self.go_package),
                    "github.com/yourusername/yourproject/proto",
                ),
            )
            .set(
                "module_name",
                optional_line("moduleName", non_empty(&self.module_name), PLACEHOLDER_MODULE),
            )
            .set(
                "proto_go_import",
                optional_line(
                    "protoGoImport",
                    non_empty(&self.proto_go_import),
                    "github.com/yourusername/yourproject/proto",
                ),
            )
            .set("with_mappers", self.with_mappers.to_string())
            .set("with_services", self.with_services.to_string())
            .set("service_naming", naming_name(self.service_naming))
            .set(
                "service_prefix",
                optional_line(
                    "servicePrefix",
                    Some(self.service_prefix.as_str()).filter(|p| !p.is_empty()),
                    "API",
                ),
            )
            .set("service_suffix", quote(&self.service_suffix))
            .set("include_pagination", options.include_pagination.to_string())
            .set("split_services", options.split_services.to_string())
            .set("enable_streaming", options.enable_streaming.to_string())
            .set("page_size_field", quote(&options.page_size_field))
            .set("page_token_field", quote(&options.page_token_field))
            .set("next_page_token_field", quote(&options.next_page_token_field))
            .set("total_size_field", quote(&options.total_size_field))
            .set("field_style", self.field_style.to_string())
            .set(
                "include_file",
                optional_line(
                    "includeFile",
                    self.include_file()
                        .map(|p| p.to_string_lossy())
                        .as_deref(),
                    DEFAULT_INCLUDES_FILE,
                ),
            )
            .set(
                "type_mappings",
                mapping_lines(
                    &self.type_mappings,
                    &[
                        "#  \"CustomType\": \"string\"",
                        "#  \"uuid.UUID\": \"bytes\"",
                    ],
                ),
            )
            .set(
                "nullable_type_mappings",
                mapping_lines(
                    &self.nullable_type_mappings,
                    &["#  \"sql.NullString\": \"google.protobuf.StringValue\""],
                ),
            )
            .set("custom_converters", converter_lines(&self.custom_converters));

        template.render(&values)
    }
}

/// Double-quoted YAML scalar body, without the surrounding quotes.
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn optional_line(key: &str, value: Option<&str>, example: &str) -> String {
    match value {
        Some(value) => format!("{key}: \"{}\"", quote(value)),
        None => format!("# {key}: \"{example}\""),
    }
}

fn naming_name(naming: ServiceNaming) -> &'static str {
    match naming {
        ServiceNaming::Entity => "entity",
        ServiceNaming::Flat => "flat",
        ServiceNaming::Custom => "custom",
    }
}

fn mapping_lines(map: &BTreeMap<String, String>, examples: &[&str]) -> String {
    if map.is_empty() {
        return examples.join("\n");
    }
    map.iter()
        .map(|(k, v)| format!("  \"{}\": \"{}\"", quote(k), quote(v)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn converter_lines(converters: &BTreeMap<String, CustomConverter>) -> String {
    if converters.is_empty() {
        return [
            "#  \"decimal.Decimal\":",
            "#    toProto: \"decimalToString\"",
            "#    fromProto: \"stringToDecimal\"",
        ]
        .join("\n");
    }
    converters
        .iter()
        .map(|(go_type, c)| {
            format!(
                "  \"{}\":\n    toProto: \"{}\"\n    fromProto: \"{}\"",
                quote(go_type),
                quote(&c.to_proto),
                quote(&c.from_proto)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Module path declared on the first line of `<dir>/go.mod`.
///
/// A missing file or a first line that is not a `module` directive yields
/// `None`.
pub fn detect_go_module(dir: &Path) -> GenerateResult<Option<String>> {
    let path = dir.join("go.mod");
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GenerateError::io(path, e)),
    };

    let module = text
        .lines()
        .next()
        .map(str::trim)
        .and_then(|line| line.strip_prefix("module "))
        .map(|m| m.trim().trim_matches('"').to_string())
        .filter(|m| !m.is_empty());
    if module.is_none() {
        debug!(path = %path.display(), "no module directive on the first line");
    }
    Ok(module)
}

#[cfg(test)]
#[path = "config/config_tests.rs"]
mod config_tests;
