#![allow(non_snake_case)]

use super::*;
use crate::conversion::Helper;
use std::path::Path;
use tempfile::TempDir;
use test_case::test_case;

// Parsing tests

#[test]
fn GeneratorConfig___missing_keys___defaults() {
    let config = GeneratorConfig::from_yaml("protoPackage: api.v2\nwithMappers: true\n").unwrap();

    assert_eq!(config.proto_package, "api.v2");
    assert!(config.with_mappers);
    assert_eq!(config.sqlc_dir, PathBuf::from("./db/sqlc"));
    assert_eq!(config.proto_dir, PathBuf::from("./proto/gen"));
    assert_eq!(config.field_style, FieldStyle::TagPreferred);
    assert_eq!(config.service_suffix, "Service");
    assert!(config.service_options.include_pagination);
    assert_eq!(config.service_options.page_size_field, "limit");
}

#[test]
fn GeneratorConfig___comment_only___default() {
    let config = GeneratorConfig::from_yaml("# nothing here\n\n").unwrap();

    assert_eq!(config, GeneratorConfig::default());
}

#[test]
fn GeneratorConfig___full_file___all_keys_read() {
    let yaml = r#"
sqlcDir: internal/db
protoDir: gen/proto
protoPackage: shop.v1
goPackage: example.com/shop/gen/proto
moduleName: example.com/shop
protoGoImport: example.com/shop/gen/proto/shopv1
withMappers: true
withServices: true
fieldStyle: snake_case
serviceNaming: custom
servicePrefix: Api
serviceSuffix: Handler
serviceOptions:
  splitServices: true
  enableStreaming: true
  pageSizeField: page_size
typeMappings:
  "decimal.Decimal": "string"
nullableTypeMappings:
  "sql.NullString": "google.protobuf.StringValue"
customConverters:
  "decimal.Decimal":
    toProto: decimalToString
    fromProto: stringToDecimal
includeFile: includes.yaml
templateDir: templates
"#;

    let config = GeneratorConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.sqlc_dir, PathBuf::from("internal/db"));
    assert_eq!(config.field_style, FieldStyle::SnakeCase);
    assert_eq!(config.service_naming, ServiceNaming::Custom);
    assert_eq!(config.service_prefix, "Api");
    assert!(config.service_options.split_services);
    assert!(config.service_options.enable_streaming);
    assert!(config.service_options.include_pagination);
    assert_eq!(config.service_options.page_size_field, "page_size");
    assert_eq!(config.service_options.page_token_field, "page_token");
    assert_eq!(config.type_mappings["decimal.Decimal"], "string");
    assert_eq!(config.custom_converters["decimal.Decimal"].to_proto, "decimalToString");
    assert_eq!(config.include_file(), Some(Path::new("includes.yaml")));
    assert_eq!(config.template_dir, Some(PathBuf::from("templates")));
}

#[test]
fn GeneratorConfig___null_mapping_sections___empty() {
    let yaml = "typeMappings:\n#  \"CustomType\": \"string\"\nnullableTypeMappings:\ncustomConverters:\n";

    let config = GeneratorConfig::from_yaml(yaml).unwrap();

    assert!(config.type_mappings.is_empty());
    assert!(config.nullable_type_mappings.is_empty());
    assert!(config.custom_converters.is_empty());
}

#[test]
fn GeneratorConfig___unknown_field_style___yaml_error() {
    let err = GeneratorConfig::from_yaml("fieldStyle: kebab\n").unwrap_err();

    assert!(matches!(err, GenerateError::Yaml(_)));
}

#[test]
fn GeneratorConfig___field_style_alias___tag_preferred() {
    let config = GeneratorConfig::from_yaml("fieldStyle: tag-preferred\n").unwrap();

    assert_eq!(config.field_style, FieldStyle::TagPreferred);
}

#[test]
fn load___missing_file___io_error() {
    let dir = TempDir::new().unwrap();

    let err = GeneratorConfig::load(&dir.path().join("nope.yaml")).unwrap_err();

    assert!(matches!(err, GenerateError::Io { .. }));
}

#[test]
fn discover___first_name_in_order_wins() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".sqlc2proto.yml"), "").unwrap();
    std::fs::write(dir.path().join("sqlc2proto.yml"), "").unwrap();

    let found = GeneratorConfig::discover(dir.path());

    assert_eq!(found, Some(dir.path().join("sqlc2proto.yml")));
}

#[test]
fn discover___none_present___none() {
    let dir = TempDir::new().unwrap();

    assert_eq!(GeneratorConfig::discover(dir.path()), None);
}

// Validation tests

#[test_case("api.v1" ; "dotted")]
#[test_case("shop" ; "single segment")]
#[test_case("my_company.api.v1" ; "underscore")]
fn validate___package_accepted(package: &str) {
    let config = GeneratorConfig {
        proto_package: package.to_string(),
        ..GeneratorConfig::default()
    };

    assert!(config.validate().is_ok());
}

#[test_case("" ; "empty")]
#[test_case("api..v1" ; "empty segment")]
#[test_case("1api.v1" ; "leading digit")]
#[test_case("api-v1" ; "dash")]
fn validate___package_rejected(package: &str) {
    let config = GeneratorConfig {
        proto_package: package.to_string(),
        ..GeneratorConfig::default()
    };

    assert!(matches!(config.validate(), Err(GenerateError::Config(_))));
}

#[test]
fn validate___empty_pagination_name___rejected() {
    let mut config = GeneratorConfig::default();
    config.service_options.next_page_token_field = " ".to_string();

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("nextPageTokenField"));
}

#[test]
fn validate___half_custom_converter___rejected() {
    let mut config = GeneratorConfig::default();
    config.custom_converters.insert(
        "decimal.Decimal".to_string(),
        CustomConverter {
            to_proto: "decimalToString".to_string(),
            from_proto: String::new(),
        },
    );

    assert!(matches!(config.validate(), Err(GenerateError::Config(_))));
}

// Type table tests

#[test]
fn type_table___custom_mapping_added() {
    let mut config = GeneratorConfig::default();
    config
        .type_mappings
        .insert("decimal.Decimal".to_string(), "string".to_string());

    let table = config.type_table();

    let resolved = table.resolve("decimal.Decimal");
    assert!(resolved.matched);
    assert_eq!(resolved.wire_type, "string");
    assert!(table.resolve("int64").matched);
}

#[test]
fn type_table___remapped_builtin___converter_reset() {
    let mut config = GeneratorConfig::default();
    config
        .nullable_type_mappings
        .insert("sql.NullString".to_string(), "google.protobuf.StringValue".to_string());

    let table = config.type_table();

    let resolved = table.resolve("sql.NullString");
    assert_eq!(resolved.wire_type, "google.protobuf.StringValue");
    assert!(resolved.optional);
    assert_eq!(resolved.conversion, Conversion::Identity);
}

#[test]
fn type_table___same_wire_type___builtin_converter_kept() {
    let mut config = GeneratorConfig::default();
    config
        .nullable_type_mappings
        .insert("sql.NullString".to_string(), "string".to_string());

    let table = config.type_table();

    assert_eq!(
        table.resolve("sql.NullString").conversion,
        Helper::NullString.conversion()
    );
}

#[test]
fn type_table___custom_converter___call_without_helper() {
    let mut config = GeneratorConfig::default();
    config
        .type_mappings
        .insert("uuid.UUID".to_string(), "bytes".to_string());
    config.custom_converters.insert(
        "uuid.UUID".to_string(),
        CustomConverter {
            to_proto: "uuidToBytes".to_string(),
            from_proto: "bytesToUUID".to_string(),
        },
    );

    let table = config.type_table();

    let resolved = table.resolve("uuid.UUID");
    assert_eq!(resolved.wire_type, "bytes");
    assert_eq!(resolved.conversion.render_to_wire("in.ID"), "uuidToBytes(in.ID)");
    assert_eq!(
        resolved.conversion,
        Conversion::Call {
            to_wire: "uuidToBytes".to_string(),
            from_wire: "bytesToUUID".to_string(),
            helper: None,
        }
    );
}

// Import path tests

#[test]
fn resolve_go_package___explicit_wins() {
    let config = GeneratorConfig {
        go_package: Some("example.com/x/pb".to_string()),
        module_name: Some("example.com/x".to_string()),
        ..GeneratorConfig::default()
    };

    assert_eq!(config.resolve_go_package(Some("example.com/gomod")), "example.com/x/pb");
}

#[test]
fn resolve_go_package___module_name___joined_with_proto_dir() {
    let config = GeneratorConfig {
        go_package: Some(String::new()),
        module_name: Some("example.com/x".to_string()),
        ..GeneratorConfig::default()
    };

    assert_eq!(config.resolve_go_package(None), "example.com/x/proto/gen");
}

#[test]
fn resolve_go_package___go_mod___module_proto() {
    let config = GeneratorConfig::default();

    assert_eq!(
        config.resolve_go_package(Some("example.com/gomod")),
        "example.com/gomod/proto"
    );
}

#[test]
fn resolve_go_package___nothing_known___placeholder() {
    let config = GeneratorConfig::default();

    assert_eq!(
        config.resolve_go_package(None),
        "github.com/yourusername/yourproject/gen/api.v0"
    );
}

#[test]
fn proto_import___override_or_go_package() {
    let mut config = GeneratorConfig::default();
    assert_eq!(config.proto_import("example.com/x/proto"), "example.com/x/proto");

    config.proto_go_import = Some("example.com/x/gen/apiv1".to_string());
    assert_eq!(config.proto_import("example.com/x/proto"), "example.com/x/gen/apiv1");
}

#[test]
fn db_import___module_and_sqlc_dir() {
    let config = GeneratorConfig {
        sqlc_dir: PathBuf::from("././internal/db/"),
        ..GeneratorConfig::default()
    };

    assert_eq!(config.db_import(Some("example.com/x")), "example.com/x/internal/db");
    assert_eq!(
        GeneratorConfig::default().db_import(None),
        "github.com/yourusername/yourproject/db/sqlc"
    );
}

// go.mod tests

#[test]
fn detect_go_module___first_line_module() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("go.mod"),
        "module example.com/shop\n\ngo 1.22\n",
    )
    .unwrap();

    assert_eq!(
        detect_go_module(dir.path()).unwrap().as_deref(),
        Some("example.com/shop")
    );
}

#[test]
fn detect_go_module___missing_or_malformed___none() {
    let dir = TempDir::new().unwrap();
    assert_eq!(detect_go_module(dir.path()).unwrap(), None);

    std::fs::write(dir.path().join("go.mod"), "go 1.22\nmodule example.com/shop\n").unwrap();
    assert_eq!(detect_go_module(dir.path()).unwrap(), None);
}

// Commented config tests

#[test]
fn render_commented___init_config___reads_back_equal() {
    let config = GeneratorConfig::for_init(Some("example.com/shop"));

    let text = config.render_commented().unwrap();
    let parsed = GeneratorConfig::from_yaml(&text).unwrap();

    assert_eq!(parsed, config);
    assert!(text.contains("moduleName: \"example.com/shop\""));
    assert!(text.contains("goPackage: \"example.com/shop/proto\""));
    assert!(text.contains("# protoGoImport: "));
    assert!(text.contains("# includeFile: \"sqlc2proto.includes.yaml\""));
}

#[test]
fn render_commented___without_module___commented_lines() {
    let config = GeneratorConfig::for_init(None);

    let text = config.render_commented().unwrap();

    assert!(text.contains("# moduleName: \"github.com/yourusername/yourproject\""));
    assert!(text.contains("# goPackage: "));
    assert!(text.contains("protoPackage: \"api.v1\""));
    assert_eq!(GeneratorConfig::from_yaml(&text).unwrap(), config);
}

#[test]
fn render_commented___mappings_and_converters___reads_back_equal() {
    let mut config = GeneratorConfig::for_init(None);
    config.service_naming = ServiceNaming::Custom;
    config.service_prefix = "Api".to_string();
    config.include_file = Some(PathBuf::from("includes.yaml"));
    config
        .type_mappings
        .insert("decimal.Decimal".to_string(), "string".to_string());
    config.custom_converters.insert(
        "decimal.Decimal".to_string(),
        CustomConverter {
            to_proto: "decimalToString".to_string(),
            from_proto: "stringToDecimal".to_string(),
        },
    );

    let text = config.render_commented().unwrap();

    assert_eq!(GeneratorConfig::from_yaml(&text).unwrap(), config);
}
