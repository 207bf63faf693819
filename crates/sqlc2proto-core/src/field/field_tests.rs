#![allow(non_snake_case)]

use super::*;
use crate::conversion::Conversion;
use test_case::test_case;

fn extract(name: &str, ty: &str, tag: Option<&str>, style: FieldStyle) -> Option<FieldDescriptor> {
    let input = FieldInput {
        name: Some(name),
        ty: TypeShape::parse(ty),
        tag,
        doc: &[],
    };
    extract_field(
        &input,
        1,
        style,
        &TypeMappingConfig::default(),
        &LocalTypes::default(),
    )
}

// FieldStyle tests

#[test_case(FieldStyle::SnakeCase, "UserID", None, "user_id" ; "snake case id")]
#[test_case(FieldStyle::Original, "UserID", None, "UserID" ; "original")]
#[test_case(FieldStyle::TagPreferred, "UserID", Some("uid"), "uid" ; "tag preferred with tag")]
#[test_case(FieldStyle::TagPreferred, "UserID", None, "user_id" ; "tag preferred without tag")]
#[test_case(FieldStyle::SnakeCase, "UserID", Some("uid"), "user_id" ; "snake case ignores tag")]
fn FieldStyle___field_name(style: FieldStyle, go_name: &str, json: Option<&str>, expected: &str) {
    assert_eq!(style.field_name(go_name, json), expected);
}

#[test_case("original", FieldStyle::Original ; "original")]
#[test_case("snake_case", FieldStyle::SnakeCase ; "snake")]
#[test_case("json", FieldStyle::TagPreferred ; "json")]
#[test_case("tag-preferred", FieldStyle::TagPreferred ; "dash alias")]
#[test_case("tag_preferred", FieldStyle::TagPreferred ; "underscore alias")]
fn FieldStyle___from_str___accepts_names_and_aliases(input: &str, expected: FieldStyle) {
    assert_eq!(input.parse::<FieldStyle>().unwrap(), expected);
}

#[test]
fn FieldStyle___from_str___unknown___config_error() {
    let err = "camel".parse::<FieldStyle>().unwrap_err();

    assert!(matches!(err, GenerateError::Config(_)));
}

#[test]
fn FieldStyle___deserialize___aliases() {
    let style: FieldStyle = serde_yaml::from_str("tag-preferred").unwrap();

    assert_eq!(style, FieldStyle::TagPreferred);
    assert_eq!(style.to_string(), "json");
}

// StructTag tests

#[test]
fn StructTag___parse___multiple_keys() {
    let tag = StructTag::parse(r#"json:"user_id,omitempty" db:"user_id""#);

    assert_eq!(tag.lookup("json"), Some("user_id,omitempty"));
    assert_eq!(tag.lookup("db"), Some("user_id"));
    assert_eq!(tag.lookup("yaml"), None);
}

#[test]
fn StructTag___parse___escaped_quote_in_value() {
    let tag = StructTag::parse(r#"doc:"say \"hi\"" json:"x""#);

    assert_eq!(tag.lookup("doc"), Some(r#"say "hi""#));
    assert_eq!(tag.lookup("json"), Some("x"));
}

#[test]
fn StructTag___parse___malformed_tail___keeps_earlier_pairs() {
    let tag = StructTag::parse(r#"json:"id" broken db:"x""#);

    assert_eq!(tag.lookup("json"), Some("id"));
    assert_eq!(tag.lookup("db"), None);
}

#[test]
fn StructTag___parse___unterminated_value___empty() {
    let tag = StructTag::parse(r#"json:"id"#);

    assert_eq!(tag, StructTag::default());
}

#[test_case(r#"json:"id""#, Some("id") ; "plain")]
#[test_case(r#"json:"id,omitempty""#, Some("id") ; "with option")]
#[test_case(r#"json:"-""#, None ; "dash")]
#[test_case(r#"json:",omitempty""#, None ; "empty name")]
#[test_case(r#"db:"id""#, None ; "no json key")]
fn StructTag___json_name(tag: &str, expected: Option<&str>) {
    assert_eq!(StructTag::parse(tag).json_name(), expected);
}

#[test]
fn StructTag___has_option___checks_options_not_names() {
    assert!(StructTag::parse(r#"json:"x,omitempty""#).has_option("omitempty"));
    assert!(!StructTag::parse(r#"json:"omitempty""#).has_option("omitempty"));
}

// extract_field tests

#[test]
fn extract_field___unexported___skipped() {
    assert!(extract("secret", "string", None, FieldStyle::SnakeCase).is_none());
}

#[test]
fn extract_field___embedded___skipped() {
    let input = FieldInput {
        name: None,
        ty: TypeShape::parse("Base"),
        tag: None,
        doc: &[],
    };

    let field = extract_field(
        &input,
        1,
        FieldStyle::SnakeCase,
        &TypeMappingConfig::default(),
        &LocalTypes::default(),
    );

    assert!(field.is_none());
}

#[test]
fn extract_field___nullable_int64_with_omitempty___optional_with_conversions() {
    let field = extract(
        "Age",
        "sql.NullInt64",
        Some(r#"json:"age,omitempty""#),
        FieldStyle::TagPreferred,
    )
    .unwrap();

    assert_eq!(field.wire_type, "int64");
    assert!(field.optional);
    assert_eq!(field.to_proto, "nullInt64ToInt64(in.Age)");
    assert_eq!(field.from_proto, "int64ToNullInt64(in.Age)");
}

#[test]
fn extract_field___omitempty_on_plain_type___optional() {
    let field = extract(
        "Nickname",
        "string",
        Some(r#"json:"nickname,omitempty""#),
        FieldStyle::TagPreferred,
    )
    .unwrap();

    assert!(field.optional);
    assert_eq!(field.conversion, Conversion::Identity);
    assert_eq!(field.to_proto, "in.Nickname");
}

#[test]
fn extract_field___plain_type_without_tag___required() {
    let field = extract("Name", "string", None, FieldStyle::SnakeCase).unwrap();

    assert!(!field.optional);
    assert!(field.json_name.is_none());
}

#[test]
fn extract_field___user_id___snake_and_original_styles() {
    let snake = extract("UserID", "int64", None, FieldStyle::SnakeCase).unwrap();
    let original = extract("UserID", "int64", None, FieldStyle::Original).unwrap();

    assert_eq!(snake.name, "user_id");
    assert_eq!(snake.from_proto, "in.UserId");
    assert_eq!(original.name, "UserID");
    assert_eq!(original.from_proto, "in.UserID");
}

#[test]
fn extract_field___json_name_kept_for_alias() {
    let field = extract(
        "AuthorID",
        "int64",
        Some(r#"json:"authorId""#),
        FieldStyle::SnakeCase,
    )
    .unwrap();

    assert_eq!(field.name, "author_id");
    assert_eq!(field.json_alias(), Some("authorId"));
}

#[test]
fn extract_field___json_alias_equal_to_name___not_rendered() {
    let field = extract("ID", "int64", Some(r#"json:"id""#), FieldStyle::TagPreferred).unwrap();

    assert_eq!(field.json_name.as_deref(), Some("id"));
    assert_eq!(field.json_alias(), None);
}

#[test]
fn extract_field___timestamp___conversion_uses_camel_case_proto_name() {
    let field = extract(
        "CreatedAt",
        "time.Time",
        Some(r#"json:"created_at""#),
        FieldStyle::TagPreferred,
    )
    .unwrap();

    assert_eq!(field.wire_type, "google.protobuf.Timestamp");
    assert_eq!(field.to_proto, "timestamppb.New(in.CreatedAt)");
    assert_eq!(field.from_proto, "in.CreatedAt.AsTime()");
}

#[test]
fn extract_field___unknown_shape___string_unmatched() {
    let field = extract("Meta", "map[string]any", None, FieldStyle::SnakeCase).unwrap();

    assert_eq!(field.wire_type, "string");
    assert!(!field.matched);
}

#[test]
fn extract_field___doc_lines___joined_with_space() {
    let doc = vec!["First line".to_string(), "second line".to_string()];
    let input = FieldInput {
        name: Some("Title"),
        ty: TypeShape::parse("string"),
        tag: None,
        doc: &doc,
    };

    let field = extract_field(
        &input,
        3,
        FieldStyle::SnakeCase,
        &TypeMappingConfig::default(),
        &LocalTypes::default(),
    )
    .unwrap();

    assert_eq!(field.doc.as_deref(), Some("First line second line"));
    assert_eq!(field.number, 3);
}

#[test]
fn extract_field___byte_slices() {
    let blob = extract("Data", "[]byte", None, FieldStyle::SnakeCase).unwrap();
    let blobs = extract("Chunks", "[][]byte", None, FieldStyle::SnakeCase).unwrap();

    assert_eq!((blob.wire_type.as_str(), blob.repeated), ("bytes", false));
    assert_eq!((blobs.wire_type.as_str(), blobs.repeated), ("bytes", true));
}
