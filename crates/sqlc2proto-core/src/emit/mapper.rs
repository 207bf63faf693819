//! `mappers.go` rendering.
//!
//! One `<Struct>ToProto` / `<Struct>FromProto` pair per message, then only
//! the helper functions those pairs reference, in [`Helper`] order.

use super::{Templates, Values};
use crate::conversion::{GoImport, Helper};
use crate::error::GenerateResult;
use crate::ir::MessageDescriptor;
use crate::naming::go_camel_case;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Import paths of the two Go packages the mappers convert between.
#[derive(Debug, Clone)]
pub struct MapperImports<'a> {
    /// protoc-gen-go output package, imported as `pb`.
    pub proto: &'a str,
    /// sqlc package, imported as `db`.
    pub db: &'a str,
}

/// Helpers and imports referenced by the conversions of `messages`.
pub fn collect_requirements(messages: &[MessageDescriptor]) -> (BTreeSet<Helper>, BTreeSet<GoImport>) {
    let mut helpers = BTreeSet::new();
    let mut imports = BTreeSet::new();
    for field in messages.iter().flat_map(|m| &m.fields) {
        field.conversion.collect_requirements(&mut helpers, &mut imports);
    }
    (helpers, imports)
}

fn import_block(imports: &BTreeSet<GoImport>, packages: Option<&MapperImports<'_>>) -> String {
    let std: Vec<_> = imports.iter().filter(|i| i.is_std()).collect();
    let third_party: Vec<_> = imports.iter().filter(|i| !i.is_std()).collect();
    if std.is_empty() && third_party.is_empty() && packages.is_none() {
        return String::new();
    }

    let mut block = String::from("\nimport (\n");
    for import in &std {
        let _ = writeln!(block, "\t\"{}\"", import.path());
    }
    if !std.is_empty() && (!third_party.is_empty() || packages.is_some()) {
        block.push('\n');
    }
    for import in &third_party {
        let _ = writeln!(block, "\t\"{}\"", import.path());
    }
    if let Some(packages) = packages {
        let _ = writeln!(block, "\tpb \"{}\"", packages.proto);
        let _ = writeln!(block, "\tdb \"{}\"", packages.db);
    }
    block.push_str(")\n");
    block
}

/// Render the mapper pair of one message.
pub fn render_mapper(message: &MessageDescriptor, templates: &Templates) -> GenerateResult<String> {
    let mut to_fields = String::new();
    let mut from_fields = String::new();
    for field in &message.fields {
        let proto_name = go_camel_case(&field.name);
        if !field.conversion.is_supported() {
            let _ = writeln!(to_fields, "\t\t// {proto_name}: no conversion from db.{}", message.source_struct);
            let _ = writeln!(from_fields, "\t\t// {}: no conversion from pb.{}", field.source_name, message.name);
            continue;
        }
        let _ = writeln!(to_fields, "\t\t{proto_name}: {},", field.to_proto);
        let _ = writeln!(from_fields, "\t\t{}: {},", field.source_name, field.from_proto);
    }

    templates.mapper.render(
        &Values::new()
            .set("struct", message.source_struct.as_str())
            .set("name", message.name.as_str())
            .set("to_fields", to_fields)
            .set("from_fields", from_fields),
    )
}

/// Render `mappers.go`.
pub fn render_mappers(
    messages: &[MessageDescriptor],
    packages: &MapperImports<'_>,
    templates: &Templates,
) -> GenerateResult<String> {
    let (helpers, imports) = collect_requirements(messages);
    // Without messages nothing references `pb` or `db`.
    let packages = (!messages.is_empty()).then_some(packages);

    let mut helper_source = String::new();
    for helper in &helpers {
        helper_source.push('\n');
        helper_source.push_str(helper.source());
    }

    let mut mappers = String::new();
    for message in messages {
        mappers.push('\n');
        mappers.push_str(&render_mapper(message, templates)?);
    }

    templates.mappers_go.render(
        &Values::new()
            .set("imports", import_block(&imports, packages))
            .set("helpers", helper_source)
            .set("mappers", mappers),
    )
}
