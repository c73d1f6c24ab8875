//! Client and type code emission.
//!
//! Type code is always emitted in its typed form; the javascript flavor of
//! the type stub is derived by stripping the type syntax back out, while the
//! declaration file keeps the typed form. Client code is emitted directly in
//! the flavor the output mode asks for.

use crate::config::FieldType;
use crate::schema::{CollectionSchema, FieldSchema, SchemaArtifact};

use super::UserDocument;

const HEADER: &str = "// Generated by contentsync. Do not edit.\n";

/// Emit the typed type definitions for the schema.
pub fn emit_types(schema: &SchemaArtifact) -> String {
    let mut out = String::from(HEADER);
    out.push_str("\nexport type Maybe<T> = T | null;\n");

    for c in &schema.collections {
        out.push_str(&format!("\nexport interface {} {{\n", c.type_name));
        out.push_str("  id: string;\n  relativePath: string;\n");
        for f in &c.fields {
            out.push_str(&format!("  {}\n", ts_field(f, &schema.collections)));
        }
        out.push_str("}\n");

        out.push_str(&format!(
            "\nexport interface {ty}Connection {{\n  totalCount: number;\n  edges: Array<{{ cursor: string; node: {ty} }}>;\n}}\n",
            ty = c.type_name,
        ));
    }

    out.push_str("\nexport interface QueryResponses {\n");
    for (query, entry) in &schema.lookup {
        out.push_str(&format!("  {query}: {};\n", entry.type_name));
    }
    out.push_str("}\n");

    // Runtime exports survive transpilation
    let names: Vec<String> = schema
        .collections
        .iter()
        .map(|c| format!("\"{}\"", c.name))
        .collect();
    out.push_str(&format!(
        "\nexport const collectionNames = [{}];\n",
        names.join(", ")
    ));
    out
}

/// Emit the client module in the requested flavor.
pub fn emit_client(
    schema: &SchemaArtifact,
    user_docs: &[UserDocument],
    api_url: &str,
    typed: bool,
) -> String {
    let mut out = String::from(HEADER);

    if typed {
        out.push_str("\nimport type { QueryResponses } from \"./types\";\n");
    }

    out.push_str(&format!("\nconst API_URL = \"{api_url}\";\n"));

    out.push_str("\nconst DOCUMENTS = `");
    out.push_str(&escape_template(&schema.query_doc));
    out.push('\n');
    out.push_str(&escape_template(&schema.fragment_doc));
    out.push_str("`;\n");

    if typed {
        out.push_str(
            "\nexport async function request<T>(\n  operationName: string,\n  variables?: Record<string, unknown>\n): Promise<T> {\n",
        );
    } else {
        out.push_str("\nexport async function request(operationName, variables) {\n");
    }
    out.push_str(
        "  const res = await fetch(API_URL, {\n    method: \"POST\",\n    headers: { \"Content-Type\": \"application/json\" },\n    body: JSON.stringify({ query: DOCUMENTS, variables, operationName }),\n  });\n  const payload = await res.json();\n  if (payload.errors) {\n    throw new Error(payload.errors[0].message);\n  }\n",
    );
    if typed {
        out.push_str("  return payload.data as T;\n}\n");
    } else {
        out.push_str("  return payload.data;\n}\n");
    }

    out.push_str("\nexport const client = {\n");
    for (query, _entry) in &schema.lookup {
        let is_connection = query.ends_with("Connection");
        match (is_connection, typed) {
            (false, true) => out.push_str(&format!(
                "  {query}: (relativePath: string) =>\n    request<QueryResponses[\"{query}\"]>(\"{query}\", {{ relativePath }}),\n"
            )),
            (false, false) => out.push_str(&format!(
                "  {query}: (relativePath) => request(\"{query}\", {{ relativePath }}),\n"
            )),
            (true, true) => out.push_str(&format!(
                "  {query}: () => request<QueryResponses[\"{query}\"]>(\"{query}\"),\n"
            )),
            (true, false) => out.push_str(&format!("  {query}: () => request(\"{query}\"),\n")),
        }
    }
    out.push_str("};\n");

    if !user_docs.is_empty() {
        out.push_str("\nexport const userDocuments = {\n");
        for doc in user_docs {
            out.push_str(&format!(
                "  \"{}\": `{}`,\n",
                doc.path.display(),
                escape_template(&doc.source)
            ));
        }
        out.push_str("};\n");
    }

    out
}

/// Strip type syntax from emitted type code, leaving only the runtime
/// exports. Handles exactly the constructs the emitter produces: interface
/// blocks, type aliases, `import type` lines, and typed const declarations.
pub fn strip_type_annotations(source: &str) -> String {
    let mut out = String::new();
    let mut interface_depth = 0usize;
    let mut blank_pending = false;

    for line in source.lines() {
        let trimmed = line.trim_start();

        if interface_depth > 0 {
            interface_depth += trimmed.matches('{').count();
            interface_depth = interface_depth.saturating_sub(trimmed.matches('}').count());
            continue;
        }

        if trimmed.starts_with("export interface") || trimmed.starts_with("interface") {
            // Single-line interfaces close immediately
            interface_depth = trimmed
                .matches('{')
                .count()
                .saturating_sub(trimmed.matches('}').count());
            continue;
        }
        if trimmed.starts_with("export type") || trimmed.starts_with("import type") {
            continue;
        }

        if trimmed.is_empty() {
            blank_pending = !out.is_empty();
            continue;
        }
        if blank_pending {
            out.push('\n');
            blank_pending = false;
        }

        // `const NAME: Type = ...` -> `const NAME = ...`
        if let Some(stripped) = strip_const_annotation(line) {
            out.push_str(&stripped);
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    out
}

fn strip_const_annotation(line: &str) -> Option<String> {
    let const_pos = line.find("const ")?;
    let colon = line[const_pos..].find(": ")? + const_pos;
    let eq = line[colon..].find(" = ")? + colon;
    Some(format!("{}{}", &line[..colon], &line[eq..]))
}

fn ts_field(f: &FieldSchema, collections: &[CollectionSchema]) -> String {
    let ty = match f.field_type {
        FieldType::String | FieldType::Datetime => "string".to_string(),
        FieldType::Number => "number".to_string(),
        FieldType::Boolean => "boolean".to_string(),
        FieldType::Reference => {
            let target = f.reference.as_deref().unwrap_or_default();
            collections
                .iter()
                .find(|c| c.name == target)
                .map(|c| c.type_name.clone())
                .unwrap_or_else(|| "string".to_string())
        }
    };
    if f.required {
        format!("{}: {ty};", f.name)
    } else {
        format!("{}?: Maybe<{ty}>;", f.name)
    }
}

fn escape_template(source: &str) -> String {
    source.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionConfig, ContentFormat, FieldConfig, Settings};
    use crate::schema::SchemaBuilder;
    use std::path::PathBuf;

    fn schema() -> SchemaArtifact {
        let settings = Settings {
            collections: vec![CollectionConfig {
                name: "posts".to_string(),
                label: None,
                path: "content/posts".into(),
                format: ContentFormat::Markdown,
                fields: vec![FieldConfig {
                    name: "title".to_string(),
                    field_type: FieldType::String,
                    required: true,
                    collection: None,
                }],
            }],
            ..Settings::default()
        };
        SchemaBuilder::build(&settings).unwrap()
    }

    #[test]
    fn types_cover_collections_and_responses() {
        let code = emit_types(&schema());
        assert!(code.contains("export interface Posts {"));
        assert!(code.contains("title: string;"));
        assert!(code.contains("body?: Maybe<string>;"));
        assert!(code.contains("export interface QueryResponses {"));
        assert!(code.contains("posts: Posts;"));
        assert!(code.contains("export const collectionNames = [\"posts\"];"));
    }

    #[test]
    fn typed_client_embeds_endpoint_and_operations() {
        let code = emit_client(&schema(), &[], "http://localhost:4001/graphql", true);
        assert!(code.contains("const API_URL = \"http://localhost:4001/graphql\";"));
        assert!(code.contains("query posts($relativePath: String!)"));
        assert!(code.contains("fragment PostsParts on Posts"));
        assert!(code.contains("request<QueryResponses[\"posts\"]>"));
    }

    #[test]
    fn untyped_client_has_no_type_syntax() {
        let code = emit_client(&schema(), &[], "http://localhost:4001/graphql", false);
        assert!(!code.contains("QueryResponses"));
        assert!(!code.contains(": string"));
        assert!(!code.contains("import type"));
        assert!(code.contains("export async function request(operationName, variables) {"));
    }

    #[test]
    fn user_documents_are_embedded_escaped() {
        let docs = vec![UserDocument {
            path: PathBuf::from("queries/a.gql"),
            source: "query A { posts { id } } # uses `backticks` and ${vars}".to_string(),
        }];
        let code = emit_client(&schema(), &docs, "http://localhost:4001/graphql", true);
        assert!(code.contains("\"queries/a.gql\""));
        assert!(code.contains("\\`backticks\\`"));
        assert!(code.contains("\\${vars}"));
    }

    #[test]
    fn strip_removes_interfaces_and_keeps_runtime_exports() {
        let typed = emit_types(&schema());
        let js = strip_type_annotations(&typed);
        assert!(!js.contains("interface"));
        assert!(!js.contains("export type"));
        assert!(!js.contains("Maybe"));
        assert!(js.contains("export const collectionNames = [\"posts\"];"));
        assert!(js.contains("// Generated by contentsync"));
    }

    #[test]
    fn strip_removes_const_annotations() {
        let js = strip_type_annotations("const API_URL: string = \"x\";\n");
        assert_eq!(js, "const API_URL = \"x\";\n");
    }
}
