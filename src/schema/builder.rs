//! Builds the GraphQL schema and canonical documents from configuration.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{ContentFormat, FieldType, Settings};
use crate::error::{SyncError, SyncResult};

/// The built schema plus its derived documents.
///
/// Owned by the reconciler for the duration of one pass and handed to the
/// codegen pipeline by shared reference.
#[derive(Debug, Clone)]
pub struct SchemaArtifact {
    /// GraphQL SDL document
    pub sdl: String,
    /// Canonical query document, one document/connection query per collection
    pub query_doc: String,
    /// Canonical fragment document, one fragment per collection
    pub fragment_doc: String,
    /// Query name -> collection/type/fragment, in collection order
    pub lookup: IndexMap<String, LookupEntry>,
    /// Resolved collection schemas used by the content indexer
    pub collections: Vec<CollectionSchema>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LookupEntry {
    pub collection: String,
    pub type_name: String,
    pub fragment: String,
}

/// A collection as the indexer sees it: where its files live and which
/// fields its documents must carry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionSchema {
    pub name: String,
    pub type_name: String,
    pub path: PathBuf,
    pub format: ContentFormat,
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Target collection name for reference fields
    pub reference: Option<String>,
}

impl CollectionSchema {
    /// Whether a root-relative path belongs to this collection.
    pub fn owns(&self, rel: &Path) -> bool {
        rel.starts_with(&self.path)
            && rel
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.format.extension())
    }
}

pub struct SchemaBuilder;

impl SchemaBuilder {
    /// Build the schema artifact from the current configuration.
    ///
    /// Fails with `SchemaBuild` on empty or inconsistent collection
    /// definitions (duplicate names, dangling reference targets).
    pub fn build(settings: &Settings) -> SyncResult<SchemaArtifact> {
        if settings.collections.is_empty() {
            return Err(SyncError::SchemaBuild {
                reason: "no collections defined in configuration".to_string(),
            });
        }

        let collections = Self::resolve_collections(settings)?;
        let by_name: HashMap<&str, &CollectionSchema> =
            collections.iter().map(|c| (c.name.as_str(), c)).collect();

        let sdl = Self::emit_sdl(&collections);
        let fragment_doc = Self::emit_fragments(&collections, &by_name, settings.reference_depth);
        let query_doc = Self::emit_queries(&collections);

        let mut lookup = IndexMap::new();
        for c in &collections {
            lookup.insert(
                c.name.clone(),
                LookupEntry {
                    collection: c.name.clone(),
                    type_name: c.type_name.clone(),
                    fragment: format!("{}Parts", c.type_name),
                },
            );
            lookup.insert(
                format!("{}Connection", c.name),
                LookupEntry {
                    collection: c.name.clone(),
                    type_name: format!("{}Connection", c.type_name),
                    fragment: format!("{}Parts", c.type_name),
                },
            );
        }

        Ok(SchemaArtifact {
            sdl,
            query_doc,
            fragment_doc,
            lookup,
            collections,
        })
    }

    /// Raw GraphQL introspection value persisted into the lock manifest.
    pub fn introspection(artifact: &SchemaArtifact) -> serde_json::Value {
        let types: Vec<serde_json::Value> = artifact
            .collections
            .iter()
            .map(|c| {
                let fields: Vec<serde_json::Value> = system_fields()
                    .iter()
                    .map(|(name, ty)| serde_json::json!({ "name": name, "type": { "name": ty } }))
                    .chain(c.fields.iter().map(|f| {
                        serde_json::json!({
                            "name": f.name,
                            "type": { "name": graphql_type_name(f, &artifact.collections) },
                        })
                    }))
                    .collect();
                serde_json::json!({ "kind": "OBJECT", "name": c.type_name, "fields": fields })
            })
            .collect();

        serde_json::json!({
            "__schema": {
                "queryType": { "name": "Query" },
                "types": types,
            }
        })
    }

    fn resolve_collections(settings: &Settings) -> SyncResult<Vec<CollectionSchema>> {
        let mut seen = HashMap::new();
        let names: Vec<&str> = settings.collections.iter().map(|c| c.name.as_str()).collect();

        let mut out = Vec::with_capacity(settings.collections.len());
        for c in &settings.collections {
            if seen.insert(c.name.as_str(), ()).is_some() {
                return Err(SyncError::SchemaBuild {
                    reason: format!("duplicate collection name '{}'", c.name),
                });
            }

            let mut fields = Vec::with_capacity(c.fields.len() + 1);
            for f in &c.fields {
                let reference = match f.field_type {
                    FieldType::Reference => {
                        let target = f.collection.as_deref().ok_or_else(|| SyncError::SchemaBuild {
                            reason: format!(
                                "reference field '{}.{}' has no target collection",
                                c.name, f.name
                            ),
                        })?;
                        if !names.contains(&target) {
                            return Err(SyncError::SchemaBuild {
                                reason: format!(
                                    "reference field '{}.{}' targets unknown collection '{target}'",
                                    c.name, f.name
                                ),
                            });
                        }
                        Some(target.to_string())
                    }
                    _ => None,
                };
                fields.push(FieldSchema {
                    name: f.name.clone(),
                    field_type: f.field_type,
                    required: f.required,
                    reference,
                });
            }

            // Markdown documents always carry their body
            if c.format == ContentFormat::Markdown {
                fields.push(FieldSchema {
                    name: "body".to_string(),
                    field_type: FieldType::String,
                    required: false,
                    reference: None,
                });
            }

            out.push(CollectionSchema {
                name: c.name.clone(),
                type_name: pascal_case(&c.name),
                path: c.path.clone(),
                format: c.format,
                fields,
            });
        }
        Ok(out)
    }

    fn emit_sdl(collections: &[CollectionSchema]) -> String {
        let mut sdl = String::from("schema {\n  query: Query\n}\n\ntype Query {\n");
        for c in collections {
            sdl.push_str(&format!(
                "  {name}(relativePath: String!): {ty}!\n  {name}Connection(first: Int, last: Int, before: String, after: String): {ty}Connection!\n",
                name = c.name,
                ty = c.type_name,
            ));
        }
        sdl.push_str("}\n");

        for c in collections {
            sdl.push_str(&format!("\ntype {} {{\n", c.type_name));
            for (name, ty) in system_fields() {
                sdl.push_str(&format!("  {name}: {ty}\n"));
            }
            for f in &c.fields {
                let ty = graphql_type_name(f, collections);
                let suffix = if f.required { "!" } else { "" };
                sdl.push_str(&format!("  {}: {ty}{suffix}\n", f.name));
            }
            sdl.push_str("}\n");

            sdl.push_str(&format!(
                "\ntype {ty}Connection {{\n  totalCount: Int!\n  edges: [{ty}Edge!]!\n}}\n\ntype {ty}Edge {{\n  cursor: String!\n  node: {ty}!\n}}\n",
                ty = c.type_name,
            ));
        }
        sdl
    }

    fn emit_fragments(
        collections: &[CollectionSchema],
        by_name: &HashMap<&str, &CollectionSchema>,
        reference_depth: usize,
    ) -> String {
        let mut doc = String::new();
        for c in collections {
            if !doc.is_empty() {
                doc.push('\n');
            }
            doc.push_str(&format!("fragment {}Parts on {} {{\n", c.type_name, c.type_name));
            Self::push_fields(&mut doc, c, by_name, reference_depth, 1);
            doc.push_str("}\n");
        }
        doc
    }

    /// Recursively expands a collection's fields, descending into reference
    /// fields until the remaining depth is exhausted.
    fn push_fields(
        doc: &mut String,
        c: &CollectionSchema,
        by_name: &HashMap<&str, &CollectionSchema>,
        depth: usize,
        indent: usize,
    ) {
        let pad = "  ".repeat(indent);
        doc.push_str(&format!("{pad}id\n{pad}relativePath\n"));
        for f in &c.fields {
            match (&f.reference, depth) {
                (Some(_), 0) => {
                    // Depth exhausted: keep the reference opaque
                    doc.push_str(&format!("{pad}{} {{\n{pad}  id\n{pad}}}\n", f.name));
                }
                (Some(target), _) => {
                    doc.push_str(&format!("{pad}{} {{\n", f.name));
                    if let Some(nested) = by_name.get(target.as_str()) {
                        Self::push_fields(doc, nested, by_name, depth - 1, indent + 1);
                    }
                    doc.push_str(&format!("{pad}}}\n"));
                }
                (None, _) => doc.push_str(&format!("{pad}{}\n", f.name)),
            }
        }
    }

    fn emit_queries(collections: &[CollectionSchema]) -> String {
        let mut doc = String::new();
        for c in collections {
            if !doc.is_empty() {
                doc.push('\n');
            }
            doc.push_str(&format!(
                "query {name}($relativePath: String!) {{\n  {name}(relativePath: $relativePath) {{\n    ...{ty}Parts\n  }}\n}}\n\nquery {name}Connection {{\n  {name}Connection {{\n    totalCount\n    edges {{\n      cursor\n      node {{\n        ...{ty}Parts\n      }}\n    }}\n  }}\n}}\n",
                name = c.name,
                ty = c.type_name,
            ));
        }
        doc
    }
}

fn system_fields() -> [(&'static str, &'static str); 2] {
    [("id", "ID!"), ("relativePath", "String!")]
}

fn graphql_type_name(f: &FieldSchema, collections: &[CollectionSchema]) -> String {
    match f.field_type {
        FieldType::String | FieldType::Datetime => "String".to_string(),
        FieldType::Number => "Float".to_string(),
        FieldType::Boolean => "Boolean".to_string(),
        FieldType::Reference => {
            let target = f.reference.as_deref().unwrap_or_default();
            collections
                .iter()
                .find(|c| c.name == target)
                .map(|c| c.type_name.clone())
                .unwrap_or_else(|| "ID".to_string())
        }
    }
}

/// snake/kebab name -> PascalCase type name.
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionConfig, FieldConfig};

    fn settings_with(collections: Vec<CollectionConfig>) -> Settings {
        Settings {
            collections,
            ..Settings::default()
        }
    }

    fn field(name: &str, field_type: FieldType, required: bool) -> FieldConfig {
        FieldConfig {
            name: name.to_string(),
            field_type,
            required,
            collection: None,
        }
    }

    fn posts_and_authors() -> Settings {
        settings_with(vec![
            CollectionConfig {
                name: "posts".to_string(),
                label: None,
                path: "content/posts".into(),
                format: ContentFormat::Markdown,
                fields: vec![
                    field("title", FieldType::String, true),
                    FieldConfig {
                        name: "author".to_string(),
                        field_type: FieldType::Reference,
                        required: false,
                        collection: Some("authors".to_string()),
                    },
                ],
            },
            CollectionConfig {
                name: "authors".to_string(),
                label: None,
                path: "content/authors".into(),
                format: ContentFormat::Json,
                fields: vec![field("name", FieldType::String, true)],
            },
        ])
    }

    #[test]
    fn builds_types_and_queries_for_each_collection() {
        let artifact = SchemaBuilder::build(&posts_and_authors()).unwrap();
        assert!(artifact.sdl.contains("type Posts {"));
        assert!(artifact.sdl.contains("type Authors {"));
        assert!(artifact.sdl.contains("posts(relativePath: String!): Posts!"));
        assert!(artifact.sdl.contains("postsConnection(first: Int"));
        assert!(artifact.sdl.contains("title: String!"));
        // Markdown collections get a body field
        assert!(artifact.sdl.contains("body: String\n"));
        // Reference maps to the target type
        assert!(artifact.sdl.contains("author: Authors"));
    }

    #[test]
    fn lookup_is_ordered_by_collection() {
        let artifact = SchemaBuilder::build(&posts_and_authors()).unwrap();
        let keys: Vec<&str> = artifact.lookup.keys().map(|s| s.as_str()).collect();
        assert_eq!(
            keys,
            vec!["posts", "postsConnection", "authors", "authorsConnection"]
        );
    }

    #[test]
    fn fragment_expands_references_to_configured_depth() {
        let mut settings = posts_and_authors();
        settings.reference_depth = 1;
        let shallow = SchemaBuilder::build(&settings).unwrap();
        assert!(shallow.fragment_doc.contains("author {"));
        // The referenced author's fields are inlined one level deep
        assert!(shallow.fragment_doc.contains("    name\n"));

        settings.reference_depth = 0;
        let opaque = SchemaBuilder::build(&settings).unwrap();
        // At depth 0 the reference stays opaque
        assert!(opaque.fragment_doc.contains("author {\n    id\n  }"));
        assert!(opaque.fragment_doc.len() < shallow.fragment_doc.len());
    }

    #[test]
    fn rejects_empty_collections() {
        let err = SchemaBuilder::build(&Settings::default()).unwrap_err();
        assert!(err.to_string().contains("no collections"));
    }

    #[test]
    fn rejects_unknown_reference_target() {
        let settings = settings_with(vec![CollectionConfig {
            name: "posts".to_string(),
            label: None,
            path: "content/posts".into(),
            format: ContentFormat::Markdown,
            fields: vec![FieldConfig {
                name: "author".to_string(),
                field_type: FieldType::Reference,
                required: false,
                collection: Some("nobody".to_string()),
            }],
        }]);
        let err = SchemaBuilder::build(&settings).unwrap_err();
        assert!(err.to_string().contains("unknown collection 'nobody'"));
    }

    #[test]
    fn build_is_deterministic() {
        let settings = posts_and_authors();
        let a = SchemaBuilder::build(&settings).unwrap();
        let b = SchemaBuilder::build(&settings).unwrap();
        assert_eq!(a.sdl, b.sdl);
        assert_eq!(a.query_doc, b.query_doc);
        assert_eq!(a.fragment_doc, b.fragment_doc);
    }

    #[test]
    fn collection_owns_matching_paths_only() {
        let artifact = SchemaBuilder::build(&posts_and_authors()).unwrap();
        let posts = &artifact.collections[0];
        assert!(posts.owns(Path::new("content/posts/a.md")));
        assert!(posts.owns(Path::new("content/posts/2024/b.md")));
        assert!(!posts.owns(Path::new("content/posts/a.json")));
        assert!(!posts.owns(Path::new("content/authors/a.md")));
    }

    #[test]
    fn pascal_case_handles_separators() {
        assert_eq!(pascal_case("posts"), "Posts");
        assert_eq!(pascal_case("blog_posts"), "BlogPosts");
        assert_eq!(pascal_case("blog-posts"), "BlogPosts");
    }
}
