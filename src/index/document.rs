//! Document parsing and schema-driven validation.

use std::path::Path;

use crate::config::{ContentFormat, FieldType};
use crate::error::{SyncError, SyncResult};
use crate::schema::CollectionSchema;

/// Parse a document's fields according to its collection format.
///
/// Markdown documents carry TOML front matter delimited by `---` lines; the
/// remaining text becomes the `body` field. JSON and TOML documents must be
/// a single top-level table.
pub fn parse_document(
    path: &Path,
    content: &str,
    format: ContentFormat,
) -> SyncResult<serde_json::Map<String, serde_json::Value>> {
    match format {
        ContentFormat::Markdown => parse_markdown(path, content),
        ContentFormat::Json => {
            let value: serde_json::Value =
                serde_json::from_str(content).map_err(|e| SyncError::Index {
                    path: path.to_path_buf(),
                    reason: format!("invalid JSON: {e}"),
                })?;
            match value {
                serde_json::Value::Object(map) => Ok(map),
                _ => Err(SyncError::Index {
                    path: path.to_path_buf(),
                    reason: "expected a top-level JSON object".to_string(),
                }),
            }
        }
        ContentFormat::Toml => {
            let table: toml::Table = toml::from_str(content).map_err(|e| SyncError::Index {
                path: path.to_path_buf(),
                reason: format!("invalid TOML: {e}"),
            })?;
            toml_to_map(path, table)
        }
    }
}

fn parse_markdown(
    path: &Path,
    content: &str,
) -> SyncResult<serde_json::Map<String, serde_json::Value>> {
    let mut map = serde_json::Map::new();
    let body;

    if let Some(rest) = content.strip_prefix("---\n") {
        let end = rest.find("\n---").ok_or_else(|| SyncError::Index {
            path: path.to_path_buf(),
            reason: "unterminated front matter".to_string(),
        })?;
        let front = &rest[..end];
        body = rest[end + 4..].trim_start_matches('\n').to_string();

        let table: toml::Table = toml::from_str(front).map_err(|e| SyncError::Index {
            path: path.to_path_buf(),
            reason: format!("invalid front matter: {e}"),
        })?;
        map = toml_to_map(path, table)?;
    } else {
        body = content.to_string();
    }

    map.insert("body".to_string(), serde_json::Value::String(body));
    Ok(map)
}

fn toml_to_map(
    path: &Path,
    table: toml::Table,
) -> SyncResult<serde_json::Map<String, serde_json::Value>> {
    match serde_json::to_value(&table) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => unreachable!("a TOML table serializes to a JSON object"),
        Err(e) => Err(SyncError::Index {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Validate parsed fields against the collection schema.
///
/// Required fields must be present; present fields must carry the declared
/// scalar type. Reference fields hold the relative path of the target
/// document as a string.
pub fn validate_fields(
    path: &Path,
    collection: &CollectionSchema,
    fields: &serde_json::Map<String, serde_json::Value>,
) -> SyncResult<()> {
    for field in &collection.fields {
        let value = match fields.get(&field.name) {
            Some(v) => v,
            None => {
                if field.required {
                    return Err(SyncError::MissingField {
                        path: path.to_path_buf(),
                        field: field.name.clone(),
                        collection: collection.name.clone(),
                    });
                }
                continue;
            }
        };

        let (ok, expected) = match field.field_type {
            FieldType::String | FieldType::Datetime | FieldType::Reference => {
                (value.is_string(), "string")
            }
            FieldType::Number => (value.is_number(), "number"),
            FieldType::Boolean => (value.is_boolean(), "boolean"),
        };
        if !ok {
            return Err(SyncError::FieldType {
                path: path.to_path_buf(),
                field: field.name.clone(),
                expected,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchema;
    use std::path::PathBuf;

    fn posts_schema() -> CollectionSchema {
        CollectionSchema {
            name: "posts".to_string(),
            type_name: "Posts".to_string(),
            path: PathBuf::from("posts"),
            format: ContentFormat::Markdown,
            fields: vec![
                FieldSchema {
                    name: "title".to_string(),
                    field_type: FieldType::String,
                    required: true,
                    reference: None,
                },
                FieldSchema {
                    name: "draft".to_string(),
                    field_type: FieldType::Boolean,
                    required: false,
                    reference: None,
                },
            ],
        }
    }

    #[test]
    fn markdown_front_matter_and_body() {
        let fields = parse_document(
            Path::new("posts/a.md"),
            "---\ntitle = \"Hello\"\ndraft = false\n---\n\nThe body.",
            ContentFormat::Markdown,
        )
        .unwrap();
        assert_eq!(fields["title"], "Hello");
        assert_eq!(fields["draft"], false);
        assert_eq!(fields["body"], "The body.");
    }

    #[test]
    fn markdown_without_front_matter_is_all_body() {
        let fields = parse_document(
            Path::new("posts/a.md"),
            "just text",
            ContentFormat::Markdown,
        )
        .unwrap();
        assert_eq!(fields["body"], "just text");
        assert!(!fields.contains_key("title"));
    }

    #[test]
    fn unterminated_front_matter_is_an_error() {
        let err = parse_document(
            Path::new("posts/a.md"),
            "---\ntitle = \"Hello\"\n",
            ContentFormat::Markdown,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unterminated front matter"));
    }

    #[test]
    fn json_document_must_be_an_object() {
        let err = parse_document(Path::new("authors/a.json"), "[1, 2]", ContentFormat::Json)
            .unwrap_err();
        assert!(err.to_string().contains("top-level JSON object"));
    }

    #[test]
    fn validation_flags_wrong_scalar_type() {
        let mut fields = serde_json::Map::new();
        fields.insert("title".to_string(), serde_json::json!("ok"));
        fields.insert("draft".to_string(), serde_json::json!("not-a-bool"));

        let err = validate_fields(Path::new("posts/a.md"), &posts_schema(), &fields).unwrap_err();
        assert!(matches!(err, SyncError::FieldType { expected: "boolean", .. }));
    }

    #[test]
    fn validation_accepts_optional_absence() {
        let mut fields = serde_json::Map::new();
        fields.insert("title".to_string(), serde_json::json!("ok"));
        validate_fields(Path::new("posts/a.md"), &posts_schema(), &fields).unwrap();
    }
}
