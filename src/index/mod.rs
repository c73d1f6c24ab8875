//! Content indexing: schema-validated document map with incremental updates.
//!
//! The index supports path-scoped operations for cheap single-file updates
//! and a full rebuild used by the reconciler. Content hashing makes rapid
//! successive edits to the same path last-write-wins and idempotent.

mod document;

pub use document::parse_document;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{SyncError, SyncResult};
use crate::schema::{CollectionSchema, SchemaArtifact};
use crate::{debug_event, log_event};

/// One indexed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub collection: String,
    pub hash: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Counts reported by a full rebuild.
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    pub documents: usize,
    pub collections: usize,
}

/// The content index.
///
/// Mutated from two triggers: path-scoped updates from the content watch
/// scope and the full rebuild inside a reconcile. Callers serialize access by
/// holding the surrounding write lock; a rebuild holds it for its whole pass.
pub struct ContentIndex {
    root: PathBuf,
    state_path: PathBuf,
    collections: Vec<CollectionSchema>,
    documents: IndexMap<String, DocumentRecord>,
}

impl ContentIndex {
    /// Open the index, loading any persisted state from a previous session.
    pub fn open(root: PathBuf, index_dir: PathBuf) -> Self {
        let state_path = index_dir.join("state.json");
        let documents = std::fs::read_to_string(&state_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        Self {
            root,
            state_path,
            collections: Vec::new(),
            documents,
        }
    }

    /// Rebuild the whole index against a freshly built schema.
    ///
    /// The index's field-level validation depends on the schema, so the
    /// collection set is swapped first and every content tree is re-walked.
    /// Any validation failure aborts the rebuild; the caller keeps prior
    /// artifacts in place.
    pub fn full_index(&mut self, schema: &SchemaArtifact) -> SyncResult<IndexStats> {
        self.collections = schema.collections.clone();

        let mut documents = IndexMap::new();
        for collection in &self.collections {
            let content_root = self.root.join(&collection.path);
            if !content_root.is_dir() {
                debug_event!("index", "no content yet", "{}", content_root.display());
                continue;
            }

            let mut walker: Vec<_> = WalkDir::new(&content_root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e == collection.format.extension())
                })
                .collect();
            walker.sort();

            for abs in walker {
                let rel = abs
                    .strip_prefix(&self.root)
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|_| abs.clone());
                let record = Self::read_document(&abs, &rel, collection)?;
                documents.insert(rel.to_string_lossy().into_owned(), record);
            }
        }

        self.documents = documents;
        self.save_state()?;

        let stats = IndexStats {
            documents: self.documents.len(),
            collections: self.collections.len(),
        };
        log_event!(
            "index",
            "rebuilt",
            "{} documents across {} collections",
            stats.documents,
            stats.collections
        );
        Ok(stats)
    }

    /// Index the given root-relative paths incrementally.
    ///
    /// A path whose content hash is unchanged is skipped, which makes rapid
    /// successive edits last-write-wins without duplicate work.
    pub fn index_by_paths(&mut self, paths: &[PathBuf]) -> SyncResult<()> {
        for rel in paths {
            let collection = self.collection_for(rel)?.clone();
            let abs = self.root.join(rel);
            let key = rel.to_string_lossy().into_owned();

            let record = Self::read_document(&abs, rel, &collection)?;
            if self.documents.get(&key).is_some_and(|r| r.hash == record.hash) {
                debug_event!("index", "unchanged (hash match)", "{}", rel.display());
                continue;
            }

            self.documents.insert(key, record);
            log_event!("index", "indexed", "{}", rel.display());
        }
        self.save_state()
    }

    /// Remove the given root-relative paths from the index.
    pub fn delete_by_paths(&mut self, paths: &[PathBuf]) -> SyncResult<()> {
        for rel in paths {
            let key = rel.to_string_lossy().into_owned();
            if self.documents.shift_remove(&key).is_some() {
                log_event!("index", "removed", "{}", rel.display());
            } else {
                debug_event!("index", "was not indexed", "{}", rel.display());
            }
        }
        self.save_state()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn contains(&self, rel: &Path) -> bool {
        self.documents.contains_key(rel.to_string_lossy().as_ref())
    }

    pub fn get(&self, rel: &Path) -> Option<&DocumentRecord> {
        self.documents.get(rel.to_string_lossy().as_ref())
    }

    fn collection_for(&self, rel: &Path) -> SyncResult<&CollectionSchema> {
        self.collections
            .iter()
            .find(|c| c.owns(rel))
            .ok_or_else(|| SyncError::UnknownCollection {
                path: rel.to_path_buf(),
            })
    }

    fn read_document(
        abs: &Path,
        rel: &Path,
        collection: &CollectionSchema,
    ) -> SyncResult<DocumentRecord> {
        let content = std::fs::read_to_string(abs).map_err(|e| SyncError::Index {
            path: rel.to_path_buf(),
            reason: e.to_string(),
        })?;

        let fields = parse_document(rel, &content, collection.format)?;
        document::validate_fields(rel, collection, &fields)?;

        Ok(DocumentRecord {
            collection: collection.name.clone(),
            hash: content_hash(content.as_bytes()),
            fields,
        })
    }

    fn save_state(&self) -> SyncResult<()> {
        if let Some(parent) = self.state_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.documents)
            .map_err(|e| SyncError::Index {
                path: self.state_path.clone(),
                reason: e.to_string(),
            })?;
        std::fs::write(&self.state_path, json)?;
        Ok(())
    }
}

/// Hex sha256 of raw file content.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionConfig, ContentFormat, FieldConfig, FieldType, Settings};
    use crate::schema::SchemaBuilder;
    use tempfile::TempDir;

    fn posts_settings() -> Settings {
        Settings {
            collections: vec![CollectionConfig {
                name: "posts".to_string(),
                label: None,
                path: "posts".into(),
                format: ContentFormat::Markdown,
                fields: vec![FieldConfig {
                    name: "title".to_string(),
                    field_type: FieldType::String,
                    required: true,
                    collection: None,
                }],
            }],
            ..Settings::default()
        }
    }

    fn open_index(root: &Path) -> (ContentIndex, SchemaArtifact) {
        let schema = SchemaBuilder::build(&posts_settings()).unwrap();
        let index = ContentIndex::open(root.to_path_buf(), root.join(".contentsync/index"));
        (index, schema)
    }

    #[test]
    fn full_index_walks_collection_roots() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("posts")).unwrap();
        std::fs::write(
            temp.path().join("posts/a.md"),
            "---\ntitle = \"A\"\n---\nhello",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("posts/b.md"),
            "---\ntitle = \"B\"\n---\nworld",
        )
        .unwrap();
        // Wrong extension is ignored
        std::fs::write(temp.path().join("posts/skip.txt"), "nope").unwrap();

        let (mut index, schema) = open_index(temp.path());
        let stats = index.full_index(&schema).unwrap();
        assert_eq!(stats.documents, 2);
        assert!(index.contains(Path::new("posts/a.md")));
        assert!(index.contains(Path::new("posts/b.md")));
    }

    #[test]
    fn incremental_index_then_delete() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("posts")).unwrap();

        let (mut index, schema) = open_index(temp.path());
        index.full_index(&schema).unwrap();
        assert_eq!(index.document_count(), 0);

        std::fs::write(
            temp.path().join("posts/a.md"),
            "---\ntitle = \"A\"\n---\nhello",
        )
        .unwrap();

        index.index_by_paths(&["posts/a.md".into()]).unwrap();
        assert_eq!(index.document_count(), 1);

        index.delete_by_paths(&["posts/a.md".into()]).unwrap();
        assert!(!index.contains(Path::new("posts/a.md")));
    }

    #[test]
    fn reindex_with_same_content_is_a_noop() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("posts")).unwrap();
        std::fs::write(
            temp.path().join("posts/a.md"),
            "---\ntitle = \"A\"\n---\nhello",
        )
        .unwrap();

        let (mut index, schema) = open_index(temp.path());
        index.full_index(&schema).unwrap();
        let before = index.get(Path::new("posts/a.md")).unwrap().hash.clone();

        index.index_by_paths(&["posts/a.md".into()]).unwrap();
        let after = index.get(Path::new("posts/a.md")).unwrap().hash.clone();
        assert_eq!(before, after);
    }

    #[test]
    fn missing_required_field_names_path_and_field() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("posts")).unwrap();
        std::fs::write(temp.path().join("posts/bad.md"), "no front matter").unwrap();

        let (mut index, schema) = open_index(temp.path());
        let err = index.full_index(&schema).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("posts/bad.md"), "got: {msg}");
        assert!(msg.contains("'title'"), "got: {msg}");
    }

    #[test]
    fn unknown_collection_is_an_error() {
        let temp = TempDir::new().unwrap();
        let (mut index, schema) = open_index(temp.path());
        index.full_index(&schema).unwrap();

        let err = index.index_by_paths(&["elsewhere/a.md".into()]).unwrap_err();
        assert!(matches!(err, SyncError::UnknownCollection { .. }));
    }

    #[test]
    fn state_survives_reopen() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("posts")).unwrap();
        std::fs::write(
            temp.path().join("posts/a.md"),
            "---\ntitle = \"A\"\n---\nhello",
        )
        .unwrap();

        let (mut index, schema) = open_index(temp.path());
        index.full_index(&schema).unwrap();
        drop(index);

        let reopened = ContentIndex::open(
            temp.path().to_path_buf(),
            temp.path().join(".contentsync/index"),
        );
        assert_eq!(reopened.document_count(), 1);
    }
}
