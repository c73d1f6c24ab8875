//! Content-files scope: routes document edits to the incremental indexer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use glob::Pattern;

use crate::config::CollectionConfig;
use crate::watcher::{ChangeKind, RouteAction, ScopeHandler, WatchError};

/// Watches every collection's content directory.
///
/// Adds and edits become path-scoped index calls; removals become deletes.
/// Content edits never rebuild the schema, which is a function of the
/// settings file alone.
pub struct ContentScope {
    roots: Vec<PathBuf>,
    patterns: Vec<Pattern>,
}

impl ContentScope {
    pub fn new(collections: &[CollectionConfig]) -> Result<Self, WatchError> {
        let mut patterns = Vec::new();
        for collection in collections {
            let base = collection.path.display();
            let ext = collection.format.extension();
            for raw in [
                format!("{base}/*.{ext}"),
                format!("{base}/**/*.{ext}"),
            ] {
                let pattern = Pattern::new(&raw).map_err(|e| WatchError::Setup {
                    reason: format!("invalid content glob '{raw}': {e}"),
                })?;
                patterns.push(pattern);
            }
        }
        Ok(Self {
            roots: collections.iter().map(|c| c.path.clone()).collect(),
            patterns,
        })
    }
}

#[async_trait]
impl ScopeHandler for ContentScope {
    fn name(&self) -> &str {
        "content"
    }

    fn matches(&self, rel: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches_path(rel))
    }

    fn watch_roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    async fn route(&self, rel: &Path, kind: ChangeKind) -> Result<RouteAction, WatchError> {
        let action = match kind {
            ChangeKind::Added | ChangeKind::Changed => {
                RouteAction::IndexPaths(vec![rel.to_path_buf()])
            }
            ChangeKind::Removed => RouteAction::DeletePaths(vec![rel.to_path_buf()]),
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionConfig, ContentFormat};

    fn scope() -> ContentScope {
        ContentScope::new(&[
            CollectionConfig {
                name: "posts".to_string(),
                label: None,
                path: "content/posts".into(),
                format: ContentFormat::Markdown,
                fields: Vec::new(),
            },
            CollectionConfig {
                name: "authors".to_string(),
                label: None,
                path: "content/authors".into(),
                format: ContentFormat::Json,
                fields: Vec::new(),
            },
        ])
        .unwrap()
    }

    #[test]
    fn matches_collection_files_by_extension() {
        let scope = scope();
        assert!(scope.matches(Path::new("content/posts/a.md")));
        assert!(scope.matches(Path::new("content/posts/2024/b.md")));
        assert!(scope.matches(Path::new("content/authors/jane.json")));

        assert!(!scope.matches(Path::new("content/posts/a.json")));
        assert!(!scope.matches(Path::new("content/pages/a.md")));
        assert!(!scope.matches(Path::new("queries/a.gql")));
    }

    #[tokio::test]
    async fn edits_index_and_removals_delete() {
        let scope = scope();
        let rel = Path::new("content/posts/a.md");

        let action = scope.route(rel, ChangeKind::Changed).await.unwrap();
        assert_eq!(action, RouteAction::IndexPaths(vec![rel.to_path_buf()]));

        let action = scope.route(rel, ChangeKind::Added).await.unwrap();
        assert_eq!(action, RouteAction::IndexPaths(vec![rel.to_path_buf()]));

        let action = scope.route(rel, ChangeKind::Removed).await.unwrap();
        assert_eq!(action, RouteAction::DeletePaths(vec![rel.to_path_buf()]));
    }
}
