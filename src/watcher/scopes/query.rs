//! Query-files scope: user GraphQL documents trigger codegen-only runs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use glob::Pattern;

use crate::watcher::{ChangeKind, RouteAction, ScopeHandler, WatchError};

/// Watches user-authored `.gql`/`.graphql` documents.
///
/// Query documents affect only what the generated client and types project,
/// never the schema or the content index, so every event maps to the same
/// codegen-only regeneration.
pub struct QueryScope {
    queries_path: PathBuf,
    patterns: Vec<Pattern>,
}

impl QueryScope {
    pub fn new(queries_path: &Path) -> Result<Self, WatchError> {
        let base = queries_path.display();
        let mut patterns = Vec::new();
        for ext in ["gql", "graphql"] {
            for raw in [format!("{base}/*.{ext}"), format!("{base}/**/*.{ext}")] {
                let pattern = Pattern::new(&raw).map_err(|e| WatchError::Setup {
                    reason: format!("invalid query glob '{raw}': {e}"),
                })?;
                patterns.push(pattern);
            }
        }
        Ok(Self {
            queries_path: queries_path.to_path_buf(),
            patterns,
        })
    }
}

#[async_trait]
impl ScopeHandler for QueryScope {
    fn name(&self) -> &str {
        "queries"
    }

    fn matches(&self, rel: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches_path(rel))
    }

    fn watch_roots(&self) -> Vec<PathBuf> {
        vec![self.queries_path.clone()]
    }

    async fn route(&self, _rel: &Path, _kind: ChangeKind) -> Result<RouteAction, WatchError> {
        Ok(RouteAction::RegenerateCodegen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_query_documents_only() {
        let scope = QueryScope::new(Path::new("queries")).unwrap();
        assert!(scope.matches(Path::new("queries/posts.gql")));
        assert!(scope.matches(Path::new("queries/nested/frag.graphql")));
        assert!(!scope.matches(Path::new("queries/readme.md")));
        assert!(!scope.matches(Path::new("content/posts/a.md")));
    }

    #[tokio::test]
    async fn every_event_regenerates_codegen() {
        let scope = QueryScope::new(Path::new("queries")).unwrap();
        for kind in [ChangeKind::Added, ChangeKind::Changed, ChangeKind::Removed] {
            let action = scope.route(Path::new("queries/a.gql"), kind).await.unwrap();
            assert_eq!(action, RouteAction::RegenerateCodegen);
        }
    }
}
