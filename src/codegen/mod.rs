//! Codegen pipeline: schema + query documents in, client and type code out.
//!
//! Pure with respect to its inputs aside from reading the glob-matched user
//! query documents. Two output flavors exist (typescript/javascript); the
//! javascript flavor is produced by transpiling the typed source while the
//! declaration file retains the typed form.

mod api_url;
mod emit;

pub use api_url::resolve_api_url;
pub use emit::strip_type_annotations;

use std::path::{Path, PathBuf};

use crate::config::OutputMode;
use crate::error::{SyncError, SyncResult};
use crate::schema::SchemaArtifact;

/// Fragment documents past this size trigger a non-fatal advisory.
pub const FRAGMENT_SIZE_ADVISORY_BYTES: usize = 100 * 1024;

/// A user-authored query or fragment document.
#[derive(Debug, Clone)]
pub struct UserDocument {
    pub path: PathBuf,
    pub source: String,
}

/// Generated code in its typed form. Mode-specific flavors are derived by
/// the artifact writer.
#[derive(Debug, Clone)]
pub struct CodegenOutput {
    pub client_code: String,
    pub type_code: String,
}

pub struct CodegenPipeline;

impl CodegenPipeline {
    /// Produce the client and type code for the given schema and documents.
    ///
    /// The client is emitted in the flavor the output mode asks for; type
    /// code is always the typed source, with the javascript stub derived by
    /// [`strip_type_annotations`] at write time.
    pub fn generate(
        schema: &SchemaArtifact,
        user_docs: &[UserDocument],
        api_url: &str,
        mode: OutputMode,
    ) -> SyncResult<CodegenOutput> {
        let typed = mode == OutputMode::Typescript;
        Ok(CodegenOutput {
            client_code: emit::emit_client(schema, user_docs, api_url, typed),
            type_code: emit::emit_types(schema),
        })
    }
}

/// Collect user-authored query/fragment documents under the queries
/// directory, in path order so downstream output is deterministic.
pub fn collect_user_documents(root: &Path, queries_path: &Path) -> SyncResult<Vec<UserDocument>> {
    let dir = root.join(queries_path);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut docs = Vec::new();
    for ext in ["gql", "graphql"] {
        let pattern = format!("{}/**/*.{ext}", dir.display());
        let paths = glob::glob(&pattern).map_err(|e| SyncError::Index {
            path: dir.clone(),
            reason: format!("invalid query glob: {e}"),
        })?;
        for entry in paths {
            let path = entry.map_err(|e| SyncError::Index {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
            let source = std::fs::read_to_string(&path)?;
            let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            docs.push(UserDocument { path: rel, source });
        }
    }
    docs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(docs)
}

/// Advisory for oversized fragment documents. Never blocks generation.
pub fn fragment_size_advisory(bytes: usize) -> Option<String> {
    if bytes <= FRAGMENT_SIZE_ADVISORY_BYTES {
        return None;
    }
    Some(format!(
        "the generated fragment document is {} KiB, which may slow down tooling. \
         Consider lowering reference_depth in settings.toml, e.g.:\n\n    reference_depth = 1\n",
        bytes / 1024
    ))
}
