//! Artifact writing: the canonical generated-file layout.
//!
//! All generated files live under `<root>/.contentsync/generated/` and are
//! mutated only through this writer. Writes are idempotent (unchanged bytes
//! are skipped so mtimes stay stable) and mode-exclusive: switching the
//! output flavor deletes the other flavor's files in the same operation that
//! writes the new ones.

use std::path::{Path, PathBuf};

use crate::codegen::{self, CodegenOutput, strip_type_annotations};
use crate::config::OutputMode;
use crate::error::SyncResult;
use crate::schema::{SchemaArtifact, SchemaBuilder};
use crate::{debug_event, log_event};

pub const QUERIES_DOC: &str = "queries.gql";
pub const FRAGMENTS_DOC: &str = "frags.gql";
pub const SCHEMA_DOC: &str = "schema.gql";
pub const MANIFEST: &str = "manifest.json";
pub const INDEX_HTML: &str = "index.html";
pub const GITIGNORE: &str = ".gitignore";

const TYPESCRIPT_FILES: [&str; 2] = ["types.ts", "client.ts"];
const JAVASCRIPT_FILES: [&str; 3] = ["types.d.ts", "types.js", "client.js"];

pub struct ArtifactWriter {
    generated_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(generated_dir: PathBuf) -> Self {
        Self { generated_dir }
    }

    pub fn generated_dir(&self) -> &Path {
        &self.generated_dir
    }

    /// Files owned by the given output mode.
    pub fn mode_files(mode: OutputMode) -> &'static [&'static str] {
        match mode {
            OutputMode::Typescript => &TYPESCRIPT_FILES,
            OutputMode::Javascript => &JAVASCRIPT_FILES,
        }
    }

    /// Write the schema document and the canonical query/fragment documents.
    ///
    /// Emits the oversize advisory after the fragment document lands; the
    /// advisory never blocks generation.
    pub fn write_schema_docs(&self, schema: &SchemaArtifact) -> SyncResult<()> {
        self.write_if_changed(QUERIES_DOC, schema.query_doc.as_bytes())?;
        self.write_if_changed(FRAGMENTS_DOC, schema.fragment_doc.as_bytes())?;
        if let Some(advisory) = codegen::fragment_size_advisory(schema.fragment_doc.len()) {
            tracing::warn!("[artifacts] {advisory}");
        }
        self.write_if_changed(SCHEMA_DOC, schema.sdl.as_bytes())?;
        Ok(())
    }

    /// Write the codegen outputs for the active mode and delete the other
    /// mode's files.
    pub fn write_codegen(&self, output: &CodegenOutput, mode: OutputMode) -> SyncResult<()> {
        match mode {
            OutputMode::Typescript => {
                self.write_if_changed("types.ts", output.type_code.as_bytes())?;
                self.write_if_changed("client.ts", output.client_code.as_bytes())?;
            }
            OutputMode::Javascript => {
                // Declaration keeps the typed form; the stub is transpiled
                self.write_if_changed("types.d.ts", output.type_code.as_bytes())?;
                let stub = strip_type_annotations(&output.type_code);
                self.write_if_changed("types.js", stub.as_bytes())?;
                self.write_if_changed("client.js", output.client_code.as_bytes())?;
            }
        }

        let stale = match mode {
            OutputMode::Typescript => OutputMode::Javascript,
            OutputMode::Javascript => OutputMode::Typescript,
        };
        for name in Self::mode_files(stale) {
            self.remove_if_exists(name)?;
        }
        Ok(())
    }

    /// Persist the lock manifest: schema JSON, lookup table, and raw GraphQL
    /// introspection, for tooling that needs a stable snapshot without
    /// re-running the builder.
    pub fn write_manifest(&self, schema: &SchemaArtifact) -> SyncResult<()> {
        let manifest = serde_json::json!({
            "schema": {
                "sdl": schema.sdl,
                "collections": schema.collections,
            },
            "lookup": schema.lookup,
            "graphql": SchemaBuilder::introspection(schema),
        });
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.write_if_changed(MANIFEST, json.as_bytes())
    }

    /// Write the companion entry point and the .gitignore covering generated
    /// HTML/asset output.
    pub fn write_static(&self) -> SyncResult<()> {
        let html = "<!doctype html>\n<html>\n  <head>\n    <meta charset=\"utf-8\" />\n    <title>contentsync</title>\n  </head>\n  <body>\n    <div id=\"root\"></div>\n    <script type=\"module\" src=\"./client.js\"></script>\n  </body>\n</html>\n";
        self.write_if_changed(INDEX_HTML, html.as_bytes())?;

        let gitignore = "# Generated by contentsync\nindex.html\nassets/\n";
        self.write_if_changed(GITIGNORE, gitignore.as_bytes())?;
        Ok(())
    }

    /// List the generated files currently on disk, sorted by name.
    pub fn existing_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.generated_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .filter_map(|e| e.file_name().into_string().ok())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn write_if_changed(&self, name: &str, bytes: &[u8]) -> SyncResult<()> {
        std::fs::create_dir_all(&self.generated_dir)?;
        let path = self.generated_dir.join(name);

        if let Ok(existing) = std::fs::read(&path)
            && existing == bytes
        {
            debug_event!("artifacts", "unchanged", "{name}");
            return Ok(());
        }

        std::fs::write(&path, bytes)?;
        log_event!("artifacts", "wrote", "{name}");
        Ok(())
    }

    fn remove_if_exists(&self, name: &str) -> SyncResult<()> {
        let path = self.generated_dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log_event!("artifacts", "removed stale", "{name}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
