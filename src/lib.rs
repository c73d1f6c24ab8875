//! Development-time content synchronization engine.
//!
//! Keeps four derived artifacts consistent with a project's configuration
//! and content files: the content index, the GraphQL schema documents, the
//! generated client code, and the generated type definitions. A dev session
//! runs one full reconcile up front, then stays resident routing filesystem
//! events to the cheapest sufficient action.
//!
//! # Architecture
//!
//! ```text
//! Settings (.contentsync/settings.toml)
//!     |
//! Reconciler -- SchemaBuilder -- ContentIndex -- CodegenPipeline
//!     |                                              |
//!     +-------------- ArtifactWriter ----------------+
//!                         |
//!              .contentsync/generated/
//!
//! WatchRouter: content edits -> index ops, query edits -> codegen-only,
//! settings edits -> restart the session.
//! ```

pub mod artifacts;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod reconcile;
pub mod schema;
pub mod supervisor;
pub mod watcher;

pub use config::{OutputMode, Settings};
pub use error::{SyncError, SyncResult};
pub use index::ContentIndex;
pub use reconcile::Reconciler;
pub use schema::{SchemaArtifact, SchemaBuilder};
