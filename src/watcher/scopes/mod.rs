//! Built-in watch scopes.
//!
//! Two scopes run in a dev session: content files (incremental index
//! updates) and user query documents (codegen-only regeneration). Settings
//! changes are picked up by restarting the session, not watched live.

mod content;
mod query;

pub use content::ContentScope;
pub use query::QueryScope;
