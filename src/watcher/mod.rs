//! Watch router for keeping generated artifacts consistent with sources.
//!
//! One OS-level watcher feeds a router that debounces events and delivers
//! them to glob-bound scopes.
//!
//! # Architecture
//!
//! ```text
//! WatchRouter
//!   - Single notify::RecommendedWatcher
//!   - Shared Debouncer
//!   - Per-scope readiness (scanning -> ready)
//!   - Suppresses generated-output paths
//!         |
//!    +----+----+
//!    |         |
//! ContentScope QueryScope
//! (index ops)  (codegen-only)
//! ```
//!
//! Settings changes are applied by restarting the dev session; only content
//! and query documents are routed live.

mod debouncer;
mod error;
mod router;
mod scope;
pub mod scopes;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use router::{WatchRouter, WatchRouterBuilder, path_contains_marker};
pub use scope::{ChangeKind, RouteAction, ScopeHandler, ScopeState, should_deliver};
pub use scopes::{ContentScope, QueryScope};
