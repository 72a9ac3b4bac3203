//! Suggestion export for the recast casting planner.
//!
//! Two read-only views over a resolved plan: [`export`] folds it back into a
//! mapping document (with placeholder transforms, auto-match annotations,
//! and ignore rationale), and [`render_summary`] renders the stable text
//! report the CLI prints. Serialization of the exported document stays with
//! the caller.

pub mod export;
pub mod summary;

pub use export::export;
pub use summary::render_summary;
