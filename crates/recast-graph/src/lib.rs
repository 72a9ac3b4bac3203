//! Type graph for the recast casting planner.
//!
//! This crate is the shared vocabulary of the pipeline: named types and
//! their kinds ([`TypeId`], [`TypeKind`], [`TypeInfo`], [`FieldInfo`]), the
//! immutable catalog they live in ([`TypeGraph`]), and dotted field paths
//! resolved against it ([`FieldPath`]). Providers build a graph once; the
//! resolver and everything downstream only query it.

pub mod graph;
pub mod path;
pub mod types;

pub use graph::TypeGraph;
pub use path::{FieldPath, PathError, PathSegment};
pub use types::{FieldInfo, TypeId, TypeInfo, TypeKind};
