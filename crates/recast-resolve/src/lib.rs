//! Mapping resolution for the recast casting planner.
//!
//! Given a type graph ([`recast_graph`]) and a mapping document
//! ([`recast_mapping`]), [`resolve`] produces a [`ResolvedPlan`]: one
//! [`ResolvedTypePair`] per conversion with field-level strategies, unmapped
//! targets with ranked candidates, nested pair references, ordering edges,
//! and a diagnostics bag. The plan is data for downstream consumers (the
//! suggestion exporter, code emitters); nothing here runs a conversion.

pub mod diagnostics;
pub mod plan;
pub mod requires;
pub mod resolver;
pub mod strategy;
pub mod synth;

pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use plan::{
    Cardinality, NestedConversion, Origin, PairId, ResolvedFieldMapping, ResolvedPlan,
    ResolvedTypePair, Strategy, UnmappedReason, UnmappedTarget,
};
pub use resolver::{resolve, ResolveConfig, ResolveError};
pub use strategy::{select, StrategyChoice};
