//! Mapping document model for the recast casting planner.
//!
//! The document is what users write (conventionally as YAML) to declare
//! which types cast into which, with five priority sections of field rules.
//! This crate is pure data plus serde; tokenization and file handling live
//! with the callers.

pub mod document;

pub use document::{
    FieldRule, Hint, IgnoreRule, MappingDocument, RequiresDecl, TransformDecl, TypeMapping,
    ANY_TYPE,
};
