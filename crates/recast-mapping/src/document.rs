//! The mapping document: what the user declares, before resolution.
//!
//! A document lists type mappings (source type, target type, explicit field
//! rules in five priority sections) and named transform declarations. The
//! concrete serialization is YAML in practice, but this model only assumes
//! serde. Section priority -- `one_to_one` over `fields` over `ignore` over
//! `auto` over algorithmic matching -- is enforced by the resolver, not here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel type string for requires entries whose type is not yet known.
pub const ANY_TYPE: &str = "any";

/// A parsed mapping document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Document schema version tag.
    #[serde(default = "default_version")]
    pub version: String,
    /// The declared type mappings, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<TypeMapping>,
    /// Named transform functions the mappings may reference. Opaque to the
    /// planner: only the names matter here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<TransformDecl>,
}

fn default_version() -> String {
    "1".to_string()
}

impl MappingDocument {
    pub fn new() -> Self {
        MappingDocument {
            version: default_version(),
            mappings: Vec::new(),
            transforms: Vec::new(),
        }
    }

    /// Look up a transform declaration by name.
    pub fn transform(&self, name: &str) -> Option<&TransformDecl> {
        self.transforms.iter().find(|t| t.name == name)
    }

    /// Find the declared mapping for a `source -> target` type pair, if any.
    pub fn mapping_for(&self, source: &str, target: &str) -> Option<&TypeMapping> {
        self.mappings
            .iter()
            .find(|m| m.source == source && m.target == target)
    }
}

/// One declared conversion between a source type and a target type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeMapping {
    /// Source type, `pkg.Name` form.
    pub source: String,
    /// Target type, `pkg.Name` form.
    pub target: String,
    /// When set, the target type does not exist yet and must be synthesized
    /// from this mapping's rules.
    #[serde(default, skip_serializing_if = "is_false")]
    pub generate_target: bool,
    /// External arguments the generated casting function must accept.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiresDecl>,
    /// Direct renames: source field path -> target field path. Highest
    /// priority tier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub one_to_one: BTreeMap<String, String>,
    /// Explicit field rules, applied after `one_to_one`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldRule>,
    /// Target paths to leave unassigned.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<IgnoreRule>,
    /// Explicit auto rules: like `fields`, lower priority, conventionally
    /// produced by the suggestion exporter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auto: Vec<FieldRule>,
    /// Free-form annotations on the mapping itself.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl TypeMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        TypeMapping {
            source: source.into(),
            target: target.into(),
            ..TypeMapping::default()
        }
    }
}

/// An external argument of a generated casting function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiresDecl {
    pub name: String,
    /// Type string, `pkg.Name` form; [`ANY_TYPE`] when unknown. The
    /// requires-type deducer may promote it after resolution.
    #[serde(rename = "type", default = "default_any")]
    pub ty: String,
}

fn default_any() -> String {
    ANY_TYPE.to_string()
}

impl RequiresDecl {
    pub fn new(name: impl Into<String>) -> Self {
        RequiresDecl { name: name.into(), ty: default_any() }
    }

    pub fn typed(name: impl Into<String>, ty: impl Into<String>) -> Self {
        RequiresDecl { name: name.into(), ty: ty.into() }
    }

    /// Whether the type is still the unknown sentinel.
    pub fn is_any(&self) -> bool {
        self.ty == ANY_TYPE || self.ty.is_empty()
    }
}

/// An explicit field rule in the `fields` or `auto` section.
///
/// Source and target each accept a single path (`source:`) or a list
/// (`sources:`); the accessors below merge the two spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
    /// Named transform to invoke instead of an inferred strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    /// Literal default; short-circuits strategy selection entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Introspection hint for strategy selection.
    #[serde(default, skip_serializing_if = "Hint::is_none")]
    pub hint: Hint,
    /// Free-form annotations; `def.target` entries become ordering edges,
    /// `def.<name>` entries feed nested requires arguments.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    /// Human-readable rationale, written by the suggestion exporter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FieldRule {
    /// A plain `source -> target` rule.
    pub fn simple(source: impl Into<String>, target: impl Into<String>) -> Self {
        FieldRule {
            source: Some(source.into()),
            target: Some(target.into()),
            ..FieldRule::default()
        }
    }

    /// All source path strings, `source` first.
    pub fn source_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        if let Some(s) = &self.source {
            paths.push(s);
        }
        paths.extend(self.sources.iter().map(String::as_str));
        paths
    }

    /// All target path strings, `target` first.
    pub fn target_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        if let Some(t) = &self.target {
            paths.push(t);
        }
        paths.extend(self.targets.iter().map(String::as_str));
        paths
    }
}

/// Introspection hint attached to a field rule.
///
/// `dive` demands recursive descent into element/struct fields; `final`
/// forbids introspection and forces a transform strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hint {
    #[default]
    None,
    Dive,
    Final,
}

impl Hint {
    pub fn is_none(&self) -> bool {
        matches!(self, Hint::None)
    }
}

/// An entry of the `ignore` section: a bare target path, or a path with the
/// rationale the suggestion exporter attaches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IgnoreRule {
    Path(String),
    Annotated { path: String, reason: String },
}

impl IgnoreRule {
    pub fn path(&self) -> &str {
        match self {
            IgnoreRule::Path(p) => p,
            IgnoreRule::Annotated { path, .. } => path,
        }
    }
}

/// A named transform function the emitter will call. Opaque here: the
/// planner never checks its body, only records the name (and, when declared,
/// the endpoint types, which the exporter echoes back).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl TransformDecl {
    pub fn named(name: impl Into<String>) -> Self {
        TransformDecl { name: name.into(), source: None, target: None }
    }
}
