//! The resolved plan: the terminal artifact of resolution.
//!
//! A plan holds one [`ResolvedTypePair`] per type mapping (declared or
//! discovered through nesting), each with its field mappings, unmapped
//! targets, and nested-pair references. Pairs live in an arena addressed by
//! [`PairId`] so that cyclic pair references need no shared ownership -- the
//! same trick the graph plays with [`recast_graph::TypeId`]s.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use recast_graph::{FieldPath, TypeId};
use recast_mapping::{Hint, RequiresDecl, TransformDecl};
use recast_match::Candidate;

use crate::diagnostics::Diagnostics;

/// Index of a pair in the plan's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PairId(pub usize);

/// Which priority tier produced a field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Origin {
    /// Direct renames from the `one_to_one` section.
    #[serde(rename = "yaml:121")]
    OneToOne,
    /// Explicit rules from the `fields` section.
    #[serde(rename = "yaml:fields")]
    Fields,
    /// Explicit ignores.
    #[serde(rename = "yaml:ignore")]
    Ignore,
    /// Explicit rules from the `auto` section.
    #[serde(rename = "yaml:auto")]
    AutoRule,
    /// Algorithmic auto-match.
    #[serde(rename = "auto")]
    AutoMatch,
}

impl Origin {
    /// Stable tier identifier, as exposed in the plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::OneToOne => "yaml:121",
            Origin::Fields => "yaml:fields",
            Origin::Ignore => "yaml:ignore",
            Origin::AutoRule => "yaml:auto",
            Origin::AutoMatch => "auto",
        }
    }

    /// Priority rank; lower tiers win conflicts and sort first.
    pub fn tier(&self) -> u8 {
        match self {
            Origin::OneToOne => 1,
            Origin::Fields => 2,
            Origin::Ignore => 3,
            Origin::AutoRule => 4,
            Origin::AutoMatch => 5,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arity of a resolved mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:1")]
    ManyToOne,
    #[serde(rename = "N:M")]
    ManyToMany,
}

impl Cardinality {
    pub fn from_counts(sources: usize, targets: usize) -> Self {
        match (sources > 1, targets > 1) {
            (false, false) => Cardinality::OneToOne,
            (false, true) => Cardinality::OneToMany,
            (true, false) => Cardinality::ManyToOne,
            (true, true) => Cardinality::ManyToMany,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:N",
            Cardinality::ManyToOne => "N:1",
            Cardinality::ManyToMany => "N:M",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed set of conversion strategies an emitter must honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `target := source`
    DirectAssign,
    /// `target := T(source)`
    Convert,
    /// Nil-guard, then read `*source`.
    PointerDeref,
    /// Allocate, then take the address of source.
    PointerWrap,
    /// Nil-guard, recurse into the pointed-to nested caster, re-wrap.
    PointerNestedCast,
    /// Build a target slice of matching length, per-element recursion.
    SliceMap,
    /// Allocate the target map; convert key then value per entry.
    MapCopy,
    /// Invoke the nested caster for the inner type pair.
    NestedCast,
    /// Invoke a user-named transform function.
    Transform,
    /// Assign a literal default.
    Default,
    /// Emit nothing.
    Ignore,
}

impl Strategy {
    /// Stable identifier, as exposed to downstream emitters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::DirectAssign => "direct_assign",
            Strategy::Convert => "convert",
            Strategy::PointerDeref => "pointer_deref",
            Strategy::PointerWrap => "pointer_wrap",
            Strategy::PointerNestedCast => "pointer_nested_cast",
            Strategy::SliceMap => "slice_map",
            Strategy::MapCopy => "map_copy",
            Strategy::NestedCast => "nested_cast",
            Strategy::Transform => "transform",
            Strategy::Default => "default",
            Strategy::Ignore => "ignore",
        }
    }

    /// Whether the strategy implies a nested struct conversion to discover.
    pub fn induces_nested_pair(&self) -> bool {
        matches!(
            self,
            Strategy::NestedCast | Strategy::SliceMap | Strategy::PointerNestedCast
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resolved assignment: which source expression(s) feed which target
/// path(s), and how.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedFieldMapping {
    pub targets: Vec<FieldPath>,
    pub sources: Vec<FieldPath>,
    pub origin: Origin,
    pub cardinality: Cardinality,
    pub strategy: Strategy,
    /// Name of the user transform to invoke, when strategy is `transform`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    /// Literal default, when strategy is `default`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Confidence in [0, 1]; explicit rules carry 1.0.
    pub confidence: f64,
    /// Human-readable rationale for the chosen strategy.
    pub explanation: String,
    /// The effective introspection hint.
    #[serde(skip_serializing_if = "Hint::is_none")]
    pub hint: Hint,
    /// Annotations carried over from the rule.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    /// Target paths this mapping's assignment must run after.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl ResolvedFieldMapping {
    /// The first target path's string form; the sort and claim key.
    pub fn primary_target(&self) -> String {
        self.targets
            .first()
            .map(|p| p.to_string())
            .unwrap_or_default()
    }

    /// Whether this entry requires a transform no one named.
    pub fn is_incomplete(&self) -> bool {
        self.strategy == Strategy::Transform && self.transform.is_none()
    }
}

/// Why a target field could not be auto-matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedReason {
    /// Two candidates scored too close together.
    Ambiguous,
    /// The best candidate scored below the confidence threshold.
    BelowThreshold,
    /// No exported source field is compatible at all.
    NoCompatibleSource,
    /// No rule matched and no candidate cleared any gate.
    Unmatched,
}

impl UnmappedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnmappedReason::Ambiguous => "ambiguous",
            UnmappedReason::BelowThreshold => "below_threshold",
            UnmappedReason::NoCompatibleSource => "no_compatible_source",
            UnmappedReason::Unmatched => "unmatched",
        }
    }
}

/// A target field no tier claimed, with the ranked candidates considered.
///
/// Unmapped targets are first-class plan data, never errors; the suggestion
/// exporter turns them into annotated ignore entries.
#[derive(Debug, Clone, Serialize)]
pub struct UnmappedTarget {
    pub path: String,
    pub target_type: TypeId,
    pub reason: UnmappedReason,
    /// One-line detail (scores, thresholds in force).
    pub detail: String,
    pub candidates: Vec<Candidate>,
}

/// A child type pair induced by a field mapping's strategy.
#[derive(Debug, Clone, Serialize)]
pub struct NestedConversion {
    pub source: TypeId,
    pub target: TypeId,
    /// Target paths of the field mappings that need this conversion.
    pub referenced_by: Vec<String>,
    /// The recursively produced pair, when resolution reached it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<PairId>,
}

impl NestedConversion {
    /// The `source->target` key used for dedup and ordering.
    pub fn key(&self) -> String {
        format!("{}->{}", self.source, self.target)
    }
}

/// The fully resolved conversion between one source type and one target type.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTypePair {
    pub source: TypeId,
    pub target: TypeId,
    pub fields: Vec<ResolvedFieldMapping>,
    pub unmapped: Vec<UnmappedTarget>,
    pub nested: Vec<NestedConversion>,
    /// External arguments the generated caster must accept.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiresDecl>,
    /// Whether the target type was synthesized from the mapping.
    pub generated_target: bool,
}

impl ResolvedTypePair {
    pub fn pair_key(&self) -> String {
        format!("{}->{}", self.source, self.target)
    }
}

/// The terminal artifact: every resolved pair, the transforms in force, and
/// the diagnostics bag. The type graph is shared by reference with the
/// caller rather than owned here; pairs reference it by [`TypeId`].
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPlan {
    /// All pairs, in resolution order. Nested pairs follow their parents.
    pub pairs: Vec<ResolvedTypePair>,
    /// The declared (top-level) pairs, in document order.
    pub roots: Vec<PairId>,
    /// Transform declarations carried over from the document.
    pub transforms: Vec<TransformDecl>,
    pub diagnostics: Diagnostics,
}

impl ResolvedPlan {
    pub fn pair(&self, id: PairId) -> &ResolvedTypePair {
        &self.pairs[id.0]
    }

    /// A plan is valid iff no diagnostic is at error severity.
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Plan entries that require a transform none was named for, as
    /// `(pair key, field mapping)` pairs in plan order.
    pub fn incomplete_mappings(&self) -> Vec<(String, &ResolvedFieldMapping)> {
        let mut incomplete = Vec::new();
        for pair in &self.pairs {
            for mapping in &pair.fields {
                if mapping.is_incomplete() {
                    incomplete.push((pair.pair_key(), mapping));
                }
            }
        }
        incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_identifiers_and_tiers() {
        assert_eq!(Origin::OneToOne.as_str(), "yaml:121");
        assert_eq!(Origin::AutoMatch.as_str(), "auto");
        assert!(Origin::OneToOne.tier() < Origin::Fields.tier());
        assert!(Origin::AutoRule.tier() < Origin::AutoMatch.tier());
    }

    #[test]
    fn strategy_identifiers_are_stable() {
        assert_eq!(Strategy::DirectAssign.as_str(), "direct_assign");
        assert_eq!(Strategy::PointerNestedCast.as_str(), "pointer_nested_cast");
        assert_eq!(Strategy::SliceMap.as_str(), "slice_map");
    }

    #[test]
    fn cardinality_from_counts() {
        assert_eq!(Cardinality::from_counts(1, 1), Cardinality::OneToOne);
        assert_eq!(Cardinality::from_counts(1, 2), Cardinality::OneToMany);
        assert_eq!(Cardinality::from_counts(3, 1), Cardinality::ManyToOne);
        assert_eq!(Cardinality::from_counts(2, 2), Cardinality::ManyToMany);
    }

    #[test]
    fn nested_strategies_induce_pairs() {
        assert!(Strategy::NestedCast.induces_nested_pair());
        assert!(Strategy::SliceMap.induces_nested_pair());
        assert!(Strategy::PointerNestedCast.induces_nested_pair());
        assert!(!Strategy::MapCopy.induces_nested_pair());
        assert!(!Strategy::Transform.induces_nested_pair());
    }
}
