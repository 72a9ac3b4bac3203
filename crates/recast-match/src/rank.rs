//! Candidate ranking: which source fields could feed a target field?
//!
//! Every exported source field is scored against the target field as
//! `0.6 * name-score + 0.4 * type-score` and the list is sorted descending,
//! ties broken by alphabetical source field name so runs are deterministic.

use serde::Serialize;

use recast_graph::{FieldInfo, TypeGraph, TypeId, TypeInfo};

use crate::compat::{classify, Compat};
use crate::distance::name_score;

/// Weight of the name component in the combined score.
const NAME_WEIGHT: f64 = 0.6;
/// Weight of the type component in the combined score.
const TYPE_WEIGHT: f64 = 0.4;

/// One scored source-field candidate for a target field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Source field name.
    pub name: String,
    /// Source field type.
    pub source_type: TypeId,
    /// Combined score in [0, 1].
    pub score: f64,
    pub name_score: f64,
    pub type_score: f64,
    /// Compatibility verdict between the field types.
    pub compat: Compat,
}

/// The ranked candidate list for one target field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

/// Score every exported source field against `target_field`.
///
/// Unexported fields are skipped on both sides; an unexported target yields
/// an empty set.
pub fn rank_candidates(
    graph: &TypeGraph,
    source: &TypeInfo,
    target_field: &FieldInfo,
) -> CandidateSet {
    if !target_field.exported {
        return CandidateSet::default();
    }
    let mut candidates: Vec<Candidate> = source
        .fields
        .iter()
        .filter(|f| f.exported)
        .map(|f| {
            let verdict = classify(graph, &f.ty, &target_field.ty);
            let name_score = best_name_score(f, target_field);
            let type_score = verdict.compat.type_score();
            Candidate {
                name: f.name.clone(),
                source_type: f.ty.clone(),
                score: NAME_WEIGHT * name_score + TYPE_WEIGHT * type_score,
                name_score,
                type_score,
                compat: verdict.compat,
            }
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    CandidateSet { candidates }
}

/// The best name score over every (source, target) name variant pair.
///
/// A field is known by its declared name and, when tagged, by its wire
/// name (`json:"sku,omitempty"` also answers to `sku`), so a renamed field
/// still matches its serialized counterpart.
fn best_name_score(source: &FieldInfo, target: &FieldInfo) -> f64 {
    let mut best: f64 = 0.0;
    for s in name_variants(source) {
        for t in name_variants(target) {
            best = best.max(name_score(s, t));
        }
    }
    best
}

fn name_variants(field: &FieldInfo) -> Vec<&str> {
    let mut variants = vec![field.name.as_str()];
    if let Some(tag) = field.tag_value("json") {
        let base = tag.split(',').next().unwrap_or("");
        if !base.is_empty() && base != "-" {
            variants.push(base);
        }
    }
    variants
}

impl CandidateSet {
    /// The top candidate, if any field scored at all.
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// The first `n` candidates.
    pub fn top(&self, n: usize) -> &[Candidate] {
        &self.candidates[..self.candidates.len().min(n)]
    }

    /// Whether the top two candidates are within `threshold` of each other.
    pub fn ambiguous(&self, threshold: f64) -> bool {
        match (self.candidates.first(), self.candidates.get(1)) {
            (Some(first), Some(second)) => first.score - second.score <= threshold,
            _ => false,
        }
    }

    /// The top candidate, only when it is safe to auto-accept: score at
    /// least `min_score`, compatibility at least needs-transform, and either
    /// no runner-up or a gap of at least `min_gap` to it.
    pub fn high_confidence(&self, min_score: f64, min_gap: f64) -> Option<&Candidate> {
        let first = self.candidates.first()?;
        if first.score < min_score || !first.compat.at_least(Compat::NeedsTransform) {
            return None;
        }
        match self.candidates.get(1) {
            None => Some(first),
            Some(second) if first.score - second.score >= min_gap => Some(first),
            Some(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }
}
