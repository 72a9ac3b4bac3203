//! Requires-type deduction.
//!
//! A nested mapping may declare external arguments without types (the `any`
//! sentinel). When a parent field mapping references such an argument via an
//! `extra` entry `def.<name>: <field path>`, the referenced field's type is
//! a candidate for the argument's real type. If every reference agrees, the
//! entry is promoted; conflicting references leave the sentinel in place
//! with a warning.

use recast_graph::{FieldPath, TypeGraph};

use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
use crate::plan::{PairId, ResolvedTypePair};

/// Promote `any`-typed requires entries across the whole plan.
pub fn deduce(pairs: &mut [ResolvedTypePair], graph: &TypeGraph, diagnostics: &mut Diagnostics) {
    let mut promotions: Vec<(usize, usize, String)> = Vec::new();

    for (pair_idx, pair) in pairs.iter().enumerate() {
        for (req_idx, req) in pair.requires.iter().enumerate() {
            if !req.is_any() {
                continue;
            }
            let extra_key = format!("def.{}", req.name);
            let mut seen = collect_reference_types(pairs, graph, pair_idx, &extra_key);
            if seen.is_empty() {
                continue;
            }
            seen.sort();
            seen.dedup();
            if seen.len() == 1 {
                promotions.push((pair_idx, req_idx, seen.pop().expect("one entry")));
            } else {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        DiagnosticCode::RequiresTypeConflict,
                        format!(
                            "requires argument `{}` deduced as conflicting types: {}",
                            req.name,
                            seen.join(", ")
                        ),
                    )
                    .with_pair(pair.pair_key()),
                );
            }
        }
    }

    for (pair_idx, req_idx, ty) in promotions {
        pairs[pair_idx].requires[req_idx].ty = ty;
    }
}

/// Stringified types of every field a parent references for this argument.
///
/// A reference is a parent field mapping that (a) induced the nested pair
/// and (b) carries the `def.<name>` extra; its path resolves against the
/// parent's source type first, falling back to the target type.
fn collect_reference_types(
    pairs: &[ResolvedTypePair],
    graph: &TypeGraph,
    pair_idx: usize,
    extra_key: &str,
) -> Vec<String> {
    let mut seen = Vec::new();
    for parent in pairs {
        for conversion in &parent.nested {
            if conversion.resolved != Some(PairId(pair_idx)) {
                continue;
            }
            for mapping in &parent.fields {
                if !conversion.referenced_by.contains(&mapping.primary_target()) {
                    continue;
                }
                let Some(raw) = mapping.extra.get(extra_key) else { continue };
                let Ok(path) = FieldPath::parse(raw) else { continue };
                let resolved = path
                    .resolve(graph, &parent.source)
                    .or_else(|_| path.resolve(graph, &parent.target));
                if let Ok(ty) = resolved {
                    seen.push(ty.to_string());
                }
            }
        }
    }
    seen
}
