//! Fold a resolved plan back into a mapping document.
//!
//! The exported document is what a user would have had to write to get the
//! plan's behavior explicitly: auto-matches become annotated `auto` rules,
//! unmapped targets become annotated ignores with their ranked candidates,
//! and `one_to_one` entries whose inferred strategy needs a transform are
//! moved into `fields` with a `TODO_<Source>To<Target>` placeholder name.
//! Output order is fully deterministic; serializing the result twice yields
//! byte-identical text.

use rustc_hash::FxHashSet;

use recast_graph::{TypeGraph, TypeId};
use recast_mapping::{FieldRule, IgnoreRule, MappingDocument, TypeMapping};
use recast_resolve::{Origin, PairId, ResolvedFieldMapping, ResolvedPlan, ResolvedTypePair};

/// Fold `plan` into a mapping document ready for serialization.
///
/// Pairs are visited root-first in declaration order, then depth-first
/// through nested conversions, deduplicated by pair key.
pub fn export(plan: &ResolvedPlan, graph: &TypeGraph) -> MappingDocument {
    let mut doc = MappingDocument::new();
    doc.transforms = plan.transforms.clone();

    let mut visited: FxHashSet<String> = FxHashSet::default();
    let mut order: Vec<&ResolvedTypePair> = Vec::new();
    for &root in &plan.roots {
        visit(plan, root, &mut visited, &mut order);
    }
    for pair in order {
        doc.mappings.push(export_pair(pair, graph));
    }
    doc
}

fn visit<'p>(
    plan: &'p ResolvedPlan,
    id: PairId,
    visited: &mut FxHashSet<String>,
    order: &mut Vec<&'p ResolvedTypePair>,
) {
    let pair = plan.pair(id);
    if !visited.insert(pair.pair_key()) {
        return;
    }
    order.push(pair);
    for nested in &pair.nested {
        if let Some(child) = nested.resolved {
            visit(plan, child, visited, order);
        }
    }
}

fn export_pair(pair: &ResolvedTypePair, graph: &TypeGraph) -> TypeMapping {
    let mut mapping = TypeMapping::new(pair.source.to_string(), pair.target.to_string());
    mapping.generate_target = pair.generated_target;
    mapping.requires = pair.requires.clone();

    for field in &pair.fields {
        match field.origin {
            Origin::OneToOne => {
                if field.is_incomplete() {
                    // The rename turned out to need a transform; surface it
                    // as an explicit rule with a placeholder name so the
                    // user sees what is missing.
                    let mut rule = rule_from(field);
                    rule.transform = Some(placeholder_name(pair, field, graph));
                    rule.note =
                        Some("moved from one_to_one: inferred strategy requires a transform".into());
                    mapping.fields.push(rule);
                } else {
                    mapping.one_to_one.insert(
                        field.sources[0].to_string(),
                        field.targets[0].to_string(),
                    );
                }
            }
            Origin::Fields => mapping.fields.push(rule_from(field)),
            Origin::Ignore => {
                let path = field.primary_target();
                match field.explanation.strip_prefix("explicitly ignored: ") {
                    Some(reason) => mapping.ignore.push(IgnoreRule::Annotated {
                        path,
                        reason: reason.to_string(),
                    }),
                    None => mapping.ignore.push(IgnoreRule::Path(path)),
                }
            }
            Origin::AutoRule => mapping.auto.push(rule_from(field)),
            Origin::AutoMatch => {
                let mut rule = rule_from(field);
                rule.note = Some(format!(
                    "auto-matched: confidence {:.2}, strategy {}",
                    field.confidence, field.strategy
                ));
                mapping.auto.push(rule);
            }
        }
    }

    for unmapped in &pair.unmapped {
        let mut reason = format!("unmapped ({}): {}", unmapped.reason.as_str(), unmapped.detail);
        if !unmapped.candidates.is_empty() {
            let listed: Vec<String> = unmapped
                .candidates
                .iter()
                .map(|c| format!("{} ({:.2})", c.name, c.score))
                .collect();
            reason.push_str("; top candidates: ");
            reason.push_str(&listed.join(", "));
        }
        mapping.ignore.push(IgnoreRule::Annotated {
            path: unmapped.path.clone(),
            reason,
        });
    }

    mapping
}

/// Reconstruct a field rule from a resolved mapping.
fn rule_from(field: &ResolvedFieldMapping) -> FieldRule {
    let mut sources = field.sources.iter().map(ToString::to_string);
    let mut targets = field.targets.iter().map(ToString::to_string);
    FieldRule {
        source: sources.next(),
        sources: sources.collect(),
        target: targets.next(),
        targets: targets.collect(),
        transform: field.transform.clone(),
        default: field.default.clone(),
        hint: field.hint,
        extra: field.extra.clone(),
        note: None,
    }
}

/// `TODO_<Source>To<Target>` from the terminal type names of the entry.
fn placeholder_name(
    pair: &ResolvedTypePair,
    field: &ResolvedFieldMapping,
    graph: &TypeGraph,
) -> String {
    let source = terminal_name(graph, &pair.source, field.sources.first());
    let target = terminal_name(graph, &pair.target, field.targets.first());
    format!("TODO_{}To{}", source, target)
}

fn terminal_name(
    graph: &TypeGraph,
    root: &TypeId,
    path: Option<&recast_graph::FieldPath>,
) -> String {
    let terminal = path.and_then(|p| p.resolve(graph, root).ok());
    let name = match &terminal {
        Some(id) => id.name.as_str(),
        None => "Unknown",
    };
    // Compound type names carry punctuation (`*int`, `[]store.Item`); keep
    // only what survives in an identifier.
    let cleaned: String = name.chars().filter(|c| c.is_alphanumeric()).collect();
    if cleaned.is_empty() {
        "Unknown".to_string()
    } else {
        cleaned
    }
}
