//! Strategy selection: from a (source type, target type, hint) triple to
//! one of the closed conversion strategies.
//!
//! Selection is phase-ordered: missing type information and the `final`
//! hint short-circuit to `transform`; synthesized types (whose compatibility
//! the classifier cannot judge) go through kind-based selection; everything
//! else maps the classifier's verdict, refining `needs-transform` and
//! `incompatible` by kind.

use recast_graph::{TypeGraph, TypeId, TypeInfo, TypeKind};
use recast_mapping::Hint;
use recast_match::{classify, Compat};

use crate::plan::Strategy;

/// A selected strategy with its one-line rationale.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyChoice {
    pub strategy: Strategy,
    pub reason: String,
}

impl StrategyChoice {
    fn new(strategy: Strategy, reason: impl Into<String>) -> Self {
        StrategyChoice { strategy, reason: reason.into() }
    }
}

/// Select the conversion strategy for a source/target type pair.
pub fn select(
    graph: &TypeGraph,
    source: Option<&TypeId>,
    target: Option<&TypeId>,
    hint: Hint,
) -> StrategyChoice {
    let (Some(source), Some(target)) = (source, target) else {
        return StrategyChoice::new(Strategy::Transform, "type info unavailable");
    };
    let (Some(src), Some(tgt)) = (graph.get(source), graph.get(target)) else {
        return StrategyChoice::new(Strategy::Transform, "type info unavailable");
    };

    if hint == Hint::Final {
        return StrategyChoice::new(Strategy::Transform, "final hint forbids introspection");
    }

    // Synthesized types have no concrete type-system representation, so the
    // classifier cannot judge them; fall back to kind-based selection.
    if src.synthesized || tgt.synthesized || element_synthesized(graph, src) || element_synthesized(graph, tgt) {
        return select_by_kind(graph, src, tgt, hint);
    }

    let verdict = classify(graph, source, target);
    match verdict.compat {
        Compat::Identical | Compat::Assignable => {
            StrategyChoice::new(Strategy::DirectAssign, verdict.reason)
        }
        Compat::Convertible => StrategyChoice::new(Strategy::Convert, verdict.reason),
        Compat::NeedsTransform | Compat::Incompatible => refine_by_kind(graph, src, tgt, hint)
            .unwrap_or_else(|| {
                StrategyChoice::new(
                    Strategy::Transform,
                    format!("no structural strategy applies ({})", verdict.reason),
                )
            }),
    }
}

/// Whether a compound type wraps a synthesized element anywhere down its
/// wrapper chain.
fn element_synthesized(graph: &TypeGraph, info: &TypeInfo) -> bool {
    let mut current = info;
    let mut hops = 0;
    while let Some(element) = &current.element {
        let Some(next) = graph.get(element) else { return false };
        if next.synthesized {
            return true;
        }
        current = next;
        hops += 1;
        if hops > 32 {
            return false;
        }
    }
    false
}

/// Kind-based selection for pairs involving synthesized types.
fn select_by_kind(graph: &TypeGraph, src: &TypeInfo, tgt: &TypeInfo, hint: Hint) -> StrategyChoice {
    if src.kind == tgt.kind {
        return match src.kind {
            TypeKind::Basic => {
                if src.id == tgt.id {
                    StrategyChoice::new(Strategy::DirectAssign, "same basic type")
                } else {
                    StrategyChoice::new(Strategy::Convert, "basic types of different names")
                }
            }
            TypeKind::Struct => {
                let reason = if hint == Hint::Dive {
                    "struct pair (dive)"
                } else {
                    "struct pair"
                };
                StrategyChoice::new(Strategy::NestedCast, reason)
            }
            TypeKind::Slice | TypeKind::Array => {
                StrategyChoice::new(Strategy::SliceMap, "element-wise collection copy")
            }
            TypeKind::Map => StrategyChoice::new(Strategy::MapCopy, "entry-wise map copy"),
            TypeKind::Pointer => {
                if pointee_is_struct(graph, src) && pointee_is_struct(graph, tgt) {
                    StrategyChoice::new(Strategy::PointerNestedCast, "pointers to struct pair")
                } else {
                    StrategyChoice::new(Strategy::DirectAssign, "pointer pair")
                }
            }
            _ => {
                if src.id == tgt.id {
                    StrategyChoice::new(Strategy::DirectAssign, "same type")
                } else {
                    StrategyChoice::new(Strategy::Transform, "opaque kinds differ in name")
                }
            }
        };
    }
    if src.kind == TypeKind::Pointer {
        return StrategyChoice::new(Strategy::PointerDeref, "source is a pointer");
    }
    if tgt.kind == TypeKind::Pointer {
        return StrategyChoice::new(Strategy::PointerWrap, "target is a pointer");
    }
    StrategyChoice::new(Strategy::Transform, "kinds differ with no structural bridge")
}

/// Kind refinement for `needs-transform` / `incompatible` verdicts.
///
/// Works on alias-resolved kinds so a named slice still refines to
/// `slice_map`. Returns `None` when no refinement applies.
fn refine_by_kind(
    graph: &TypeGraph,
    src: &TypeInfo,
    tgt: &TypeInfo,
    hint: Hint,
) -> Option<StrategyChoice> {
    let src = graph.resolve_alias(src)?;
    let tgt = graph.resolve_alias(tgt)?;
    match (src.kind, tgt.kind) {
        (TypeKind::Pointer, TypeKind::Pointer) => {
            if pointee_is_struct(graph, src) && pointee_is_struct(graph, tgt) {
                Some(StrategyChoice::new(
                    Strategy::PointerNestedCast,
                    "pointers to distinct struct types",
                ))
            } else {
                None
            }
        }
        (TypeKind::Pointer, _) => Some(StrategyChoice::new(
            Strategy::PointerDeref,
            "requires pointer dereference",
        )),
        (_, TypeKind::Pointer) => Some(StrategyChoice::new(
            Strategy::PointerWrap,
            "requires taking address",
        )),
        (TypeKind::Slice, TypeKind::Slice) => Some(StrategyChoice::new(
            Strategy::SliceMap,
            "per-element slice conversion (dive)",
        )),
        (TypeKind::Array, TypeKind::Array) => Some(StrategyChoice::new(
            Strategy::SliceMap,
            "per-element array conversion",
        )),
        (TypeKind::Map, TypeKind::Map) => Some(StrategyChoice::new(
            Strategy::MapCopy,
            "entry-wise map copy",
        )),
        (TypeKind::Struct, TypeKind::Struct) => {
            let reason = if hint == Hint::Dive {
                "distinct struct types (dive)"
            } else {
                "distinct struct types"
            };
            Some(StrategyChoice::new(Strategy::NestedCast, reason))
        }
        _ => None,
    }
}

fn pointee_is_struct(graph: &TypeGraph, pointer: &TypeInfo) -> bool {
    pointer
        .element
        .as_ref()
        .is_some_and(|element| graph.is_struct_like(element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_graph::{FieldInfo, TypeInfo};

    fn struct_pair(g: &mut TypeGraph) -> (TypeId, TypeId) {
        let int = g.basic("int");
        let a = g.insert(TypeInfo::strukt(
            TypeId::new("src", "Order"),
            vec![FieldInfo::new("ID", int.clone())],
        ));
        let b = g.insert(TypeInfo::strukt(
            TypeId::new("dst", "Order"),
            vec![FieldInfo::new("ID", int)],
        ));
        (a, b)
    }

    #[test]
    fn missing_type_info_forces_transform() {
        let g = TypeGraph::new();
        let choice = select(&g, None, Some(&TypeGraph::any_id()), Hint::None);
        assert_eq!(choice.strategy, Strategy::Transform);
        assert_eq!(choice.reason, "type info unavailable");
        let ghost = TypeId::new("no", "Such");
        let choice = select(&g, Some(&ghost), Some(&TypeGraph::any_id()), Hint::None);
        assert_eq!(choice.strategy, Strategy::Transform);
    }

    #[test]
    fn final_hint_always_forces_transform() {
        let mut g = TypeGraph::new();
        let int = g.basic("int");
        let choice = select(&g, Some(&int), Some(&int), Hint::Final);
        assert_eq!(choice.strategy, Strategy::Transform);
    }

    #[test]
    fn identical_types_assign_directly() {
        let mut g = TypeGraph::new();
        let int = g.basic("int");
        let choice = select(&g, Some(&int), Some(&int), Hint::None);
        assert_eq!(choice.strategy, Strategy::DirectAssign);
    }

    #[test]
    fn convertible_basics_convert() {
        let mut g = TypeGraph::new();
        let i64_ = g.basic("int64");
        let u = g.basic("uint");
        let choice = select(&g, Some(&i64_), Some(&u), Hint::None);
        assert_eq!(choice.strategy, Strategy::Convert);
    }

    #[test]
    fn struct_pairs_nest() {
        let mut g = TypeGraph::new();
        let (a, b) = struct_pair(&mut g);
        let choice = select(&g, Some(&a), Some(&b), Hint::None);
        assert_eq!(choice.strategy, Strategy::NestedCast);
    }

    #[test]
    fn pointer_shapes_refine() {
        let mut g = TypeGraph::new();
        let (a, b) = struct_pair(&mut g);
        let pa = g.pointer_to(&a);
        let pb = g.pointer_to(&b);
        assert_eq!(select(&g, Some(&pa), Some(&pb), Hint::None).strategy, Strategy::PointerNestedCast);
        assert_eq!(select(&g, Some(&pa), Some(&b), Hint::None).strategy, Strategy::PointerDeref);
        assert_eq!(select(&g, Some(&a), Some(&pb), Hint::None).strategy, Strategy::PointerWrap);
        let int = g.basic("int");
        let pint = g.pointer_to(&int);
        assert_eq!(select(&g, Some(&pint), Some(&int), Hint::None).strategy, Strategy::PointerDeref);
        assert_eq!(select(&g, Some(&int), Some(&pint), Hint::None).strategy, Strategy::PointerWrap);
    }

    #[test]
    fn slices_and_maps_refine() {
        let mut g = TypeGraph::new();
        let (a, b) = struct_pair(&mut g);
        let sa = g.slice_of(&a);
        let sb = g.slice_of(&b);
        assert_eq!(select(&g, Some(&sa), Some(&sb), Hint::None).strategy, Strategy::SliceMap);
        let string = g.basic("string");
        let ma = g.map_of(&string, &a);
        let mb = g.map_of(&string, &b);
        assert_eq!(select(&g, Some(&ma), Some(&mb), Hint::None).strategy, Strategy::MapCopy);
    }

    #[test]
    fn synthesized_targets_select_by_kind() {
        let mut g = TypeGraph::new();
        let int = g.basic("int");
        let src = g.insert(TypeInfo::strukt(
            TypeId::new("src", "Order"),
            vec![FieldInfo::new("ID", int)],
        ));
        let dto = g.insert(
            TypeInfo::strukt(TypeId::new("dto", "OrderDTO"), vec![]).synthesized(),
        );
        let choice = select(&g, Some(&src), Some(&dto), Hint::None);
        assert_eq!(choice.strategy, Strategy::NestedCast);
        // A struct against a synthesized pointer wraps.
        let pdto = g.pointer_to(&dto);
        let choice = select(&g, Some(&src), Some(&pdto), Hint::None);
        assert_eq!(choice.strategy, Strategy::PointerWrap);
    }

    #[test]
    fn incompatible_pair_falls_back_to_transform() {
        let mut g = TypeGraph::new();
        let int = g.basic("int");
        let (a, _) = struct_pair(&mut g);
        let choice = select(&g, Some(&int), Some(&a), Hint::None);
        assert_eq!(choice.strategy, Strategy::Transform);
    }
}
