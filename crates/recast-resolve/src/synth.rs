//! Virtual target synthesis.
//!
//! A mapping may declare `generate_target` on a target type that does not
//! exist yet; resolution then needs a stub to resolve against. Synthesis
//! runs once, before any pair is resolved, so nested references already see
//! every virtual type. Field types are adopted from the referenced source
//! fields, and references to the source of a *sibling* virtual target are
//! rewritten to that sibling -- `OrderDTO.Items` ends up referencing
//! `OrderItemDTO`, not `OrderItem`, wrapper chain preserved.

use rustc_hash::FxHashMap;

use recast_graph::{FieldInfo, FieldPath, TypeGraph, TypeId, TypeInfo, TypeKind};
use recast_mapping::MappingDocument;

use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};

/// Create every requested virtual target type and insert it into the graph.
pub fn populate_virtual_targets(
    graph: &mut TypeGraph,
    doc: &MappingDocument,
    diagnostics: &mut Diagnostics,
) {
    // Pass 1: plan ids, and index source -> virtual target for remapping.
    // Document order wins when two mappings generate from the same source.
    let mut planned: Vec<(TypeId, TypeId)> = Vec::new();
    let mut by_source: FxHashMap<TypeId, TypeId> = FxHashMap::default();
    for mapping in &doc.mappings {
        if !mapping.generate_target {
            continue;
        }
        let target = TypeId::parse(&mapping.target);
        if graph.contains(&target) {
            continue;
        }
        let source = TypeId::parse(&mapping.source);
        by_source.entry(source.clone()).or_insert_with(|| target.clone());
        planned.push((source, target));
    }

    // Pass 2: build and insert each stub.
    for (source, target) in &planned {
        let mapping = doc
            .mappings
            .iter()
            .find(|m| {
                m.generate_target
                    && TypeId::parse(&m.source) == *source
                    && TypeId::parse(&m.target) == *target
            })
            .expect("planned from this document");

        let mut fields: Vec<FieldInfo> = Vec::new();
        let push_field = |fields: &mut Vec<FieldInfo>, name: &str, ty: TypeId| {
            if fields.iter().any(|f| f.name == name) {
                return;
            }
            fields.push(FieldInfo::new(name, ty));
        };

        for (src_path, tgt_path) in &mapping.one_to_one {
            let Some(name) = target_field_name(tgt_path) else {
                diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        DiagnosticCode::OneToOneMappingError,
                        format!("cannot derive a generated field from path `{}`", tgt_path),
                    )
                    .with_pair(format!("{}->{}", source, target)),
                );
                continue;
            };
            let ty = adopt_source_type(graph, source, src_path);
            let ty = remap_to_sibling(graph, &ty, &by_source);
            push_field(&mut fields, &name, ty);
        }

        for rule in mapping.fields.iter().chain(mapping.auto.iter()) {
            for tgt_path in rule.target_paths() {
                let Some(name) = target_field_name(tgt_path) else { continue };
                let ty = rule
                    .source_paths()
                    .first()
                    .map(|src_path| adopt_source_type(graph, source, src_path))
                    .unwrap_or_else(TypeGraph::any_id);
                let ty = remap_to_sibling(graph, &ty, &by_source);
                push_field(&mut fields, &name, ty);
            }
        }

        graph.insert(TypeInfo::strukt(target.clone(), fields).synthesized());
    }
}

/// The generated field name for a target path: its leading segment.
/// Deep or indexed paths cannot name a generated field.
fn target_field_name(path: &str) -> Option<String> {
    let parsed = FieldPath::parse(path).ok()?;
    if !parsed.is_plain_field() {
        return None;
    }
    Some(parsed.leading().to_string())
}

/// Resolve a source path and adopt its terminal type; `any` when the path
/// does not resolve (resolution proper will report it).
fn adopt_source_type(graph: &TypeGraph, source: &TypeId, path: &str) -> TypeId {
    FieldPath::parse(path)
        .ok()
        .and_then(|p| p.resolve(graph, source).ok())
        .unwrap_or_else(TypeGraph::any_id)
}

/// Rewrite references to the source of another virtual target so they point
/// at the sibling virtual target instead, preserving pointer/slice/array/map
/// wrappers. Wrapper nodes created here are marked synthesized.
fn remap_to_sibling(
    graph: &mut TypeGraph,
    ty: &TypeId,
    by_source: &FxHashMap<TypeId, TypeId>,
) -> TypeId {
    if let Some(sibling) = by_source.get(ty) {
        return sibling.clone();
    }
    let Some(info) = graph.get(ty) else {
        return ty.clone();
    };
    let (kind, key, element, array_len) =
        (info.kind, info.key.clone(), info.element.clone(), info.array_len);
    let Some(element) = element else {
        return ty.clone();
    };
    let remapped = remap_to_sibling(graph, &element, by_source);
    if remapped == element {
        return ty.clone();
    }
    let wrapper = match kind {
        TypeKind::Pointer => graph.pointer_to(&remapped),
        TypeKind::Slice => graph.slice_of(&remapped),
        TypeKind::Array => graph.array_of(array_len.unwrap_or(0), &remapped),
        TypeKind::Map => {
            let key = key.unwrap_or_else(|| TypeId::anon("string"));
            graph.map_of(&key, &remapped)
        }
        _ => return ty.clone(),
    };
    // The rebuilt wrapper closes over a synthesized element; flag it so
    // strategy selection takes the kind-based branch.
    if let Some(node) = graph.get(&wrapper) {
        let mut node = node.clone();
        node.synthesized = true;
        graph.insert(node);
    }
    wrapper
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_mapping::{FieldRule, TypeMapping};

    fn order_graph() -> TypeGraph {
        let mut g = TypeGraph::new();
        let int = g.basic("int");
        let string = g.basic("string");
        let item = g.insert(TypeInfo::strukt(
            TypeId::new("store", "OrderItem"),
            vec![
                FieldInfo::new("SKU", string.clone()),
                FieldInfo::new("Qty", int.clone()),
            ],
        ));
        let items = g.slice_of(&item);
        g.insert(TypeInfo::strukt(
            TypeId::new("store", "Order"),
            vec![
                FieldInfo::new("ID", int),
                FieldInfo::new("Items", items),
                FieldInfo::new("Note", string),
            ],
        ));
        g
    }

    fn generate_doc() -> MappingDocument {
        let mut doc = MappingDocument::new();
        let mut order = TypeMapping::new("store.Order", "dto.OrderDTO");
        order.generate_target = true;
        order.one_to_one.insert("ID".into(), "ID".into());
        order.fields.push(FieldRule::simple("Items", "Items"));
        let mut item = TypeMapping::new("store.OrderItem", "dto.OrderItemDTO");
        item.generate_target = true;
        item.one_to_one.insert("SKU".into(), "SKU".into());
        item.one_to_one.insert("Qty".into(), "Qty".into());
        doc.mappings.push(order);
        doc.mappings.push(item);
        doc
    }

    /// The synthesized `OrderDTO.Items` must reference the synthesized
    /// `OrderItemDTO` element, not the original `OrderItem`.
    #[test]
    fn sibling_virtual_targets_are_remapped() {
        let mut graph = order_graph();
        let mut diagnostics = Diagnostics::new();
        populate_virtual_targets(&mut graph, &generate_doc(), &mut diagnostics);

        let dto = graph.get(&TypeId::new("dto", "OrderDTO")).expect("synthesized");
        assert!(dto.synthesized);
        let items = dto.field("Items").expect("adopted from rule");
        assert_eq!(items.ty.to_string(), "[]dto.OrderItemDTO");
        let wrapper = graph.get(&items.ty).unwrap();
        assert!(wrapper.synthesized);
        assert_eq!(
            wrapper.element.as_ref().unwrap(),
            &TypeId::new("dto", "OrderItemDTO")
        );

        let item_dto = graph.get(&TypeId::new("dto", "OrderItemDTO")).unwrap();
        assert_eq!(item_dto.fields.len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unmatched_rule_defaults_to_any() {
        let mut graph = order_graph();
        let mut doc = MappingDocument::new();
        let mut mapping = TypeMapping::new("store.Order", "dto.Slim");
        mapping.generate_target = true;
        let mut rule = FieldRule::default();
        rule.target = Some("Label".into());
        mapping.fields.push(rule);
        doc.mappings.push(mapping);
        let mut diagnostics = Diagnostics::new();
        populate_virtual_targets(&mut graph, &doc, &mut diagnostics);
        let slim = graph.get(&TypeId::new("dto", "Slim")).unwrap();
        assert_eq!(slim.field("Label").unwrap().ty, TypeGraph::any_id());
    }

    #[test]
    fn existing_targets_are_left_alone() {
        let mut graph = order_graph();
        let existing = graph.insert(TypeInfo::strukt(TypeId::new("dto", "OrderDTO"), vec![]));
        let mut doc = generate_doc();
        doc.mappings.truncate(1);
        let mut diagnostics = Diagnostics::new();
        populate_virtual_targets(&mut graph, &doc, &mut diagnostics);
        assert!(!graph.get(&existing).unwrap().synthesized);
    }
}
