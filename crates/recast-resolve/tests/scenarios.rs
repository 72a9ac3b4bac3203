//! End-to-end resolution scenarios.
//!
//! Each test builds a small type graph and mapping document by hand, runs
//! the resolver with default configuration, and checks the strategy, origin,
//! and diagnostics per target field.

use recast_graph::{FieldInfo, TypeGraph, TypeId, TypeInfo};
use recast_mapping::{FieldRule, MappingDocument, TransformDecl, TypeMapping};
use recast_resolve::{
    resolve, DiagnosticCode, Origin, ResolveConfig, ResolvedFieldMapping, ResolvedPlan,
    ResolvedTypePair, Strategy, UnmappedReason,
};

// ── Helpers ────────────────────────────────────────────────────────────

fn resolve_plan(graph: &mut TypeGraph, doc: &MappingDocument) -> ResolvedPlan {
    resolve(graph, doc, &ResolveConfig::default())
        .expect("non-strict resolution always yields a plan")
}

fn root_pair(plan: &ResolvedPlan) -> &ResolvedTypePair {
    plan.pair(plan.roots[0])
}

fn field<'p>(pair: &'p ResolvedTypePair, target: &str) -> &'p ResolvedFieldMapping {
    pair.fields
        .iter()
        .find(|m| m.primary_target() == target)
        .unwrap_or_else(|| panic!("no resolved mapping for `{}`", target))
}

// ── Scenarios ──────────────────────────────────────────────────────────

/// Scenario 1: pure rename through `one_to_one` -- two direct assigns,
/// nothing unmapped.
#[test]
fn pure_rename() {
    let mut graph = TypeGraph::new();
    let int = graph.basic("int");
    let string = graph.basic("string");
    graph.insert(TypeInfo::strukt(
        TypeId::new("src", "User"),
        vec![
            FieldInfo::new("ID", int.clone()),
            FieldInfo::new("FullName", string.clone()),
        ],
    ));
    graph.insert(TypeInfo::strukt(
        TypeId::new("dst", "User"),
        vec![FieldInfo::new("ID", int), FieldInfo::new("Name", string)],
    ));
    let mut doc = MappingDocument::new();
    let mut mapping = TypeMapping::new("src.User", "dst.User");
    mapping.one_to_one.insert("ID".into(), "ID".into());
    mapping.one_to_one.insert("FullName".into(), "Name".into());
    doc.mappings.push(mapping);

    let plan = resolve_plan(&mut graph, &doc);
    assert!(plan.is_valid());
    let pair = root_pair(&plan);
    assert_eq!(pair.fields.len(), 2);
    for mapping in &pair.fields {
        assert_eq!(mapping.origin, Origin::OneToOne);
        assert_eq!(mapping.strategy, Strategy::DirectAssign);
        assert_eq!(mapping.confidence, 1.0);
    }
    assert!(pair.unmapped.is_empty());
}

/// Scenario 2: widening conversion through an explicit named transform.
#[test]
fn widening_conversion_with_transform() {
    let mut graph = TypeGraph::new();
    let i64_ = graph.basic("int64");
    let uint = graph.basic("uint");
    graph.insert(TypeInfo::strukt(
        TypeId::new("src", "Account"),
        vec![FieldInfo::new("ID", i64_)],
    ));
    graph.insert(TypeInfo::strukt(
        TypeId::new("dst", "Account"),
        vec![FieldInfo::new("UserID", uint)],
    ));
    let mut doc = MappingDocument::new();
    let mut mapping = TypeMapping::new("src.Account", "dst.Account");
    let mut rule = FieldRule::simple("ID", "UserID");
    rule.transform = Some("Int64ToUint".into());
    mapping.fields.push(rule);
    doc.mappings.push(mapping);
    doc.transforms.push(TransformDecl::named("Int64ToUint"));

    let plan = resolve_plan(&mut graph, &doc);
    assert!(plan.is_valid());
    let pair = root_pair(&plan);
    let mapping = field(pair, "UserID");
    assert_eq!(mapping.strategy, Strategy::Transform);
    assert_eq!(mapping.transform.as_deref(), Some("Int64ToUint"));
    assert!(pair.unmapped.is_empty());
    assert!(plan.incomplete_mappings().is_empty());
}

/// Scenario 3: a pointer leaf at the end of a deep path selects
/// `pointer_deref`, not `transform` -- the walk crossed `*APILineItem`
/// transparently but the terminal `*int` kept its shape.
#[test]
fn pointer_deref_at_deep_leaf() {
    let mut graph = TypeGraph::new();
    let int = graph.basic("int");
    let price = graph.pointer_to(&int);
    let line_item = graph.insert(TypeInfo::strukt(
        TypeId::new("api", "APILineItem"),
        vec![FieldInfo::new("Price", price)],
    ));
    let line_item_ptr = graph.pointer_to(&line_item);
    graph.insert(TypeInfo::strukt(
        TypeId::new("api", "APIOrder"),
        vec![FieldInfo::new("LineItem", line_item_ptr)],
    ));
    graph.insert(TypeInfo::strukt(
        TypeId::new("domain", "DomainOrder"),
        vec![FieldInfo::new("LineItemPrice", int)],
    ));
    let mut doc = MappingDocument::new();
    let mut mapping = TypeMapping::new("api.APIOrder", "domain.DomainOrder");
    mapping
        .fields
        .push(FieldRule::simple("LineItem.Price", "LineItemPrice"));
    doc.mappings.push(mapping);

    let plan = resolve_plan(&mut graph, &doc);
    let mapping = field(root_pair(&plan), "LineItemPrice");
    assert_eq!(mapping.strategy, Strategy::PointerDeref);
    assert_eq!(mapping.explanation, "requires pointer dereference");
}

/// Scenario 4: algorithmic auto-match of slice fields emits `slice_map`
/// and a recursively resolved nested pair.
#[test]
fn auto_match_slices_with_nested_pair() {
    let mut graph = TypeGraph::new();
    let int = graph.basic("int");
    let string = graph.basic("string");
    let source_item = graph.insert(TypeInfo::strukt(
        TypeId::new("store", "SourceItem"),
        vec![
            FieldInfo::new("SKU", string.clone()),
            FieldInfo::new("Qty", int.clone()),
        ],
    ));
    let target_item = graph.insert(TypeInfo::strukt(
        TypeId::new("bill", "TargetItem"),
        vec![FieldInfo::new("SKU", string), FieldInfo::new("Qty", int)],
    ));
    let source_items = graph.slice_of(&source_item);
    let target_items = graph.slice_of(&target_item);
    graph.insert(TypeInfo::strukt(
        TypeId::new("store", "Order"),
        vec![FieldInfo::new("Items", source_items)],
    ));
    graph.insert(TypeInfo::strukt(
        TypeId::new("bill", "Invoice"),
        vec![FieldInfo::new("Items", target_items)],
    ));
    let mut doc = MappingDocument::new();
    doc.mappings.push(TypeMapping::new("store.Order", "bill.Invoice"));

    let plan = resolve_plan(&mut graph, &doc);
    assert!(plan.is_valid());
    let pair = root_pair(&plan);
    let items = field(pair, "Items");
    assert_eq!(items.origin, Origin::AutoMatch);
    assert_eq!(items.strategy, Strategy::SliceMap);
    assert_eq!(pair.nested.len(), 1);
    let nested = &pair.nested[0];
    assert_eq!(nested.key(), "store.SourceItem->bill.TargetItem");
    assert_eq!(nested.referenced_by, vec!["Items".to_string()]);

    let inner = plan.pair(nested.resolved.expect("nested pair resolved"));
    assert_eq!(inner.fields.len(), 2);
    for mapping in &inner.fields {
        assert_eq!(mapping.strategy, Strategy::DirectAssign);
        assert_eq!(mapping.origin, Origin::AutoMatch);
    }
}

/// Scenario 5: two equally plausible sources reject the auto-match and
/// record an ambiguous unmapped target with both candidates.
#[test]
fn ambiguity_rejects_auto_match() {
    let mut graph = TypeGraph::new();
    let string = graph.basic("string");
    graph.insert(TypeInfo::strukt(
        TypeId::new("src", "Addr"),
        vec![
            FieldInfo::new("CityA", string.clone()),
            FieldInfo::new("CityB", string.clone()),
        ],
    ));
    graph.insert(TypeInfo::strukt(
        TypeId::new("dst", "Addr"),
        vec![FieldInfo::new("City", string)],
    ));
    let mut doc = MappingDocument::new();
    doc.mappings.push(TypeMapping::new("src.Addr", "dst.Addr"));

    let plan = resolve_plan(&mut graph, &doc);
    assert!(plan.is_valid(), "unmapped targets are never errors");
    let pair = root_pair(&plan);
    assert!(pair.fields.is_empty());
    assert_eq!(pair.unmapped.len(), 1);
    let unmapped = &pair.unmapped[0];
    assert_eq!(unmapped.path, "City");
    assert_eq!(unmapped.reason, UnmappedReason::Ambiguous);
    assert_eq!(unmapped.candidates.len(), 2);
    assert_eq!(unmapped.candidates[0].name, "CityA");
    assert_eq!(unmapped.candidates[1].name, "CityB");
    assert!(plan
        .diagnostics
        .infos()
        .any(|d| d.code == DiagnosticCode::UnmappedField));
}

/// Scenario 6: mutually referencing `def.target` annotations produce one
/// `extra_dependency_cycle` error per mapping.
#[test]
fn dependency_cycle_is_reported_twice() {
    let mut graph = TypeGraph::new();
    let int = graph.basic("int");
    graph.insert(TypeInfo::strukt(
        TypeId::new("src", "Calc"),
        vec![
            FieldInfo::new("A", int.clone()),
            FieldInfo::new("B", int.clone()),
        ],
    ));
    graph.insert(TypeInfo::strukt(
        TypeId::new("dst", "Calc"),
        vec![FieldInfo::new("X", int.clone()), FieldInfo::new("Y", int)],
    ));
    let mut doc = MappingDocument::new();
    let mut mapping = TypeMapping::new("src.Calc", "dst.Calc");
    let mut first = FieldRule::simple("A", "X");
    first.extra.insert("def.target".into(), "Y".into());
    let mut second = FieldRule::simple("B", "Y");
    second.extra.insert("def.target".into(), "X".into());
    mapping.fields.push(first);
    mapping.fields.push(second);
    doc.mappings.push(mapping);

    let plan = resolve_plan(&mut graph, &doc);
    assert!(!plan.is_valid());
    let cycles: Vec<_> = plan
        .diagnostics
        .errors()
        .filter(|d| d.code == DiagnosticCode::ExtraDependencyCycle)
        .collect();
    assert_eq!(cycles.len(), 2);
    let pair = root_pair(&plan);
    assert!(field(pair, "X").depends_on.is_empty());
    assert!(field(pair, "Y").depends_on.is_empty());
}

/// The plan serializes with the stable strategy, tier, and code
/// identifiers downstream emitters key on.
#[test]
fn plan_serializes_stable_identifiers() {
    let mut graph = TypeGraph::new();
    let int = graph.basic("int");
    graph.insert(TypeInfo::strukt(
        TypeId::new("src", "User"),
        vec![FieldInfo::new("ID", int.clone())],
    ));
    graph.insert(TypeInfo::strukt(
        TypeId::new("dst", "User"),
        vec![FieldInfo::new("ID", int)],
    ));
    let mut doc = MappingDocument::new();
    let mut mapping = TypeMapping::new("src.User", "dst.User");
    mapping.one_to_one.insert("ID".into(), "ID".into());
    doc.mappings.push(mapping);

    let plan = resolve_plan(&mut graph, &doc);
    let encoded = serde_json::to_string(&plan).unwrap();
    assert!(encoded.contains("\"direct_assign\""));
    assert!(encoded.contains("\"yaml:121\""));
    assert!(encoded.contains("\"1:1\""));
}

/// A valid `def.target` edge lands in `depends_on`, sorted.
#[test]
fn dependency_edge_is_recorded() {
    let mut graph = TypeGraph::new();
    let int = graph.basic("int");
    graph.insert(TypeInfo::strukt(
        TypeId::new("src", "Calc"),
        vec![
            FieldInfo::new("A", int.clone()),
            FieldInfo::new("B", int.clone()),
        ],
    ));
    graph.insert(TypeInfo::strukt(
        TypeId::new("dst", "Calc"),
        vec![FieldInfo::new("X", int.clone()), FieldInfo::new("Y", int)],
    ));
    let mut doc = MappingDocument::new();
    let mut mapping = TypeMapping::new("src.Calc", "dst.Calc");
    let mut first = FieldRule::simple("A", "X");
    first.extra.insert("def.target".into(), "Y".into());
    mapping.fields.push(first);
    mapping.fields.push(FieldRule::simple("B", "Y"));
    doc.mappings.push(mapping);

    let plan = resolve_plan(&mut graph, &doc);
    assert!(plan.is_valid());
    assert_eq!(field(root_pair(&plan), "X").depends_on, vec!["Y".to_string()]);
}
