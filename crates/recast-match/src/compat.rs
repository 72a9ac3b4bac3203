//! Type-compatibility classification.
//!
//! Given two types from the graph, produce one of five ordered verdicts plus
//! a short reason. The classifier only labels; it never converts anything.
//! The strategy selector maps verdicts to strategies, and the candidate
//! ranker turns them into a numeric type score.

use std::fmt;

use serde::{Deserialize, Serialize};

use recast_graph::{TypeGraph, TypeId, TypeInfo, TypeKind};

/// Classification verdict, ordered from strongest to weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compat {
    Identical,
    Assignable,
    Convertible,
    NeedsTransform,
    Incompatible,
}

impl Compat {
    /// Stable identifier, as exposed in plans and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compat::Identical => "identical",
            Compat::Assignable => "assignable",
            Compat::Convertible => "convertible",
            Compat::NeedsTransform => "needs-transform",
            Compat::Incompatible => "incompatible",
        }
    }

    /// Whether this verdict is at least as strong as `other`.
    /// (`Identical` is the strongest tier.)
    pub fn at_least(&self, other: Compat) -> bool {
        *self <= other
    }

    /// The ranker's type-score table.
    pub fn type_score(&self) -> f64 {
        match self {
            Compat::Identical => 1.0,
            Compat::Assignable => 0.9,
            Compat::Convertible => 0.7,
            Compat::NeedsTransform => 0.4,
            Compat::Incompatible => 0.0,
        }
    }
}

impl fmt::Display for Compat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A verdict with its one-line justification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub compat: Compat,
    pub reason: String,
}

impl Verdict {
    fn new(compat: Compat, reason: impl Into<String>) -> Self {
        Verdict { compat, reason: reason.into() }
    }
}

// Recursion guard for degenerate self-referential compounds (`type S []S`).
const MAX_CLASSIFY_DEPTH: u32 = 16;

/// Classify how a `source` value relates to a `target` slot.
///
/// Evaluation order matches the verdict order: identity, assignability,
/// primitive convertibility, then the structural opportunities that only
/// need a transform (pointer deref/wrap, element-wise slices, struct pairs).
/// Types missing from the graph classify as incompatible.
pub fn classify(graph: &TypeGraph, source: &TypeId, target: &TypeId) -> Verdict {
    classify_at(graph, source, target, 0)
}

fn classify_at(graph: &TypeGraph, source: &TypeId, target: &TypeId, depth: u32) -> Verdict {
    if depth > MAX_CLASSIFY_DEPTH {
        return Verdict::new(Compat::Incompatible, "type nesting too deep to classify");
    }
    if source == target {
        return Verdict::new(Compat::Identical, "types are identical");
    }
    let (Some(src), Some(tgt)) = (graph.get(source), graph.get(target)) else {
        return Verdict::new(Compat::Incompatible, "type not present in graph");
    };

    // Assignability: the `any` sentinel, or an alias and the type it names.
    if *target == TypeGraph::any_id() {
        return Verdict::new(Compat::Assignable, "any accepts every type");
    }
    let src_res = graph.resolve_alias(src);
    let tgt_res = graph.resolve_alias(tgt);
    if let Some(src_res) = src_res {
        if src_res.id == *target {
            return Verdict::new(Compat::Assignable, "source is a named form of the target");
        }
    }
    if let Some(tgt_res) = tgt_res {
        if tgt_res.id == *source {
            return Verdict::new(Compat::Assignable, "target is a named form of the source");
        }
    }

    // Primitive convertibility on the alias-resolved forms.
    if let (Some(src_res), Some(tgt_res)) = (src_res, tgt_res) {
        if let Some(reason) = basic_conversion(src_res, tgt_res) {
            return Verdict::new(Compat::Convertible, reason);
        }

        // Structural opportunities that need a transform.
        if src_res.kind == TypeKind::Pointer {
            if let Some(pointee) = &src_res.element {
                let inner = classify_at(graph, pointee, target, depth + 1);
                if inner.compat.at_least(Compat::Convertible) {
                    return Verdict::new(Compat::NeedsTransform, "requires pointer dereference");
                }
            }
        }
        if tgt_res.kind == TypeKind::Pointer {
            if let Some(pointee) = &tgt_res.element {
                let inner = classify_at(graph, source, pointee, depth + 1);
                if inner.compat.at_least(Compat::Convertible) {
                    return Verdict::new(Compat::NeedsTransform, "requires taking address");
                }
            }
        }
        if src_res.kind == TypeKind::Pointer && tgt_res.kind == TypeKind::Pointer {
            if let (Some(sp), Some(tp)) = (&src_res.element, &tgt_res.element) {
                let inner = classify_at(graph, sp, tp, depth + 1);
                if inner.compat.at_least(Compat::NeedsTransform) {
                    return Verdict::new(Compat::NeedsTransform, "pointees need conversion");
                }
            }
        }
        if collection_pair(src_res.kind, tgt_res.kind) {
            if let (Some(se), Some(te)) = (&src_res.element, &tgt_res.element) {
                let inner = classify_at(graph, se, te, depth + 1);
                if inner.compat.at_least(Compat::NeedsTransform) {
                    return Verdict::new(
                        Compat::NeedsTransform,
                        "elements need per-element conversion",
                    );
                }
            }
        }
        if src_res.kind == TypeKind::Struct && tgt_res.kind == TypeKind::Struct {
            return Verdict::new(
                Compat::NeedsTransform,
                "distinct struct types need a nested cast",
            );
        }
    }

    Verdict::new(Compat::Incompatible, "no conversion path between the types")
}

/// Slice/slice, array/array, and map/map pairs refine element-wise.
fn collection_pair(a: TypeKind, b: TypeKind) -> bool {
    matches!(
        (a, b),
        (TypeKind::Slice, TypeKind::Slice)
            | (TypeKind::Array, TypeKind::Array)
            | (TypeKind::Map, TypeKind::Map)
    )
}

/// Scalar class used by the convertibility table.
#[derive(PartialEq, Clone, Copy)]
enum BasicClass {
    Integer,
    Float,
    Text,
    Bool,
    Other,
}

fn basic_class(name: &str) -> BasicClass {
    match name {
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
        | "uint32" | "uint64" | "uintptr" | "byte" | "rune" => BasicClass::Integer,
        "float32" | "float64" => BasicClass::Float,
        "string" => BasicClass::Text,
        "bool" => BasicClass::Bool,
        _ => BasicClass::Other,
    }
}

/// Language-native value conversions between resolved basic types, plus the
/// string/byte-slice special cases. Returns the reason on success.
fn basic_conversion(src: &TypeInfo, tgt: &TypeInfo) -> Option<&'static str> {
    if src.kind == TypeKind::Basic && tgt.kind == TypeKind::Basic {
        if src.id == tgt.id {
            // Distinct aliases over the same basic reach here.
            return Some("underlying types are identical");
        }
        return match (basic_class(&src.id.name), basic_class(&tgt.id.name)) {
            (BasicClass::Integer, BasicClass::Integer) => Some("integer conversion"),
            (BasicClass::Float, BasicClass::Float) => Some("float conversion"),
            (BasicClass::Integer, BasicClass::Float)
            | (BasicClass::Float, BasicClass::Integer) => Some("numeric conversion"),
            (BasicClass::Integer, BasicClass::Text)
            | (BasicClass::Text, BasicClass::Integer) => Some("rune/byte string conversion"),
            _ => None,
        };
    }
    // string <-> []byte / []rune
    if let Some(reason) = text_bytes_conversion(src, tgt) {
        return Some(reason);
    }
    text_bytes_conversion(tgt, src)
}

fn text_bytes_conversion(text: &TypeInfo, bytes: &TypeInfo) -> Option<&'static str> {
    if text.kind != TypeKind::Basic || text.id.name != "string" {
        return None;
    }
    if bytes.kind != TypeKind::Slice {
        return None;
    }
    let element = bytes.element.as_ref()?;
    if element.is_anon() && (element.name == "byte" || element.name == "rune") {
        Some("string/byte-slice conversion")
    } else {
        None
    }
}
