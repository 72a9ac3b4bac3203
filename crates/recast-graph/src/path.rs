//! Dotted field paths and their resolution against the type graph.
//!
//! A path like `Customer.Items[].SKU` descends struct fields, steps into
//! slice/array elements on `[]`, and transparently crosses pointers only
//! when a further segment follows. The terminal type keeps its own pointer
//! shape; that preserved shape is what lets the strategy selector pick
//! `pointer_deref` at a leaf.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::graph::TypeGraph;
use crate::types::{TypeId, TypeInfo, TypeKind};

/// One step of a field path: a field name, optionally followed by `[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: String,
    /// Whether the segment descends into the slice/array element (`Items[]`).
    pub indexed: bool,
}

/// An ordered sequence of [`PathSegment`]s, parsed from `A.B[].C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub segments: Vec<PathSegment>,
}

/// Failure to parse or resolve a field path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    /// The path string was empty.
    Empty,
    /// A segment between dots was empty (`A..B`) or malformed (`A[B]`).
    BadSegment { path: String, segment: String },
    /// The root type id is not in the graph.
    UnknownType { id: TypeId },
    /// A segment was applied to a type that is not a struct and cannot be
    /// peeled into one.
    NotAStruct { id: TypeId, segment: String },
    /// A segment names a field absent on the current struct.
    UnknownField { id: TypeId, field: String },
    /// `[]` was applied to a type that is not a slice or array.
    NotIndexable { id: TypeId, segment: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "empty field path"),
            PathError::BadSegment { path, segment } => {
                write!(f, "malformed segment `{}` in path `{}`", segment, path)
            }
            PathError::UnknownType { id } => write!(f, "type `{}` not found in graph", id),
            PathError::NotAStruct { id, segment } => {
                write!(f, "cannot select `{}`: `{}` is not a struct", segment, id)
            }
            PathError::UnknownField { id, field } => {
                write!(f, "type `{}` has no field `{}`", id, field)
            }
            PathError::NotIndexable { id, segment } => {
                write!(f, "cannot index `{}`: `{}` is not a slice or array", segment, id)
            }
        }
    }
}

impl std::error::Error for PathError {}

impl FieldPath {
    /// Parse a path from its string form.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for raw in s.split('.') {
            let (name, indexed) = match raw.strip_suffix("[]") {
                Some(name) => (name, true),
                None => (raw, false),
            };
            if name.is_empty() || name.contains(['[', ']']) {
                return Err(PathError::BadSegment {
                    path: s.to_string(),
                    segment: raw.to_string(),
                });
            }
            segments.push(PathSegment { name: name.to_string(), indexed });
        }
        Ok(FieldPath { segments })
    }

    /// Build a single-segment path from a plain field name.
    pub fn field(name: impl Into<String>) -> Self {
        FieldPath {
            segments: vec![PathSegment { name: name.into(), indexed: false }],
        }
    }

    /// The first segment's field name.
    pub fn leading(&self) -> &str {
        &self.segments[0].name
    }

    /// Whether the path is a single plain field name.
    pub fn is_plain_field(&self) -> bool {
        self.segments.len() == 1 && !self.segments[0].indexed
    }

    /// Walk the path from `root` and return the terminal type id.
    ///
    /// Non-terminal pointers and aliases are peeled transparently so struct
    /// lookups succeed; the terminal type is returned as declared, pointer
    /// shape intact.
    pub fn resolve(&self, graph: &TypeGraph, root: &TypeId) -> Result<TypeId, PathError> {
        let mut current = root.clone();
        for segment in &self.segments {
            let owner = peel_for_lookup(graph, &current)?;
            if owner.kind != TypeKind::Struct {
                return Err(PathError::NotAStruct {
                    id: owner.id.clone(),
                    segment: segment.name.clone(),
                });
            }
            let field = owner.field(&segment.name).ok_or_else(|| PathError::UnknownField {
                id: owner.id.clone(),
                field: segment.name.clone(),
            })?;
            current = field.ty.clone();
            if segment.indexed {
                current = descend_element(graph, &current, &segment.name)?;
            }
        }
        Ok(current)
    }
}

/// Peel pointers and aliases until a field lookup is possible.
fn peel_for_lookup<'a>(graph: &'a TypeGraph, id: &TypeId) -> Result<&'a TypeInfo, PathError> {
    let mut current = graph.get(id).ok_or_else(|| PathError::UnknownType { id: id.clone() })?;
    loop {
        match current.kind {
            TypeKind::Pointer => {
                let element = current.element.as_ref().ok_or_else(|| PathError::UnknownType {
                    id: current.id.clone(),
                })?;
                current = graph
                    .get(element)
                    .ok_or_else(|| PathError::UnknownType { id: element.clone() })?;
            }
            TypeKind::Alias => {
                let under = current.underlying.as_ref().ok_or_else(|| PathError::UnknownType {
                    id: current.id.clone(),
                })?;
                current = graph
                    .get(under)
                    .ok_or_else(|| PathError::UnknownType { id: under.clone() })?;
            }
            _ => return Ok(current),
        }
    }
}

/// Step into the element of a slice or array (peeling pointers/aliases on
/// the way; an explicit `[]` is a request to cross them).
fn descend_element(graph: &TypeGraph, id: &TypeId, segment: &str) -> Result<TypeId, PathError> {
    let mut current = graph.get(id).ok_or_else(|| PathError::UnknownType { id: id.clone() })?;
    loop {
        match current.kind {
            TypeKind::Slice | TypeKind::Array => {
                let element = current.element.as_ref().ok_or_else(|| PathError::UnknownType {
                    id: current.id.clone(),
                })?;
                return Ok(element.clone());
            }
            TypeKind::Pointer => {
                let element = current.element.as_ref().ok_or_else(|| PathError::UnknownType {
                    id: current.id.clone(),
                })?;
                current = graph
                    .get(element)
                    .ok_or_else(|| PathError::UnknownType { id: element.clone() })?;
            }
            TypeKind::Alias => {
                let under = current.underlying.as_ref().ok_or_else(|| PathError::UnknownType {
                    id: current.id.clone(),
                })?;
                current = graph
                    .get(under)
                    .ok_or_else(|| PathError::UnknownType { id: under.clone() })?;
            }
            _ => {
                return Err(PathError::NotIndexable {
                    id: current.id.clone(),
                    segment: segment.to_string(),
                })
            }
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment.name)?;
            if segment.indexed {
                write!(f, "[]")?;
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

// Paths serialize as their string form so documents and plans stay readable.
impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FieldPath::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldInfo;

    fn sample_graph() -> (TypeGraph, TypeId) {
        let mut graph = TypeGraph::new();
        let int = graph.basic("int");
        let string = graph.basic("string");
        let price_ptr = graph.pointer_to(&int);
        let line_item = graph.insert(TypeInfo::strukt(
            TypeId::new("api", "APILineItem"),
            vec![
                FieldInfo::new("Price", price_ptr),
                FieldInfo::new("SKU", string),
            ],
        ));
        let line_item_ptr = graph.pointer_to(&line_item);
        let items = graph.slice_of(&line_item);
        let order = graph.insert(TypeInfo::strukt(
            TypeId::new("api", "APIOrder"),
            vec![
                FieldInfo::new("LineItem", line_item_ptr),
                FieldInfo::new("Items", items),
            ],
        ));
        (graph, order)
    }

    #[test]
    fn parse_round_trips_through_display() {
        let path = FieldPath::parse("Customer.Items[].SKU").unwrap();
        assert_eq!(path.segments.len(), 3);
        assert!(path.segments[1].indexed);
        assert_eq!(path.to_string(), "Customer.Items[].SKU");
    }

    #[test]
    fn parse_rejects_empty_and_malformed() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
        assert!(matches!(FieldPath::parse("A..B"), Err(PathError::BadSegment { .. })));
        assert!(matches!(FieldPath::parse("A[0]"), Err(PathError::BadSegment { .. })));
    }

    /// Leaf preservation: the walk crosses the `*APILineItem` pointer because
    /// a further segment follows, but the terminal `*int` keeps its shape.
    #[test]
    fn leaf_pointer_shape_is_preserved() {
        let (graph, order) = sample_graph();
        let path = FieldPath::parse("LineItem.Price").unwrap();
        let terminal = path.resolve(&graph, &order).unwrap();
        assert_eq!(terminal.to_string(), "*int");
    }

    #[test]
    fn indexed_segment_descends_into_element() {
        let (graph, order) = sample_graph();
        let path = FieldPath::parse("Items[].SKU").unwrap();
        let terminal = path.resolve(&graph, &order).unwrap();
        assert_eq!(terminal.to_string(), "string");
    }

    #[test]
    fn terminal_slice_without_index_is_returned_whole() {
        let (graph, order) = sample_graph();
        let path = FieldPath::parse("Items").unwrap();
        let terminal = path.resolve(&graph, &order).unwrap();
        assert_eq!(terminal.to_string(), "[]api.APILineItem");
    }

    #[test]
    fn unknown_field_is_reported_with_owner() {
        let (graph, order) = sample_graph();
        let path = FieldPath::parse("Missing").unwrap();
        let err = path.resolve(&graph, &order).unwrap_err();
        assert!(matches!(err, PathError::UnknownField { ref field, .. } if field == "Missing"));
    }

    #[test]
    fn indexing_a_scalar_fails() {
        let (graph, order) = sample_graph();
        let path = FieldPath::parse("LineItem.Price[]").unwrap();
        let err = path.resolve(&graph, &order).unwrap_err();
        assert!(matches!(err, PathError::NotIndexable { .. }));
    }
}
