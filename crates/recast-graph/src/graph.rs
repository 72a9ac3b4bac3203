//! The type graph: an insertion-ordered catalog of [`TypeInfo`] nodes.
//!
//! Built once per invocation by a graph provider (or by hand in tests),
//! queried by every later stage. The only post-construction mutation is the
//! virtual-type synthesizer inserting its stubs before resolution starts;
//! after that the graph is read-only.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::types::{TypeId, TypeInfo, TypeKind};

/// The catalog of all known types, keyed by [`TypeId`].
///
/// Types are stored in insertion order; id-based lookup goes through an
/// internal hash index. Anonymous compound types (pointers, slices, arrays,
/// maps) are interned on demand under structural ids (`*store.Order`,
/// `[]store.Item`, ...), so a compound type mentioned twice is one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<TypeInfo>", into = "Vec<TypeInfo>")]
pub struct TypeGraph {
    types: Vec<TypeInfo>,
    index: FxHashMap<TypeId, usize>,
}

impl TypeGraph {
    /// Create a graph pre-seeded with the `any` sentinel.
    pub fn new() -> Self {
        let mut graph = TypeGraph { types: Vec::new(), index: FxHashMap::default() };
        graph.insert(TypeInfo::external(Self::any_id()));
        graph
    }

    /// The id of the `any` sentinel: the external catch-all used for
    /// requires entries and virtual fields whose type is not yet known.
    pub fn any_id() -> TypeId {
        TypeId::anon("any")
    }

    /// Insert a type, replacing any previous node with the same id.
    pub fn insert(&mut self, info: TypeInfo) -> TypeId {
        let id = info.id.clone();
        match self.index.get(&id) {
            Some(&slot) => self.types[slot] = info,
            None => {
                self.index.insert(id.clone(), self.types.len());
                self.types.push(info);
            }
        }
        id
    }

    /// Look up a type by id.
    pub fn get(&self, id: &TypeId) -> Option<&TypeInfo> {
        self.index.get(id).map(|&slot| &self.types[slot])
    }

    pub fn contains(&self, id: &TypeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate all types in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter()
    }

    /// All ids, sorted. Use this wherever graph contents feed user-visible
    /// output.
    pub fn sorted_ids(&self) -> Vec<&TypeId> {
        let mut ids: Vec<&TypeId> = self.types.iter().map(|t| &t.id).collect();
        ids.sort();
        ids
    }

    // ── Compound-type interning ─────────────────────────────────────────

    /// Intern a pointer to `element`, returning its id.
    pub fn pointer_to(&mut self, element: &TypeId) -> TypeId {
        let id = TypeId::anon(format!("*{}", element));
        if !self.contains(&id) {
            self.insert(TypeInfo::pointer(id.clone(), element.clone()));
        }
        id
    }

    /// Intern a slice of `element`, returning its id.
    pub fn slice_of(&mut self, element: &TypeId) -> TypeId {
        let id = TypeId::anon(format!("[]{}", element));
        if !self.contains(&id) {
            self.insert(TypeInfo::slice(id.clone(), element.clone()));
        }
        id
    }

    /// Intern a fixed-length array of `element`, returning its id.
    pub fn array_of(&mut self, len: u64, element: &TypeId) -> TypeId {
        let id = TypeId::anon(format!("[{}]{}", len, element));
        if !self.contains(&id) {
            self.insert(TypeInfo::array(id.clone(), len, element.clone()));
        }
        id
    }

    /// Intern a map from `key` to `value`, returning its id.
    pub fn map_of(&mut self, key: &TypeId, value: &TypeId) -> TypeId {
        let id = TypeId::anon(format!("map[{}]{}", key, value));
        if !self.contains(&id) {
            self.insert(TypeInfo::map(id.clone(), key.clone(), value.clone()));
        }
        id
    }

    /// Intern a builtin scalar by name, returning its id.
    pub fn basic(&mut self, name: &str) -> TypeId {
        let id = TypeId::anon(name);
        if !self.contains(&id) {
            self.insert(TypeInfo::basic(name));
        }
        id
    }

    // ── Structural queries ──────────────────────────────────────────────

    /// Follow alias indirection to the first non-alias node.
    ///
    /// Returns the node itself for non-aliases; `None` if an alias points at
    /// a type missing from the graph.
    pub fn resolve_alias<'a>(&'a self, info: &'a TypeInfo) -> Option<&'a TypeInfo> {
        let mut current = info;
        let mut hops = 0;
        while current.kind == TypeKind::Alias {
            let under = current.underlying.as_ref()?;
            current = self.get(under)?;
            hops += 1;
            if hops > 32 {
                return None; // malformed alias cycle from the loader
            }
        }
        Some(current)
    }

    /// Whether the node (or, for aliases, its resolution) is a struct.
    pub fn is_struct_like(&self, id: &TypeId) -> bool {
        self.get(id)
            .and_then(|info| self.resolve_alias(info))
            .is_some_and(|info| info.kind == TypeKind::Struct)
    }

    /// Whether the type was synthesized by the resolver.
    pub fn is_synthesized(&self, id: &TypeId) -> bool {
        self.get(id).is_some_and(|info| info.synthesized)
    }
}

impl Default for TypeGraph {
    fn default() -> Self {
        TypeGraph::new()
    }
}

// Serde representation: a flat list of nodes. Insertion order is the list
// order, which keeps the provider format stable under round-trips.
impl From<Vec<TypeInfo>> for TypeGraph {
    fn from(types: Vec<TypeInfo>) -> Self {
        let mut graph = TypeGraph::new();
        for info in types {
            graph.insert(info);
        }
        graph
    }
}

impl From<TypeGraph> for Vec<TypeInfo> {
    fn from(graph: TypeGraph) -> Self {
        graph.types
    }
}
