//! Type representation for the recast type graph.
//!
//! Defines [`TypeId`], the closed [`TypeKind`] enumeration, [`TypeInfo`]
//! nodes, and [`FieldInfo`] struct members. These are the vocabulary shared
//! by every later stage: the matcher scores them, the resolver walks them,
//! and the plan references them by id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a named type: a package path plus a type name.
///
/// The package path is empty for anonymous types (pointers, slices, maps,
/// arrays, and the `any` sentinel). Equality and hashing are structural, so
/// two ids built independently from the same strings are the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId {
    /// Package path, e.g. `"store"` or `"api/v2"`. Empty for anonymous types.
    pub package: String,
    /// Type name within the package, e.g. `"Order"`.
    pub name: String,
}

impl TypeId {
    /// Create an id from a package path and a name.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeId { package: package.into(), name: name.into() }
    }

    /// Create an anonymous id (empty package).
    pub fn anon(name: impl Into<String>) -> Self {
        TypeId { package: String::new(), name: name.into() }
    }

    /// Parse a `pkg.Name` string; a bare `Name` yields an empty package.
    ///
    /// The split happens at the last `.`, so nested package paths like
    /// `api.v2.Order` put `api.v2` in the package.
    pub fn parse(s: &str) -> Self {
        match s.rsplit_once('.') {
            Some((package, name)) => TypeId::new(package, name),
            None => TypeId::anon(s),
        }
    }

    /// Whether this id has no package component.
    pub fn is_anon(&self) -> bool {
        self.package.is_empty()
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

/// The closed set of type kinds the graph distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// A builtin scalar: `int`, `string`, `float64`, ...
    Basic,
    /// A named struct with ordered fields.
    Struct,
    /// A pointer to `element`.
    Pointer,
    /// A slice of `element`.
    Slice,
    /// A fixed-length array of `element`.
    Array,
    /// A map from `key` to `element`.
    Map,
    /// A named alias over `underlying`.
    Alias,
    /// A type from outside the analyzed packages (interfaces, `any`, vendor
    /// types). The graph knows its name but not its shape.
    External,
    /// The loader could not classify the type.
    Unknown,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::Basic => "basic",
            TypeKind::Struct => "struct",
            TypeKind::Pointer => "pointer",
            TypeKind::Slice => "slice",
            TypeKind::Array => "array",
            TypeKind::Map => "map",
            TypeKind::Alias => "alias",
            TypeKind::External => "external",
            TypeKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A single node in the type graph.
///
/// Created once by the loader (or by the virtual-type synthesizer) and never
/// mutated afterwards. Compound types reference other nodes by [`TypeId`]
/// rather than by containment, which is what makes self-referential types
/// (`Node { Child: *Node }`) representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub id: TypeId,
    pub kind: TypeKind,
    /// For `Alias` (and named-over-basic types): the type this one wraps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying: Option<TypeId>,
    /// For `Pointer`/`Slice`/`Array`: the element; for `Map`: the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<TypeId>,
    /// For `Map`: the key type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<TypeId>,
    /// For `Array`: the declared length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_len: Option<u64>,
    /// For `Struct`: the fields in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldInfo>,
    /// True for types created by the resolver from mapping metadata rather
    /// than discovered by the loader.
    #[serde(default)]
    pub synthesized: bool,
}

impl TypeInfo {
    fn bare(id: TypeId, kind: TypeKind) -> Self {
        TypeInfo {
            id,
            kind,
            underlying: None,
            element: None,
            key: None,
            array_len: None,
            fields: Vec::new(),
            synthesized: false,
        }
    }

    /// Create a builtin scalar type (`int`, `string`, ...).
    pub fn basic(name: impl Into<String>) -> Self {
        TypeInfo::bare(TypeId::anon(name), TypeKind::Basic)
    }

    /// Create a named struct. Field declaration indexes are assigned here,
    /// in the order given.
    pub fn strukt(id: TypeId, mut fields: Vec<FieldInfo>) -> Self {
        for (i, field) in fields.iter_mut().enumerate() {
            field.index = i;
        }
        TypeInfo { fields, ..TypeInfo::bare(id, TypeKind::Struct) }
    }

    /// Create a named alias over another type.
    pub fn alias(id: TypeId, underlying: TypeId) -> Self {
        TypeInfo { underlying: Some(underlying), ..TypeInfo::bare(id, TypeKind::Alias) }
    }

    /// Create a pointer to `element`.
    pub fn pointer(id: TypeId, element: TypeId) -> Self {
        TypeInfo { element: Some(element), ..TypeInfo::bare(id, TypeKind::Pointer) }
    }

    /// Create a slice of `element`.
    pub fn slice(id: TypeId, element: TypeId) -> Self {
        TypeInfo { element: Some(element), ..TypeInfo::bare(id, TypeKind::Slice) }
    }

    /// Create a fixed-length array of `element`.
    pub fn array(id: TypeId, len: u64, element: TypeId) -> Self {
        TypeInfo {
            element: Some(element),
            array_len: Some(len),
            ..TypeInfo::bare(id, TypeKind::Array)
        }
    }

    /// Create a map from `key` to `value`.
    pub fn map(id: TypeId, key: TypeId, value: TypeId) -> Self {
        TypeInfo {
            key: Some(key),
            element: Some(value),
            ..TypeInfo::bare(id, TypeKind::Map)
        }
    }

    /// Create an external (opaque) type.
    pub fn external(id: TypeId) -> Self {
        TypeInfo::bare(id, TypeKind::External)
    }

    /// Create a type of unknown kind.
    pub fn unknown(id: TypeId) -> Self {
        TypeInfo::bare(id, TypeKind::Unknown)
    }

    /// Mark this type as synthesized by the resolver.
    pub fn synthesized(mut self) -> Self {
        self.synthesized = true;
        self
    }

    /// Look up a field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_struct(&self) -> bool {
        self.kind == TypeKind::Struct
    }

    pub fn is_pointer(&self) -> bool {
        self.kind == TypeKind::Pointer
    }
}

/// A struct field.
///
/// Field order within a struct is the declaration order and is never
/// reordered; `index` records that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    /// Whether the field is visible outside its package. Defaults to the
    /// capitalization rule of the source language.
    pub exported: bool,
    /// The field's type.
    #[serde(rename = "type")]
    pub ty: TypeId,
    /// Raw tag string, e.g. `json:"sku,omitempty" db:"sku_id"`. Kept opaque;
    /// use [`FieldInfo::tag_value`] to read one key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// Whether this is an embedded (anonymous) field.
    #[serde(default)]
    pub embedded: bool,
    /// Declaration index within the owning struct.
    #[serde(default)]
    pub index: usize,
}

impl FieldInfo {
    /// Create a field. `exported` is derived from the name's first character;
    /// override with [`FieldInfo::unexported`] if the loader knows better.
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        let name = name.into();
        let exported = name.chars().next().is_some_and(|c| c.is_uppercase());
        FieldInfo {
            name,
            exported,
            ty,
            tag: String::new(),
            embedded: false,
            index: 0,
        }
    }

    /// Force the field to be unexported regardless of its name.
    pub fn unexported(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Attach a raw tag string.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Mark as an embedded field.
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    /// Read one key from the tag string.
    ///
    /// Tags use the conventional `key:"value"` space-separated format. The
    /// value is returned verbatim (options like `,omitempty` included).
    /// Returns `None` for absent keys and for malformed tag text.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        let mut rest = self.tag.trim_start();
        while !rest.is_empty() {
            let colon = rest.find(':')?;
            let (tag_key, after) = rest.split_at(colon);
            let after = after.strip_prefix(':')?;
            let after = after.strip_prefix('"')?;
            let close = after.find('"')?;
            let (value, tail) = after.split_at(close);
            if tag_key == key {
                return Some(value);
            }
            rest = tail.strip_prefix('"')?.trim_start();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_id_display() {
        assert_eq!(TypeId::new("store", "Order").to_string(), "store.Order");
        assert_eq!(TypeId::anon("*store.Order").to_string(), "*store.Order");
    }

    #[test]
    fn type_id_parse_splits_at_last_dot() {
        assert_eq!(TypeId::parse("store.Order"), TypeId::new("store", "Order"));
        assert_eq!(TypeId::parse("api.v2.Order"), TypeId::new("api.v2", "Order"));
        assert_eq!(TypeId::parse("Order"), TypeId::anon("Order"));
    }

    #[test]
    fn exported_follows_capitalization() {
        let ty = TypeId::anon("int");
        assert!(FieldInfo::new("Name", ty.clone()).exported);
        assert!(!FieldInfo::new("name", ty).exported);
    }

    #[test]
    fn struct_fields_get_declaration_indexes() {
        let int = TypeId::anon("int");
        let info = TypeInfo::strukt(
            TypeId::new("store", "Point"),
            vec![FieldInfo::new("X", int.clone()), FieldInfo::new("Y", int)],
        );
        assert_eq!(info.fields[0].index, 0);
        assert_eq!(info.fields[1].index, 1);
    }

    #[test]
    fn tag_lookup_reads_single_keys() {
        let f = FieldInfo::new("SKU", TypeId::anon("string"))
            .with_tag(r#"json:"sku,omitempty" db:"sku_id""#);
        assert_eq!(f.tag_value("json"), Some("sku,omitempty"));
        assert_eq!(f.tag_value("db"), Some("sku_id"));
        assert_eq!(f.tag_value("xml"), None);
    }

    #[test]
    fn tag_lookup_tolerates_malformed_tags() {
        let f = FieldInfo::new("A", TypeId::anon("int")).with_tag("not a tag");
        assert_eq!(f.tag_value("json"), None);
    }
}
