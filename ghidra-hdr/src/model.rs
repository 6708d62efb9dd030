//! Intermediate model types: the bridge between dump parsing and header emission.
//!
//! Everything here is plain declaration text; the parser fills a [`Registry`]
//! and the emitter reads it back. A registry is built fresh for every run and
//! dropped at the end of it, so nothing in here is ever shared across runs.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::parse::ParseError;

/// Builtin type names that are never recorded as dependencies.
pub const INTERNAL_TYPES: &[&str] = &[
    "void",
    "char",
    "unsigned char",
    "short",
    "unsigned short",
    "int",
    "unsigned int",
    "double",
    "float",
    "long",
];

/// Returns true for the builtin names in [`INTERNAL_TYPES`].
pub fn is_internal(ty: &str) -> bool {
    INTERNAL_TYPES.contains(&ty)
}

/// Strip pointer markers and a trailing array suffix from a type text.
///
/// `Unit**` → `Unit`, `char[1]` → `char`.
pub fn base_type(ty: &str) -> String {
    let ty = match ty.find('[') {
        Some(idx) => &ty[..idx],
        None => ty,
    };
    ty.replace('*', "").trim().to_string()
}

/// Discriminant of a [`TypeDef`], used for the per-kind name index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Enum,
    Typedef,
    Union,
    Struct,
}

impl TypeKind {
    /// The C keyword used when declaring a record of this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Enum => "enum",
            TypeKind::Typedef => "typedef",
            TypeKind::Union => "union",
            TypeKind::Struct => "struct",
        }
    }
}

/// A single struct/union field: `(type, name, comment)`.
///
/// `comment` is empty when the dump line carried none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub ty: String,
    pub name: String,
    pub comment: String,
}

impl Field {
    pub fn new(ty: impl Into<String>, name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            comment: comment.into(),
        }
    }
}

/// A single enum label. Labels may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    pub label: String,
    pub value: i64,
}

/// A `typedef enum NAME { ... } NAME;` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub variants: Vec<EnumVariant>,
}

impl EnumDef {
    /// Order variants by value. Equal values keep their dump order.
    pub fn sort_by_value(&mut self) {
        self.variants.sort_by_key(|v| v.value);
    }
}

/// A typedef, either a plain alias or a function-pointer signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedefDef {
    pub name: String,
    /// Underlying type text. For function pointers this is the whole
    /// signature with the typedef name embedded, e.g. `void (*cb)(Unit*)`.
    pub underlying: String,
    pub depends: IndexSet<String>,
    pub is_func: bool,
}

/// Body of a struct or union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<Field>,
    /// Non-primitive type names referenced by fields. May contain `name`
    /// itself; the resolver ignores that edge.
    pub depends: IndexSet<String>,
    /// Free text captured from the declaration header line.
    pub comment: Option<String>,
}

impl RecordDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            depends: IndexSet::new(),
            comment: None,
        }
    }
}

/// Any declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Enum(EnumDef),
    Typedef(TypedefDef),
    Union(RecordDef),
    Struct(RecordDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Enum(e) => &e.name,
            TypeDef::Typedef(t) => &t.name,
            TypeDef::Union(r) | TypeDef::Struct(r) => &r.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDef::Enum(_) => TypeKind::Enum,
            TypeDef::Typedef(_) => TypeKind::Typedef,
            TypeDef::Union(_) => TypeKind::Union,
            TypeDef::Struct(_) => TypeKind::Struct,
        }
    }

    /// Dependency set, for the kinds that have one (everything but enums).
    pub fn depends(&self) -> Option<&IndexSet<String>> {
        match self {
            TypeDef::Enum(_) => None,
            TypeDef::Typedef(t) => Some(&t.depends),
            TypeDef::Union(r) | TypeDef::Struct(r) => Some(&r.depends),
        }
    }
}

/// A method declaration attached to a struct from hand-written sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub return_type: String,
    pub name: String,
    pub args: String,
}

/// A user-declared subclass of a dumped struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildClass {
    /// `struct` or `class`.
    pub keyword: String,
    pub name: String,
    /// `public`, `protected` or `private`; empty when omitted.
    pub visibility: String,
    pub base: String,
}

/// All types declared by one dump, keyed by unique name.
#[derive(Debug, Default)]
pub struct Registry {
    types: IndexMap<String, TypeDef>,
    by_kind: HashMap<TypeKind, Vec<String>>,
}

impl Registry {
    /// Register a type. A second type with the same name is an error,
    /// whatever its kind.
    pub fn insert(&mut self, ty: TypeDef) -> Result<(), ParseError> {
        let name = ty.name().to_string();
        if self.types.contains_key(&name) {
            return Err(ParseError::DuplicateType { name });
        }
        self.by_kind.entry(ty.kind()).or_default().push(name.clone());
        self.types.insert(name, ty);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeDef> {
        self.types.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names of every registered type of `kind`, in declaration order.
    pub fn names_of(&self, kind: TypeKind) -> &[String] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if `name` (pointer markers ignored) is a registered enum.
    pub fn is_enum(&self, name: &str) -> bool {
        matches!(self.types.get(&base_type(name)), Some(TypeDef::Enum(_)))
    }

    /// True if `name` is a registered struct (not a union).
    pub fn is_struct(&self, name: &str) -> bool {
        matches!(self.types.get(name), Some(TypeDef::Struct(_)))
    }
}
