//! Modelgen core types: the registered CRD type graph.
//!
//! The generator never reflects over live Rust types. Instead the entry point
//! registers every Go type it cares about in a [`TypeRegistry`], which acts as
//! the manual registration table behind the `describe` contract. Handles are
//! cheap indices into the registry; records are immutable once defined.

#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Opaque identifier for a registered type. Produced only by [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    String,
    Integer,
    Boolean,
    Double,
}

/// Struct fields keep declaration order; most CRD structs stay small.
pub type FieldList = SmallVec<[FieldDef; 8]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Serialized (wire) field name, i.e. the Go json tag. Empty for embedded
    /// fields, which take their name from the embedded type.
    pub name: String,
    pub ty: TypeHandle,
    pub embedded: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            embedded: false,
        }
    }

    pub fn embedded(ty: TypeHandle) -> Self {
        Self {
            name: String::new(),
            ty,
            embedded: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Scalar(ScalarKind),
    Struct {
        fields: FieldList,
    },
    /// Slice of `elem` (`[]T`).
    List {
        elem: TypeHandle,
    },
    /// String-keyed map (`map[string]T`).
    Map {
        value: TypeHandle,
    },
    /// Pointer (`*T`); marks the pointee optional at a field position.
    Pointer {
        pointee: TypeHandle,
    },
    /// A shape the generator cannot decompose (channels, funcs, bare
    /// interfaces). Reachable only through a manual override.
    Opaque {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRecord {
    pub name: String,
    /// Originating Go module path, e.g. `k8s.io/apimachinery/pkg/apis/meta/v1`.
    /// Empty for scalars and anonymous composites.
    pub module: String,
    /// `None` while only declared. Declared-but-undefined types may still be
    /// referenced by name (provided/external types are never decomposed).
    pub kind: Option<TypeKind>,
}

impl TypeRecord {
    pub fn qualified_name(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("type `{0}` is already defined")]
    AlreadyDefined(String),
}

/// The registration table. Scalars and composite wrappers are interned so the
/// same handle always denotes the same type.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    records: Vec<TypeRecord>,
    by_name: FxHashMap<(String, String), TypeHandle>,
    scalars: FxHashMap<ScalarKind, TypeHandle>,
    lists: FxHashMap<TypeHandle, TypeHandle>,
    maps: FxHashMap<TypeHandle, TypeHandle>,
    pointers: FxHashMap<TypeHandle, TypeHandle>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, record: TypeRecord) -> TypeHandle {
        let handle = TypeHandle(self.records.len() as u32);
        self.records.push(record);
        handle
    }

    pub fn scalar(&mut self, kind: ScalarKind) -> TypeHandle {
        if let Some(&h) = self.scalars.get(&kind) {
            return h;
        }
        let name = match kind {
            ScalarKind::String => "string",
            ScalarKind::Integer => "int",
            ScalarKind::Boolean => "bool",
            ScalarKind::Double => "float64",
        };
        let h = self.push(TypeRecord {
            name: name.to_string(),
            module: String::new(),
            kind: Some(TypeKind::Scalar(kind)),
        });
        self.scalars.insert(kind, h);
        h
    }

    /// Register a named type without a shape. Idempotent: declaring the same
    /// `(module, name)` twice yields the same handle.
    pub fn declare(&mut self, module: &str, name: &str) -> TypeHandle {
        let key = (module.to_string(), name.to_string());
        if let Some(&h) = self.by_name.get(&key) {
            return h;
        }
        let h = self.push(TypeRecord {
            name: name.to_string(),
            module: module.to_string(),
            kind: None,
        });
        self.by_name.insert(key, h);
        h
    }

    /// Attach a struct shape to a previously declared handle. Errors if the
    /// handle already carries a definition.
    pub fn define_struct(
        &mut self,
        handle: TypeHandle,
        fields: impl IntoIterator<Item = FieldDef>,
    ) -> Result<(), RegistryError> {
        self.define(
            handle,
            TypeKind::Struct {
                fields: fields.into_iter().collect(),
            },
        )
    }

    fn define(&mut self, handle: TypeHandle, kind: TypeKind) -> Result<(), RegistryError> {
        let record = &mut self.records[handle.0 as usize];
        if record.kind.is_some() {
            return Err(RegistryError::AlreadyDefined(record.qualified_name()));
        }
        record.kind = Some(kind);
        Ok(())
    }

    /// Declare and define a struct in one step.
    pub fn strukt(
        &mut self,
        module: &str,
        name: &str,
        fields: impl IntoIterator<Item = FieldDef>,
    ) -> Result<TypeHandle, RegistryError> {
        let h = self.declare(module, name);
        self.define_struct(h, fields)?;
        Ok(h)
    }

    /// Register a type the generator must never decompose (e.g. `sync.Mutex`).
    pub fn opaque(
        &mut self,
        module: &str,
        name: &str,
        reason: &str,
    ) -> Result<TypeHandle, RegistryError> {
        let h = self.declare(module, name);
        self.define(
            h,
            TypeKind::Opaque {
                reason: reason.to_string(),
            },
        )?;
        Ok(h)
    }

    pub fn list_of(&mut self, elem: TypeHandle) -> TypeHandle {
        if let Some(&h) = self.lists.get(&elem) {
            return h;
        }
        let name = format!("[]{}", self.name(elem));
        let h = self.push(TypeRecord {
            name,
            module: String::new(),
            kind: Some(TypeKind::List { elem }),
        });
        self.lists.insert(elem, h);
        h
    }

    pub fn map_of(&mut self, value: TypeHandle) -> TypeHandle {
        if let Some(&h) = self.maps.get(&value) {
            return h;
        }
        let name = format!("map[string]{}", self.name(value));
        let h = self.push(TypeRecord {
            name,
            module: String::new(),
            kind: Some(TypeKind::Map { value }),
        });
        self.maps.insert(value, h);
        h
    }

    pub fn pointer_to(&mut self, pointee: TypeHandle) -> TypeHandle {
        if let Some(&h) = self.pointers.get(&pointee) {
            return h;
        }
        let name = format!("*{}", self.name(pointee));
        let h = self.push(TypeRecord {
            name,
            module: String::new(),
            kind: Some(TypeKind::Pointer { pointee }),
        });
        self.pointers.insert(pointee, h);
        h
    }

    pub fn record(&self, handle: TypeHandle) -> &TypeRecord {
        &self.records[handle.0 as usize]
    }

    pub fn name(&self, handle: TypeHandle) -> &str {
        &self.record(handle).name
    }

    pub fn module(&self, handle: TypeHandle) -> &str {
        &self.record(handle).module
    }

    pub fn kind(&self, handle: TypeHandle) -> Option<&TypeKind> {
        self.record(handle).kind.as_ref()
    }

    pub fn qualified_name(&self, handle: TypeHandle) -> String {
        self.record(handle).qualified_name()
    }

    pub fn handles(&self) -> impl Iterator<Item = TypeHandle> + '_ {
        (0..self.records.len() as u32).map(TypeHandle)
    }

    /// Module paths of all named records, with repeats. Callers dedup.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(|r| !r.module.is_empty())
            .map(|r| r.module.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
