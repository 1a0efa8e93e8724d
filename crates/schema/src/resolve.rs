//! Type descriptor resolver: turns a registered struct into its resolved
//! field shapes. Declared field order is preserved so output stays
//! deterministic across runs.
//!
//! Shape rules follow the Go source types: pointer-to-T fields become
//! optional single values of T, slices become arrays, string-keyed maps
//! become objects with `additionalProperties`. Embedded fields are flattened
//! into the parent unless a terminal override applies to the embedded type,
//! in which case the override wins and the field survives under the embedded
//! type's own name.

use modelgen_core::{ScalarKind, TypeHandle, TypeKind, TypeRegistry};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::overrides::Overrides;

#[derive(Debug, Clone, PartialEq)]
pub enum ValueShape {
    Scalar(ScalarKind),
    /// A named type needing reference resolution (struct, opaque, or
    /// declared-only external).
    Named(TypeHandle),
    Array(Box<ValueShape>),
    Map(Box<ValueShape>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub name: String,
    pub shape: ValueShape,
    pub optional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TypeDescriptor {
    pub fields: SmallVec<[FieldShape; 8]>,
}

#[derive(Debug)]
pub struct Resolver<'a> {
    registry: &'a TypeRegistry,
    overrides: &'a Overrides,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a TypeRegistry, overrides: &'a Overrides) -> Self {
        Self {
            registry,
            overrides,
        }
    }

    /// Resolve the full field list of a struct, flattening embedded types.
    pub fn describe(&self, handle: TypeHandle) -> Result<TypeDescriptor> {
        let mut descriptor = TypeDescriptor::default();
        let mut trail = Vec::new();
        self.collect_fields(handle, &mut descriptor, &mut trail)?;
        Ok(descriptor)
    }

    fn collect_fields(
        &self,
        handle: TypeHandle,
        out: &mut TypeDescriptor,
        trail: &mut Vec<TypeHandle>,
    ) -> Result<()> {
        if trail.contains(&handle) {
            return Err(Error::conflict(format!(
                "embedding cycle through `{}`",
                self.registry.qualified_name(handle)
            )));
        }
        trail.push(handle);

        let fields = match self.registry.kind(handle) {
            Some(TypeKind::Struct { fields }) => fields,
            Some(TypeKind::Opaque { reason }) => {
                return Err(self.unsupported(handle, reason));
            }
            Some(_) => return Err(self.unsupported(handle, "not a struct")),
            None => return Err(self.unsupported(handle, "declared but never defined")),
        };

        for field in fields {
            if field.embedded {
                let target = self.deref(field.ty);
                if self.overrides.is_terminal(target) {
                    // Override wins: keep the field, named after the embedded
                    // type as Go does, and skip flattening.
                    out.fields.push(FieldShape {
                        name: self.registry.name(target).to_string(),
                        shape: ValueShape::Named(target),
                        optional: false,
                    });
                } else {
                    self.collect_fields(target, out, trail)?;
                }
            } else {
                let (shape, optional) = self.shape_of(field.ty);
                out.fields.push(FieldShape {
                    name: field.name.clone(),
                    shape,
                    optional,
                });
            }
        }

        trail.pop();
        Ok(())
    }

    /// Strip pointer wrappers; embedded `*T` flattens the same as embedded `T`.
    fn deref(&self, mut handle: TypeHandle) -> TypeHandle {
        while let Some(TypeKind::Pointer { pointee }) = self.registry.kind(handle) {
            handle = *pointee;
        }
        handle
    }

    fn shape_of(&self, handle: TypeHandle) -> (ValueShape, bool) {
        match self.registry.kind(handle) {
            Some(TypeKind::Scalar(kind)) => (ValueShape::Scalar(*kind), false),
            Some(TypeKind::Pointer { pointee }) => {
                let (shape, _) = self.shape_of(*pointee);
                (shape, true)
            }
            Some(TypeKind::List { elem }) => {
                let (shape, _) = self.shape_of(*elem);
                (ValueShape::Array(Box::new(shape)), false)
            }
            Some(TypeKind::Map { value }) => {
                let (shape, _) = self.shape_of(*value);
                (ValueShape::Map(Box::new(shape)), false)
            }
            // Structs, opaques, and declared-only types resolve by name; the
            // emitter decides between reference and error.
            Some(TypeKind::Struct { .. }) | Some(TypeKind::Opaque { .. }) | None => {
                (ValueShape::Named(handle), false)
            }
        }
    }

    fn unsupported(&self, handle: TypeHandle, reason: &str) -> Error {
        Error::UnsupportedKind {
            type_name: self.registry.qualified_name(handle),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorConfig;
    use modelgen_core::FieldDef;

    fn no_overrides() -> Overrides {
        Overrides::from_config(&GeneratorConfig::default())
    }

    #[test]
    fn pointer_fields_become_optional() {
        let mut reg = TypeRegistry::new();
        let s = reg.scalar(ScalarKind::String);
        let spec = reg.strukt("example.io/v1", "Spec", []).unwrap();
        let spec_ptr = reg.pointer_to(spec);
        let widget = reg
            .strukt(
                "example.io/v1",
                "Widget",
                [FieldDef::new("name", s), FieldDef::new("spec", spec_ptr)],
            )
            .unwrap();

        let overrides = no_overrides();
        let d = Resolver::new(&reg, &overrides).describe(widget).unwrap();
        assert_eq!(d.fields.len(), 2);
        assert!(!d.fields[0].optional);
        assert!(d.fields[1].optional);
        assert_eq!(d.fields[1].shape, ValueShape::Named(spec));
    }

    #[test]
    fn slices_and_maps_resolve_to_array_and_map_shapes() {
        let mut reg = TypeRegistry::new();
        let s = reg.scalar(ScalarKind::String);
        let tags = reg.list_of(s);
        let labels = reg.map_of(s);
        let widget = reg
            .strukt(
                "example.io/v1",
                "Widget",
                [FieldDef::new("tags", tags), FieldDef::new("labels", labels)],
            )
            .unwrap();

        let overrides = no_overrides();
        let d = Resolver::new(&reg, &overrides).describe(widget).unwrap();
        assert_eq!(
            d.fields[0].shape,
            ValueShape::Array(Box::new(ValueShape::Scalar(ScalarKind::String)))
        );
        assert_eq!(
            d.fields[1].shape,
            ValueShape::Map(Box::new(ValueShape::Scalar(ScalarKind::String)))
        );
    }

    #[test]
    fn embedded_structs_flatten_in_declaration_order() {
        let mut reg = TypeRegistry::new();
        let s = reg.scalar(ScalarKind::String);
        let type_meta = reg
            .strukt(
                "k8s.io/apimachinery/pkg/apis/meta/v1",
                "TypeMeta",
                [FieldDef::new("kind", s), FieldDef::new("apiVersion", s)],
            )
            .unwrap();
        let widget = reg
            .strukt(
                "example.io/v1",
                "Widget",
                [FieldDef::embedded(type_meta), FieldDef::new("name", s)],
            )
            .unwrap();

        let overrides = no_overrides();
        let d = Resolver::new(&reg, &overrides).describe(widget).unwrap();
        let names: Vec<_> = d.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["kind", "apiVersion", "name"]);
    }

    #[test]
    fn terminal_override_suppresses_flattening() {
        let mut reg = TypeRegistry::new();
        let s = reg.scalar(ScalarKind::String);
        let mutex = reg.opaque("sync", "Mutex", "synchronization primitive").unwrap();
        let widget = reg
            .strukt(
                "example.io/v1",
                "Widget",
                [FieldDef::embedded(mutex), FieldDef::new("name", s)],
            )
            .unwrap();

        let config = GeneratorConfig {
            manual_types: vec![(mutex, "java.util.Map<String, Object>".to_string())],
            ..Default::default()
        };
        let overrides = Overrides::from_config(&config);
        let d = Resolver::new(&reg, &overrides).describe(widget).unwrap();
        assert_eq!(d.fields[0].name, "Mutex");
        assert_eq!(d.fields[0].shape, ValueShape::Named(mutex));
    }

    #[test]
    fn embedded_opaque_without_override_is_unsupported() {
        let mut reg = TypeRegistry::new();
        let mutex = reg.opaque("sync", "Mutex", "synchronization primitive").unwrap();
        let widget = reg
            .strukt("example.io/v1", "Widget", [FieldDef::embedded(mutex)])
            .unwrap();

        let overrides = no_overrides();
        let err = Resolver::new(&reg, &overrides).describe(widget).unwrap_err();
        match err {
            Error::UnsupportedKind { type_name, .. } => {
                assert_eq!(type_name, "sync.Mutex");
            }
            other => panic!("expected UnsupportedKind, got {other:?}"),
        }
    }

    #[test]
    fn embedding_cycles_are_a_conflict() {
        let mut reg = TypeRegistry::new();
        let a = reg.declare("example.io/v1", "A");
        let b = reg.declare("example.io/v1", "B");
        reg.define_struct(a, [FieldDef::embedded(b)]).unwrap();
        reg.define_struct(b, [FieldDef::embedded(a)]).unwrap();

        let overrides = no_overrides();
        let err = Resolver::new(&reg, &overrides).describe(a).unwrap_err();
        assert!(matches!(err, Error::ConfigurationConflict { .. }));
    }

    #[test]
    fn describing_a_declared_only_type_fails() {
        let mut reg = TypeRegistry::new();
        let ghost = reg.declare("example.io/v1", "Ghost");
        let overrides = no_overrides();
        let err = Resolver::new(&reg, &overrides).describe(ghost).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKind { .. }));
    }
}
