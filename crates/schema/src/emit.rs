//! Schema emitter: walks the type graph from the declared roots and builds
//! the output document.
//!
//! Traversal is a FIFO work queue seeded from the roots. A handle's resolved
//! Java name is memoized the moment it is first referenced, before its fields
//! are walked, so cyclic graphs emit references instead of re-entering
//! resolution. Definitions land in first-discovered order: root declaration
//! order, then field declaration order, which keeps repeated runs
//! byte-identical.

use std::collections::VecDeque;

use modelgen_core::{TypeHandle, TypeKind, TypeRegistry};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::doc::{Definition, OrderedMap, Property, RootEntry, SchemaDocument, SCHEMA_DRAFT};
use crate::error::{Error, Result};
use crate::mapping::{NamespaceInfo, PackageResolver};
use crate::overrides::{Overrides, Resolution};
use crate::resolve::{Resolver, TypeDescriptor, ValueShape};
use crate::{GeneratorConfig, Scope};

/// Generate the schema document for `config` over `registry`. Fails closed:
/// any resolution error aborts the run with no partial output.
pub fn generate(registry: &TypeRegistry, config: &GeneratorConfig) -> Result<SchemaDocument> {
    let overrides = Overrides::from_config(config);
    let packages = PackageResolver::new(config);
    let resolver = Resolver::new(registry, &overrides);

    validate(registry, config, &packages, &overrides, &resolver)?;

    let mut emitter = Emitter {
        registry,
        overrides: &overrides,
        packages: &packages,
        resolver: &resolver,
        queue: VecDeque::new(),
        names: FxHashMap::default(),
        definitions: OrderedMap::new(),
    };

    for &(root, _) in &config.roots {
        match emitter.type_ref(root)? {
            TypeRef::Definition(_) => {}
            TypeRef::External(java_type) => {
                return Err(Error::conflict(format!(
                    "root `{}` resolves to external type `{java_type}`",
                    registry.qualified_name(root)
                )));
            }
        }
    }

    while let Some(handle) = emitter.queue.pop_front() {
        emitter.emit_definition(handle)?;
    }

    let mut properties = OrderedMap::new();
    for &(root, scope) in &config.roots {
        let name = emitter.names[&root].clone();
        let entry = emitter.root_entry(root, scope)?;
        properties.insert(name, entry);
    }

    info!(
        definitions = emitter.definitions.len(),
        roots = properties.len(),
        "schema generation complete"
    );

    Ok(SchemaDocument {
        schema: SCHEMA_DRAFT,
        id: config.schema_id.clone(),
        module: config.root_namespace.clone(),
        kind: "object",
        definitions: emitter.definitions,
        properties,
    })
}

enum TypeRef {
    /// A definition exists (or will exist) in this document.
    Definition(String),
    /// The type lives outside the document; reference by Java class name.
    External(String),
}

struct Emitter<'a> {
    registry: &'a TypeRegistry,
    overrides: &'a Overrides,
    packages: &'a PackageResolver<'a>,
    resolver: &'a Resolver<'a>,
    queue: VecDeque<TypeHandle>,
    /// Resolved Java names of descend types, populated at first reference.
    names: FxHashMap<TypeHandle, String>,
    definitions: OrderedMap<Definition>,
}

impl Emitter<'_> {
    /// Resolve how a named type is referenced, enqueuing it for definition
    /// emission the first time a generated type is seen.
    fn type_ref(&mut self, handle: TypeHandle) -> Result<TypeRef> {
        match self.overrides.resolve_type(handle) {
            Resolution::Manual(java_type) | Resolution::Provided(java_type) => {
                return Ok(TypeRef::External(java_type.to_string()));
            }
            Resolution::Descend => {}
        }

        if let Some(name) = self.names.get(&handle) {
            return Ok(TypeRef::Definition(name.clone()));
        }

        if let Some(TypeKind::Opaque { reason }) = self.registry.kind(handle) {
            return Err(Error::UnsupportedKind {
                type_name: self.registry.qualified_name(handle),
                reason: reason.clone(),
            });
        }

        let module = self.registry.module(handle);
        let type_name = self.registry.name(handle);
        match self.packages.resolve(module, type_name)? {
            NamespaceInfo::Provided { java_package } => {
                Ok(TypeRef::External(format!("{java_package}.{type_name}")))
            }
            NamespaceInfo::Generated(info) => {
                let qualified = format!("{}.{}", info.java_package, type_name);
                self.names.insert(handle, qualified.clone());
                self.queue.push_back(handle);
                Ok(TypeRef::Definition(qualified))
            }
        }
    }

    fn emit_definition(&mut self, handle: TypeHandle) -> Result<()> {
        let java_type = self.names[&handle].clone();
        debug!(
            type_name = %self.registry.qualified_name(handle),
            java_type = %java_type,
            "emitting definition"
        );

        let descriptor = self.resolver.describe(handle)?;
        let mut properties = OrderedMap::new();
        let mut required = Vec::new();
        for field in &descriptor.fields {
            let mut property = self.property_for(&field.shape)?;
            if let Some(constraint) = self.overrides.constraints_for(handle, &field.name) {
                property.max_length = constraint.max_length;
                property.pattern = constraint.pattern.clone();
            }
            if !field.optional {
                required.push(field.name.clone());
            }
            properties.insert(field.name.clone(), property);
        }

        let (api_group, api_version) = match self
            .packages
            .resolve(self.registry.module(handle), self.registry.name(handle))?
        {
            NamespaceInfo::Generated(info) => (info.api_group.clone(), info.api_version.clone()),
            NamespaceInfo::Provided { .. } => (None, None),
        };

        self.definitions.insert(
            java_type.clone(),
            Definition {
                kind: "object",
                properties,
                required,
                java_type,
                api_group,
                api_version,
            },
        );
        Ok(())
    }

    fn property_for(&mut self, shape: &ValueShape) -> Result<Property> {
        Ok(match shape {
            ValueShape::Scalar(kind) => Property::scalar(match kind {
                modelgen_core::ScalarKind::String => "string",
                modelgen_core::ScalarKind::Integer => "integer",
                modelgen_core::ScalarKind::Boolean => "boolean",
                modelgen_core::ScalarKind::Double => "number",
            }),
            ValueShape::Named(handle) => match self.type_ref(*handle)? {
                TypeRef::Definition(name) => Property::reference(&name),
                TypeRef::External(java_type) => Property::external(java_type),
            },
            ValueShape::Array(inner) => Property::array(self.property_for(inner)?),
            ValueShape::Map(inner) => Property::map(self.property_for(inner)?),
        })
    }

    fn root_entry(&mut self, root: TypeHandle, scope: Scope) -> Result<RootEntry> {
        let descriptor = self.resolver.describe(root)?;
        let item = list_item(&descriptor).ok_or_else(|| {
            Error::conflict(format!(
                "root `{}` is not a list type (no slice field)",
                self.registry.qualified_name(root)
            ))
        })?;
        match self.type_ref(item)? {
            TypeRef::Definition(name) => Ok(RootEntry {
                reference: format!("#/definitions/{name}"),
                scope,
            }),
            TypeRef::External(java_type) => Err(Error::conflict(format!(
                "items of root `{}` resolve to external type `{java_type}`",
                self.registry.qualified_name(root)
            ))),
        }
    }
}

/// First slice-of-named field of a list wrapper struct.
fn list_item(descriptor: &TypeDescriptor) -> Option<TypeHandle> {
    descriptor.fields.iter().find_map(|field| match &field.shape {
        ValueShape::Array(inner) => match inner.as_ref() {
            ValueShape::Named(handle) => Some(*handle),
            _ => None,
        },
        _ => None,
    })
}

/// Upfront validation pass. Ambiguous or contradictory configuration fails
/// the run before any traversal starts.
fn validate(
    registry: &TypeRegistry,
    config: &GeneratorConfig,
    packages: &PackageResolver<'_>,
    overrides: &Overrides,
    resolver: &Resolver<'_>,
) -> Result<()> {
    for (i, (prefix, _)) in config.package_mapping.iter().enumerate() {
        if config.package_mapping[..i].iter().any(|(p, _)| p == prefix) {
            return Err(Error::conflict(format!(
                "duplicate package mapping for `{prefix}`"
            )));
        }
    }
    for (i, (module, _)) in config.provided_packages.iter().enumerate() {
        if config.provided_packages[..i].iter().any(|(m, _)| m == module) {
            return Err(Error::conflict(format!(
                "duplicate provided package `{module}`"
            )));
        }
    }

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for module in registry.modules() {
        if !seen.insert(module) {
            continue;
        }
        let matches = packages.matches(module);
        if matches.len() > 1 {
            return Err(Error::conflict(format!(
                "module `{module}` matches multiple package mappings: {}",
                matches.join(", ")
            )));
        }
        if packages.is_provided(module) && !matches.is_empty() {
            return Err(Error::conflict(format!(
                "module `{module}` is both provided and mapped for generation"
            )));
        }
    }

    for (handle, _) in &config.manual_types {
        if config.provided_types.iter().any(|(h, _)| h == handle) {
            return Err(Error::conflict(format!(
                "type `{}` is both manually mapped and provided",
                registry.qualified_name(*handle)
            )));
        }
    }

    for (i, (root, _)) in config.roots.iter().enumerate() {
        if config.roots[..i].iter().any(|(h, _)| h == root) {
            return Err(Error::conflict(format!(
                "duplicate root `{}`",
                registry.qualified_name(*root)
            )));
        }
        if overrides.is_terminal(*root) {
            return Err(Error::conflict(format!(
                "root `{}` is overridden and cannot be generated",
                registry.qualified_name(*root)
            )));
        }
        let descriptor = resolver.describe(*root)?;
        match list_item(&descriptor) {
            None => {
                return Err(Error::conflict(format!(
                    "root `{}` is not a list type (no slice field)",
                    registry.qualified_name(*root)
                )));
            }
            Some(item) if overrides.is_terminal(item) => {
                return Err(Error::conflict(format!(
                    "items of root `{}` resolve to an override",
                    registry.qualified_name(*root)
                )));
            }
            Some(_) => {}
        }
    }

    for (handle, field, constraint) in &config.constraints {
        let qualified = registry.qualified_name(*handle);
        if overrides.is_terminal(*handle) {
            return Err(Error::conflict(format!(
                "constraint on overridden type `{qualified}`"
            )));
        }
        let descriptor = resolver.describe(*handle).map_err(|_| {
            Error::conflict(format!(
                "constraint on `{qualified}`, which is not a generated struct"
            ))
        })?;
        if !descriptor.fields.iter().any(|f| &f.name == field) {
            return Err(Error::conflict(format!(
                "constraint on unknown field `{qualified}.{field}`"
            )));
        }
        if let Some(pattern) = &constraint.pattern {
            Regex::new(pattern).map_err(|err| {
                Error::conflict(format!(
                    "invalid constraint pattern for `{qualified}.{field}`: {err}"
                ))
            })?;
        }
    }

    Ok(())
}
