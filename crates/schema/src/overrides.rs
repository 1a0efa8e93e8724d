//! Override engine: manual type substitutions, provided types, and field
//! constraints. Lookup order is manual, then provided, then descend; the
//! first match is terminal and suppresses definition emission.

use modelgen_core::TypeHandle;
use rustc_hash::FxHashMap;

use crate::{Constraint, GeneratorConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Literal target-type name from the manual type map.
    Manual(&'a str),
    /// Externally defined type; referenced by its Java class name.
    Provided(&'a str),
    /// No override; the emitter resolves the type structurally.
    Descend,
}

#[derive(Debug, Default)]
pub struct Overrides {
    manual: FxHashMap<TypeHandle, String>,
    provided: FxHashMap<TypeHandle, String>,
    constraints: FxHashMap<TypeHandle, FxHashMap<String, Constraint>>,
}

impl Overrides {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let mut out = Overrides::default();
        for (handle, java_type) in &config.manual_types {
            out.manual.insert(*handle, java_type.clone());
        }
        for (handle, java_type) in &config.provided_types {
            out.provided.insert(*handle, java_type.clone());
        }
        for (handle, field, constraint) in &config.constraints {
            out.constraints
                .entry(*handle)
                .or_default()
                .insert(field.clone(), constraint.clone());
        }
        out
    }

    pub fn resolve_type(&self, handle: TypeHandle) -> Resolution<'_> {
        if let Some(name) = self.manual.get(&handle) {
            return Resolution::Manual(name);
        }
        if let Some(name) = self.provided.get(&handle) {
            return Resolution::Provided(name);
        }
        Resolution::Descend
    }

    /// True when resolution stops at this handle without descending.
    pub fn is_terminal(&self, handle: TypeHandle) -> bool {
        !matches!(self.resolve_type(handle), Resolution::Descend)
    }

    pub fn constraints_for(&self, handle: TypeHandle, field: &str) -> Option<&Constraint> {
        self.constraints.get(&handle)?.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelgen_core::TypeRegistry;

    #[test]
    fn manual_wins_over_provided() {
        let mut reg = TypeRegistry::new();
        let t = reg.declare("example.io/v1", "Thing");
        let config = GeneratorConfig {
            manual_types: vec![(t, "java.lang.String".to_string())],
            provided_types: vec![(t, "io.example.Thing".to_string())],
            ..Default::default()
        };
        let overrides = Overrides::from_config(&config);
        assert_eq!(
            overrides.resolve_type(t),
            Resolution::Manual("java.lang.String")
        );
        assert!(overrides.is_terminal(t));
    }

    #[test]
    fn unlisted_types_descend() {
        let mut reg = TypeRegistry::new();
        let t = reg.declare("example.io/v1", "Thing");
        let overrides = Overrides::from_config(&GeneratorConfig::default());
        assert_eq!(overrides.resolve_type(t), Resolution::Descend);
        assert!(!overrides.is_terminal(t));
    }

    #[test]
    fn constraints_are_scoped_to_type_and_field() {
        let mut reg = TypeRegistry::new();
        let a = reg.declare("example.io/v1", "A");
        let b = reg.declare("example.io/v1", "B");
        let constraint = Constraint {
            max_length: Some(63),
            pattern: Some("^[a-z0-9]([-a-z0-9]*[a-z0-9])?$".to_string()),
        };
        let config = GeneratorConfig {
            constraints: vec![(a, "name".to_string(), constraint.clone())],
            ..Default::default()
        };
        let overrides = Overrides::from_config(&config);
        assert_eq!(overrides.constraints_for(a, "name"), Some(&constraint));
        assert_eq!(overrides.constraints_for(a, "other"), None);
        assert_eq!(overrides.constraints_for(b, "name"), None);
    }
}
