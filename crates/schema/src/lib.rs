//! Modelgen schema engine: resolves a registered CRD type graph into a single
//! Java-binding schema document.
//!
//! The engine is split the way the generation pipeline flows: [`resolve`]
//! extracts structural descriptors, [`mapping`] turns Go module paths into
//! Java packages, [`overrides`] short-circuits resolution for manual and
//! provided types, and [`emit`] drives the traversal and assembles the
//! [`doc::SchemaDocument`]. All configuration is one immutable
//! [`GeneratorConfig`] handed to [`generate`]; nothing is retained between
//! runs.

#![forbid(unsafe_code)]

pub mod doc;
pub mod emit;
pub mod error;
pub mod mapping;
pub mod overrides;
pub mod resolve;

pub use doc::SchemaDocument;
pub use emit::generate;
pub use error::{Error, Result};

use modelgen_core::TypeHandle;
use serde::{Deserialize, Serialize};

/// Resource scope of a CRD root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    Namespaced,
    Cluster,
}

/// Target-package information for one Go module path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub java_package: String,
    /// Attached as metadata on definitions from this module; not inherited by
    /// types from other modules.
    pub api_group: Option<String>,
    pub api_version: Option<String>,
}

impl PackageInfo {
    pub fn new(java_package: impl Into<String>) -> Self {
        Self {
            java_package: java_package.into(),
            api_group: None,
            api_version: None,
        }
    }

    pub fn with_api(
        java_package: impl Into<String>,
        api_group: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            java_package: java_package.into(),
            api_group: Some(api_group.into()),
            api_version: Some(api_version.into()),
        }
    }
}

/// Advisory field-level constraint metadata. Attached to the emitted field;
/// never alters traversal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
}

/// The full configuration for one generation run, constructed once by the
/// entry point and read-only from then on.
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// CRD list roots in declaration order; order fixes output order.
    pub roots: Vec<(TypeHandle, Scope)>,
    /// Go module prefix -> target package. Matched by string prefix; at most
    /// one entry may match any registered module (validated up front).
    pub package_mapping: Vec<(String, PackageInfo)>,
    /// Go modules whose types already exist in the consumer model; matched
    /// exactly, referenced but never generated.
    pub provided_packages: Vec<(String, String)>,
    /// Types rendered as a literal Java type, bypassing resolution.
    pub manual_types: Vec<(TypeHandle, String)>,
    /// Individual types the consumer defines externally.
    pub provided_types: Vec<(TypeHandle, String)>,
    /// `(type, field, constraint)` triples; apply only to that type's fields.
    pub constraints: Vec<(TypeHandle, String, Constraint)>,
    /// URI-like identifier stamped into the document `id`.
    pub schema_id: String,
    /// Root namespace prefix of the generated model, e.g. `io.fabric8`.
    pub root_namespace: String,
}
