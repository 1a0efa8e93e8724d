//! Package namespace mapper: Go module path to Java package.
//!
//! Provided packages are consulted first by exact module path; they mark the
//! zero-generation set. Package mappings match by string prefix; when prefixes
//! overlap, the longest match wins, and the validation pass in `emit` rejects
//! configurations where more than one entry matches a registered module.

use crate::error::{Error, Result};
use crate::{GeneratorConfig, PackageInfo};

#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceInfo<'a> {
    /// Definitions are generated into this package.
    Generated(&'a PackageInfo),
    /// The package already exists in the consumer model; reference only.
    Provided { java_package: &'a str },
}

#[derive(Debug)]
pub struct PackageResolver<'a> {
    mapping: &'a [(String, PackageInfo)],
    provided: &'a [(String, String)],
}

impl<'a> PackageResolver<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            mapping: &config.package_mapping,
            provided: &config.provided_packages,
        }
    }

    /// Every mapping prefix that matches `module`, for conflict detection.
    pub fn matches(&self, module: &str) -> Vec<&'a str> {
        self.mapping
            .iter()
            .filter(|(prefix, _)| module.starts_with(prefix.as_str()))
            .map(|(prefix, _)| prefix.as_str())
            .collect()
    }

    pub fn is_provided(&self, module: &str) -> bool {
        self.provided.iter().any(|(m, _)| m == module)
    }

    pub fn resolve(&self, module: &str, type_name: &str) -> Result<NamespaceInfo<'a>> {
        if let Some((_, java_package)) = self.provided.iter().find(|(m, _)| m == module) {
            return Ok(NamespaceInfo::Provided {
                java_package: java_package.as_str(),
            });
        }
        self.mapping
            .iter()
            .filter(|(prefix, _)| module.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, info)| NamespaceInfo::Generated(info))
            .ok_or_else(|| Error::UnmappedPackage {
                module: module.to_string(),
                type_name: type_name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            package_mapping: vec![
                (
                    "github.com/solo-io/solo-apis/pkg/api/gloo.solo.io/v1".to_string(),
                    PackageInfo::with_api("io.fabric8.solo.gloo.v1", "gloo.solo.io", "v1"),
                ),
                (
                    "github.com/solo-io/solo-apis/pkg/api".to_string(),
                    PackageInfo::new("io.fabric8.solo"),
                ),
            ],
            provided_packages: vec![(
                "k8s.io/apimachinery/pkg/apis/meta/v1".to_string(),
                "io.fabric8.kubernetes.api.model".to_string(),
            )],
            ..Default::default()
        }
    }

    #[test]
    fn provided_packages_match_exactly() {
        let config = config();
        let resolver = PackageResolver::new(&config);
        let info = resolver
            .resolve("k8s.io/apimachinery/pkg/apis/meta/v1", "ObjectMeta")
            .unwrap();
        assert_eq!(
            info,
            NamespaceInfo::Provided {
                java_package: "io.fabric8.kubernetes.api.model"
            }
        );
        // Exact match only: a submodule of a provided package is not provided.
        assert!(resolver
            .resolve("k8s.io/apimachinery/pkg/apis/meta/v1beta1", "Table")
            .is_err());
    }

    #[test]
    fn longest_prefix_wins() {
        let config = config();
        let resolver = PackageResolver::new(&config);
        let info = resolver
            .resolve(
                "github.com/solo-io/solo-apis/pkg/api/gloo.solo.io/v1",
                "Upstream",
            )
            .unwrap();
        match info {
            NamespaceInfo::Generated(pkg) => {
                assert_eq!(pkg.java_package, "io.fabric8.solo.gloo.v1");
                assert_eq!(pkg.api_group.as_deref(), Some("gloo.solo.io"));
            }
            other => panic!("expected generated mapping, got {other:?}"),
        }
    }

    #[test]
    fn unmapped_module_reports_module_and_type() {
        let config = config();
        let resolver = PackageResolver::new(&config);
        let err = resolver
            .resolve("github.com/other/apis/v1", "Widget")
            .unwrap_err();
        match err {
            Error::UnmappedPackage { module, type_name } => {
                assert_eq!(module, "github.com/other/apis/v1");
                assert_eq!(type_name, "Widget");
            }
            other => panic!("expected UnmappedPackage, got {other:?}"),
        }
    }

    #[test]
    fn matches_lists_every_candidate() {
        let config = config();
        let resolver = PackageResolver::new(&config);
        let matches =
            resolver.matches("github.com/solo-io/solo-apis/pkg/api/gloo.solo.io/v1");
        assert_eq!(matches.len(), 2);
    }
}
