//! Declarative registration of the Gloo CRD type graph and the generation
//! configuration that goes with it. This file is the single place to touch
//! when a CRD gains a field or a new resource joins the schema.

use modelgen_core::{FieldDef, RegistryError, ScalarKind, TypeRegistry};
use modelgen_schema::{Constraint, GeneratorConfig, PackageInfo, Scope};

const META: &str = "k8s.io/apimachinery/pkg/apis/meta/v1";
const RUNTIME: &str = "k8s.io/apimachinery/pkg/runtime";
const CORE: &str = "k8s.io/api/core/v1";
const RESOURCE: &str = "k8s.io/apimachinery/pkg/api/resource";
const GLOO: &str = "github.com/solo-io/solo-apis/pkg/api/gloo.solo.io/v1";
const GATEWAY: &str = "github.com/solo-io/solo-apis/pkg/api/gateway.solo.io/v1";

const FABRIC8_MODEL: &str = "io.fabric8.kubernetes.api.model";

// RFC 1123 label, the shape CRD object names must take.
const DNS_LABEL_PATTERN: &str = "^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// Build the registry and config for the Gloo/Gateway schema run.
pub fn gloo_model() -> Result<(TypeRegistry, GeneratorConfig), RegistryError> {
    let mut reg = TypeRegistry::new();
    let string = reg.scalar(ScalarKind::String);
    let int = reg.scalar(ScalarKind::Integer);
    let boolean = reg.scalar(ScalarKind::Boolean);
    let string_map = reg.map_of(string);
    let string_list = reg.list_of(string);

    // Kubernetes machinery. ObjectMeta and ListMeta come from a provided
    // package and are referenced by class name, never decomposed; TypeMeta is
    // embedded in every resource and flattens into it.
    let type_meta = reg.strukt(
        META,
        "TypeMeta",
        [
            FieldDef::new("kind", string),
            FieldDef::new("apiVersion", string),
        ],
    )?;
    let object_meta = reg.declare(META, "ObjectMeta");
    let object_meta_ptr = reg.pointer_to(object_meta);
    let list_meta = reg.declare(META, "ListMeta");
    let list_meta_ptr = reg.pointer_to(list_meta);
    let time = reg.declare(META, "Time");
    let raw_extension = reg.declare(RUNTIME, "RawExtension");
    let mutex = reg.opaque("sync", "Mutex", "synchronization primitive")?;

    // gloo.solo.io/v1
    let resource_ref = reg.strukt(
        GLOO,
        "ResourceRef",
        [
            FieldDef::new("name", string),
            FieldDef::new("namespace", string),
        ],
    )?;
    let resource_ref_ptr = reg.pointer_to(resource_ref);

    let status = reg.declare(GLOO, "Status");
    let status_map = reg.map_of(status);
    reg.define_struct(
        status,
        [
            FieldDef::new("state", int),
            FieldDef::new("reason", string),
            FieldDef::new("reportedBy", string),
            FieldDef::new("subresourceStatuses", status_map),
        ],
    )?;
    let status_ptr = reg.pointer_to(status);

    let kube_upstream = reg.strukt(
        GLOO,
        "KubeUpstream",
        [
            FieldDef::new("serviceName", string),
            FieldDef::new("serviceNamespace", string),
            FieldDef::new("servicePort", int),
            FieldDef::new("selector", string_map),
        ],
    )?;
    let kube_upstream_ptr = reg.pointer_to(kube_upstream);

    let host = reg.strukt(
        GLOO,
        "Host",
        [FieldDef::new("addr", string), FieldDef::new("port", int)],
    )?;
    let hosts = reg.list_of(host);
    let static_upstream = reg.strukt(
        GLOO,
        "StaticUpstream",
        [
            FieldDef::new("hosts", hosts),
            FieldDef::new("useTls", boolean),
        ],
    )?;
    let static_upstream_ptr = reg.pointer_to(static_upstream);

    let discovery_metadata = reg.strukt(
        GLOO,
        "DiscoveryMetadata",
        [FieldDef::new("labels", string_map)],
    )?;
    let discovery_metadata_ptr = reg.pointer_to(discovery_metadata);

    let upstream_spec = reg.strukt(
        GLOO,
        "UpstreamSpec",
        [
            FieldDef::new("kube", kube_upstream_ptr),
            FieldDef::new("static", static_upstream_ptr),
            FieldDef::new("discoveryMetadata", discovery_metadata_ptr),
            FieldDef::new("labels", string_map),
        ],
    )?;

    let upstream = reg.strukt(
        GLOO,
        "Upstream",
        [
            FieldDef::embedded(type_meta),
            FieldDef::new("metadata", object_meta_ptr),
            FieldDef::new("spec", upstream_spec),
            FieldDef::new("status", status_ptr),
        ],
    )?;
    let upstreams = reg.list_of(upstream);
    let upstream_list = reg.strukt(
        GLOO,
        "UpstreamList",
        [
            FieldDef::embedded(type_meta),
            FieldDef::new("metadata", list_meta_ptr),
            FieldDef::new("items", upstreams),
        ],
    )?;

    // gateway.solo.io/v1
    let matcher = reg.strukt(
        GATEWAY,
        "Matcher",
        [
            FieldDef::new("prefix", string),
            FieldDef::new("exact", string),
            FieldDef::new("regex", string),
            FieldDef::new("methods", string_list),
            FieldDef::new("headers", string_map),
        ],
    )?;
    let matchers = reg.list_of(matcher);

    let route_action = reg.strukt(
        GATEWAY,
        "RouteAction",
        [FieldDef::new("upstream", resource_ref_ptr)],
    )?;
    let route_action_ptr = reg.pointer_to(route_action);
    let route = reg.strukt(
        GATEWAY,
        "Route",
        [
            FieldDef::new("matchers", matchers),
            FieldDef::new("routeAction", route_action_ptr),
        ],
    )?;
    let routes = reg.list_of(route);

    let virtual_host = reg.strukt(
        GATEWAY,
        "VirtualHost",
        [
            FieldDef::new("domains", string_list),
            FieldDef::new("routes", routes),
        ],
    )?;
    let virtual_host_ptr = reg.pointer_to(virtual_host);

    let ssl_config = reg.strukt(
        GATEWAY,
        "SslConfig",
        [
            FieldDef::new("secretRef", resource_ref_ptr),
            FieldDef::new("sniDomains", string_list),
        ],
    )?;
    let ssl_config_ptr = reg.pointer_to(ssl_config);

    let virtual_service_spec = reg.strukt(
        GATEWAY,
        "VirtualServiceSpec",
        [
            FieldDef::new("virtualHost", virtual_host_ptr),
            FieldDef::new("sslConfig", ssl_config_ptr),
            FieldDef::new("displayName", string),
        ],
    )?;

    let virtual_service = reg.strukt(
        GATEWAY,
        "VirtualService",
        [
            FieldDef::embedded(type_meta),
            FieldDef::new("metadata", object_meta_ptr),
            FieldDef::new("spec", virtual_service_spec),
            FieldDef::new("status", status_ptr),
        ],
    )?;
    let virtual_services = reg.list_of(virtual_service);
    let virtual_service_list = reg.strukt(
        GATEWAY,
        "VirtualServiceList",
        [
            FieldDef::embedded(type_meta),
            FieldDef::new("metadata", list_meta_ptr),
            FieldDef::new("items", virtual_services),
        ],
    )?;

    let config = GeneratorConfig {
        roots: vec![
            (upstream_list, Scope::Namespaced),
            (virtual_service_list, Scope::Namespaced),
        ],
        package_mapping: vec![
            (
                GLOO.to_string(),
                PackageInfo::with_api("io.fabric8.solo.gloo.v1", "gloo.solo.io", "v1"),
            ),
            (
                GATEWAY.to_string(),
                PackageInfo::with_api("io.fabric8.solo.gateway.v1", "gateway.solo.io", "v1"),
            ),
        ],
        provided_packages: vec![
            (META.to_string(), FABRIC8_MODEL.to_string()),
            (CORE.to_string(), FABRIC8_MODEL.to_string()),
            (RESOURCE.to_string(), FABRIC8_MODEL.to_string()),
            (RUNTIME.to_string(), format!("{FABRIC8_MODEL}.runtime")),
        ],
        manual_types: vec![
            (time, "java.lang.String".to_string()),
            (raw_extension, "java.util.Map<String, Object>".to_string()),
            (mutex, "java.util.Map<String, Object>".to_string()),
        ],
        provided_types: Vec::new(),
        constraints: vec![(
            resource_ref,
            "name".to_string(),
            Constraint {
                max_length: Some(63),
                pattern: Some(DNS_LABEL_PATTERN.to_string()),
            },
        )],
        schema_id: "http://solo.io/gloo/v1/GlooSchema#".to_string(),
        root_namespace: "io.fabric8".to_string(),
    };

    Ok((reg, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn gloo_model_generates() {
        let (reg, config) = gloo_model().unwrap();
        let doc = modelgen_schema::generate(&reg, &config).unwrap();
        let json: Value = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["id"], "http://solo.io/gloo/v1/GlooSchema#");
        assert_eq!(json["$module"], "io.fabric8");

        // Both roots surface with their list item references.
        assert_eq!(
            json["properties"]["io.fabric8.solo.gloo.v1.UpstreamList"]["$ref"],
            "#/definitions/io.fabric8.solo.gloo.v1.Upstream"
        );
        assert_eq!(
            json["properties"]["io.fabric8.solo.gateway.v1.VirtualServiceList"]["$ref"],
            "#/definitions/io.fabric8.solo.gateway.v1.VirtualService"
        );

        // Embedded TypeMeta flattens; ObjectMeta stays an external reference.
        let upstream = &json["definitions"]["io.fabric8.solo.gloo.v1.Upstream"];
        assert_eq!(upstream["properties"]["kind"]["type"], "string");
        assert_eq!(
            upstream["properties"]["metadata"]["existingJavaType"],
            "io.fabric8.kubernetes.api.model.ObjectMeta"
        );
        assert_eq!(upstream["apiGroup"], "gloo.solo.io");
        assert_eq!(upstream["apiVersion"], "v1");

        // No definitions generated for provided machinery.
        assert!(doc
            .definitions
            .keys()
            .all(|k| !k.contains("ObjectMeta") && !k.contains("ListMeta")));
    }

    #[test]
    fn generation_is_deterministic() {
        let (reg, config) = gloo_model().unwrap();
        let a = serde_json::to_string(&modelgen_schema::generate(&reg, &config).unwrap()).unwrap();
        let b = serde_json::to_string(&modelgen_schema::generate(&reg, &config).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn name_constraint_lands_on_resource_ref() {
        let (reg, config) = gloo_model().unwrap();
        let doc = modelgen_schema::generate(&reg, &config).unwrap();
        let json: Value = serde_json::to_value(&doc).unwrap();
        let props = &json["definitions"]["io.fabric8.solo.gloo.v1.ResourceRef"]["properties"];
        assert_eq!(props["name"]["maxLength"], 63);
        assert_eq!(props["name"]["pattern"], DNS_LABEL_PATTERN);
        assert!(props["namespace"]["maxLength"].is_null());
    }

    #[test]
    fn recursive_status_map_terminates() {
        let (reg, config) = gloo_model().unwrap();
        let doc = modelgen_schema::generate(&reg, &config).unwrap();
        let json: Value = serde_json::to_value(&doc).unwrap();
        let status = &json["definitions"]["io.fabric8.solo.gloo.v1.Status"];
        assert_eq!(
            status["properties"]["subresourceStatuses"]["additionalProperties"]["$ref"],
            "#/definitions/io.fabric8.solo.gloo.v1.Status"
        );
    }
}
