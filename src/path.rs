//! REST paths of namespaced resources
//!
//! Collection name is computed by lower-casing the kind and appending `s`.
//! Kinds with irregular plurals (`Endpoints`, `Ingress`, `NetworkPolicy`)
//! get paths the API server does not serve, and requests to them fail with
//! 404 or 405.

use crate::{errors::ApplyError, resource::Resource};

/// Returns `/apis` for grouped api versions (`apps/v1`) and `/api` for core (`v1`).
pub fn api_root(api_version: &str) -> &'static str {
    match api_version.find('/') {
        Some(idx) if idx > 0 => "/apis",
        _ => "/api",
    }
}

/// Naive plural form of `kind`.
pub fn plural(kind: &str) -> String {
    format!("{}s", kind.to_lowercase())
}

/// Path of the collection containing `resource`, e.g. `/api/v1/namespaces/default/pods`.
pub fn collection_path(resource: &Resource) -> Result<String, ApplyError> {
    let ns = resource.namespace().ok_or(ApplyError::MissingNamespace)?;
    Ok(format!(
        "{}/{}/namespaces/{}/{}",
        api_root(&resource.api_version),
        resource.api_version,
        ns,
        plural(&resource.kind)
    ))
}

/// Path of the object itself: collection path followed by the name.
pub fn object_path(resource: &Resource) -> Result<String, ApplyError> {
    let collection = collection_path(resource)?;
    let name = resource.name().ok_or(ApplyError::MissingName)?;
    Ok(format!("{}/{}", collection, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn resource(api_version: &str, kind: &str, ns: Option<&str>, name: Option<&str>) -> Resource {
        let mut r = Resource::new(api_version, kind);
        r.metadata.namespace = ns.map(ToString::to_string);
        r.metadata.name = name.map(ToString::to_string);
        r
    }

    #[test]
    fn core_group() {
        let pod = resource("v1", "Pod", Some("default"), Some("x"));
        assert_eq!(
            collection_path(&pod).unwrap(),
            "/api/v1/namespaces/default/pods"
        );
        assert_eq!(
            object_path(&pod).unwrap(),
            "/api/v1/namespaces/default/pods/x"
        );
    }

    #[test]
    fn grouped_version() {
        let deployment = resource("apps/v1", "Deployment", Some("ns1"), None);
        assert_eq!(
            collection_path(&deployment).unwrap(),
            "/apis/apps/v1/namespaces/ns1/deployments"
        );
    }

    #[test]
    fn irregular_plurals_are_not_special_cased() {
        let endpoints = resource("v1", "Endpoints", Some("default"), None);
        assert_eq!(
            collection_path(&endpoints).unwrap(),
            "/api/v1/namespaces/default/endpointss"
        );
        let policy = resource("networking.k8s.io/v1", "NetworkPolicy", Some("a"), None);
        assert_eq!(
            collection_path(&policy).unwrap(),
            "/apis/networking.k8s.io/v1/namespaces/a/networkpolicys"
        );
    }

    #[test]
    fn leading_slash_is_not_a_group() {
        assert_eq!(api_root("/v1"), "/api");
        assert_eq!(api_root("v1"), "/api");
        assert_eq!(api_root("batch/v1"), "/apis");
    }

    #[test]
    fn missing_fields() {
        let no_ns = resource("v1", "Pod", None, Some("x"));
        assert_matches!(collection_path(&no_ns), Err(ApplyError::MissingNamespace));
        let no_name = resource("v1", "Pod", Some("default"), None);
        assert_matches!(object_path(&no_name), Err(ApplyError::MissingName));
    }
}
