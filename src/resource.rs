//! Untyped resource representation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kubernetes-style object: a fixed envelope plus arbitrary payload.
///
/// Only the fields needed to address the object are modelled. Everything
/// else (`spec`, `data`, `status`, labels, ...) lives in `payload` or
/// `metadata.extra` and is sent back to the server unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Either `<group>/<version>` or `<version>` for the core group
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set by the server. Must be current when the object is replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    pub fn new(api_version: &str, kind: &str) -> Self {
        Resource {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata: Metadata::default(),
            payload: Map::new(),
        }
    }

    /// Converts typed object (e.g. `ConfigMap`) into untyped representation.
    pub fn from_object<K: k8s_openapi::Resource + Serialize>(
        object: &K,
    ) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(object)?)
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ns) = self.namespace() {
            write!(f, " {}/", ns)?;
        } else {
            write!(f, " ")?;
        }
        write!(f, "{}", self.name().unwrap_or("<unnamed>"))
    }
}
