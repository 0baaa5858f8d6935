use crate::{
    client::{ApiResponse, ApplyClient},
    errors::ApplyError,
    path,
    resource::Resource,
};
use http::StatusCode;

impl ApplyClient {
    /// Creates `resource`, or replaces it if it already exists.
    ///
    /// Creation is attempted first. Only `409 Conflict` triggers the update
    /// path: the stored object is fetched, its `resourceVersion` is copied
    /// into `resource` and the result is `PUT` back. Every other response
    /// is returned unchanged.
    ///
    /// Nothing is retried: if the object changes between the `GET` and the
    /// `PUT`, the server's `409` from the `PUT` is returned as is.
    #[tracing::instrument(skip_all, fields(resource = %resource))]
    pub async fn apply_object(&self, resource: &mut Resource) -> Result<ApiResponse, ApplyError> {
        let collection = path::collection_path(resource)?;
        let created = self.post(&collection, &*resource).await?;
        if created.status() != StatusCode::CONFLICT {
            return Ok(created);
        }

        let object_path = path::object_path(resource)?;
        let current = self.get(&object_path).await?;
        if current.status() != StatusCode::OK {
            let body = serde_json::to_string_pretty(&current.data).map_err(ApplyError::Serialize)?;
            return Err(ApplyError::ConflictResolution {
                status: current.status_code,
                body,
            });
        }
        resource.metadata.resource_version = current
            .data
            .pointer("/metadata/resourceVersion")
            .and_then(|v| v.as_str())
            .map(ToString::to_string);

        self.put(&object_path, &*resource).await
    }

    /// Deletes object named by `resource`. Does not check that it exists.
    #[tracing::instrument(skip_all, fields(resource = %resource))]
    pub async fn delete_object(&self, resource: &Resource) -> Result<ApiResponse, ApplyError> {
        let object_path = path::object_path(resource)?;
        self.delete(&object_path).await
    }
}

/// Utility for applying objects which may lack a namespace
#[derive(Debug, Clone)]
pub struct Applier {
    client: ApplyClient,
    default_namespace: String,
}

impl Applier {
    pub fn new(client: ApplyClient, default_namespace: &str) -> Self {
        Applier {
            client,
            default_namespace: default_namespace.to_string(),
        }
    }

    pub fn client(&self) -> &ApplyClient {
        &self.client
    }

    fn fill_namespace(&self, resource: &mut Resource) {
        resource
            .metadata
            .namespace
            .get_or_insert_with(|| self.default_namespace.clone());
    }

    /// Applies a resource, placing it into default namespace if it has none
    pub async fn apply(&self, resource: &mut Resource) -> Result<ApiResponse, ApplyError> {
        self.fill_namespace(resource);
        self.client.apply_object(resource).await
    }

    /// Deletes a resource, looking it up in default namespace if it has none
    pub async fn delete(&self, resource: &mut Resource) -> Result<ApiResponse, ApplyError> {
        self.fill_namespace(resource);
        self.client.delete_object(resource).await
    }
}
