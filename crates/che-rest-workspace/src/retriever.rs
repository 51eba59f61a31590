//! Reads the workspace custom resource
//!
//! The devfile subtree is normalized and rendered to canonical YAML so the
//! parser never sees the custom-resource shape. The pre-computed runtime blob,
//! when a controller has written one, is handed back untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use kube::api::{Api, DynamicObject};
use kube::core::ApiResource;
use kube::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

use che_rest_common::kube_utils::workspace_api_resource;
use che_rest_common::yaml::to_yaml_string;
use che_rest_common::{Error, Result, RUNTIME_ADDITIONAL_FIELD};

use crate::config::WorkspaceIdentity;
use crate::devfile::DevfileSchema;

/// The parts of a workspace custom resource this service reads
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct WorkspaceResource {
    /// `spec`
    #[serde(default)]
    pub spec: Option<WorkspaceResourceSpec>,
    /// `status`
    #[serde(default)]
    pub status: Option<WorkspaceResourceStatus>,
}

/// `spec` of the workspace custom resource
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct WorkspaceResourceSpec {
    /// Raw devfile subtree
    #[serde(default)]
    pub devfile: Option<Value>,
}

/// `status` of the workspace custom resource
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceResourceStatus {
    /// Free-form fields written by the workspace controller
    #[serde(default)]
    pub additional_fields: BTreeMap<String, String>,
}

impl WorkspaceResource {
    /// Canonical YAML of the devfile subtree after schema normalization
    pub fn devfile_text(&self, schema: DevfileSchema) -> Result<String> {
        let devfile = self
            .spec
            .as_ref()
            .and_then(|spec| spec.devfile.as_ref())
            .filter(|devfile| !devfile.is_null())
            .ok_or_else(|| Error::not_found("devfile", "custom resource has no spec.devfile"))?;

        to_yaml_string(&schema.normalize(devfile.clone()))
            .map_err(|e| Error::malformed("devfile", e.to_string()))
    }

    /// Pre-computed runtime JSON, if present and non-blank
    pub fn runtime_text(&self) -> Option<&str> {
        self.status
            .as_ref()?
            .additional_fields
            .get(RUNTIME_ADDITIONAL_FIELD)
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }
}

/// Source of workspace custom resources
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkspaceResourceSource: Send + Sync {
    /// Fetch the named resource; `None` when it does not exist
    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<WorkspaceResource>>;
}

/// Reads `workspaces.workspace.che.eclipse.org` through the Kubernetes API
pub struct KubeWorkspaceSource {
    client: Client,
    resource: ApiResource,
}

impl KubeWorkspaceSource {
    /// Source reading the given CRD version
    pub fn new(client: Client, crd_version: &str) -> Self {
        Self {
            client,
            resource: workspace_api_resource(crd_version),
        }
    }
}

#[async_trait]
impl WorkspaceResourceSource for KubeWorkspaceSource {
    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<WorkspaceResource>> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &self.resource);

        let Some(object) = api.get_opt(name).await? else {
            return Ok(None);
        };

        serde_json::from_value(object.data)
            .map(Some)
            .map_err(|e| Error::malformed("workspace custom resource", e.to_string()))
    }
}

/// Text pulled out of one read of the custom resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievedWorkspace {
    /// Canonical devfile YAML
    pub devfile: String,
    /// Pre-computed runtime JSON, when a controller wrote one
    pub runtime: Option<String>,
}

/// Fetches and extracts the devfile (and runtime blob) for a workspace
pub struct DevfileRetriever {
    source: Arc<dyn WorkspaceResourceSource>,
    schema: DevfileSchema,
}

impl DevfileRetriever {
    /// Create a retriever normalizing with `schema`
    pub fn new(source: Arc<dyn WorkspaceResourceSource>, schema: DevfileSchema) -> Self {
        Self { source, schema }
    }

    /// Read the custom resource once and extract both texts
    #[instrument(skip(self, identity), fields(workspace = %identity.name(), namespace = %identity.namespace()))]
    pub async fn retrieve(&self, identity: &WorkspaceIdentity) -> Result<RetrievedWorkspace> {
        let resource = self
            .source
            .fetch(identity.namespace(), identity.name())
            .await?
            .ok_or_else(|| {
                Error::not_found(
                    "workspace custom resource",
                    format!("{}/{}", identity.namespace(), identity.name()),
                )
            })?;

        let devfile = resource.devfile_text(self.schema)?;
        let runtime = resource.runtime_text().map(str::to_string);
        debug!(
            schema = %self.schema,
            precomputed_runtime = runtime.is_some(),
            "retrieved devfile"
        );

        Ok(RetrievedWorkspace { devfile, runtime })
    }

    /// Canonical devfile YAML only
    pub async fn fetch_devfile_text(&self, identity: &WorkspaceIdentity) -> Result<String> {
        Ok(self.retrieve(identity).await?.devfile)
    }

    /// Pre-computed runtime JSON only
    pub async fn fetch_runtime_text(&self, identity: &WorkspaceIdentity) -> Result<Option<String>> {
        Ok(self.retrieve(identity).await?.runtime)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use che_rest_common::yaml::parse_yaml;
    use mockall::predicate::eq;
    use serde_json::json;

    pub(crate) fn resource(data: Value) -> WorkspaceResource {
        serde_json::from_value(data).unwrap()
    }

    fn identity() -> WorkspaceIdentity {
        WorkspaceIdentity::new("ws1", "petclinic", "che").unwrap()
    }

    fn source_returning(found: Option<WorkspaceResource>) -> Arc<dyn WorkspaceResourceSource> {
        let mut source = MockWorkspaceResourceSource::new();
        source
            .expect_fetch()
            .with(eq("che"), eq("petclinic"))
            .returning(move |_, _| Ok(found.clone()));
        Arc::new(source)
    }

    // =========================================================================
    // Resource extraction
    // =========================================================================

    #[test]
    fn test_devfile_text_renders_subtree() {
        let res = resource(json!({
            "spec": {"devfile": {"apiVersion": "1.0.0", "metadata": {"name": "petclinic"}}}
        }));
        let text = res.devfile_text(DevfileSchema::V1).unwrap();
        let reparsed = parse_yaml(&text).unwrap();
        assert_eq!(reparsed["metadata"]["name"], "petclinic");
        assert_eq!(reparsed["apiVersion"], "1.0.0");
    }

    #[test]
    fn test_devfile_text_applies_schema() {
        let res = resource(json!({
            "spec": {"devfile": {"apiVersion": "1.0.0", "metadata": {"name": "petclinic"}}}
        }));
        let text = res.devfile_text(DevfileSchema::V1LegacyMetadata).unwrap();
        let reparsed = parse_yaml(&text).unwrap();
        assert_eq!(reparsed["name"], "petclinic");
        assert_eq!(reparsed["specVersion"], "1.0.0");
        assert!(reparsed.get("apiVersion").is_none());
    }

    #[test]
    fn test_missing_devfile_is_not_found() {
        for data in [json!({}), json!({"spec": {}}), json!({"spec": {"devfile": null}})] {
            let err = resource(data).devfile_text(DevfileSchema::V1).unwrap_err();
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn test_runtime_text() {
        let res = resource(json!({
            "status": {"additionalFields": {RUNTIME_ADDITIONAL_FIELD: "{\"activeEnv\":\"default\"}"}}
        }));
        assert_eq!(res.runtime_text(), Some("{\"activeEnv\":\"default\"}"));

        let blank = resource(json!({
            "status": {"additionalFields": {RUNTIME_ADDITIONAL_FIELD: "  "}}
        }));
        assert_eq!(blank.runtime_text(), None);
        assert_eq!(resource(json!({})).runtime_text(), None);
    }

    // =========================================================================
    // Retriever
    // =========================================================================

    #[tokio::test]
    async fn story_missing_resource_is_not_found() {
        let retriever = DevfileRetriever::new(source_returning(None), DevfileSchema::V1);
        let err = retriever.retrieve(&identity()).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("che/petclinic"));
    }

    #[tokio::test]
    async fn story_retrieve_returns_devfile_and_runtime() {
        let res = resource(json!({
            "spec": {"devfile": {"metadata": {"name": "petclinic"}}},
            "status": {"additionalFields": {RUNTIME_ADDITIONAL_FIELD: "{}"}}
        }));
        let retriever = DevfileRetriever::new(source_returning(Some(res)), DevfileSchema::V1);

        let retrieved = retriever.retrieve(&identity()).await.unwrap();
        assert!(retrieved.devfile.contains("petclinic"));
        assert_eq!(retrieved.runtime.as_deref(), Some("{}"));

        assert!(retriever
            .fetch_devfile_text(&identity())
            .await
            .unwrap()
            .contains("petclinic"));
        assert_eq!(
            retriever.fetch_runtime_text(&identity()).await.unwrap(),
            Some("{}".to_string())
        );
    }

    #[tokio::test]
    async fn story_source_errors_propagate() {
        let mut source = MockWorkspaceResourceSource::new();
        source
            .expect_fetch()
            .returning(|_, _| Err(Error::internal("connection refused")));
        let retriever = DevfileRetriever::new(Arc::new(source), DevfileSchema::V1);

        let err = retriever.retrieve(&identity()).await.unwrap_err();
        assert_eq!(err.kind(), "internal");
    }
}
