//! Shared Kubernetes utilities using kube-rs

use std::path::Path;
use std::time::Duration;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, GroupVersionKind};
use kube::{Client, Config};
use tracing::debug;

use crate::{Error, WORKSPACE_CRD_GROUP, WORKSPACE_CRD_KIND, WORKSPACE_CRD_PLURAL, WORKSPACE_ID_LABEL};

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a kube client from optional kubeconfig path with default timeouts
pub async fn create_client(kubeconfig: Option<&Path>) -> Result<Client, Error> {
    create_client_with_timeout(kubeconfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT).await
}

/// Create a kube client from optional kubeconfig path with custom timeouts
///
/// Without a path the configuration is inferred: `KUBECONFIG` (possibly a
/// colon-separated list) or `~/.kube/config`, then the in-cluster service
/// account.
pub async fn create_client_with_timeout(
    kubeconfig: Option<&Path>,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, Error> {
    let mut config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::internal_with_context(
                    "create_client",
                    format!("failed to read kubeconfig {}: {}", path.display(), e),
                )
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    Error::internal_with_context(
                        "create_client",
                        format!("failed to load kubeconfig: {}", e),
                    )
                })?
        }
        None => Config::infer().await.map_err(|e| {
            Error::internal_with_context("create_client", format!("failed to infer config: {}", e))
        })?,
    };
    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);
    debug!(cluster_url = %config.cluster_url, default_namespace = %config.default_namespace, "kube client configured");
    Client::try_from(config).map_err(|e| {
        Error::internal_with_context("create_client", format!("failed to create client: {}", e))
    })
}

/// Label selector matching every object that belongs to a workspace.
///
/// The spaced form is what the workspace controller has always queried with;
/// the API server treats it the same as `che.workspace_id=<id>`.
pub fn workspace_id_selector(workspace_id: &str) -> String {
    format!("{} = {}", WORKSPACE_ID_LABEL, workspace_id)
}

/// ApiResource for the `workspaces` custom resource at the given version
pub fn workspace_api_resource(version: &str) -> ApiResource {
    let gvk = GroupVersionKind::gvk(WORKSPACE_CRD_GROUP, version, WORKSPACE_CRD_KIND);
    ApiResource::from_gvk_with_plural(&gvk, WORKSPACE_CRD_PLURAL)
}
