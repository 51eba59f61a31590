//! Discovery of the Services and Ingresses that run a workspace
//!
//! Listing is best-effort: a failed or timed-out call is logged and reported
//! as an empty result so the runtime view degrades instead of failing.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, ListParams, ObjectList};
use kube::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::DEFAULT_LIST_TIMEOUT;

/// Page size requested from the API server
pub const LIST_PAGE_SIZE: u32 = 1000;

/// Lists the cluster objects labelled for a workspace
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterObjectLister: Send + Sync {
    /// All Services in `namespace` matching `selector`; empty on failure
    async fn list_services(&self, namespace: &str, selector: &str) -> Vec<Service>;

    /// All Ingresses in `namespace` matching `selector`; empty on failure
    async fn list_ingresses(&self, namespace: &str, selector: &str) -> Vec<Ingress>;
}

/// Lister backed by the Kubernetes API
pub struct KubeObjectLister {
    client: Client,
    timeout: Duration,
}

impl KubeObjectLister {
    /// Create a lister with the default per-page timeout
    pub fn new(client: Client) -> Self {
        Self::with_timeout(client, DEFAULT_LIST_TIMEOUT)
    }

    /// Create a lister with a custom per-page timeout
    pub fn with_timeout(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn list_all<K>(&self, namespace: &str, selector: &str) -> Vec<K>
    where
        K: kube::Resource<Scope = kube::core::NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let api = &api;
        let kind = K::kind(&K::DynamicType::default()).to_string();

        list_or_empty(
            &kind,
            namespace,
            selector,
            self.timeout,
            move |params| async move { api.list(&params).await },
        )
        .await
    }
}

/// Drain a listing, logging and returning nothing if any page fails
async fn list_or_empty<K, F, Fut>(
    kind: &str,
    namespace: &str,
    selector: &str,
    timeout: Duration,
    fetch: F,
) -> Vec<K>
where
    F: FnMut(ListParams) -> Fut,
    K: Clone,
    Fut: Future<Output = kube::Result<ObjectList<K>>>,
{
    match drain_pages(fetch, selector, timeout).await {
        Ok(items) => {
            debug!(%kind, %namespace, %selector, count = items.len(), "listed workspace objects");
            items
        }
        Err(reason) => {
            warn!(%kind, %namespace, %selector, error = %reason, "listing failed, continuing without these objects");
            Vec::new()
        }
    }
}

/// Follow `continue` tokens until the listing is exhausted.
///
/// Each call to `fetch` gets its own `timeout`.
async fn drain_pages<K, F, Fut>(mut fetch: F, selector: &str, timeout: Duration) -> Result<Vec<K>, String>
where
    F: FnMut(ListParams) -> Fut,
    K: Clone,
    Fut: Future<Output = kube::Result<ObjectList<K>>>,
{
    let mut items = Vec::new();
    let mut continue_token: Option<String> = None;

    loop {
        let mut params = ListParams::default()
            .labels(selector)
            .limit(LIST_PAGE_SIZE);
        if let Some(token) = continue_token.take() {
            params = params.continue_token(&token);
        }

        let page = tokio::time::timeout(timeout, fetch(params))
            .await
            .map_err(|_| format!("timed out after {}s", timeout.as_secs_f64()))?
            .map_err(|e| e.to_string())?;

        let next = page.metadata.continue_;
        items.extend(page.items);

        match next {
            Some(token) if !token.is_empty() => continue_token = Some(token),
            _ => return Ok(items),
        }
    }
}

#[async_trait]
impl ClusterObjectLister for KubeObjectLister {
    async fn list_services(&self, namespace: &str, selector: &str) -> Vec<Service> {
        self.list_all::<Service>(namespace, selector).await
    }

    async fn list_ingresses(&self, namespace: &str, selector: &str) -> Vec<Ingress> {
        self.list_all::<Ingress>(namespace, selector).await
    }
}
