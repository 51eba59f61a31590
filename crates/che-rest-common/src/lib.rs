//! Common types for che-rest-apis: errors, telemetry and Kubernetes helpers

#![deny(missing_docs)]

pub mod error;
pub mod kube_utils;
pub mod telemetry;
pub mod yaml;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group of the workspace custom resource
pub const WORKSPACE_CRD_GROUP: &str = "workspace.che.eclipse.org";

/// Kind of the workspace custom resource
pub const WORKSPACE_CRD_KIND: &str = "Workspace";

/// Plural resource name of the workspace custom resource
pub const WORKSPACE_CRD_PLURAL: &str = "workspaces";

/// CRD version used when none is configured
pub const DEFAULT_WORKSPACE_CRD_VERSION: &str = "v1alpha1";

/// Label carried by every cluster object belonging to a workspace
pub const WORKSPACE_ID_LABEL: &str = "che.workspace_id";

/// Annotation naming the machine a Service or Ingress belongs to
pub const MACHINE_NAME_ANNOTATION: &str = "org.eclipse.che.machine.name";

/// Prefix of annotations copied into machine attributes
pub const MACHINE_ANNOTATION_PREFIX: &str = "org.eclipse.che.machine.";

/// Annotation holding the protocol used to build a server URL
pub const SERVER_PROTOCOL_ANNOTATION: &str = "org.eclipse.che.server.protocol";

/// Annotation holding a JSON object of extra server attributes
pub const SERVER_ATTRIBUTES_ANNOTATION: &str = "org.eclipse.che.server.attributes";

/// Annotation holding the server port, optionally suffixed with `/<protocol>`
pub const SERVER_PORT_ANNOTATION: &str = "org.eclipse.che.server.port";

/// Key under `status.additionalFields` holding a pre-computed runtime
pub const RUNTIME_ADDITIONAL_FIELD: &str = "org.eclipse.che.workspace/runtime";
