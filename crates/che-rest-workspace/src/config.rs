//! Process configuration for the served workspace
//!
//! The bootstrap reads these values once; everything downstream receives an
//! immutable `ServiceConfig` instead of consulting the environment.

use std::time::Duration;

use che_rest_common::{Error, Result, DEFAULT_WORKSPACE_CRD_VERSION};

use crate::annotations::ServerNameMode;
use crate::devfile::DevfileSchema;

/// Default deadline for each cluster listing call
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity of the single workspace this process serves
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceIdentity {
    id: String,
    name: String,
    namespace: String,
}

impl WorkspaceIdentity {
    /// Build an identity, rejecting empty components
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        let identity = Self {
            id: id.into(),
            name: name.into(),
            namespace: namespace.into(),
        };
        for (field, value) in [
            ("workspace id", &identity.id),
            ("workspace name", &identity.name),
            ("workspace namespace", &identity.namespace),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config_for_field(field, format!("{field} must be set")));
            }
        }
        Ok(identity)
    }

    /// Workspace id, as carried by the `che.workspace_id` label
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the workspace custom resource
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace holding the custom resource and the workspace objects
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Complete configuration of the assembly pipeline
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Which workspace is served
    pub identity: WorkspaceIdentity,
    /// Version of the workspace CRD to read
    pub crd_version: String,
    /// Devfile schema revision stored in the custom resource
    pub devfile_schema: DevfileSchema,
    /// How server names are derived from Ingress names
    pub server_names: ServerNameMode,
    /// Deadline for each Service/Ingress listing page
    pub list_timeout: Duration,
    /// Inject a placeholder environment when conversion yields none
    pub default_environment: bool,
}

impl ServiceConfig {
    /// Configuration with defaults for everything but the identity
    pub fn new(identity: WorkspaceIdentity) -> Self {
        Self {
            identity,
            crd_version: DEFAULT_WORKSPACE_CRD_VERSION.to_string(),
            devfile_schema: DevfileSchema::default(),
            server_names: ServerNameMode::default(),
            list_timeout: DEFAULT_LIST_TIMEOUT,
            default_environment: true,
        }
    }

    /// Override the CRD version, rejecting an empty value
    pub fn with_crd_version(mut self, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(Error::config_for_field(
                "crd version",
                "crd version must not be empty",
            ));
        }
        self.crd_version = version;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_accessors() {
        let identity = WorkspaceIdentity::new("ws-1", "petclinic", "che").unwrap();
        assert_eq!(identity.id(), "ws-1");
        assert_eq!(identity.name(), "petclinic");
        assert_eq!(identity.namespace(), "che");
    }

    #[test]
    fn test_identity_rejects_missing_parts() {
        for (id, name, ns, field) in [
            ("", "n", "ns", "workspace id"),
            ("id", " ", "ns", "workspace name"),
            ("id", "n", "", "workspace namespace"),
        ] {
            match WorkspaceIdentity::new(id, name, ns) {
                Err(Error::Config { field: Some(f), .. }) => assert_eq!(f, field),
                other => panic!("expected config error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = ServiceConfig::new(WorkspaceIdentity::new("id", "n", "ns").unwrap());
        assert_eq!(config.crd_version, "v1alpha1");
        assert_eq!(config.devfile_schema, DevfileSchema::V1);
        assert_eq!(config.server_names, ServerNameMode::Prefix);
        assert_eq!(config.list_timeout, DEFAULT_LIST_TIMEOUT);
        assert!(config.default_environment);
    }

    #[test]
    fn test_crd_version_override() {
        let config = ServiceConfig::new(WorkspaceIdentity::new("id", "n", "ns").unwrap());
        let config = config.with_crd_version("v1beta1").unwrap();
        assert_eq!(config.crd_version, "v1beta1");
        assert!(config.with_crd_version("").is_err());
    }
}
