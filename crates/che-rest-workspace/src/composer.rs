//! Final assembly of the served `Workspace`

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::WorkspaceIdentity;
use crate::devfile::Devfile;
use crate::model::{
    Account, Environment, Recipe, Runtime, Workspace, WorkspaceConfig, WorkspaceStatus,
    DEFAULT_ENVIRONMENT,
};

/// Recipe type of the placeholder environment
pub const PLACEHOLDER_RECIPE_TYPE: &str = "kubernetes";

/// Content type of the placeholder environment recipe
pub const PLACEHOLDER_RECIPE_CONTENT_TYPE: &str = "application/x-yaml";

/// Give a configuration with no environments an empty `default` one.
///
/// Some plugin-only devfiles convert to zero environments, which IDE clients
/// cannot start. Returns whether the placeholder was added.
pub fn ensure_default_environment(config: &mut WorkspaceConfig) -> bool {
    if !config.environments.is_empty() {
        return false;
    }

    config.environments.insert(
        DEFAULT_ENVIRONMENT.to_string(),
        Environment {
            recipe: Recipe {
                type_: PLACEHOLDER_RECIPE_TYPE.to_string(),
                content_type: PLACEHOLDER_RECIPE_CONTENT_TYPE.to_string(),
                content: String::new(),
            },
            machines: BTreeMap::new(),
        },
    );
    config.default_env = Some(DEFAULT_ENVIRONMENT.to_string());
    debug!("configuration had no environments, added placeholder");
    true
}

/// Merge identity, devfile, converted configuration and runtime.
///
/// The workspace is always reported RUNNING and owned by the anonymous account.
pub fn compose(
    identity: &WorkspaceIdentity,
    devfile: Devfile,
    config: WorkspaceConfig,
    runtime: Option<Runtime>,
) -> Workspace {
    Workspace {
        id: identity.id().to_string(),
        config,
        devfile,
        account: Account::anonymous(),
        attributes: BTreeMap::new(),
        temporary: false,
        runtime,
        status: WorkspaceStatus::Running,
    }
}
