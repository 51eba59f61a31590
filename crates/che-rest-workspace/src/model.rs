//! Workspace representation served to clients
//!
//! Field names follow the Che workspace REST model so existing IDE clients can
//! consume the JSON unchanged. Maps are `BTreeMap` so repeated assembly over
//! unchanged input serializes identically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::devfile::Devfile;

/// Name of the environment every runtime is reported under
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Owner and account name used for every served workspace
pub const ANONYMOUS: &str = "anonymous";

// =============================================================================
// Runtime
// =============================================================================

/// Lifecycle status of a machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MachineStatus {
    /// Machine is being created
    Starting,
    /// Machine is up
    #[default]
    Running,
    /// Machine was stopped
    Stopped,
    /// Machine failed to start
    Failed,
}

/// Reachability status of a server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerStatus {
    /// Server answers
    Running,
    /// Server is down
    Stopped,
    /// Nobody checked
    #[default]
    Unknown,
}

/// Endpoint exposed by a machine
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Externally reachable URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Reachability status
    #[serde(default)]
    pub status: ServerStatus,
    /// Free-form attributes (`port`, `type`, `secure`, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Logical compute unit of a running workspace
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Attributes taken from `org.eclipse.che.machine.*` annotations
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Servers keyed by server name
    #[serde(default)]
    pub servers: BTreeMap<String, Server>,
    /// Lifecycle status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MachineStatus>,
}

/// Command contributed by the runtime (e.g., by a plugin)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Command name
    pub name: String,
    /// Command type (e.g., "exec")
    #[serde(rename = "type")]
    pub type_: String,
    /// Command line to run
    #[serde(default)]
    pub command_line: String,
    /// Extra attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Warning reported alongside a runtime
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeWarning {
    /// Numeric warning code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<f64>,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Live view of a workspace: its machines and their servers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    /// Environment the runtime was started from
    #[serde(default)]
    pub active_env: String,
    /// Machines keyed by machine name
    #[serde(default)]
    pub machines: BTreeMap<String, Machine>,
    /// Owner of the runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Token for machine-level authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_token: Option<String>,
    /// Commands contributed at runtime
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
    /// Warnings raised while starting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RuntimeWarning>,
}

impl Runtime {
    /// Runtime of the default environment owned by the anonymous user
    pub fn from_machines(machines: BTreeMap<String, Machine>) -> Self {
        Self {
            active_env: DEFAULT_ENVIRONMENT.to_string(),
            machines,
            owner: Some(ANONYMOUS.to_string()),
            ..Default::default()
        }
    }
}

// =============================================================================
// Workspace configuration (converted from the devfile)
// =============================================================================

/// Recipe an environment is created from
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Recipe type (e.g., "kubernetes", "openshift")
    #[serde(rename = "type")]
    pub type_: String,
    /// MIME type of `content`
    pub content_type: String,
    /// Inline recipe content
    pub content: String,
}

/// Server declared by a machine configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port in `<n>/<protocol>` form
    pub port: String,
    /// Application protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Default path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Extra attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Machine declared by an environment
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Machine attributes (e.g., `memoryLimitBytes`)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Servers keyed by endpoint name
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    /// Environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Named environment of a workspace configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Recipe the environment is created from
    pub recipe: Recipe,
    /// Machines keyed by name
    #[serde(default)]
    pub machines: BTreeMap<String, MachineConfig>,
}

/// Where project sources come from
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceStorage {
    /// Source type (e.g., "git", "zip")
    #[serde(rename = "type")]
    pub type_: String,
    /// Source location
    pub location: String,
    /// Branch, tag, commit and similar parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// Project imported into the workspace
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,
    /// Path under the projects root
    pub path: String,
    /// Source location
    pub source: SourceStorage,
}

/// Workspace configuration derived from the devfile
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Workspace name
    pub name: String,
    /// Environment started by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_env: Option<String>,
    /// Environments keyed by name
    #[serde(default)]
    pub environments: BTreeMap<String, Environment>,
    /// Projects
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
    /// Commands
    #[serde(default)]
    pub commands: Vec<Command>,
    /// Attributes (`editor`, `plugins`, `persistVolumes`, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

// =============================================================================
// Workspace
// =============================================================================

/// Account owning a workspace
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account id
    pub id: String,
    /// Account name
    pub name: String,
    /// Account type
    #[serde(rename = "type")]
    pub type_: String,
}

impl Account {
    /// The account every served workspace belongs to
    pub fn anonymous() -> Self {
        Self {
            id: ANONYMOUS.to_string(),
            name: ANONYMOUS.to_string(),
            type_: ANONYMOUS.to_string(),
        }
    }
}

/// Workspace lifecycle status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkspaceStatus {
    /// Workspace is starting
    Starting,
    /// Workspace is running
    #[default]
    Running,
    /// Workspace is stopping
    Stopping,
    /// Workspace is stopped
    Stopped,
}

/// The assembled workspace returned by the API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Workspace id
    pub id: String,
    /// Configuration converted from the devfile
    pub config: WorkspaceConfig,
    /// The devfile as stored in the custom resource
    pub devfile: Devfile,
    /// Owning account
    pub account: Account,
    /// Workspace attributes
    pub attributes: BTreeMap<String, String>,
    /// Whether the workspace is temporary
    pub temporary: bool,
    /// Live runtime, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Runtime>,
    /// Lifecycle status
    pub status: WorkspaceStatus,
}
