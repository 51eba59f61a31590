//! Request-facing read path
//!
//! `WorkspacePipeline` runs retrieval, parsing, validation, runtime assembly,
//! conversion and composition. `WorkspaceAccessor` either runs it once at
//! startup (eager) or on every request (lazy).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use che_rest_common::{Error, Result};

use crate::composer::{compose, ensure_default_environment};
use crate::config::ServiceConfig;
use crate::devfile::{
    parse_devfile, DefaultDevfileConverter, DevfileConverter, DevfileValidator,
    IntegrityValidator,
};
use crate::lister::ClusterObjectLister;
use crate::model::{Runtime, Workspace};
use crate::retriever::{DevfileRetriever, WorkspaceResourceSource};
use crate::runtime::RuntimeAssembler;

/// When the workspace view is computed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessMode {
    /// Once at startup; any failure aborts startup
    Eager,
    /// On every request
    #[default]
    Lazy,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Eager => write!(f, "eager"),
            AccessMode::Lazy => write!(f, "lazy"),
        }
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "eager" => Ok(AccessMode::Eager),
            "lazy" => Ok(AccessMode::Lazy),
            other => Err(format!(
                "unknown access mode '{other}' (expected 'eager' or 'lazy')"
            )),
        }
    }
}

/// Parse a pre-computed runtime written by the workspace controller
pub fn parse_runtime(text: &str) -> Result<Runtime> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::malformed("runtime", e.to_string()))?;
    if !value.is_object() {
        return Err(Error::malformed("runtime", "expected a JSON object"));
    }
    serde_json::from_value(value).map_err(|e| Error::malformed("runtime", e.to_string()))
}

/// The full assembly pipeline for the configured workspace
pub struct WorkspacePipeline {
    config: ServiceConfig,
    retriever: DevfileRetriever,
    assembler: RuntimeAssembler,
    validator: Arc<dyn DevfileValidator>,
    converter: Arc<dyn DevfileConverter>,
}

impl WorkspacePipeline {
    /// Pipeline with the integrity validator and default converter
    pub fn new(
        config: ServiceConfig,
        source: Arc<dyn WorkspaceResourceSource>,
        lister: Arc<dyn ClusterObjectLister>,
    ) -> Self {
        Self {
            retriever: DevfileRetriever::new(source, config.devfile_schema),
            assembler: RuntimeAssembler::new(lister, config.server_names),
            validator: Arc::new(IntegrityValidator),
            converter: Arc::new(DefaultDevfileConverter),
            config,
        }
    }

    /// Replace the devfile validator
    pub fn with_validator(mut self, validator: Arc<dyn DevfileValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the devfile converter
    pub fn with_converter(mut self, converter: Arc<dyn DevfileConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Configuration the pipeline runs with
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Build the workspace view from current cluster state
    #[instrument(skip(self), fields(workspace_id = %self.config.identity.id()))]
    pub async fn assemble(&self) -> Result<Workspace> {
        let identity = &self.config.identity;
        let retrieved = self.retriever.retrieve(identity).await?;

        let devfile = parse_devfile(&retrieved.devfile)?;
        for warning in self.validator.validate(&devfile) {
            warn!(%warning, "devfile integrity problem");
        }

        let runtime = match retrieved.runtime.as_deref() {
            Some(text) => parse_runtime(text)?,
            None => {
                self.assembler
                    .assemble(identity.id(), identity.namespace())
                    .await?
            }
        };

        let mut workspace_config = self.converter.convert(&devfile)?;
        if self.config.default_environment {
            ensure_default_environment(&mut workspace_config);
        }

        Ok(compose(identity, devfile, workspace_config, Some(runtime)))
    }
}

/// Serves the single configured workspace
pub enum WorkspaceAccessor {
    /// Workspace computed at startup
    Eager {
        /// Configured workspace id
        id: String,
        /// The memoized view
        workspace: Arc<Workspace>,
    },
    /// Workspace recomputed per request
    Lazy {
        /// Pipeline run on each request
        pipeline: WorkspacePipeline,
    },
}

impl WorkspaceAccessor {
    /// Prepare the accessor; eager mode assembles now and fails on any error
    pub async fn initialize(mode: AccessMode, pipeline: WorkspacePipeline) -> Result<Self> {
        let id = pipeline.config().identity.id().to_string();
        match mode {
            AccessMode::Eager => {
                let workspace = pipeline.assemble().await?;
                info!(workspace_id = %id, "workspace assembled at startup");
                Ok(WorkspaceAccessor::Eager {
                    id,
                    workspace: Arc::new(workspace),
                })
            }
            AccessMode::Lazy => {
                info!(workspace_id = %id, "workspace will be assembled per request");
                Ok(WorkspaceAccessor::Lazy { pipeline })
            }
        }
    }

    /// Id of the served workspace
    pub fn workspace_id(&self) -> &str {
        match self {
            WorkspaceAccessor::Eager { id, .. } => id,
            WorkspaceAccessor::Lazy { pipeline } => pipeline.config().identity.id(),
        }
    }

    /// The workspace view, or `NotFound` for any other id
    pub async fn get_workspace(&self, id: &str) -> Result<Workspace> {
        if id != self.workspace_id() {
            return Err(Error::not_found(
                "workspace",
                format!("this service only serves workspace {}", self.workspace_id()),
            ));
        }

        match self {
            WorkspaceAccessor::Eager { workspace, .. } => Ok(workspace.as_ref().clone()),
            WorkspaceAccessor::Lazy { pipeline } => pipeline.assemble().await,
        }
    }
}
