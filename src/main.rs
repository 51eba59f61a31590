//! che-rest-apis - serves one Che workspace assembled from its custom resource

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use che_rest_api::server::{shutdown_signal, start_server};
use che_rest_common::kube_utils::create_client;
use che_rest_common::telemetry::{init_telemetry, TelemetryConfig};
use che_rest_common::DEFAULT_WORKSPACE_CRD_VERSION;
use che_rest_workspace::annotations::ServerNameMode;
use che_rest_workspace::devfile::DevfileSchema;
use che_rest_workspace::{
    AccessMode, KubeObjectLister, KubeWorkspaceSource, ServiceConfig, WorkspaceAccessor,
    WorkspaceIdentity, WorkspacePipeline,
};

/// Workspace REST API for IDE clients
#[derive(Parser, Debug)]
#[command(name = "che-rest-apis", version, about, long_about = None)]
struct Cli {
    /// Id of the served workspace (value of the `che.workspace_id` label)
    #[arg(long, env = "CHE_WORKSPACE_ID")]
    workspace_id: String,

    /// Name of the workspace custom resource
    #[arg(long, env = "CHE_WORKSPACE_NAME")]
    workspace_name: String,

    /// Namespace of the custom resource and workspace objects
    #[arg(long, env = "CHE_WORKSPACE_NAMESPACE")]
    workspace_namespace: String,

    /// Version of the workspace CRD
    #[arg(long, env = "CHE_WORKSPACE_CRD_VERSION", default_value = DEFAULT_WORKSPACE_CRD_VERSION)]
    crd_version: String,

    /// Address to listen on
    #[arg(long, env = "CHE_REST_APIS_LISTEN", default_value = "0.0.0.0:9999")]
    listen: SocketAddr,

    /// Kubeconfig file to use; without it the client is inferred from
    /// `KUBECONFIG` (which may list several files) or in-cluster config
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Assemble once at startup (eager) or on every request (lazy)
    #[arg(long, env = "CHE_REST_APIS_ACCESS_MODE", default_value_t = AccessMode::Lazy)]
    access_mode: AccessMode,

    /// Devfile schema revision stored in the custom resource
    #[arg(long, env = "CHE_WORKSPACE_DEVFILE_SCHEMA", default_value_t = DevfileSchema::V1)]
    devfile_schema: DevfileSchema,

    /// How server names are derived from Ingress names
    #[arg(long, env = "CHE_REST_APIS_SERVER_NAME_MODE", default_value_t = ServerNameMode::Prefix)]
    server_name_mode: ServerNameMode,

    /// Deadline in seconds for each Service/Ingress listing call
    #[arg(long, default_value = "5")]
    list_timeout_secs: u64,

    /// Do not add a placeholder environment to configurations without one
    #[arg(long)]
    no_default_environment: bool,
}

impl Cli {
    fn service_config(&self) -> che_rest_common::Result<ServiceConfig> {
        let identity = WorkspaceIdentity::new(
            self.workspace_id.clone(),
            self.workspace_name.clone(),
            self.workspace_namespace.clone(),
        )?;
        let mut config = ServiceConfig::new(identity).with_crd_version(self.crd_version.clone())?;
        config.devfile_schema = self.devfile_schema;
        config.server_names = self.server_name_mode;
        config.list_timeout = Duration::from_secs(self.list_timeout_secs);
        config.default_environment = !self.no_default_environment;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("CRITICAL: Failed to install rustls crypto provider: {:?}", e);
        std::process::exit(1);
    }

    init_telemetry(TelemetryConfig::default()).context("failed to initialize telemetry")?;

    let cli = Cli::parse();
    let config = cli.service_config().context("invalid configuration")?;

    info!(
        workspace_id = %config.identity.id(),
        workspace = %config.identity.name(),
        namespace = %config.identity.namespace(),
        crd_version = %config.crd_version,
        access_mode = %cli.access_mode,
        devfile_schema = %config.devfile_schema,
        server_names = %config.server_names,
        "Starting che-rest-apis"
    );

    let client = create_client(cli.kubeconfig.as_deref())
        .await
        .context("failed to create Kubernetes client")?;

    let source = Arc::new(KubeWorkspaceSource::new(client.clone(), &config.crd_version));
    let lister = Arc::new(KubeObjectLister::with_timeout(client, config.list_timeout));
    let pipeline = WorkspacePipeline::new(config, source, lister);

    let accessor = WorkspaceAccessor::initialize(cli.access_mode, pipeline)
        .await
        .context("failed to assemble workspace at startup")?;

    start_server(cli.listen, Arc::new(accessor), shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const REQUIRED: [&str; 7] = [
        "che-rest-apis",
        "--workspace-id",
        "ws1",
        "--workspace-name",
        "petclinic",
        "--workspace-namespace",
        "che",
    ];

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        assert_eq!(cli.access_mode, AccessMode::Lazy);
        assert_eq!(cli.listen, "0.0.0.0:9999".parse().unwrap());

        let config = cli.service_config().unwrap();
        assert_eq!(config.crd_version, "v1alpha1");
        assert_eq!(config.devfile_schema, DevfileSchema::V1);
        assert_eq!(config.server_names, ServerNameMode::Prefix);
        assert_eq!(config.list_timeout, Duration::from_secs(5));
        assert!(config.default_environment);
    }

    #[test]
    fn test_overrides() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--access-mode",
            "eager",
            "--devfile-schema",
            "v1-legacy-metadata",
            "--server-name-mode",
            "substring",
            "--crd-version",
            "v1beta1",
            "--list-timeout-secs",
            "2",
            "--no-default-environment",
        ]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.access_mode, AccessMode::Eager);

        let config = cli.service_config().unwrap();
        assert_eq!(config.crd_version, "v1beta1");
        assert_eq!(config.devfile_schema, DevfileSchema::V1LegacyMetadata);
        assert_eq!(config.server_names, ServerNameMode::Substring);
        assert_eq!(config.list_timeout, Duration::from_secs(2));
        assert!(!config.default_environment);
    }

    #[test]
    fn test_kubeconfig_only_comes_from_the_flag() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        assert!(cli.kubeconfig.is_none());

        let mut args = REQUIRED.to_vec();
        args.extend(["--kubeconfig", "/tmp/a.yaml"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.kubeconfig, Some(PathBuf::from("/tmp/a.yaml")));

        let arg = Cli::command()
            .get_arguments()
            .find(|a| a.get_id() == "kubeconfig")
            .cloned()
            .unwrap();
        assert!(arg.get_env().is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--access-mode", "sometimes"]);
        assert!(Cli::try_parse_from(args).is_err());

        let mut args = REQUIRED.to_vec();
        args[2] = " ";
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.service_config().is_err());
    }
}
