//! Assembles the petclinic sample devfile end to end through the public API

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use serde_json::Value;

use che_rest_common::yaml::parse_yaml;
use che_rest_common::Result;
use che_rest_workspace::devfile::{
    parse_devfile, DefaultDevfileConverter, DevfileConverter, DevfileValidator,
    IntegrityValidator,
};
use che_rest_workspace::model::WorkspaceStatus;
use che_rest_workspace::retriever::WorkspaceResource;
use che_rest_workspace::{
    AccessMode, ClusterObjectLister, ServiceConfig, WorkspaceAccessor, WorkspaceIdentity,
    WorkspacePipeline, WorkspaceResourceSource,
};

const PETCLINIC: &str = include_str!("fixtures/petclinic-sample.yaml");

struct FixtureSource;

#[async_trait]
impl WorkspaceResourceSource for FixtureSource {
    async fn fetch(&self, _namespace: &str, _name: &str) -> Result<Option<WorkspaceResource>> {
        let devfile: Value = parse_yaml(PETCLINIC).expect("fixture is valid YAML");
        let resource = serde_json::json!({ "spec": { "devfile": devfile } });
        Ok(Some(serde_json::from_value(resource).expect("resource shape")))
    }
}

struct EmptyCluster;

#[async_trait]
impl ClusterObjectLister for EmptyCluster {
    async fn list_services(&self, _namespace: &str, _selector: &str) -> Vec<Service> {
        Vec::new()
    }

    async fn list_ingresses(&self, _namespace: &str, _selector: &str) -> Vec<Ingress> {
        Vec::new()
    }
}

#[test]
fn petclinic_converts_to_named_workspace_config() {
    let devfile = parse_devfile(PETCLINIC).unwrap();
    assert!(IntegrityValidator.validate(&devfile).is_empty());

    let config = DefaultDevfileConverter.convert(&devfile).unwrap();
    assert_eq!(config.name, "petclinic");
    assert_eq!(config.default_env.as_deref(), Some("default"));

    let env = &config.environments["default"];
    assert_eq!(env.recipe.type_, "kubernetes");
    assert!(env.recipe.content.contains("name: mysql"));
    let maven = &env.machines["maven"];
    assert_eq!(maven.attributes["memoryLimitBytes"], "536870912");
    assert_eq!(maven.servers["8080/tcp"].port, "8080/tcp");
    assert_eq!(maven.env["MAVEN_CONFIG"], "");

    assert_eq!(config.projects[0].path, "/web-java-spring-petclinic");
    assert_eq!(config.projects[0].source.parameters["branch"], "main");
    assert_eq!(config.commands.len(), 2);
    assert_eq!(config.commands[0].attributes["componentAlias"], "maven");
    assert_eq!(config.attributes["editor"], "eclipse/che-theia/next");
    assert_eq!(config.attributes["plugins"], "redhat/java/latest");
    assert_eq!(config.attributes["persistVolumes"], "false");
}

#[tokio::test]
async fn petclinic_is_served_through_the_accessor() {
    let identity = WorkspaceIdentity::new("workspace7c5d4b", "petclinic", "che").unwrap();
    let pipeline = WorkspacePipeline::new(
        ServiceConfig::new(identity),
        Arc::new(FixtureSource),
        Arc::new(EmptyCluster),
    );
    let accessor = WorkspaceAccessor::initialize(AccessMode::Eager, pipeline)
        .await
        .unwrap();

    let workspace = accessor.get_workspace("workspace7c5d4b").await.unwrap();
    assert_eq!(workspace.config.name, "petclinic");
    assert_eq!(workspace.status, WorkspaceStatus::Running);
    assert!(workspace.runtime.unwrap().machines.is_empty());

    let json = serde_json::to_value(accessor.get_workspace("workspace7c5d4b").await.unwrap())
        .unwrap();
    assert_eq!(json["id"], "workspace7c5d4b");
    assert_eq!(json["status"], "RUNNING");
    assert_eq!(json["config"]["defaultEnv"], "default");
    assert_eq!(json["temporary"], false);

    assert!(accessor
        .get_workspace("another")
        .await
        .unwrap_err()
        .is_not_found());
}
