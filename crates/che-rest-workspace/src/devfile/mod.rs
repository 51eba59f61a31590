//! Devfile model, parsing, validation and conversion
//!
//! Parsing is strict: a devfile that does not fit the model fails the request.
//! Validation is advisory and only produces warnings.

mod convert;
mod schema;
mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use che_rest_common::yaml::parse_yaml;
use che_rest_common::{Error, Result};

pub use convert::{DefaultDevfileConverter, DevfileConverter};
pub use schema::DevfileSchema;
pub use validate::{DevfileValidator, IntegrityValidator, ValidationWarning};

/// Declarative description of a workspace
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devfile {
    /// Schema version (1.x devfiles)
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_version: Option<String>,
    /// Schema version after legacy normalization
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub spec_version: Option<String>,
    /// Workspace name after legacy normalization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Devfile metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DevfileMetadata>,
    /// Devfile attributes (e.g., `persistVolumes`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    /// Projects to import
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    /// Editor, plugins and containers
    #[serde(default)]
    pub components: Vec<Component>,
    /// Workspace-wide commands
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<DevfileCommand>,
    /// Fields this model does not know about, kept for round-tripping
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Devfile {
    /// Workspace name: `metadata.name`, then top-level `name`, then `metadata.generateName`
    pub fn workspace_name(&self) -> Option<&str> {
        let meta = self.metadata.as_ref();
        meta.and_then(|m| m.name.as_deref())
            .or(self.name.as_deref())
            .or_else(|| meta.and_then(|m| m.generate_name.as_deref()))
            .filter(|n| !n.is_empty())
    }
}

/// Devfile metadata block
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevfileMetadata {
    /// Workspace name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Prefix for a generated name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_name: Option<String>,
    /// Unknown metadata fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Project imported into the workspace
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project name
    pub name: String,
    /// Path relative to the projects root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_path: Option<String>,
    /// Where the sources come from
    pub source: ProjectSource,
}

/// Project source location
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSource {
    /// Source type (`git`, `github`, `zip`)
    #[serde(rename = "type")]
    pub type_: String,
    /// Source URL
    pub location: String,
    /// Branch to check out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Ref to start from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_point: Option<String>,
    /// Tag to check out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Commit to check out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    /// Directory to sparse-checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse_checkout_dir: Option<String>,
}

/// Kind of a devfile component
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentType {
    /// The IDE
    CheEditor,
    /// An IDE plugin
    ChePlugin,
    /// A container started from an image
    Dockerimage,
    /// Kubernetes objects
    Kubernetes,
    /// OpenShift objects
    Openshift,
}

impl ComponentType {
    /// Whether the component carries a Kubernetes-style recipe
    pub fn is_recipe(self) -> bool {
        matches!(self, ComponentType::Kubernetes | ComponentType::Openshift)
    }

    /// Recipe type string for recipe components
    pub fn recipe_type(self) -> &'static str {
        match self {
            ComponentType::Openshift => "openshift",
            _ => "kubernetes",
        }
    }
}

/// A devfile component
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Component kind
    #[serde(rename = "type")]
    pub type_: ComponentType,
    /// Unique name within the devfile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Plugin or editor id (`publisher/name/version`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Location of a recipe or meta.yaml
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Inlined content of `reference`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_content: Option<String>,
    /// Object selector applied to the recipe
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,
    /// Container image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Memory limit (`512Mi`, `1G`, or bytes)
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub memory_limit: Option<String>,
    /// Whether project sources are mounted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_sources: Option<bool>,
    /// Exposed endpoints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
    /// Container environment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    /// Mounted volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    /// Command overriding the image entrypoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Arguments to the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Unknown component fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Endpoint exposed by a dockerimage component
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Endpoint name
    pub name: String,
    /// Container port
    pub port: i64,
    /// Attributes (`protocol`, `path`, `public`, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// Environment variable of a dockerimage component
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Variable value
    #[serde(default, deserialize_with = "scalar_string")]
    pub value: Option<String>,
}

/// Volume mounted into a dockerimage component
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name, shared between components
    pub name: String,
    /// Mount path in the container
    pub container_path: String,
}

/// Workspace-wide command
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DevfileCommand {
    /// Command name
    pub name: String,
    /// Actions; exactly one is supported
    #[serde(default)]
    pub actions: Vec<CommandAction>,
    /// Extra attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Single action of a command
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandAction {
    /// Action type (e.g., "exec")
    #[serde(rename = "type")]
    pub type_: String,
    /// Alias of the component the action runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    /// Location of a referenced action definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Inlined content of `reference`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_content: Option<String>,
}

/// Parse devfile text (YAML or JSON) into a `Devfile`.
///
/// Fails with `Error::MalformedInput` on invalid YAML, an empty document, or
/// a document that does not match the devfile model.
pub fn parse_devfile(text: &str) -> Result<Devfile> {
    let value = parse_yaml(text).map_err(|e| Error::malformed("devfile", e.to_string()))?;
    if !value.is_object() {
        return Err(Error::malformed(
            "devfile",
            "expected a mapping at the document root",
        ));
    }
    serde_json::from_value(value).map_err(|e| Error::malformed("devfile", e.to_string()))
}

/// Accept strings, numbers and booleans where a string is expected
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODEJS_DEVFILE: &str = r#"
apiVersion: 1.0.0
metadata:
  name: nodejs-web
projects:
  - name: web-nodejs-sample
    source:
      type: git
      location: "https://github.com/che-samples/web-nodejs-sample.git"
components:
  - type: chePlugin
    id: che-incubator/typescript/latest
  - type: dockerimage
    alias: nodejs
    image: quay.io/eclipse/che-nodejs10-ubi:nightly
    memoryLimit: 512Mi
    mountSources: true
    endpoints:
      - name: nodejs
        port: 3000
    env:
      - name: PORT
        value: 3000
commands:
  - name: run
    actions:
      - type: exec
        component: nodejs
        command: npm start
        workdir: ${CHE_PROJECTS_ROOT}/web-nodejs-sample/app
"#;

    #[test]
    fn test_parse_full_devfile() {
        let devfile = parse_devfile(NODEJS_DEVFILE).unwrap();
        assert_eq!(devfile.api_version.as_deref(), Some("1.0.0"));
        assert_eq!(devfile.workspace_name(), Some("nodejs-web"));
        assert_eq!(devfile.projects[0].source.type_, "git");
        assert_eq!(devfile.components.len(), 2);

        let nodejs = &devfile.components[1];
        assert_eq!(nodejs.type_, ComponentType::Dockerimage);
        assert_eq!(nodejs.memory_limit.as_deref(), Some("512Mi"));
        assert_eq!(nodejs.endpoints[0].port, 3000);
        assert_eq!(nodejs.env[0].value.as_deref(), Some("3000"));

        let action = &devfile.commands[0].actions[0];
        assert_eq!(action.component.as_deref(), Some("nodejs"));
        assert_eq!(action.command.as_deref(), Some("npm start"));
    }

    #[test]
    fn test_parse_json_devfile() {
        let devfile =
            parse_devfile(r#"{"apiVersion":"1.0.0","metadata":{"name":"ws"},"components":[]}"#)
                .unwrap();
        assert_eq!(devfile.workspace_name(), Some("ws"));
    }

    #[test]
    fn test_unknown_fields_survive_a_round_trip() {
        let devfile =
            parse_devfile("metadata:\n  name: ws\ncomponents: []\nfutureField:\n  a: 1\n").unwrap();
        assert_eq!(devfile.extra["futureField"]["a"], 1);
        let json = serde_json::to_value(&devfile).unwrap();
        assert_eq!(json["futureField"]["a"], 1);
    }

    #[test]
    fn test_invalid_yaml_is_malformed_input() {
        let err = parse_devfile("components: [unterminated").unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[test]
    fn test_structural_mismatch_is_malformed_input() {
        let err = parse_devfile("components:\n  - type: spaceship\n").unwrap_err();
        assert_eq!(err.kind(), "malformed_input");

        let err = parse_devfile("components: 42\n").unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[test]
    fn test_empty_or_scalar_document_is_malformed_input() {
        assert!(parse_devfile("").is_err());
        assert!(parse_devfile("just a string").is_err());
    }

    #[test]
    fn test_workspace_name_fallbacks() {
        let mut devfile = Devfile {
            name: Some("top".to_string()),
            ..Default::default()
        };
        assert_eq!(devfile.workspace_name(), Some("top"));

        devfile.name = None;
        devfile.metadata = Some(DevfileMetadata {
            generate_name: Some("gen-".to_string()),
            ..Default::default()
        });
        assert_eq!(devfile.workspace_name(), Some("gen-"));

        devfile.metadata = None;
        assert_eq!(devfile.workspace_name(), None);
    }
}
