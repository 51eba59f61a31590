//! Devfile to workspace configuration conversion

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use che_rest_common::Result;

use super::{Component, ComponentType, Devfile, DevfileCommand, Project};
use crate::model::{
    Command, Environment, MachineConfig, ProjectConfig, Recipe, ServerConfig, SourceStorage,
    WorkspaceConfig, DEFAULT_ENVIRONMENT,
};

/// Workspace attribute holding the editor id
pub const EDITOR_ATTRIBUTE: &str = "editor";
/// Workspace attribute holding comma-separated plugin ids
pub const PLUGINS_ATTRIBUTE: &str = "plugins";
/// Command attribute naming the component a command runs in
pub const COMPONENT_ALIAS_ATTRIBUTE: &str = "componentAlias";
/// Command attribute holding the working directory
pub const WORKING_DIR_ATTRIBUTE: &str = "workingDir";
/// Machine attribute holding the memory limit in bytes
pub const MEMORY_LIMIT_ATTRIBUTE: &str = "memoryLimitBytes";
/// MIME type of inline Kubernetes recipes
pub const RECIPE_CONTENT_TYPE: &str = "application/x-yaml";

const RECIPE_SEPARATOR: &str = "\n---\n";

/// Turns a devfile into a workspace configuration
pub trait DevfileConverter: Send + Sync {
    /// Convert the devfile; fails when the devfile cannot describe a workspace
    fn convert(&self, devfile: &Devfile) -> Result<WorkspaceConfig>;
}

/// Converter for 1.x devfiles
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDevfileConverter;

impl DevfileConverter for DefaultDevfileConverter {
    fn convert(&self, devfile: &Devfile) -> Result<WorkspaceConfig> {
        let name = devfile.workspace_name().unwrap_or_else(|| {
            debug!("devfile sets no workspace name, using an empty one");
            ""
        });

        let environments: BTreeMap<_, _> = build_environment(&devfile.components)
            .map(|env| (DEFAULT_ENVIRONMENT.to_string(), env))
            .into_iter()
            .collect();

        Ok(WorkspaceConfig {
            name: name.to_string(),
            default_env: (!environments.is_empty()).then(|| DEFAULT_ENVIRONMENT.to_string()),
            environments,
            projects: devfile.projects.iter().map(convert_project).collect(),
            commands: devfile.commands.iter().filter_map(convert_command).collect(),
            attributes: workspace_attributes(devfile),
        })
    }
}

fn workspace_attributes(devfile: &Devfile) -> BTreeMap<String, String> {
    let mut attributes: BTreeMap<String, String> = devfile
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), value_text(v)))
        .collect();

    let ids_of = |kind: ComponentType| {
        devfile
            .components
            .iter()
            .filter(move |c| c.type_ == kind)
            .filter_map(|c| c.id.clone())
    };

    if let Some(editor) = ids_of(ComponentType::CheEditor).next() {
        attributes.insert(EDITOR_ATTRIBUTE.to_string(), editor);
    }
    let plugins: Vec<String> = ids_of(ComponentType::ChePlugin).collect();
    if !plugins.is_empty() {
        attributes.insert(PLUGINS_ATTRIBUTE.to_string(), plugins.join(","));
    }

    attributes
}

fn convert_project(project: &Project) -> ProjectConfig {
    let source = &project.source;
    let parameters = [
        ("branch", &source.branch),
        ("startPoint", &source.start_point),
        ("tag", &source.tag),
        ("commitId", &source.commit_id),
        ("sparseCheckoutDir", &source.sparse_checkout_dir),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
    .collect();

    ProjectConfig {
        name: project.name.clone(),
        path: format!("/{}", project.clone_path.as_deref().unwrap_or(&project.name)),
        source: SourceStorage {
            type_: source.type_.clone(),
            location: source.location.clone(),
            parameters,
        },
    }
}

fn convert_command(command: &DevfileCommand) -> Option<Command> {
    let Some(action) = command.actions.first() else {
        debug!(command = %command.name, "skipping command without actions");
        return None;
    };

    let mut attributes = command.attributes.clone();
    if let Some(component) = &action.component {
        attributes.insert(COMPONENT_ALIAS_ATTRIBUTE.to_string(), component.clone());
    }
    if let Some(workdir) = &action.workdir {
        attributes.insert(WORKING_DIR_ATTRIBUTE.to_string(), workdir.clone());
    }

    Some(Command {
        name: command.name.clone(),
        type_: action.type_.clone(),
        command_line: action.command.clone().unwrap_or_default(),
        attributes,
    })
}

/// Single environment built from recipe and dockerimage components, if any
fn build_environment(components: &[Component]) -> Option<Environment> {
    let recipes: Vec<&Component> = components
        .iter()
        .filter(|c| c.type_.is_recipe() && c.reference_content.is_some())
        .collect();
    let images: Vec<&Component> = components
        .iter()
        .filter(|c| c.type_ == ComponentType::Dockerimage)
        .collect();

    if recipes.is_empty() && images.is_empty() {
        return None;
    }

    let recipe_type = recipes
        .first()
        .map(|c| c.type_.recipe_type())
        .unwrap_or(ComponentType::Kubernetes.recipe_type());
    let content = recipes
        .iter()
        .filter_map(|c| c.reference_content.as_deref())
        .collect::<Vec<_>>()
        .join(RECIPE_SEPARATOR);

    let machines = images
        .iter()
        .filter_map(|c| {
            let name = c.alias.clone().or_else(|| c.image.clone())?;
            Some((name, machine_config(c)))
        })
        .collect();

    Some(Environment {
        recipe: Recipe {
            type_: recipe_type.to_string(),
            content_type: RECIPE_CONTENT_TYPE.to_string(),
            content,
        },
        machines,
    })
}

fn machine_config(component: &Component) -> MachineConfig {
    let mut attributes = BTreeMap::new();
    if let Some(bytes) = component.memory_limit.as_deref().and_then(parse_memory) {
        attributes.insert(MEMORY_LIMIT_ATTRIBUTE.to_string(), bytes.to_string());
    }

    let servers = component
        .endpoints
        .iter()
        .map(|endpoint| {
            let mut attributes: BTreeMap<String, String> = endpoint
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), value_text(v)))
                .collect();
            let server = ServerConfig {
                port: format!("{}/tcp", endpoint.port),
                protocol: attributes.remove("protocol"),
                path: attributes.remove("path"),
                attributes,
            };
            (endpoint.name.clone(), server)
        })
        .collect();

    let env = component
        .env
        .iter()
        .map(|var| (var.name.clone(), var.value.clone().unwrap_or_default()))
        .collect();

    MachineConfig {
        attributes,
        servers,
        env,
    }
}

/// Parse a Kubernetes memory quantity (`512Mi`, `1G`, `1048576`) into bytes
fn parse_memory(quantity: &str) -> Option<u64> {
    const SUFFIXES: &[(&str, u64)] = &[
        ("Ei", 1 << 60),
        ("Pi", 1 << 50),
        ("Ti", 1 << 40),
        ("Gi", 1 << 30),
        ("Mi", 1 << 20),
        ("Ki", 1 << 10),
        ("E", 1_000_000_000_000_000_000),
        ("P", 1_000_000_000_000_000),
        ("T", 1_000_000_000_000),
        ("G", 1_000_000_000),
        ("M", 1_000_000),
        ("K", 1_000),
        ("k", 1_000),
    ];

    let quantity = quantity.trim();
    for (suffix, multiplier) in SUFFIXES {
        if let Some(number) = quantity.strip_suffix(suffix) {
            return number.trim().parse::<u64>().ok()?.checked_mul(*multiplier);
        }
    }
    quantity.parse().ok()
}

/// String form of an attribute value; strings are not quoted
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
