//! Advisory devfile integrity checks

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component as PathComponent, Path};

use super::{ComponentType, Devfile};

/// A single integrity problem found in a devfile
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Location of the problem (e.g., "commands[1].actions[0].component")
    pub path: String,
    /// What is wrong
    pub message: String,
}

impl ValidationWarning {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Checks a parsed devfile for integrity problems
pub trait DevfileValidator: Send + Sync {
    /// Return every problem found; an empty list means the devfile is consistent
    fn validate(&self, devfile: &Devfile) -> Vec<ValidationWarning>;
}

/// Cross-reference checks between components, commands and projects
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegrityValidator;

impl DevfileValidator for IntegrityValidator {
    fn validate(&self, devfile: &Devfile) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if devfile.workspace_name().is_none() {
            warnings.push(ValidationWarning::new(
                "metadata.name",
                "workspace name is not set",
            ));
        }

        let aliases = check_components(devfile, &mut warnings);
        check_commands(devfile, &aliases, &mut warnings);
        check_projects(devfile, &mut warnings);

        warnings
    }
}

fn check_components(devfile: &Devfile, warnings: &mut Vec<ValidationWarning>) -> BTreeSet<String> {
    let mut aliases = BTreeSet::new();
    let mut editors = 0;

    for (i, component) in devfile.components.iter().enumerate() {
        if let Some(alias) = &component.alias {
            if !aliases.insert(alias.clone()) {
                warnings.push(ValidationWarning::new(
                    format!("components[{i}].alias"),
                    format!("duplicate component alias '{alias}'"),
                ));
            }
        }
        if component.type_ == ComponentType::CheEditor {
            editors += 1;
            if editors > 1 {
                warnings.push(ValidationWarning::new(
                    format!("components[{i}]"),
                    "only one cheEditor component is allowed",
                ));
            }
        }
    }

    aliases
}

fn check_commands(
    devfile: &Devfile,
    aliases: &BTreeSet<String>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut names = BTreeSet::new();

    for (i, command) in devfile.commands.iter().enumerate() {
        if !names.insert(command.name.as_str()) {
            warnings.push(ValidationWarning::new(
                format!("commands[{i}].name"),
                format!("duplicate command name '{}'", command.name),
            ));
        }
        if command.actions.len() != 1 {
            warnings.push(ValidationWarning::new(
                format!("commands[{i}].actions"),
                format!(
                    "command '{}' must have exactly one action, found {}",
                    command.name,
                    command.actions.len()
                ),
            ));
        }
        for (j, action) in command.actions.iter().enumerate() {
            if let Some(component) = &action.component {
                if !aliases.contains(component) {
                    warnings.push(ValidationWarning::new(
                        format!("commands[{i}].actions[{j}].component"),
                        format!("no component with alias '{component}'"),
                    ));
                }
            }
        }
    }
}

fn check_projects(devfile: &Devfile, warnings: &mut Vec<ValidationWarning>) {
    let mut names = BTreeSet::new();

    for (i, project) in devfile.projects.iter().enumerate() {
        if !names.insert(project.name.as_str()) {
            warnings.push(ValidationWarning::new(
                format!("projects[{i}].name"),
                format!("duplicate project name '{}'", project.name),
            ));
        }
        if let Some(clone_path) = &project.clone_path {
            if !is_contained_relative_path(clone_path) {
                warnings.push(ValidationWarning::new(
                    format!("projects[{i}].clonePath"),
                    format!("clonePath '{clone_path}' must stay inside the projects root"),
                ));
            }
        }
    }
}

/// Relative path that never climbs above its starting directory
fn is_contained_relative_path(path: &str) -> bool {
    let mut depth: i32 = 0;
    for part in Path::new(path).components() {
        match part {
            PathComponent::Normal(_) => depth += 1,
            PathComponent::CurDir => {}
            PathComponent::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            PathComponent::RootDir | PathComponent::Prefix(_) => return false,
        }
    }
    true
}
