//! Devfile schema revisions stored in workspace custom resources

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Schema revision of the devfile subtree in the custom resource
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DevfileSchema {
    /// Devfile 1.x, served as stored
    #[default]
    V1,
    /// Devfile 1.x written by controllers that keep the workspace name under
    /// `metadata.name` and the version under `apiVersion`; both are moved to
    /// their top-level `name` and `specVersion` spellings.
    V1LegacyMetadata,
}

impl DevfileSchema {
    /// Rewrite a raw devfile subtree onto the shape the parser expects
    pub fn normalize(self, mut devfile: Value) -> Value {
        match self {
            DevfileSchema::V1 => devfile,
            DevfileSchema::V1LegacyMetadata => {
                if let Some(root) = devfile.as_object_mut() {
                    let name = root
                        .get_mut("metadata")
                        .and_then(Value::as_object_mut)
                        .and_then(|metadata| metadata.remove("name"));
                    if let Some(name) = name {
                        root.insert("name".to_string(), name);
                    }
                    if let Some(version) = root.remove("apiVersion") {
                        root.insert("specVersion".to_string(), version);
                    }
                }
                devfile
            }
        }
    }
}

impl fmt::Display for DevfileSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevfileSchema::V1 => write!(f, "v1"),
            DevfileSchema::V1LegacyMetadata => write!(f, "v1-legacy-metadata"),
        }
    }
}

impl FromStr for DevfileSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(DevfileSchema::V1),
            "v1-legacy-metadata" => Ok(DevfileSchema::V1LegacyMetadata),
            other => Err(format!(
                "unknown devfile schema '{other}' (expected 'v1' or 'v1-legacy-metadata')"
            )),
        }
    }
}
