//! Decoding of Che annotations on Services and Ingresses
//!
//! The workspace controller describes machines and servers entirely through
//! annotations; this module turns them into `Machine` attributes and `Server`
//! values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::Value;
use tracing::warn;

use che_rest_common::{
    MACHINE_ANNOTATION_PREFIX, MACHINE_NAME_ANNOTATION, SERVER_ATTRIBUTES_ANNOTATION,
    SERVER_PORT_ANNOTATION, SERVER_PROTOCOL_ANNOTATION,
};

use crate::model::{Server, ServerStatus};

/// Server attribute filled from the port annotation
pub const PORT_ATTRIBUTE: &str = "port";

/// How the server name is derived from an Ingress name
///
/// Ingresses are named `ingress-<workspaceId>-<server>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ServerNameMode {
    /// Remove `ingress-<workspaceId>-` only at the start of the name
    #[default]
    Prefix,
    /// Remove every occurrence of `ingress-<workspaceId>-` anywhere in the name,
    /// matching servers registered by older deployments
    Substring,
}

impl fmt::Display for ServerNameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerNameMode::Prefix => write!(f, "prefix"),
            ServerNameMode::Substring => write!(f, "substring"),
        }
    }
}

impl FromStr for ServerNameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefix" => Ok(ServerNameMode::Prefix),
            "substring" => Ok(ServerNameMode::Substring),
            other => Err(format!(
                "unknown server name mode '{other}' (expected 'prefix' or 'substring')"
            )),
        }
    }
}

/// Why an Ingress could not be turned into a server
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServerDecodeError {
    /// The protocol annotation is absent
    #[error("ingress {ingress} has no {SERVER_PROTOCOL_ANNOTATION} annotation")]
    MissingProtocol {
        /// Ingress name
        ingress: String,
    },

    /// The Ingress has no rule with a host
    #[error("ingress {ingress} has no rule with a host")]
    MissingHost {
        /// Ingress name
        ingress: String,
    },
}

/// Annotations of an object, if any
pub fn annotations(meta: &ObjectMeta) -> Option<&BTreeMap<String, String>> {
    meta.annotations.as_ref()
}

/// Machine an object belongs to, from its `machine.name` annotation
pub fn machine_name(meta: &ObjectMeta) -> Option<&str> {
    annotations(meta)?
        .get(MACHINE_NAME_ANNOTATION)
        .map(String::as_str)
}

/// All `org.eclipse.che.machine.*` annotations except the name, prefix removed
pub fn machine_attributes(meta: &ObjectMeta) -> BTreeMap<String, String> {
    annotations(meta)
        .into_iter()
        .flatten()
        .filter(|(key, _)| key.as_str() != MACHINE_NAME_ANNOTATION)
        .filter_map(|(key, value)| {
            key.strip_prefix(MACHINE_ANNOTATION_PREFIX)
                .map(|attr| (attr.to_string(), value.clone()))
        })
        .collect()
}

/// Server name derived from an Ingress name
pub fn server_name(ingress_name: &str, workspace_id: &str, mode: ServerNameMode) -> String {
    let prefix = format!("ingress-{}-", workspace_id);
    match mode {
        ServerNameMode::Prefix => ingress_name
            .strip_prefix(&prefix)
            .unwrap_or(ingress_name)
            .to_string(),
        ServerNameMode::Substring => ingress_name.replace(&prefix, ""),
    }
}

/// `<protocol>://<host of the first rule>`
pub fn server_url(ingress: &Ingress) -> Result<String, ServerDecodeError> {
    let name = ingress.metadata.name.clone().unwrap_or_default();

    let protocol = annotations(&ingress.metadata)
        .and_then(|a| a.get(SERVER_PROTOCOL_ANNOTATION))
        .ok_or_else(|| ServerDecodeError::MissingProtocol {
            ingress: name.clone(),
        })?;

    let host = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .and_then(|rules| rules.first())
        .and_then(|rule| rule.host.as_deref())
        .ok_or(ServerDecodeError::MissingHost { ingress: name })?;

    Ok(format!("{}://{}", protocol, host))
}

/// Extra attributes from the JSON attributes annotation plus the port.
///
/// A malformed JSON annotation is logged and contributes nothing; the port is
/// still recorded.
pub fn server_attributes(ingress: &Ingress) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    let Some(annotations) = annotations(&ingress.metadata) else {
        return attributes;
    };

    if let Some(raw) = annotations.get(SERVER_ATTRIBUTES_ANNOTATION) {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => {
                attributes.extend(fields.into_iter().map(|(k, v)| (k, attribute_text(v))));
            }
            Ok(_) => {}
            Err(e) => warn!(
                ingress = ?ingress.metadata.name,
                error = %e,
                "ignoring malformed server attributes annotation"
            ),
        }
    }

    if let Some(port) = annotations.get(SERVER_PORT_ANNOTATION) {
        let port = port.split('/').next().unwrap_or_default();
        attributes.insert(PORT_ATTRIBUTE.to_string(), port.to_string());
    }

    attributes
}

/// Decode an Ingress into a named server
pub fn decode_server(
    ingress: &Ingress,
    workspace_id: &str,
    mode: ServerNameMode,
) -> Result<(String, Server), ServerDecodeError> {
    let url = server_url(ingress)?;
    let name = server_name(
        ingress.metadata.name.as_deref().unwrap_or_default(),
        workspace_id,
        mode,
    );
    let server = Server {
        url: Some(url),
        status: ServerStatus::Unknown,
        attributes: server_attributes(ingress),
    };
    Ok((name, server))
}

/// Text of a JSON attribute value; containers have no text form
fn attribute_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(_) | Value::Object(_) => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use k8s_openapi::api::networking::v1::{IngressRule, IngressSpec};

    pub(crate) fn ingress(name: &str, annotations: &[(&str, &str)], host: Option<&str>) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                annotations: Some(
                    annotations
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                rules: Some(
                    host.map(|h| IngressRule {
                        host: Some(h.to_string()),
                        http: None,
                    })
                    .into_iter()
                    .collect(),
                ),
                ..Default::default()
            }),
            status: None,
        }
    }

    #[test]
    fn test_server_name_prefix_mode() {
        assert_eq!(
            server_name("ingress-ws1-web", "ws1", ServerNameMode::Prefix),
            "web"
        );
        assert_eq!(
            server_name("theia-ingress-ws1-web", "ws1", ServerNameMode::Prefix),
            "theia-ingress-ws1-web"
        );
    }

    #[test]
    fn test_server_name_substring_mode_strips_anywhere() {
        assert_eq!(
            server_name("ingress-ws1-web", "ws1", ServerNameMode::Substring),
            "web"
        );
        assert_eq!(
            server_name("theia-ingress-ws1-web", "ws1", ServerNameMode::Substring),
            "theia-web"
        );
    }

    #[test]
    fn test_server_name_mode_parse() {
        assert_eq!("prefix".parse(), Ok(ServerNameMode::Prefix));
        assert_eq!("substring".parse(), Ok(ServerNameMode::Substring));
        assert!("anchored".parse::<ServerNameMode>().is_err());
        assert_eq!(ServerNameMode::Substring.to_string(), "substring");
    }

    #[test]
    fn test_server_url() {
        let ing = ingress(
            "ingress-ws1-web",
            &[(SERVER_PROTOCOL_ANNOTATION, "https")],
            Some("h.example.com"),
        );
        assert_eq!(server_url(&ing).unwrap(), "https://h.example.com");
    }

    #[test]
    fn test_server_url_requires_protocol_and_host() {
        let ing = ingress("ingress-ws1-web", &[], Some("h.example.com"));
        assert_eq!(
            server_url(&ing),
            Err(ServerDecodeError::MissingProtocol {
                ingress: "ingress-ws1-web".to_string()
            })
        );

        let ing = ingress("ingress-ws1-web", &[(SERVER_PROTOCOL_ANNOTATION, "http")], None);
        assert_eq!(
            server_url(&ing),
            Err(ServerDecodeError::MissingHost {
                ingress: "ingress-ws1-web".to_string()
            })
        );
    }

    #[test]
    fn test_server_attributes_from_json_and_port() {
        let ing = ingress(
            "i",
            &[
                (
                    SERVER_ATTRIBUTES_ANNOTATION,
                    r#"{"type": "ide", "secure": false, "cookiesAuthEnabled": true, "nested": {"a": 1}}"#,
                ),
                (SERVER_PORT_ANNOTATION, "8080/TCP"),
            ],
            Some("h"),
        );
        let attrs = server_attributes(&ing);
        assert_eq!(attrs["type"], "ide");
        assert_eq!(attrs["secure"], "false");
        assert_eq!(attrs["cookiesAuthEnabled"], "true");
        assert_eq!(attrs["nested"], "");
        assert_eq!(attrs["port"], "8080");
    }

    #[test]
    fn test_malformed_attributes_still_record_port() {
        let ing = ingress(
            "i",
            &[
                (SERVER_ATTRIBUTES_ANNOTATION, "{not json"),
                (SERVER_PORT_ANNOTATION, "3000"),
            ],
            Some("h"),
        );
        let attrs = server_attributes(&ing);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["port"], "3000");
    }

    #[test]
    fn test_non_object_attributes_are_ignored() {
        let ing = ingress("i", &[(SERVER_ATTRIBUTES_ANNOTATION, "[1, 2]")], Some("h"));
        assert!(server_attributes(&ing).is_empty());
    }

    #[test]
    fn test_machine_attributes_strip_prefix_and_skip_name() {
        let meta = ObjectMeta {
            annotations: Some(
                [
                    (MACHINE_NAME_ANNOTATION, "dev"),
                    ("org.eclipse.che.machine.source", "component"),
                    ("org.eclipse.che.machine.plugin", "redhat/java"),
                    ("org.eclipse.che.server.protocol", "http"),
                    ("unrelated", "x"),
                ]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ),
            ..Default::default()
        };
        assert_eq!(machine_name(&meta), Some("dev"));
        let attrs = machine_attributes(&meta);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["source"], "component");
        assert_eq!(attrs["plugin"], "redhat/java");
    }

    #[test]
    fn test_decode_server() {
        let ing = ingress(
            "ingress-ws1-web",
            &[
                (MACHINE_NAME_ANNOTATION, "m1"),
                (SERVER_PROTOCOL_ANNOTATION, "http"),
            ],
            Some("h.example.com"),
        );
        let (name, server) = decode_server(&ing, "ws1", ServerNameMode::Prefix).unwrap();
        assert_eq!(name, "web");
        assert_eq!(server.url.as_deref(), Some("http://h.example.com"));
        assert_eq!(server.status, ServerStatus::Unknown);
        assert!(server.attributes.is_empty());
    }
}
