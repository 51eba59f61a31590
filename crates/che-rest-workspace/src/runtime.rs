//! Runtime assembly from labelled Services and Ingresses
//!
//! Services define machines; Ingresses sharing a Service's machine name become
//! that machine's servers.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use tracing::{debug, instrument, warn};

use che_rest_common::kube_utils::workspace_id_selector;
use che_rest_common::{Error, Result};

use crate::annotations::{decode_server, machine_attributes, machine_name, ServerNameMode};
use crate::lister::ClusterObjectLister;
use crate::model::{Machine, MachineStatus, Runtime};

/// Builds a `Runtime` from the cluster objects of one workspace
pub struct RuntimeAssembler {
    lister: Arc<dyn ClusterObjectLister>,
    server_names: ServerNameMode,
}

impl RuntimeAssembler {
    /// Create an assembler over the given lister
    pub fn new(lister: Arc<dyn ClusterObjectLister>, server_names: ServerNameMode) -> Self {
        Self {
            lister,
            server_names,
        }
    }

    /// List the workspace's objects and correlate them into a runtime.
    ///
    /// Listing failures yield fewer machines; duplicate machine or server
    /// names are a data-integrity error.
    #[instrument(skip(self))]
    pub async fn assemble(&self, workspace_id: &str, namespace: &str) -> Result<Runtime> {
        let selector = workspace_id_selector(workspace_id);
        let services = self.lister.list_services(namespace, &selector).await;
        let ingresses = self.lister.list_ingresses(namespace, &selector).await;

        let machines = build_machines(&services, &ingresses, workspace_id, self.server_names)?;
        debug!(machines = machines.len(), "assembled runtime");
        Ok(Runtime::from_machines(machines))
    }
}

/// Correlate Services and Ingresses by machine name
pub fn build_machines(
    services: &[Service],
    ingresses: &[Ingress],
    workspace_id: &str,
    mode: ServerNameMode,
) -> Result<BTreeMap<String, Machine>> {
    let mut machines = BTreeMap::new();

    for service in services {
        let Some(name) = machine_name(&service.metadata) else {
            debug!(service = ?service.metadata.name, "service has no machine name, skipping");
            continue;
        };

        let machine = Machine {
            attributes: machine_attributes(&service.metadata),
            servers: BTreeMap::new(),
            status: Some(MachineStatus::Running),
        };
        match machines.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(machine);
            }
            Entry::Occupied(_) => {
                return Err(Error::data_integrity(
                    format!("machine {name}"),
                    "more than one service declares this machine",
                ));
            }
        }
    }

    for (name, machine) in machines.iter_mut() {
        let owned = ingresses
            .iter()
            .filter(|ingress| machine_name(&ingress.metadata) == Some(name.as_str()));

        for ingress in owned {
            let (server_name, server) = match decode_server(ingress, workspace_id, mode) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(machine = %name, error = %e, "skipping undecodable ingress");
                    continue;
                }
            };
            match machine.servers.entry(server_name) {
                Entry::Vacant(slot) => {
                    slot.insert(server);
                }
                Entry::Occupied(slot) => {
                    return Err(Error::data_integrity(
                        format!("machine {name} server {}", slot.key()),
                        "more than one ingress maps to this server",
                    ));
                }
            }
        }
    }

    Ok(machines)
}
