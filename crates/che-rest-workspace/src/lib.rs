//! Workspace assembly for che-rest-apis
//!
//! Joins the devfile stored in a workspace custom resource with the Services
//! and Ingresses that run the workspace, producing the `Workspace` view served
//! over HTTP.
//!
//! The pipeline, leaves first:
//! - `lister`: best-effort listing of labelled Services and Ingresses
//! - `annotations`: machine and server data from annotations
//! - `runtime`: correlation of Services and Ingresses into machines
//! - `retriever`: devfile and pre-computed runtime from the custom resource
//! - `devfile`: parsing, advisory validation and conversion
//! - `composer`: the final `Workspace`
//! - `accessor`: eager or lazy request path

#![deny(missing_docs)]

pub mod accessor;
pub mod annotations;
pub mod composer;
pub mod config;
pub mod devfile;
pub mod lister;
pub mod model;
pub mod retriever;
pub mod runtime;

pub use accessor::{AccessMode, WorkspaceAccessor, WorkspacePipeline};
pub use config::{ServiceConfig, WorkspaceIdentity};
pub use lister::{ClusterObjectLister, KubeObjectLister};
pub use model::Workspace;
pub use retriever::{KubeWorkspaceSource, WorkspaceResourceSource};
