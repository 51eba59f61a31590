//! HTTP surface for che-rest-apis
//!
//! # Endpoints
//!
//! - `GET /api/workspace/{key}` - The served workspace, or 404 for any other key
//! - `PUT /api/workspace/{key}` - Accepted and answered as a read; nothing is updated
//! - `GET /healthz` - Health check

#![deny(missing_docs)]

pub mod error;
pub mod server;
pub mod workspace;

pub use error::Error;
pub use server::{build_router, start_server, AppState};
