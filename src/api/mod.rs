//! HTTP API.
//!
//! Exposes the clinic records as JSON endpoints nested under `/api/`.
//! `clinic_api_router()` returns a `Router` that can be mounted on any axum
//! server; `start_api_server()` runs it on its own listener.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::clinic_api_router;
pub use server::{start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
