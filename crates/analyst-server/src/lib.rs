//! HTTP service for the stock analyst pipeline
//!
//! Exposes job submission, polling, listing, deletion and a server-sent
//! progress stream over the [`Orchestrator`](analyst_pipeline::Orchestrator)
//! and its job store.

mod config;
mod error;
mod routes;
mod sse;
mod state;

pub use config::{DEFAULT_REDIS_URL, ServerConfig};
pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::AppState;
