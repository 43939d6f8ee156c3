//! Shared utilities for the analyst workspace
//!
//! This crate provides the logging setup and the environment-backed
//! configuration helpers used by every other crate.

pub mod config;
pub mod logging;

pub use config::{EnvSource, EnvSourceExt, ProcessEnv, load_dotenv};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
