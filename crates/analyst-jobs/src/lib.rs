//! Job and progress storage for the analyst service
//!
//! A [`JobStore`] keeps one record per submitted analysis: status, current
//! stage, progress, message and the final report or error. Two backends are
//! provided:
//!
//! - [`RedisJobStore`] stores each job as a hash with a TTL and keeps an
//!   index sorted set for listing and eviction
//! - [`MemoryJobStore`] is the in-process fallback with the same semantics
//!
//! [`progress_stream`] turns a store into a change-only event stream for one
//! job.

mod error;
mod memory;
mod redis_store;
mod store;
pub mod stream;

pub use error::{JobStoreError, Result};
pub use memory::MemoryJobStore;
pub use redis_store::{KEY_PREFIX, RedisJobStore, RedisStoreConfig};
pub use store::{JobStore, StoreConfig};
pub use stream::{ProgressEvent, StreamConfig, progress_stream};
