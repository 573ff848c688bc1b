//! Application services - orchestrate use cases.
//!
//! The `Agent` owns a run's lifecycle and is the only writer of output
//! files; the `WorkerPool` runs generation tasks concurrently for it.

pub mod agent;
pub mod worker_pool;

pub use agent::{Agent, AgentConfig, AgentState, CancelHandle, DeliveryReport};
pub use worker_pool::{ResultStream, WorkerPool};
