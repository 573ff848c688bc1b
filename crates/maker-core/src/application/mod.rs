//! Orchestration of a generation run.
//!
//! [`Agent`] owns the lifecycle and the event stream; [`WorkerPool`] runs
//! the per-file calls. Everything outside the process is reached through
//! the traits in [`ports`].

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::{EventSink, Filesystem, GenerationClient, Packager, SinkError};
pub use services::{
    Agent, AgentConfig, AgentState, CancelHandle, DeliveryReport, ResultStream, WorkerPool,
};
