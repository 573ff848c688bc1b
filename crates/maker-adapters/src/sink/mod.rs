//! Event sink adapters.

mod log;
mod recording;

pub use log::LogSink;
pub use recording::RecordingSink;
