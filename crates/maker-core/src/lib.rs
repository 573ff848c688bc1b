//! Domain and application layers of maker.
//!
//! maker turns a one-line project description into a source tree. A
//! [`Template`](domain::Template) fixes which files exist; the
//! [`Agent`](application::Agent) asks a
//! [`GenerationClient`](application::GenerationClient) for each file's
//! contents through a bounded worker pool and reports progress to an
//! [`EventSink`](application::EventSink).
//!
//! Dependencies point inward:
//!
//! ```text
//! maker-cli, maker-server      drive an Agent and render its events
//!         |
//! application                  Agent, WorkerPool, port traits
//!         |
//! domain                       templates, runs, tasks, events
//!         ^
//! maker-adapters               HTTP client, filesystems, zip packager
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn demo(
//! #     client: std::sync::Arc<dyn maker_core::application::GenerationClient>,
//! #     catalog: std::sync::Arc<maker_core::domain::TemplateCatalog>,
//! #     fs: std::sync::Arc<dyn maker_core::application::Filesystem>,
//! #     sink: std::sync::Arc<dyn maker_core::application::EventSink>,
//! # ) -> maker_core::error::MakerResult<()> {
//! use maker_core::prelude::*;
//!
//! let config = AgentConfig::default()
//!     .with_template("go-gin", "go")
//!     .with_workers(2);
//!
//! let agent = Agent::new(config, client, catalog, fs, sink)?;
//! agent.start();
//! let summary = agent.generate_code("CRUD API for books").await?;
//! agent.stop().await;
//! println!("wrote {} files", summary.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod error;

pub mod prelude {
    pub use crate::application::{
        Agent, AgentConfig, AgentState, CancelHandle, DeliveryReport,
        ports::{EventSink, Filesystem, GenerationClient, Packager, SinkError},
    };
    pub use crate::domain::{
        FailureKind, FileContent, FileSpec, GenerationError, ProgressEvent, ProjectName,
        RunState, RunSummary, Template, TemplateCatalog, WorkerCount,
    };
    pub use crate::error::{MakerError, MakerResult};
}
