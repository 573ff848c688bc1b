//! Agent - orchestrates one project-generation run.
//!
//! Lifecycle: `Idle --start--> Started --generate_code--> Generating -->
//! {Completed | Failed | Cancelled}`, and `stop` from anywhere lands in
//! `Stopped`. An agent performs at most one run.
//!
//! Progress events go through a bounded channel to a single forwarding
//! task, so the sink sees them in emission order and a slow sink applies
//! backpressure instead of reordering.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::worker_pool::{WorkerPool, cancelled};
use crate::{
    application::{
        ApplicationError,
        ports::{EventSink, Filesystem, GenerationClient, SinkError},
    },
    domain::{
        DomainValidator, FailedFile, GenerationTask, ProgressEvent, ProjectName, ProjectRun,
        PromptContext, RelativePath, RunState, RunSummary, TaskFailure, TaskResult, Template,
        TemplateCatalog, WorkerCount,
    },
    error::{MakerError, MakerResult},
};

/// Events buffered between the run and the sink before emission blocks.
const EVENT_BUFFER: usize = 64;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Everything an agent needs to know about the run it will perform.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Directory under which the project directory is created.
    pub output_root: PathBuf,
    pub project_name: ProjectName,
    pub base_package: String,
    pub template: String,
    pub language: String,
    /// Requested worker count; validated against `max_workers`.
    pub worker_count: usize,
    pub max_workers: usize,
    /// Upper bound on a single generation call.
    pub call_timeout: Duration,
    /// When set, a successful run's terminal event carries
    /// `{download_base}/{project_name}`.
    pub download_base: Option<String>,
}

impl AgentConfig {
    pub const DEFAULT_OUTPUT_ROOT: &'static str = "./output";
    pub const DEFAULT_BASE_PACKAGE: &'static str = "github.com/user/app";
    pub const DEFAULT_TEMPLATE: &'static str = "default";
    pub const DEFAULT_LANGUAGE: &'static str = "go";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_project_name(mut self, name: ProjectName) -> Self {
        self.project_name = name;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>, language: impl Into<String>) -> Self {
        self.template = template.into();
        self.language = language.into();
        self
    }

    pub fn with_base_package(mut self, base_package: impl Into<String>) -> Self {
        self.base_package = base_package.into();
        self
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_download_base(mut self, base: impl Into<String>) -> Self {
        self.download_base = Some(base.into());
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(Self::DEFAULT_OUTPUT_ROOT),
            project_name: ProjectName::default(),
            base_package: Self::DEFAULT_BASE_PACKAGE.to_string(),
            template: Self::DEFAULT_TEMPLATE.to_string(),
            language: Self::DEFAULT_LANGUAGE.to_string(),
            worker_count: WorkerCount::DEFAULT,
            max_workers: WorkerCount::DEFAULT_MAX,
            call_timeout: Self::DEFAULT_TIMEOUT,
            download_base: None,
        }
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentState {
    Idle,
    Started,
    Generating,
    Completed,
    Failed,
    Cancelled,
    Stopped,
}

impl AgentState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Started => "started",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Stopped => "stopped",
        }
    }

    /// The one run has finished (or the agent was stopped).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Stopped
        )
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cancels the agent's run from another task.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// What the forwarding task managed to deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub dropped: usize,
    /// First delivery failure. Events after it are dropped.
    pub failure: Option<SinkError>,
}

impl DeliveryReport {
    pub fn is_clean(&self) -> bool {
        self.failure.is_none()
    }
}

struct EventChannel {
    tx: mpsc::Sender<ProgressEvent>,
    forwarder: JoinHandle<DeliveryReport>,
}

// ── Agent ─────────────────────────────────────────────────────────────────────

pub struct Agent {
    config: AgentConfig,
    workers: WorkerCount,
    client: Arc<dyn GenerationClient>,
    catalog: Arc<TemplateCatalog>,
    filesystem: Arc<dyn Filesystem>,
    sink: Arc<dyn EventSink>,
    state: Mutex<AgentState>,
    events: Mutex<Option<EventChannel>>,
    run: Mutex<Option<ProjectRun>>,
    cancel: Arc<watch::Sender<bool>>,
}

impl Agent {
    /// Build an agent. Fails with a configuration error if the worker count
    /// is out of range.
    pub fn new(
        config: AgentConfig,
        client: Arc<dyn GenerationClient>,
        catalog: Arc<TemplateCatalog>,
        filesystem: Arc<dyn Filesystem>,
        sink: Arc<dyn EventSink>,
    ) -> MakerResult<Self> {
        let workers = DomainValidator::validate_worker_count(config.worker_count, config.max_workers)?;
        let (cancel, _) = watch::channel(false);

        Ok(Self {
            config,
            workers,
            client,
            catalog,
            filesystem,
            sink,
            state: Mutex::new(AgentState::Idle),
            events: Mutex::new(None),
            run: Mutex::new(None),
            cancel: Arc::new(cancel),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state(&self) -> AgentState {
        *lock(&self.state)
    }

    /// Snapshot of the current (or last) run, if one was started.
    pub fn run(&self) -> Option<ProjectRun> {
        lock(&self.run).clone()
    }

    pub fn list_templates(&self) -> &[Template] {
        self.catalog.list_templates()
    }

    pub fn list_languages(&self) -> Vec<String> {
        self.catalog.list_languages()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    /// Request cancellation of the in-flight run. Files already written stay.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Start event forwarding. Must run inside a Tokio runtime. A no-op
    /// unless the agent is idle.
    pub fn start(&self) {
        let mut state = lock(&self.state);
        if *state != AgentState::Idle {
            debug!(state = %*state, "start ignored");
            return;
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let forwarder = tokio::spawn(forward_events(rx, Arc::clone(&self.sink)));
        *lock(&self.events) = Some(EventChannel { tx, forwarder });
        *state = AgentState::Started;

        info!(
            template = %self.config.template,
            workers = %self.workers,
            "agent started"
        );
    }

    /// Generate every file of the configured template for `prompt`.
    ///
    /// Returns the summary when all files were written. Otherwise returns
    /// `PartialGeneration` (some files failed; the rest are on disk) or
    /// `Cancelled`. Template and language problems fail before any task
    /// runs and emit no events.
    #[instrument(
        skip_all,
        fields(
            template = %self.config.template,
            language = %self.config.language,
            project = %self.config.project_name,
        )
    )]
    pub async fn generate_code(&self, prompt: &str) -> MakerResult<RunSummary> {
        self.begin()?;

        let outcome = match self.event_sender() {
            Some(events) => self.execute(prompt, &events).await,
            None => Err(MakerError::Internal {
                message: "event channel missing for a started agent".into(),
            }),
        };

        self.finish(&outcome);
        outcome
    }

    /// Stop the agent: cancel any in-flight run, drain pending events to the
    /// sink and flush it. Idempotent; later calls return an empty report.
    pub async fn stop(&self) -> DeliveryReport {
        {
            let mut state = lock(&self.state);
            if *state == AgentState::Stopped {
                return DeliveryReport::default();
            }
            *state = AgentState::Stopped;
        }

        self.cancel.send_replace(true);

        let Some(EventChannel { tx, forwarder }) = lock(&self.events).take() else {
            return DeliveryReport::default();
        };
        drop(tx);

        let report = match forwarder.await {
            Ok(report) => report,
            Err(e) => DeliveryReport {
                failure: Some(SinkError::Delivery(format!("event forwarder failed: {e}"))),
                ..DeliveryReport::default()
            },
        };

        info!(
            delivered = report.delivered,
            dropped = report.dropped,
            "agent stopped"
        );
        report
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn begin(&self) -> MakerResult<()> {
        let mut state = lock(&self.state);
        match *state {
            AgentState::Started => {
                *state = AgentState::Generating;
                Ok(())
            }
            AgentState::Generating
            | AgentState::Completed
            | AgentState::Failed
            | AgentState::Cancelled => Err(ApplicationError::AlreadyRunning.into()),
            current @ (AgentState::Idle | AgentState::Stopped) => {
                Err(ApplicationError::InvalidState {
                    operation: "generate code",
                    state: current,
                }
                .into())
            }
        }
    }

    fn finish(&self, outcome: &MakerResult<RunSummary>) {
        let mut state = lock(&self.state);
        if *state != AgentState::Generating {
            // stopped meanwhile
            return;
        }
        *state = match outcome {
            Ok(_) => AgentState::Completed,
            Err(e) if e.is_cancelled() => AgentState::Cancelled,
            Err(_) => AgentState::Failed,
        };
    }

    fn event_sender(&self) -> Option<mpsc::Sender<ProgressEvent>> {
        lock(&self.events).as_ref().map(|c| c.tx.clone())
    }

    fn store_run(&self, run: &ProjectRun) {
        *lock(&self.run) = Some(run.clone());
    }

    async fn execute(
        &self,
        prompt: &str,
        events: &mpsc::Sender<ProgressEvent>,
    ) -> MakerResult<RunSummary> {
        DomainValidator::validate_prompt(prompt)?;
        let template =
            DomainValidator::resolve_template(&self.catalog, &self.config.template, &self.config.language)?;

        let ctx = PromptContext::new(
            prompt,
            &self.config.base_package,
            self.config.project_name.clone(),
        );
        let tasks = GenerationTask::plan(template, &ctx);
        let total = tasks.len();

        let mut run = ProjectRun::new(
            prompt.trim(),
            template.name(),
            &self.config.base_package,
            self.workers,
            &self.config.output_root,
            self.config.project_name.clone(),
        );
        run.transition(RunState::Running);
        self.store_run(&run);

        let project_dir = run.project_dir();
        info!(run_id = %run.id, total, dir = %project_dir.display(), "run started");

        send(
            events,
            ProgressEvent::Start {
                run_id: run.id,
                project: self.config.project_name.to_string(),
                template: template.name().to_string(),
                total,
            },
        )
        .await;

        let pool = WorkerPool::new(Arc::clone(&self.client), self.workers, self.config.call_timeout);
        let mut cancel = self.cancel.subscribe();
        let mut stream = pool.dispatch(tasks, cancel.clone());

        let mut written: Vec<RelativePath> = Vec::with_capacity(total);
        let mut failed: Vec<FailedFile> = Vec::new();
        let mut seen: HashSet<RelativePath> = HashSet::with_capacity(total);
        let mut was_cancelled = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    was_cancelled = true;
                    break;
                }
                next = stream.next() => next,
            };
            let Some(result) = next else {
                break;
            };

            let completed = written.len() + failed.len() + 1;
            match self.persist(&project_dir, result, &mut seen) {
                Ok(path) => {
                    debug!(path = %path, completed, total, "file written");
                    send(
                        events,
                        ProgressEvent::File {
                            path: path.clone(),
                            completed,
                            total,
                        },
                    )
                    .await;
                    written.push(path);
                }
                Err(failure) => {
                    warn!(path = %failure.path, error = %failure.error, "file failed");
                    send(
                        events,
                        ProgressEvent::Error {
                            path: failure.path.clone(),
                            error: failure.error.clone(),
                            kind: failure.kind,
                            completed,
                            total,
                        },
                    )
                    .await;
                    failed.push(failure);
                }
            }
        }

        stream.shutdown().await;

        let status = if was_cancelled {
            RunState::Cancelled
        } else if failed.is_empty() {
            RunState::Completed
        } else {
            RunState::Failed
        };
        run.transition(status);
        self.store_run(&run);

        let summary = RunSummary {
            run_id: run.id,
            status,
            total,
            written,
            failed,
            output_dir: project_dir,
            elapsed_ms: run.elapsed_ms(),
        };

        info!(
            run_id = %run.id,
            status = %status,
            written = summary.succeeded(),
            failed = summary.failed.len(),
            elapsed_ms = summary.elapsed_ms,
            "run finished"
        );

        let download = if status == RunState::Completed {
            self.download_ref()
        } else {
            None
        };
        send(
            events,
            ProgressEvent::Complete {
                summary: summary.clone(),
                download,
            },
        )
        .await;

        match status {
            RunState::Completed => Ok(summary),
            RunState::Cancelled => Err(ApplicationError::Cancelled {
                completed: summary.written.len() + summary.failed.len(),
                total,
            }
            .into()),
            _ => Err(ApplicationError::PartialGeneration {
                succeeded: summary.written.len(),
                failed: summary.failed,
                total,
            }
            .into()),
        }
    }

    /// Write a successful result under `project_dir`. Each path is written
    /// at most once per run.
    fn persist(
        &self,
        project_dir: &Path,
        result: TaskResult,
        seen: &mut HashSet<RelativePath>,
    ) -> Result<RelativePath, FailedFile> {
        let TaskResult { path, outcome, .. } = result;

        let content = match outcome {
            Ok(content) => content,
            Err(failure) => return Err(FailedFile::new(path, &failure)),
        };

        if !seen.insert(path.clone()) {
            return Err(FailedFile::new(
                path,
                &TaskFailure::Write {
                    reason: "path already written in this run".into(),
                },
            ));
        }

        let target = path.under(project_dir);
        let write = || -> MakerResult<()> {
            if let Some(parent) = target.parent() {
                self.filesystem.create_dir_all(parent)?;
            }
            self.filesystem.write_file(&target, &content)
        };

        match write() {
            Ok(()) => Ok(path),
            Err(e) => Err(FailedFile::new(
                path,
                &TaskFailure::Write {
                    reason: e.to_string(),
                },
            )),
        }
    }

    fn download_ref(&self) -> Option<String> {
        self.config
            .download_base
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), self.config.project_name))
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("workers", &self.workers)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn send(events: &mpsc::Sender<ProgressEvent>, event: ProgressEvent) {
    if events.send(event).await.is_err() {
        debug!("event channel closed; event dropped");
    }
}

/// Deliver events one at a time, in order. After the first failure the
/// remaining events are counted and discarded.
async fn forward_events(
    mut rx: mpsc::Receiver<ProgressEvent>,
    sink: Arc<dyn EventSink>,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    while let Some(event) = rx.recv().await {
        if report.failure.is_some() {
            report.dropped += 1;
            continue;
        }
        match sink.emit(&event).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(error = %e, event = event.kind(), "event delivery failed, dropping the rest");
                report.failure = Some(e);
                report.dropped += 1;
            }
        }
    }

    if report.failure.is_none() {
        if let Err(e) = sink.flush().await {
            warn!(error = %e, "sink flush failed");
            report.failure = Some(e);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockGenerationClient;
    use crate::domain::{FileSpec, GenerationError};
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapFs {
        files: Mutex<HashMap<PathBuf, String>>,
        read_only: bool,
    }

    impl Filesystem for MapFs {
        fn create_dir_all(&self, _path: &Path) -> MakerResult<()> {
            Ok(())
        }

        fn write_file(&self, path: &Path, content: &str) -> MakerResult<()> {
            if self.read_only {
                return Err(ApplicationError::FilesystemError {
                    path: path.to_path_buf(),
                    reason: "read-only".into(),
                }
                .into());
            }
            lock(&self.files).insert(path.to_path_buf(), content.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            lock(&self.files).contains_key(path)
        }
    }

    #[derive(Default)]
    struct VecSink {
        events: Mutex<Vec<ProgressEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl EventSink for VecSink {
        async fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Closed);
            }
            lock(&self.events).push(event.clone());
            Ok(())
        }
    }

    fn catalog() -> Arc<TemplateCatalog> {
        let t = Template::builder()
            .name("mini")
            .language("go")
            .file(FileSpec::generated("main.go", "entry"))
            .file(FileSpec::generated("internal/app.go", "app"))
            .file(FileSpec::fixed(".gitignore", "bin/\n"))
            .build()
            .unwrap();
        Arc::new(TemplateCatalog::builder().register(t).unwrap().build())
    }

    fn config() -> AgentConfig {
        AgentConfig::default()
            .with_output_root("/out")
            .with_project_name("books".parse().unwrap())
            .with_template("mini", "go")
            .with_workers(2)
    }

    fn ok_client() -> Arc<MockGenerationClient> {
        let mut mock = MockGenerationClient::new();
        mock.expect_query().returning(|_, _| Ok("package main".into()));
        Arc::new(mock)
    }

    fn agent_with(
        config: AgentConfig,
        client: Arc<dyn GenerationClient>,
        fs: Arc<MapFs>,
        sink: Arc<VecSink>,
    ) -> Agent {
        Agent::new(config, client, catalog(), fs, sink).unwrap()
    }

    #[test]
    fn worker_count_out_of_range_is_config_error() {
        for n in [0, 9] {
            let err = Agent::new(
                config().with_workers(n),
                ok_client(),
                catalog(),
                Arc::new(MapFs::default()),
                Arc::new(VecSink::default()),
            )
            .unwrap_err();
            assert!(err.is_config_error(), "workers={n}");
        }
    }

    #[tokio::test]
    async fn generate_before_start_is_invalid_state() {
        let agent = agent_with(config(), ok_client(), Default::default(), Default::default());
        let err = agent.generate_code("books api").await.unwrap_err();
        assert!(matches!(
            err,
            MakerError::Application(ApplicationError::InvalidState {
                state: AgentState::Idle,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn successful_run_writes_files_and_emits_ordered_events() {
        let fs = Arc::new(MapFs::default());
        let sink = Arc::new(VecSink::default());
        let agent = agent_with(
            config().with_download_base("/download"),
            ok_client(),
            fs.clone(),
            sink.clone(),
        );

        agent.start();
        let summary = agent.generate_code("CRUD API for books").await.unwrap();
        let report = agent.stop().await;

        assert_eq!(summary.succeeded(), 3);
        assert_eq!(agent.state(), AgentState::Stopped);
        assert!(report.is_clean());
        assert_eq!(report.delivered, 5);

        assert!(fs.exists(Path::new("/out/books/internal/app.go")));
        assert_eq!(
            lock(&fs.files).get(Path::new("/out/books/.gitignore")).map(String::as_str),
            Some("bin/\n")
        );

        let events = lock(&sink.events).clone();
        assert_eq!(events.first().map(ProgressEvent::kind), Some("start"));
        let completed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::File { completed, .. } => Some(*completed),
                _ => None,
            })
            .collect();
        assert_eq!(completed, [1, 2, 3]);
        match events.last() {
            Some(ProgressEvent::Complete { summary, download }) => {
                assert!(summary.is_success());
                assert_eq!(download.as_deref(), Some("/download/books"));
            }
            other => panic!("expected complete event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_generate_is_already_running() {
        let agent = agent_with(config(), ok_client(), Default::default(), Default::default());
        agent.start();
        agent.generate_code("books").await.unwrap();
        let err = agent.generate_code("books").await.unwrap_err();
        assert!(matches!(err, MakerError::Application(ApplicationError::AlreadyRunning)));
        assert_eq!(agent.state(), AgentState::Completed);
    }

    #[tokio::test]
    async fn start_twice_is_a_no_op_and_stop_is_idempotent() {
        let sink = Arc::new(VecSink::default());
        let agent = agent_with(config(), ok_client(), Default::default(), sink);
        agent.start();
        agent.start();
        assert_eq!(agent.state(), AgentState::Started);

        agent.stop().await;
        let again = agent.stop().await;
        assert_eq!(again, DeliveryReport::default());
        assert_eq!(agent.state(), AgentState::Stopped);

        let err = agent.generate_code("books").await.unwrap_err();
        assert!(matches!(
            err,
            MakerError::Application(ApplicationError::InvalidState {
                state: AgentState::Stopped,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unknown_template_fails_before_any_event() {
        let sink = Arc::new(VecSink::default());
        let mut mock = MockGenerationClient::new();
        mock.expect_query().never();
        let agent = agent_with(
            config().with_template("nope", "go"),
            Arc::new(mock),
            Default::default(),
            sink.clone(),
        );

        agent.start();
        let err = agent.generate_code("books").await.unwrap_err();
        agent.stop().await;

        assert!(err.is_config_error());
        assert_eq!(agent.run(), None);
        assert!(lock(&sink.events).is_empty());
    }

    #[tokio::test]
    async fn one_failed_file_yields_partial_generation() {
        let mut mock = MockGenerationClient::new();
        mock.expect_query()
            .withf(|_, p| p.contains("`main.go`"))
            .returning(|_, _| Err(GenerationError::transient("rate limited")));
        mock.expect_query().returning(|_, _| Ok("ok".into()));

        let fs = Arc::new(MapFs::default());
        let sink = Arc::new(VecSink::default());
        let agent = agent_with(config(), Arc::new(mock), fs.clone(), sink.clone());

        agent.start();
        let err = agent.generate_code("books").await.unwrap_err();
        agent.stop().await;

        let failed = err.failed_files();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path.as_str(), "main.go");
        assert!(!fs.exists(Path::new("/out/books/main.go")));
        assert!(fs.exists(Path::new("/out/books/internal/app.go")));
        assert_eq!(agent.run().map(|r| r.state()), Some(RunState::Failed));

        let events = lock(&sink.events).clone();
        assert!(events.iter().any(|e| e.kind() == "error"));
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Complete { download: None, .. })
        ));
    }

    #[tokio::test]
    async fn write_failures_are_reported_per_file() {
        let fs = Arc::new(MapFs {
            read_only: true,
            ..Default::default()
        });
        let agent = agent_with(config(), ok_client(), fs, Default::default());
        agent.start();
        let err = agent.generate_code("books").await.unwrap_err();
        assert_eq!(err.failed_files().len(), 3);
        assert!(err.failed_files().iter().all(|f| f.error.starts_with("write error")));
    }

    #[tokio::test]
    async fn cancel_before_generation_yields_cancelled() {
        let sink = Arc::new(VecSink::default());
        let agent = agent_with(config(), ok_client(), Default::default(), sink.clone());
        agent.start();
        agent.cancel_handle().cancel();

        let err = agent.generate_code("books").await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(agent.state(), AgentState::Cancelled);

        agent.stop().await;
        match lock(&sink.events).last() {
            Some(ProgressEvent::Complete { summary, .. }) => {
                assert_eq!(summary.status, RunState::Cancelled)
            }
            other => panic!("expected complete event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sink_failure_does_not_fail_the_run() {
        let sink = Arc::new(VecSink {
            fail: true,
            ..Default::default()
        });
        let agent = agent_with(config(), ok_client(), Default::default(), sink);
        agent.start();
        assert!(agent.generate_code("books").await.is_ok());

        let report = agent.stop().await;
        assert_eq!(report.failure, Some(SinkError::Closed));
        assert_eq!(report.delivered, 0);
        assert_eq!(report.dropped, 5);
    }
}
