//! Application state shared across handlers.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use maker_adapters::{ClientConfig, HttpGenerationClient, ZipPackager};
use maker_core::{
    application::{AgentConfig, GenerationClient, Packager},
    domain::{DomainError, ProjectName, TemplateCatalog, WorkerCount},
};

/// Builds the generation client for one request, given the model it asked
/// for.
pub type ClientFactory = Arc<dyn Fn(Option<&str>) -> Arc<dyn GenerationClient> + Send + Sync>;

/// Route prefix under which finished projects are offered.
pub const DOWNLOAD_BASE: &str = "/download";

pub const DEFAULT_STATIC_DIR: &str = "web/static";

/// One generation request, sent as the first WebSocket text frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub language: Option<String>,
    pub template: Option<String>,
    pub base_package: Option<String>,
    pub worker_count: Option<usize>,
    pub model: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<TemplateCatalog>,
    pub clients: ClientFactory,
    pub packager: Arc<dyn Packager>,
    pub output_root: PathBuf,
    pub static_dir: PathBuf,
    pub max_workers: usize,
    pub call_timeout: Duration,
    /// Project directories a live run is writing into.
    active: Arc<Mutex<HashSet<String>>>,
}

/// Exclusive use of one project directory; released on drop.
#[derive(Debug)]
pub struct ProjectClaim {
    active: Arc<Mutex<HashSet<String>>>,
    name: String,
}

impl Drop for ProjectClaim {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.name);
    }
}

impl AppState {
    /// State whose requests all share one client, whatever model they name.
    pub fn with_client(
        catalog: TemplateCatalog,
        client: Arc<dyn GenerationClient>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        let clients: ClientFactory = Arc::new(move |_: Option<&str>| Arc::clone(&client));
        Self::new(catalog, clients, output_root.into())
    }

    /// State that builds an HTTP client per request from a shared base
    /// configuration; the request's model wins over the default.
    pub fn with_http(
        catalog: TemplateCatalog,
        base: ClientConfig,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        let clients: ClientFactory = Arc::new(move |model: Option<&str>| {
            let config = match model.map(str::trim).filter(|m| !m.is_empty()) {
                Some(model) => base.clone().model(model),
                None => base.clone(),
            };
            Arc::new(HttpGenerationClient::new(config)) as Arc<dyn GenerationClient>
        });
        Self::new(catalog, clients, output_root.into())
    }

    fn new(catalog: TemplateCatalog, clients: ClientFactory, output_root: PathBuf) -> Self {
        Self {
            catalog: Arc::new(catalog),
            clients,
            packager: Arc::new(ZipPackager::new()),
            output_root,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_workers: WorkerCount::DEFAULT_MAX,
            call_timeout: AgentConfig::DEFAULT_TIMEOUT,
            active: Arc::default(),
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn with_limits(mut self, max_workers: usize, call_timeout: Duration) -> Self {
        self.max_workers = max_workers;
        self.call_timeout = call_timeout;
        self
    }

    /// Translate a request into an agent configuration.
    ///
    /// Unset fields fall back to the CLI defaults, except the project name:
    /// without one the run gets `project-<8 hex>` so concurrent requests
    /// never share a directory. The worker count is not clamped here;
    /// `Agent::new` rejects it when out of range.
    pub fn agent_config(&self, request: &GenerateRequest) -> Result<AgentConfig, DomainError> {
        let defaults = AgentConfig::default();
        let mut config = defaults
            .clone()
            .with_output_root(&self.output_root)
            .with_template(
                request.template.clone().unwrap_or(defaults.template),
                request.language.clone().unwrap_or(defaults.language),
            )
            .with_base_package(request.base_package.clone().unwrap_or(defaults.base_package))
            .with_workers(request.worker_count.unwrap_or(defaults.worker_count))
            .with_timeout(self.call_timeout)
            .with_download_base(DOWNLOAD_BASE);
        config.max_workers = self.max_workers;

        let name = match request.project_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.parse()?,
            _ => generated_project_name().parse()?,
        };
        Ok(config.with_project_name(name))
    }

    /// Reserve `name` for one run. `None` while another run holds it.
    pub fn claim(&self, name: &ProjectName) -> Option<ProjectClaim> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.insert(name.as_str().to_owned()).then(|| ProjectClaim {
            active: Arc::clone(&self.active),
            name: name.as_str().to_owned(),
        })
    }

    pub fn client_for(&self, request: &GenerateRequest) -> Arc<dyn GenerationClient> {
        (self.clients)(request.model.as_deref())
    }
}

fn generated_project_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", ProjectName::DEFAULT, &id[..8])
}
