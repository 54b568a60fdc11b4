//! High-level runtime orchestrator.
//!
//! The runtime loads the wardrobe from its repository, owns the apply
//! pipeline and the expiry worker, and exposes a builder-based API for
//! clients to wire in their collaborators.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{Collaborators, OwnerOnly, PermissionProvider, Result, RuntimeError};
use crate::events::EventBus;
use crate::oracle::CatalogManager;
use crate::pipeline::{
    ApplyPipeline, Clock, CursedLootConfig, PipelineConfig, PipelineDeps, RedrawWaitConfig,
    SystemClock,
};
use crate::repository::{FileWardrobeRepository, WardrobeRepository, WardrobeStore};
use crate::workers::ExpiryWorker;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    pub redraw: RedrawWaitConfig,
    /// How often the expiry worker sweeps. Zero disables the worker.
    pub expiry_interval: Duration,
    pub loot: CursedLootConfig,
    /// Directory of the file repository used when none is supplied.
    pub data_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 100,
            redraw: RedrawWaitConfig::default(),
            expiry_interval: Duration::from_secs(1),
            loot: CursedLootConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `WARDROBE_DATA_DIR` - Repository directory (default: platform data dir)
    /// - `WARDROBE_EVENT_BUFFER` - Per-topic event capacity (default: 100)
    /// - `WARDROBE_EXPIRY_INTERVAL_MS` - Expiry sweep interval (default: 1000, 0 disables)
    /// - `WARDROBE_REDRAW_INITIAL_MS` - First redraw poll delay (default: 10)
    /// - `WARDROBE_REDRAW_MAX_MS` - Longest redraw poll delay (default: 1000)
    /// - `WARDROBE_REDRAW_TIMEOUT_MS` - Redraw wait timeout (default: 5000)
    /// - `WARDROBE_LOOT_MIN_SECS` / `WARDROBE_LOOT_MAX_SECS` - Cursed loot duration bounds
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("WARDROBE_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(capacity) = read_env::<usize>("WARDROBE_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(ms) = read_env::<u64>("WARDROBE_EXPIRY_INTERVAL_MS") {
            config.expiry_interval = Duration::from_millis(ms);
        }

        if let Some(ms) = read_env::<u64>("WARDROBE_REDRAW_INITIAL_MS") {
            config.redraw.initial_delay = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = read_env::<u64>("WARDROBE_REDRAW_MAX_MS") {
            config.redraw.max_delay = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = read_env::<u64>("WARDROBE_REDRAW_TIMEOUT_MS") {
            config.redraw.timeout = Duration::from_millis(ms);
        }

        if let Some(secs) = read_env::<u64>("WARDROBE_LOOT_MIN_SECS") {
            config.loot.min_duration = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>("WARDROBE_LOOT_MAX_SECS") {
            config.loot.max_duration = Duration::from_secs(secs);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "wardrobe")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".wardrobe"))
}

/// Owns the pipeline and background workers.
///
/// [`ApplyPipeline`] is the cloneable façade clients drive.
pub struct Runtime {
    pipeline: ApplyPipeline,
    shutdown: CancellationToken,
    expiry_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn pipeline(&self) -> ApplyPipeline {
        self.pipeline.clone()
    }

    pub fn events(&self) -> &EventBus {
        self.pipeline.events()
    }

    /// Stop the expiry worker and wait for it to finish its sweep.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        if let Some(handle) = self.expiry_handle {
            handle.await.map_err(RuntimeError::WorkerJoin)?;
        }
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    repository: Option<Arc<dyn WardrobeRepository>>,
    collaborators: Option<Collaborators>,
    permissions: Option<Arc<dyn PermissionProvider>>,
    clock: Option<Arc<dyn Clock>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            repository: None,
            collaborators: None,
            permissions: None,
            clock: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `repository` instead of a file repository under `data_dir`.
    pub fn repository(mut self, repository: Arc<dyn WardrobeRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Defaults to collaborators that only log.
    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = Some(collaborators);
        self
    }

    /// Defaults to [`OwnerOnly`].
    pub fn permissions(mut self, permissions: Arc<dyn PermissionProvider>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Loads the wardrobe and starts the workers.
    pub async fn build(self) -> Result<Runtime> {
        let repository: Arc<dyn WardrobeRepository> = match self.repository {
            Some(repository) => repository,
            None => Arc::new(FileWardrobeRepository::new(&self.config.data_dir)?),
        };
        let store = WardrobeStore::new(repository);
        let (state, catalog) = store.load()?;

        let deps = PipelineDeps {
            store,
            catalog: CatalogManager::new(catalog),
            collaborators: self.collaborators.unwrap_or_else(Collaborators::logging),
            permissions: self.permissions.unwrap_or_else(|| Arc::new(OwnerOnly)),
            events: EventBus::with_capacity(self.config.event_buffer_size),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };
        let pipeline = ApplyPipeline::new(
            state,
            deps,
            PipelineConfig {
                redraw: self.config.redraw.clone(),
                loot: self.config.loot.clone(),
            },
        );

        let shutdown = CancellationToken::new();
        let expiry_handle = (!self.config.expiry_interval.is_zero()).then(|| {
            let worker = ExpiryWorker::new(
                pipeline.clone(),
                self.config.expiry_interval,
                shutdown.child_token(),
            );
            tokio::spawn(worker.run())
        });

        Ok(Runtime {
            pipeline,
            shutdown,
            expiry_handle,
        })
    }
}
