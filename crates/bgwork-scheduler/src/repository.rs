use std::sync::{Arc, OnceLock};

use bgwork_core::{BgWorkConfig, JobConfiguration, JobIdentifier};
use tracing::info;

use crate::adapter::{PlatformAdapter, PlatformContext, SchedulingAdapter};
use crate::error::{Result, WorkError};
use crate::provider::JobProvider;
use crate::registry::JobRegistry;

static REPOSITORY: OnceLock<BackgroundWorkRepository> = OnceLock::new();

/// Single entry point for registering, scheduling and cancelling background
/// jobs.
///
/// Owns the [`JobRegistry`] and the adapter chosen for the build target.
/// Applications either hold an instance built with [`new`](Self::new) or use
/// the process-wide one from [`initialize`](BackgroundWorkRepository::initialize).
pub struct BackgroundWorkRepository<A: SchedulingAdapter = PlatformAdapter> {
    registry: Arc<JobRegistry>,
    adapter: A,
}

impl<A: SchedulingAdapter> BackgroundWorkRepository<A> {
    pub fn new(context: A::Context, provider: Arc<dyn JobProvider>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let adapter = A::new(context, Arc::clone(&registry), provider);
        Self { registry, adapter }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Replace the registered job set with `jobs` (not a merge).
    pub async fn register_jobs<I>(&self, jobs: I) -> Result<()>
    where
        I: IntoIterator<Item = (JobIdentifier, JobConfiguration)>,
    {
        self.registry.register_jobs(jobs);
        let ids = self.registry.identifiers();
        self.adapter.on_jobs_registered(&ids).await
    }

    /// Register the `[jobs]` table from `config`, rejecting identifiers that
    /// break the authoring rules.
    pub async fn register_from_config(&self, config: &BgWorkConfig) -> Result<()> {
        let table = config.job_table()?;
        self.register_jobs(table).await
    }

    /// Schedule `id` according to its registered configuration.
    ///
    /// Fails with [`WorkError::NotRegistered`] before touching the native
    /// scheduler if `id` was never registered. Job failures are not errors
    /// here; they only show up in logs.
    pub async fn schedule_job(&self, id: &JobIdentifier) -> Result<()> {
        let config = self.registry.get_configuration(id)?;
        self.adapter.schedule_job(id, &config).await
    }

    /// Cancel pending native work for `id`. The registry entry stays.
    pub async fn cancel_job(&self, id: &JobIdentifier) -> Result<()> {
        self.registry.get_configuration(id)?;
        self.adapter.cancel_job(id).await
    }
}

impl BackgroundWorkRepository {
    /// Build the process-wide repository on first call. Later calls return
    /// the existing instance and ignore their arguments.
    pub fn initialize(context: PlatformContext, provider: Arc<dyn JobProvider>) -> &'static Self {
        REPOSITORY.get_or_init(|| {
            let repository = Self::new(context, provider);
            info!(platform = %repository.adapter.platform(), "background work repository initialized");
            repository
        })
    }

    pub fn get_instance() -> Result<&'static Self> {
        REPOSITORY.get().ok_or(WorkError::NotInitialized)
    }
}
