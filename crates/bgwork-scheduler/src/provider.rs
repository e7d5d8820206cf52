use std::collections::HashMap;
use std::sync::Arc;

use bgwork_core::JobIdentifier;
use tracing::debug;

use crate::error::ProviderError;
use crate::job::BackgroundJob;

/// Resolves an identifier to a runnable job at execution time.
///
/// Resolution is late-bound so a job can pick up per-call dependencies.
/// A resolution error fails only the current execution attempt.
pub trait JobProvider: Send + Sync {
    fn get_job(&self, id: &JobIdentifier) -> Result<Arc<dyn BackgroundJob>, ProviderError>;
}

impl<F> JobProvider for F
where
    F: Fn(&JobIdentifier) -> Result<Arc<dyn BackgroundJob>, ProviderError> + Send + Sync,
{
    fn get_job(&self, id: &JobIdentifier) -> Result<Arc<dyn BackgroundJob>, ProviderError> {
        self(id)
    }
}

type JobFactory = Box<dyn Fn() -> Arc<dyn BackgroundJob> + Send + Sync>;

/// Provider backed by one factory per identifier.
///
/// Factories run on every resolution, so a factory that clones a shared
/// `Arc` acts as a long-lived container and one that builds a new value acts
/// as a per-execution scope.
#[derive(Default)]
pub struct FactoryJobProvider {
    factories: HashMap<JobIdentifier, JobFactory>,
}

impl FactoryJobProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `id` to a factory. A later binding for the same identifier wins.
    pub fn with_factory<F>(mut self, id: impl Into<JobIdentifier>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn BackgroundJob> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
        self
    }

    /// Bind `id` to a single shared instance.
    pub fn with_instance(self, id: impl Into<JobIdentifier>, job: Arc<dyn BackgroundJob>) -> Self {
        self.with_factory(id, move || Arc::clone(&job))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl JobProvider for FactoryJobProvider {
    fn get_job(&self, id: &JobIdentifier) -> Result<Arc<dyn BackgroundJob>, ProviderError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| ProviderError::NotFound { id: id.clone() })?;
        debug!(job_id = %id, "resolved job from factory");
        Ok(factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Noop;

    #[async_trait]
    impl BackgroundJob for Noop {
        async fn validate(&self) -> Result<bool, JobError> {
            Ok(true)
        }
        async fn run(&self) -> Result<bool, JobError> {
            Ok(true)
        }
    }

    #[test]
    fn unknown_identifier_is_not_found() {
        let provider = FactoryJobProvider::new();
        let err = provider.get_job(&JobIdentifier::new("SYNC")).err().unwrap();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[test]
    fn factory_runs_per_resolution() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let provider = FactoryJobProvider::new().with_factory("SYNC", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Noop) as Arc<dyn BackgroundJob>
        });

        let id = JobIdentifier::new("SYNC");
        provider.get_job(&id).unwrap();
        provider.get_job(&id).unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn instance_binding_shares_one_job() {
        let job: Arc<dyn BackgroundJob> = Arc::new(Noop);
        let provider = FactoryJobProvider::new().with_instance("SYNC", Arc::clone(&job));

        let resolved = provider.get_job(&JobIdentifier::new("SYNC")).unwrap();
        assert!(Arc::ptr_eq(&job, &resolved));
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn closures_are_providers() {
        let provider = |id: &JobIdentifier| -> Result<Arc<dyn BackgroundJob>, ProviderError> {
            Err(ProviderError::Construction(format!("no container for {id}")))
        };
        assert!(provider.get_job(&JobIdentifier::new("SYNC")).is_err());
    }
}
