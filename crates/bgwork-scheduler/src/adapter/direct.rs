use std::sync::Arc;

use async_trait::async_trait;
use bgwork_core::{JobConfiguration, JobIdentifier, Platform};
use tracing::{info, warn};

use super::{is_supported_on, SchedulingAdapter};
use crate::error::Result;
use crate::native::DirectScheduler;
use crate::provider::JobProvider;
use crate::registry::JobRegistry;
use crate::runner::JobRunner;
use crate::types::{WorkPayload, WorkResult};

/// Adapter for schedulers with native one-time and periodic work.
///
/// Scheduling is cancel-then-enqueue, so scheduling twice leaves one active
/// request. Retry policy belongs to the native layer; native failures are
/// surfaced to the caller since no later cycle would recover them.
pub struct DirectAdapter {
    scheduler: Arc<dyn DirectScheduler>,
    registry: Arc<JobRegistry>,
    provider: Arc<dyn JobProvider>,
    runner: JobRunner,
}

impl DirectAdapter {
    /// Entry point for the native worker when enqueued work fires.
    ///
    /// The payload must carry the job tag and the tag must still be
    /// registered; otherwise the work fails without running anything.
    pub async fn do_work(&self, payload: &WorkPayload) -> WorkResult {
        let Some(tag) = payload.job_tag() else {
            warn!("work payload has no job tag");
            return WorkResult::Failure;
        };
        let Some(id) = self.registry.get_identifier_for(tag) else {
            warn!(job_tag = %tag, "work fired for unregistered job");
            return WorkResult::Failure;
        };

        let result = WorkResult::from(
            self.runner
                .execute_identifier(self.provider.as_ref(), &id)
                .await,
        );
        info!(job_id = %id, ?result, "direct work finished");
        result
    }
}

#[async_trait]
impl SchedulingAdapter for DirectAdapter {
    type Context = Arc<dyn DirectScheduler>;

    fn new(
        context: Self::Context,
        registry: Arc<JobRegistry>,
        provider: Arc<dyn JobProvider>,
    ) -> Self {
        Self {
            scheduler: context,
            registry,
            provider,
            runner: JobRunner::new(),
        }
    }

    fn platform(&self) -> Platform {
        Platform::Android
    }

    async fn schedule_job(&self, id: &JobIdentifier, config: &JobConfiguration) -> Result<()> {
        if !is_supported_on(id, config, self.platform()) {
            return Ok(());
        }

        info!(job_id = %id, periodic = config.periodic, interval_ms = config.interval_in_millis, "scheduling job");
        self.scheduler.cancel_by_tag(id.as_str()).await?;

        let payload = WorkPayload::for_job(id);
        if config.periodic {
            self.scheduler
                .enqueue_periodic(id.as_str(), config.interval(), payload)
                .await?;
        } else {
            self.scheduler.enqueue_one_time(id.as_str(), payload).await?;
        }
        Ok(())
    }

    async fn cancel_job(&self, id: &JobIdentifier) -> Result<()> {
        self.scheduler.cancel_by_tag(id.as_str()).await?;
        info!(job_id = %id, "job cancelled");
        Ok(())
    }
}
