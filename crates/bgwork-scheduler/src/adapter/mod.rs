//! Platform scheduling adapters.
//!
//! Both variants implement [`SchedulingAdapter`]. The one a process uses is
//! fixed at build time through [`PlatformAdapter`].

pub mod direct;
pub mod opportunistic;

use std::sync::Arc;

use async_trait::async_trait;
use bgwork_core::{JobConfiguration, JobIdentifier, Platform};
use tracing::debug;

use crate::error::Result;
use crate::provider::JobProvider;
use crate::registry::JobRegistry;

pub use direct::DirectAdapter;
pub use opportunistic::OpportunisticAdapter;

#[cfg(target_os = "ios")]
pub type PlatformAdapter = OpportunisticAdapter;
#[cfg(not(target_os = "ios"))]
pub type PlatformAdapter = DirectAdapter;

/// Native handle the build target's adapter is constructed from.
pub type PlatformContext = <PlatformAdapter as SchedulingAdapter>::Context;

/// Translates registry entries into native schedule/cancel operations.
#[async_trait]
pub trait SchedulingAdapter: Send + Sync + Sized {
    /// Native scheduler handle this adapter drives.
    type Context: Send + Sync;

    fn new(context: Self::Context, registry: Arc<JobRegistry>, provider: Arc<dyn JobProvider>)
        -> Self;

    /// The platform this adapter represents, used for gating.
    fn platform(&self) -> Platform;

    /// Hook run after every `register_jobs` with the full identifier set.
    async fn on_jobs_registered(&self, _ids: &[JobIdentifier]) -> Result<()> {
        Ok(())
    }

    /// Schedule `id`, already known to be registered with `config`.
    async fn schedule_job(&self, id: &JobIdentifier, config: &JobConfiguration) -> Result<()>;

    /// Cancel pending native work for `id`. In-flight executions are not interrupted.
    async fn cancel_job(&self, id: &JobIdentifier) -> Result<()>;
}

/// Whether `config` allows scheduling on `platform`. Logs the skip.
pub(crate) fn is_supported_on(
    id: &JobIdentifier,
    config: &JobConfiguration,
    platform: Platform,
) -> bool {
    let supported = config.supported_platform.includes(platform);
    if !supported {
        debug!(
            job_id = %id,
            %platform,
            supported = ?config.supported_platform,
            "job not supported on this platform; skipping"
        );
    }
    supported
}
