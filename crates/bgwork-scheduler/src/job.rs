use async_trait::async_trait;

use crate::error::JobError;

/// A unit of background work.
///
/// Jobs hold no scheduling state: the scheduler resolves a fresh (or shared)
/// instance through a [`JobProvider`](crate::provider::JobProvider) on every
/// execution. Returning `Err` or panicking from either method counts as a
/// fault and is contained by the [`JobRunner`](crate::runner::JobRunner).
#[async_trait]
pub trait BackgroundJob: Send + Sync {
    /// Whether the work should run at all right now.
    ///
    /// `Ok(false)` is a controlled skip: `run` is not called and the
    /// execution is reported as unsuccessful.
    async fn validate(&self) -> Result<bool, JobError>;

    /// Do the work. `Ok(true)` means it completed successfully.
    async fn run(&self) -> Result<bool, JobError>;
}
