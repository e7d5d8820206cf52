//! Capabilities the host OS scheduler must provide.
//!
//! Platform bindings implement these traits over the real services; the
//! adapters only ever talk to the traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NativeError;
use crate::types::WorkPayload;

/// A scheduler with persistent one-time and periodic work (WorkManager family).
///
/// Work enqueued under an identifier must also be tagged with it so that
/// [`cancel_by_tag`](Self::cancel_by_tag) reaches every instance.
#[async_trait]
pub trait DirectScheduler: Send + Sync {
    async fn enqueue_one_time(&self, id: &str, payload: WorkPayload) -> Result<(), NativeError>;

    async fn enqueue_periodic(
        &self,
        id: &str,
        interval: Duration,
        payload: WorkPayload,
    ) -> Result<(), NativeError>;

    /// Cancel all pending work tagged `tag`. Cancelling nothing is not an error.
    async fn cancel_by_tag(&self, tag: &str) -> Result<(), NativeError>;
}

/// A scheduler that only grants opportunistic wake-ups (BGTaskScheduler family).
#[async_trait]
pub trait OpportunisticScheduler: Send + Sync {
    /// Ask for one wake-up no earlier than `earliest_begin`.
    async fn submit_earliest_begin_request(
        &self,
        id: &str,
        earliest_begin: DateTime<Utc>,
    ) -> Result<(), NativeError>;

    async fn cancel_request(&self, id: &str) -> Result<(), NativeError>;

    /// Install the handler invoked for every future wake-up of `id`.
    ///
    /// Platforms in this family reject a second registration for the same
    /// identifier within one process lifetime.
    fn register_callback(&self, id: &str, handler: Arc<dyn WakeUpHandler>)
        -> Result<(), NativeError>;
}

/// Callback run by the OS when an expiring execution window is revoked.
pub type ExpirationHandler = Box<dyn FnOnce() + Send + 'static>;

/// The OS-side handle for one granted execution window.
pub trait BackgroundTask: Send + Sync {
    /// Identifier the wake-up was requested under.
    fn identifier(&self) -> &str;

    /// Called at most once, possibly from another thread, if the OS takes
    /// the execution window back before completion is reported.
    fn set_expiration_handler(&self, handler: ExpirationHandler);

    /// Report the end of this execution window.
    fn set_task_completed(&self, success: bool);
}

/// Receiver for wake-ups on the opportunistic platform.
#[async_trait]
pub trait WakeUpHandler: Send + Sync {
    async fn on_wake_up(&self, task: Arc<dyn BackgroundTask>);
}
