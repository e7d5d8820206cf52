//! `bgwork-scheduler`: one scheduling API over two mobile background-task
//! schedulers.
//!
//! # Overview
//!
//! Jobs are registered by [`JobIdentifier`](bgwork_core::JobIdentifier) with a
//! [`JobConfiguration`](bgwork_core::JobConfiguration) and resolved to a
//! [`BackgroundJob`] through a [`JobProvider`] only when they execute. The
//! [`BackgroundWorkRepository`] facade funnels every call to the adapter
//! selected for the build target.
//!
//! # Adapters
//!
//! | Adapter                  | Native scheduler             | Periodicity                       |
//! |--------------------------|------------------------------|-----------------------------------|
//! | [`DirectAdapter`]        | One-time + periodic enqueue  | Native                            |
//! | [`OpportunisticAdapter`] | Single earliest-begin wake-up| Simulated by re-arming every run  |

pub mod adapter;
pub mod error;
pub mod job;
pub mod native;
pub mod provider;
pub mod registry;
pub mod repository;
pub mod runner;
pub mod schedule;
pub mod types;

pub use adapter::{
    DirectAdapter, OpportunisticAdapter, PlatformAdapter, PlatformContext, SchedulingAdapter,
};
pub use error::{JobError, NativeError, ProviderError, Result, WorkError};
pub use job::BackgroundJob;
pub use native::{
    BackgroundTask, DirectScheduler, ExpirationHandler, OpportunisticScheduler, WakeUpHandler,
};
pub use provider::{FactoryJobProvider, JobProvider};
pub use registry::JobRegistry;
pub use repository::BackgroundWorkRepository;
pub use runner::JobRunner;
pub use types::{JobState, RunOutcome, WorkPayload, WorkResult, JOB_TAG_KEY};
