//! `bgwork-core`: shared value types, errors and configuration for the
//! background work scheduler and its identifier generator.

pub mod config;
pub mod error;
pub mod types;

pub use config::BgWorkConfig;
pub use error::{CoreError, Result};
pub use types::{JobConfiguration, JobIdentifier, Platform, SupportedPlatform};
