use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

use crate::error::{CoreError, Result};

/// Stable string key naming one schedulable unit of work.
///
/// The same string is handed to the native scheduler as the request tag and
/// comes back on wake-up, so it must never change between releases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobIdentifier(String);

impl JobIdentifier {
    /// Wrap a string without checking the authoring rules.
    ///
    /// Runtime registration accepts whatever the application registered;
    /// validation happens where identifiers are authored (see [`parse`](Self::parse)).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Wrap a string after checking it is non-blank, whitespace-free and uppercase.
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = |reason| CoreError::InvalidIdentifier {
            id: id.to_string(),
            reason,
        };
        if id.trim().is_empty() {
            return Err(invalid("identifier cannot be empty"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(invalid("identifier cannot contain whitespace"));
        }
        if id.to_uppercase() != id {
            return Err(invalid("identifier must be all uppercase"));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobIdentifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobIdentifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for JobIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets maps keyed by identifier be queried with the raw native tag.
impl Borrow<str> for JobIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The mobile platform a scheduling adapter drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Direct scheduler with native one-time and periodic work.
    Android,
    /// Opportunistic scheduler with single, OS-throttled wake-ups.
    Ios,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        };
        write!(f, "{s}")
    }
}

/// Which platforms honour a scheduling request for a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportedPlatform {
    #[default]
    All,
    AndroidOnly,
    IosOnly,
}

impl SupportedPlatform {
    pub fn includes(self, platform: Platform) -> bool {
        matches!(
            (self, platform),
            (SupportedPlatform::All, _)
                | (SupportedPlatform::AndroidOnly, Platform::Android)
                | (SupportedPlatform::IosOnly, Platform::Ios)
        )
    }
}

/// How often a job runs and where.
///
/// `interval_in_millis` is ignored for one-shot jobs (`periodic = false`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfiguration {
    #[serde(default)]
    pub interval_in_millis: u64,
    pub periodic: bool,
    #[serde(default)]
    pub supported_platform: SupportedPlatform,
}

impl JobConfiguration {
    pub fn one_time() -> Self {
        Self {
            interval_in_millis: 0,
            periodic: false,
            supported_platform: SupportedPlatform::All,
        }
    }

    pub fn periodic(interval_in_millis: u64) -> Self {
        Self {
            interval_in_millis,
            periodic: true,
            supported_platform: SupportedPlatform::All,
        }
    }

    pub fn with_platform(mut self, supported_platform: SupportedPlatform) -> Self {
        self.supported_platform = supported_platform;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_in_millis)
    }
}
