use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// An identifier broke the authoring rules (blank, whitespace, lowercase).
    #[error("Invalid job identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Short error code string, stable across releases for log filtering.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidIdentifier { .. } => "INVALID_IDENTIFIER",
            CoreError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
