use bthost_settings::SettingsError;
use thiserror::Error;

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity subsystem errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("malformed identity key: {0}")]
    InvalidKey(String),

    #[error("identity generation failed: {0}")]
    Generation(String),

    #[error("settings store error: {0}")]
    Settings(#[from] SettingsError),
}
