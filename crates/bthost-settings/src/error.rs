use thiserror::Error;

/// Result type for settings-store operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Settings-store errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings subsystem init failed: {0}")]
    Init(String),

    #[error("replay entry carries no key")]
    MissingKey,

    #[error("unrecognized settings key: {0}")]
    UnknownKey(String),

    #[error("invalid value length for {key}: expected {expected}, got {actual}")]
    InvalidLength {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("value read failed: {0}")]
    Read(String),

    #[error("value write failed: {0}")]
    Write(String),

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("backend error: {0}")]
    Backend(String),
}
