use thiserror::Error;

/// Top-level error type for the Neural Chat core.
///
/// Covers configuration, settings persistence and serialization. The chat
/// crate wraps these into its own `ChatError` so the `?` operator works
/// across the crate boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NeuralError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for NeuralError {
    fn from(err: toml::de::Error) -> Self {
        NeuralError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for NeuralError {
    fn from(err: toml::ser::Error) -> Self {
        NeuralError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for NeuralError {
    fn from(err: serde_json::Error) -> Self {
        NeuralError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for core operations.
pub type Result<T> = std::result::Result<T, NeuralError>;
