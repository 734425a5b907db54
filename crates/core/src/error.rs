use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Capability already registered: {0}")]
    DuplicateCapability(String),

    #[error("Unknown capability: {0}")]
    CapabilityNotFound(String),

    #[error("Invalid arguments for {capability}: fields {fields:?}")]
    InvalidArguments {
        capability: String,
        fields: Vec<String>,
    },

    #[error("Capability {capability} failed: {message}")]
    ExecutionFailure {
        capability: String,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
