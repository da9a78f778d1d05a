//! Error types for Frumpy

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FrumpyError>;

#[derive(Error, Debug)]
pub enum FrumpyError {
    #[error("Missing initial model")]
    MissingModel,

    #[error("Invalid model: expected an object, got {0}")]
    InvalidModel(String),

    #[error("Empty handler chain for event '{0}'")]
    EmptyChain(String),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Model change cascade exceeded {limit} rounds")]
    ChangeCascade { limit: usize },

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FrumpyError {
    /// Shorthand for handlers that need to abort a chain.
    pub fn handler(message: impl Into<String>) -> Self {
        FrumpyError::Handler(message.into())
    }

    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FrumpyError::MissingModel
            | FrumpyError::InvalidModel(_)
            | FrumpyError::EmptyChain(_)
            | FrumpyError::InvalidArgument(_) => 3,
            FrumpyError::ChangeCascade { .. } => 2,
            FrumpyError::Handler(_)
            | FrumpyError::UnknownCapability(_)
            | FrumpyError::Transport(_)
            | FrumpyError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),
}
