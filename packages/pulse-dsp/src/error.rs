use thiserror::Error;

#[derive(Error, Debug)]
pub enum DspError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Non-finite value at index {0}")]
    NonFinite(usize),

    #[error("Zero variance: {0}")]
    ZeroVariance(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("FastICA failed: {0}")]
    Ica(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DspError>;
