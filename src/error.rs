use thiserror::Error;

/// Upload validation failures, raised before any store write
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The upload declared a size of zero or contained no bytes
    #[error("uploaded file is empty")]
    EmptyFile,

    /// Declared content type is neither a CSV type nor generic text
    #[error("unsupported media type: {0}")]
    InvalidMediaType(String),

    /// The sampled preview looks like binary data, not delimited text
    #[error("file content appears to be binary, not CSV text")]
    BinaryContent,

    /// The header line contained no usable column names
    #[error("no header columns found")]
    NoHeaders,

    /// One or more required columns are absent from the header
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Upload validation failures (fail fast, surfaced verbatim)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Row-level parse failures or rejected bulk writes, aggregated
    /// after in-flight work has drained
    #[error("Processing error: {0}")]
    Processing(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors (store or cache backends, task failures)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Processing(_) => "PROCESSING_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
