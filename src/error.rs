use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// No observations matched the requested filter
    #[error("Insufficient data: {0}")]
    DataInsufficient(String),

    /// The train/test split could not preserve class balance
    #[error("Stratification error: {0}")]
    Stratification(String),

    /// Neither the disease-specific nor the combined model exists
    #[error("No trained model: {0}")]
    ModelNotFound(String),

    /// Observation not found in the repository
    #[error("Not found: {0}")]
    NotFound(String),

    /// Artifact write/read failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::DataInsufficient(_) => "DATA_INSUFFICIENT",
            AppError::Stratification(_) => "STRATIFICATION_ERROR",
            AppError::ModelNotFound(_) => "MODEL_NOT_FOUND",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure was caused by the caller's input rather than the engine
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::DataInsufficient(_)
                | AppError::Stratification(_)
                | AppError::ModelNotFound(_)
                | AppError::NotFound(_)
                | AppError::Validation(_)
        )
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
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
