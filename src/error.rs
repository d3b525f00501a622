//! Error types and handling for the shackboard service

use thiserror::Error;

/// Machine-readable classification of upstream API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The upstream rejected our credentials (HTTP 401/403)
    ApiUnauthorized,
    /// The requested resource does not exist upstream
    ApiNotFound,
    /// The upstream throttled us (HTTP 429)
    ApiRateLimit,
    /// The upstream answered with a body we could not understand
    ApiInvalidResponse,
    /// Transport failure or unexpected status
    ApiNetworkError,
}

/// Main error type for the shackboard service
#[derive(Error, Debug)]
pub enum StationError {
    /// Rejected input: out-of-range coordinates, non-finite readings, bad callsigns
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String, code: ErrorCode },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl StationError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error with an explicit code
    pub fn api<S: Into<String>>(message: S, code: ErrorCode) -> Self {
        Self::Api {
            message: message.into(),
            code,
        }
    }

    /// API error code, if this is an API error
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            StationError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the error means "the thing you asked for does not exist"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(ErrorCode::ApiNotFound)
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            StationError::InvalidInput { message } => format!("Invalid input: {message}"),
            StationError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            StationError::Api {
                code: ErrorCode::ApiNotFound,
                message,
            } => message.clone(),
            StationError::Api { .. } => {
                "Data unavailable. Please try again later.".to_string()
            }
            StationError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
