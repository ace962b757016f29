//! Error types for configuration, storage and serialization
//!
//! Failures of the REST client and of the push manager have their own enums
//! in the sibling modules; everything else funnels through `AppError`.

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidConfigValue {
        key: String,
        value: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unknown configuration key: {key}")]
    UnknownConfigKey { key: String },

    // Credential storage errors
    #[error("Credential storage error for '{key}': {operation}")]
    Storage {
        key: String,
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // I/O errors
    #[error("File I/O error for '{path}': {operation}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Serialization errors
    #[error("JSON serialization error: {context}")]
    JsonSerialization {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("JSON deserialization error: {context}")]
    JsonDeserialization {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("TOML parsing error: {context}")]
    TomlParsing {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Network errors raised while building the HTTP stack
    #[error("HTTP client error: {message}")]
    HttpClient {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parse error for '{input}': {expected}")]
    Parse {
        input: String,
        expected: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Logging initialization failed: {message}")]
    LoggingInit { message: String },

    // Generic/catch-all errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new InvalidConfigValue error
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            key: key.into(),
            value: value.into(),
            source: None,
        }
    }

    /// Create a new Storage error with source
    pub fn storage_with_source(
        key: impl Into<String>,
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            key: key.into(),
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new I/O error with source
    pub fn io_with_source(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new HttpClient error with source
    pub fn http_client_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::HttpClient {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::UnknownConfigKey { .. } => "config",
            Self::Storage { .. } => "storage",
            Self::Io { .. } => "io",
            Self::JsonSerialization { .. } | Self::JsonDeserialization { .. } | Self::TomlParsing { .. } => "serialization",
            Self::HttpClient { .. } => "network",
            Self::Parse { .. } => "validation",
            Self::LoggingInit { .. } => "logging",
            Self::Internal { .. } | Self::Other { .. } => "internal",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let operation = match err.kind() {
            std::io::ErrorKind::NotFound => "file not found",
            std::io::ErrorKind::PermissionDenied => "permission denied",
            _ => "I/O operation",
        }
        .to_string();

        Self::Io {
            path: PathBuf::from("unknown"),
            operation,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() {
            Self::JsonDeserialization {
                context: format!("JSON syntax error at line {} column {}", err.line(), err.column()),
                source: Some(Box::new(err)),
            }
        } else if err.is_data() {
            Self::JsonDeserialization {
                context: "JSON data error".to_string(),
                source: Some(Box::new(err)),
            }
        } else if err.is_eof() {
            Self::JsonDeserialization {
                context: "Unexpected end of JSON input".to_string(),
                source: Some(Box::new(err)),
            }
        } else {
            Self::JsonSerialization {
                context: "JSON serialization error".to_string(),
                source: Some(Box::new(err)),
            }
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlParsing {
            context: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::Parse {
            input: "URL".to_string(),
            expected: "valid URL format".to_string(),
            source: Some(Box::new(err)),
        }
    }
}
