//! Operation context for errors raised outside the typed enums

use super::types::AppError;

/// What was being attempted when an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub operation: String,
    pub component: Option<String>,
    pub additional_info: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            component: None,
            additional_info: None,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_additional_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = Some(info.into());
        self
    }

    /// Render as a single `a | b | c` line
    pub fn describe(&self) -> String {
        let mut parts = vec![self.operation.clone()];

        if let Some(ref component) = self.component {
            parts.push(format!("component: {}", component));
        }

        if let Some(ref info) = self.additional_info {
            parts.push(info.clone());
        }

        parts.join(" | ")
    }
}

/// Like anyhow's `context`, but producing `AppError`
pub trait ErrorContextExt<T> {
    fn with_context_lazy<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;

    fn with_error_context(self, context: ErrorContext) -> Result<T, AppError>;
}

impl<T, E> ErrorContextExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context_lazy<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::Other {
            message: format!("{}: {}", f(), e),
            source: Some(Box::new(e)),
        })
    }

    fn with_error_context(self, context: ErrorContext) -> Result<T, AppError> {
        self.map_err(|e| AppError::Other {
            message: format!("{}: {}", context.describe(), e),
            source: Some(Box::new(e)),
        })
    }
}
