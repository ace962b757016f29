//! Errors returned by the authenticated REST client
//!
//! Also resolves the human-readable message shown to users: the backend's
//! own `message`/`error` field first, then a status-keyed default, then the
//! error's display text, then the caller's fallback. The first two steps
//! only apply to `ApiError`; every `ApiError` displays something, so the
//! fallback is reached by other errors with an empty message.

use serde_json::Value;
use thiserror::Error;

/// Fallback shown when nothing better is known
pub const DEFAULT_ERROR_MESSAGE: &str = "Erro desconhecido";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request {method} {path} failed: {message}")]
    Transport {
        method: String,
        path: String,
        message: String,
    },

    #[error("Unauthorized request to {path}")]
    Unauthorized { path: String, body: Option<Value> },

    #[error("Forbidden request to {path}")]
    Forbidden { path: String, body: Option<Value> },

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Credential storage failed: {0}")]
    Storage(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message provided by the backend in the `message` or `error` field
    pub fn backend_message(&self) -> Option<&str> {
        let body = match self {
            Self::Unauthorized { body, .. } | Self::Forbidden { body, .. } | Self::Status { body, .. } => {
                body.as_ref()?
            }
            _ => return None,
        };

        ["message", "error"]
            .iter()
            .filter_map(|field| body.get(*field).and_then(Value::as_str))
            .find(|msg| !msg.is_empty())
    }

    /// True for 401/403 and refresh failures
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::Forbidden { .. } | Self::RefreshFailed(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Unauthorized { .. } | Self::Forbidden { .. } | Self::RefreshFailed(_) => "auth",
            Self::Status { .. } => "validation",
            Self::Decode { .. } | Self::InvalidRequest(_) => "serialization",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<crate::errors::AppError> for ApiError {
    fn from(err: crate::errors::AppError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Default user-facing message for an HTTP status
pub fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Dados inválidos. Verifique os campos e tente novamente."),
        401 => Some("Não autorizado. Faça login novamente."),
        403 => Some("Você não tem permissão para realizar esta ação."),
        404 => Some("Recurso não encontrado."),
        409 => Some("Conflito: este item já existe ou está em uso."),
        422 => Some("Dados não processáveis. Verifique os campos obrigatórios."),
        500 => Some("Erro interno do servidor. Tente novamente mais tarde."),
        503 => Some("Serviço temporariamente indisponível. Tente novamente em alguns instantes."),
        s if s >= 500 => Some("Erro no servidor. Tente novamente mais tarde."),
        _ => None,
    }
}

/// Resolve the message to show for a failed call
pub fn error_message(error: &(dyn std::error::Error + 'static), default: &str) -> String {
    if let Some(api_error) = error.downcast_ref::<ApiError>() {
        if let Some(message) = api_error.backend_message() {
            return message.to_string();
        }

        if let Some(message) = api_error.status().and_then(status_message) {
            return message.to_string();
        }
    }

    let own = error.to_string();
    if own.trim().is_empty() {
        default.to_string()
    } else {
        own
    }
}

/// Per-operation fallbacks used by the CLI
pub struct ErrorMessages;

impl ErrorMessages {
    pub fn load(error: &(dyn std::error::Error + 'static)) -> String {
        error_message(error, "Falha ao carregar dados")
    }

    pub fn save(error: &(dyn std::error::Error + 'static)) -> String {
        error_message(error, "Falha ao salvar")
    }

    pub fn delete(error: &(dyn std::error::Error + 'static)) -> String {
        error_message(error, "Falha ao remover")
    }

    pub fn login(error: &(dyn std::error::Error + 'static)) -> String {
        error_message(error, "Falha ao entrar")
    }

    pub fn unknown(error: &(dyn std::error::Error + 'static)) -> String {
        error_message(error, DEFAULT_ERROR_MESSAGE)
    }
}
