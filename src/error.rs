use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{dao::storage::StorageError, state::state_machine::InvalidTransition};

/// Chat-facing failures raised while arbitrating one event.
///
/// Every variant is answered in the room; `chatty` replies are only sent in verbose mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Malformed or contextually illegal input.
    #[error("{message}")]
    InvalidInput {
        /// Reply sent to the room.
        message: String,
        /// Only sent in verbose mode.
        chatty: bool,
    },
    /// Trusted or super-user gate failure.
    #[error("{message}")]
    Forbidden {
        /// Reply sent to the room.
        message: String,
        /// Only sent in verbose mode.
        chatty: bool,
    },
    /// Action is illegal in the current game or clue state.
    #[error("{message}")]
    Conflict {
        /// Reply sent to the room.
        message: String,
        /// Only sent in verbose mode.
        chatty: bool,
    },
    /// Reference to a clue or game that does not exist.
    #[error("{message}")]
    NotFound {
        /// Reply sent to the room.
        message: String,
        /// Only sent in verbose mode.
        chatty: bool,
    },
    /// The game archive could not be reached for a request that needs it.
    #[error("{message}")]
    Unavailable {
        /// Reply sent to the room.
        message: String,
    },
}

impl GameError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            chatty: false,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            chatty: false,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            chatty: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            chatty: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Mark the reply as verbose-only.
    pub fn chatty(mut self) -> Self {
        match &mut self {
            Self::InvalidInput { chatty, .. }
            | Self::Forbidden { chatty, .. }
            | Self::Conflict { chatty, .. }
            | Self::NotFound { chatty, .. } => *chatty = true,
            Self::Unavailable { .. } => {}
        }
        self
    }

    /// Whether the reply is suppressed outside verbose mode.
    pub fn is_chatty(&self) -> bool {
        match self {
            Self::InvalidInput { chatty, .. }
            | Self::Forbidden { chatty, .. }
            | Self::Conflict { chatty, .. }
            | Self::NotFound { chatty, .. } => *chatty,
            Self::Unavailable { .. } => false,
        }
    }
}

/// Last-resort reply when a handler reaches the state machine in a phase it did not check for.
impl From<InvalidTransition> for GameError {
    fn from(err: InvalidTransition) -> Self {
        tracing::warn!(error = %err, "unguarded phase transition rejected");
        GameError::conflict("I can't do that right now.").chatty()
    }
}

/// Result alias used by every referee handler.
pub type GameResult<T = ()> = Result<T, GameError>;

/// Errors raised by the HTTP-facing services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
