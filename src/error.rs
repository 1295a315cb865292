//! Error types returned by the command engine

use thiserror::Error;

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;

/// Classification of a command failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Locked,
    BadRequest,
    ServerError,
}

/// Errors surfaced to callers of the command engine
#[derive(Error, Debug)]
pub enum CommandError {
    /// Device, command or device resource could not be resolved
    #[error("{0}")]
    NotFound(String),

    /// Device is administratively locked or operationally disabled
    #[error("{0}")]
    Locked(String),

    /// Malformed or missing parameters
    #[error("{message}")]
    BadRequest {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Cache inconsistency, exceeded limits, transform or driver failure
    #[error("{message}")]
    ServerError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl CommandError {
    pub fn not_found(message: impl Into<String>) -> Self {
        CommandError::NotFound(message.into())
    }

    pub fn locked(message: impl Into<String>) -> Self {
        CommandError::Locked(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        CommandError::BadRequest {
            message: message.into(),
            source: None,
        }
    }

    pub fn bad_request_from(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        CommandError::BadRequest {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        CommandError::ServerError {
            message: message.into(),
            source: None,
        }
    }

    pub fn server_from(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        CommandError::ServerError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::NotFound(_) => ErrorKind::NotFound,
            CommandError::Locked(_) => ErrorKind::Locked,
            CommandError::BadRequest { .. } => ErrorKind::BadRequest,
            CommandError::ServerError { .. } => ErrorKind::ServerError,
        }
    }

    /// HTTP status code a transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Locked => 423,
            ErrorKind::BadRequest => 400,
            ErrorKind::ServerError => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_status_codes() {
        assert_eq!(CommandError::not_found("x").status_code(), 404);
        assert_eq!(CommandError::locked("x").status_code(), 423);
        assert_eq!(CommandError::bad_request("x").status_code(), 400);
        assert_eq!(CommandError::server("x").status_code(), 500);
    }

    #[test]
    fn test_server_error_keeps_cause() {
        let err = CommandError::server_from("driver failed", anyhow::anyhow!("serial port closed"));
        assert_eq!(err.to_string(), "driver failed");
        assert_eq!(err.kind(), ErrorKind::ServerError);
        let cause = err.source().map(|e| e.to_string());
        assert_eq!(cause.as_deref(), Some("serial port closed"));
    }
}
