//! Error types for built-in commands

use switchboard_event::EventError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CommandError>;

/// Command error type
#[derive(Error, Debug)]
pub enum CommandError {
    /// Collaborator failure (`AccessDenied`, `NotFound`, ...), unchanged.
    #[error(transparent)]
    Foundation(#[from] switchboard_foundation::Error),

    /// Publishing the command's domain event failed.
    #[error("Event dispatch failed: {0}")]
    Event(#[from] EventError),

    /// The caller supplied something the command cannot act on.
    #[error("{0}")]
    InvalidArgument(String),

    /// The command was valid but carrying it out failed.
    #[error("{message}")]
    Execution {
        message: String,
        #[source]
        source: Option<switchboard_foundation::Error>,
    },
}

impl CommandError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CommandError::InvalidArgument(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        CommandError::Execution {
            message: message.into(),
            source: None,
        }
    }

    pub fn execution_caused_by(
        message: impl Into<String>,
        source: switchboard_foundation::Error,
    ) -> Self {
        CommandError::Execution {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        match self {
            CommandError::Foundation(err) => err.is_user_facing(),
            CommandError::InvalidArgument(_) | CommandError::Execution { .. } => true,
            CommandError::Event(_) => false,
        }
    }

    /// The foundation error behind this one, if any.
    pub fn as_foundation(&self) -> Option<&switchboard_foundation::Error> {
        match self {
            CommandError::Foundation(err) => Some(err),
            CommandError::Execution { source, .. } => source.as_ref(),
            _ => None,
        }
    }
}
