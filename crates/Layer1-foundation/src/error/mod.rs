//! Error types for Switchboard
//!
//! 모든 에러를 중앙에서 관리

use crate::entity::EntityKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Switchboard foundation error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 권한 관련
    // ========================================================================
    /// The acting principal lacks an allow grant for `node`, or a deny grant
    /// overrides it.
    #[error("Access denied: {principal} lacks permission \"{node}\"")]
    AccessDenied { principal: String, node: String },

    // ========================================================================
    // 엔티티 관련
    // ========================================================================
    /// A named target could not be resolved. `name` echoes what was asked for.
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },

    // ========================================================================
    // 플랫폼 관련
    // ========================================================================
    #[error("Platform error: {platform} - {message}")]
    Platform { platform: String, message: String },

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::AccessDenied { .. }
                | Error::NotFound { .. }
                | Error::InvalidArgument(_)
                | Error::Unsupported(_)
        )
    }

    /// AccessDenied 에러 생성 헬퍼
    pub fn access_denied(principal: impl Into<String>, node: impl Into<String>) -> Self {
        Error::AccessDenied {
            principal: principal.into(),
            node: node.into(),
        }
    }

    /// NotFound 에러 생성 헬퍼
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Platform 에러 생성 헬퍼
    pub fn platform(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Platform {
            platform: platform.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_echoes_name() {
        let err = Error::not_found(EntityKind::User, "Alice");
        assert_eq!(err.to_string(), "user not found: Alice");
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_storage_errors_name_the_path() {
        let err = Error::Io {
            path: PathBuf::from("/etc/switchboard/config.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "IO error at /etc/switchboard/config.json: denied"
        );
        assert!(!err.is_user_facing());
    }
}
