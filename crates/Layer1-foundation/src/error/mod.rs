//! Error types for hostplug
//!
//! 모든 에러를 중앙에서 관리

use std::path::Path;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// hostplug 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 플러그인 로드 관련
    // ========================================================================
    #[error("Invalid package {path}: {reason}")]
    InvalidPackage { path: String, reason: String },

    #[error("Plugin entry point failed: {package} - {message}")]
    EntryPoint { package: String, message: String },

    // ========================================================================
    // Hook 설치 관련 (치명적)
    // ========================================================================
    #[error("Hook installation failed: {0}")]
    HookInstallation(String),

    // ========================================================================
    // Stub 슬롯 관련
    // ========================================================================
    #[error("Cannot launch: no available slot in {pool} (capacity {capacity})")]
    CapacityExceeded { pool: String, capacity: usize },

    // ========================================================================
    // Host 디스패치 관련
    // ========================================================================
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 재시도 가능한 에러인지 확인
    ///
    /// 슬롯이 반환되면 다시 시도할 수 있다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::CapacityExceeded { .. })
    }

    /// 프로세스 시작을 중단해야 하는 에러인지 확인
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::HookInstallation(_))
    }

    /// 패키지 로드 에러 생성 헬퍼
    pub fn invalid_package(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Error::InvalidPackage {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }

    /// 슬롯 고갈 에러 생성 헬퍼
    pub fn capacity(pool: impl Into<String>, capacity: usize) -> Self {
        Error::CapacityExceeded {
            pool: pool.into(),
            capacity,
        }
    }

    /// Hook 설치 에러 생성 헬퍼
    pub fn hook(message: impl Into<String>) -> Self {
        Error::HookInstallation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::capacity("activity.standard", 4).is_retryable());
        assert!(!Error::capacity("activity.standard", 4).is_fatal());
        assert!(Error::hook("dispatcher already replaced").is_fatal());
        assert!(!Error::invalid_package("/tmp/a.json", "missing").is_retryable());
    }

    #[test]
    fn test_messages() {
        let err = Error::capacity("service", 2);
        assert_eq!(
            err.to_string(),
            "Cannot launch: no available slot in service (capacity 2)"
        );

        let err = Error::invalid_package("/plugins/a.json", "file not found");
        assert_eq!(
            err.to_string(),
            "Invalid package /plugins/a.json: file not found"
        );
    }
}
