//! Error - Pare 에러 타입
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;

/// Pare 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid detail level: {0}")]
    InvalidLevel(String),

    // ========================================================================
    // Preset 관련
    // ========================================================================
    #[error("Preset error: {0}")]
    Preset(String),

    // ========================================================================
    // Cache 관련
    // ========================================================================
    #[error("Cache rejected entry for {operation}: {reason}")]
    CacheRejected { operation: String, reason: String },

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 호출자가 무시하고 진행해도 되는 에러인지 확인
    ///
    /// Cache 거부는 재요청 비용뿐이므로 옵티마이저가 무시하고 진행
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::CacheRejected { .. } | Error::InvalidLevel(_))
    }

    /// Cache 거부 에러 생성 헬퍼
    pub fn cache_rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CacheRejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Preset 에러 생성 헬퍼
    pub fn preset(message: impl Into<String>) -> Self {
        Error::Preset(message.into())
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
