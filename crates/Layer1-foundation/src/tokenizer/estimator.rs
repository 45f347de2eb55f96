//! 바이트 길이 기반 추정기

use super::traits::TokenEstimator;

/// `ceil(bytes / bytes_per_token)` 추정 (기본 4바이트당 1토큰)
#[derive(Debug, Clone, Copy)]
pub struct ByteLengthEstimator {
    bytes_per_token: usize,
}

impl ByteLengthEstimator {
    pub fn new() -> Self {
        Self { bytes_per_token: 4 }
    }

    /// 0 은 1 로 보정
    pub fn with_ratio(bytes_per_token: usize) -> Self {
        Self {
            bytes_per_token: bytes_per_token.max(1),
        }
    }

    pub fn bytes_per_token(&self) -> usize {
        self.bytes_per_token
    }
}

impl Default for ByteLengthEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenEstimator for ByteLengthEstimator {
    fn name(&self) -> &str {
        "byte-length"
    }

    fn estimate_text(&self, text: &str) -> usize {
        text.len().div_ceil(self.bytes_per_token)
    }
}
