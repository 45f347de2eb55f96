//! TokenEstimator Trait 정의

use serde_json::Value;
use std::fmt::Debug;

/// JSON 값의 직렬화 바이트 길이 (null 은 0)
pub fn serialized_len(value: &Value) -> usize {
    if value.is_null() {
        return 0;
    }
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0)
}

/// 토큰 추정기 트레이트
///
/// 메트릭과 리포트는 이 값만 사용합니다. 정확한 인코더로 교체해도
/// 엔진 코드는 바뀌지 않습니다.
pub trait TokenEstimator: Send + Sync + Debug {
    /// 추정기 이름 (리포트/로그용)
    fn name(&self) -> &str;

    /// 텍스트의 토큰 수 추정
    fn estimate_text(&self, text: &str) -> usize;

    /// JSON 값의 토큰 수 추정
    fn estimate(&self, value: &Value) -> usize {
        if value.is_null() {
            return 0;
        }
        match serde_json::to_string(value) {
            Ok(text) => self.estimate_text(&text),
            Err(_) => 0,
        }
    }

    /// 정확한 토큰 계산 지원 여부
    fn is_exact(&self) -> bool {
        false
    }
}
