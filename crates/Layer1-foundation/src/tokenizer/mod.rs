//! Tokenizer - 토큰 수 추정
//!
//! 응답 크기는 직렬화된 JSON 바이트 길이 / 4 로 근사합니다.
//! 정확한 인코더가 필요하면 `TokenEstimator` 를 구현해 교체합니다.

mod estimator;
mod traits;

pub use estimator::ByteLengthEstimator;
pub use traits::{serialized_len, TokenEstimator};
