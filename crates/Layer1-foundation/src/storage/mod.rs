//! Storage - 설정 파일 저장소
//!
//! - `json`: JSON - 설정/preset 파일 저장/로드
//!
//! 캐시된 응답은 디스크에 저장하지 않음. 설정 파일만 저장

mod json;

pub use json::JsonStore;
