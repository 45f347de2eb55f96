//! Config - 최적화 설정 관리
//!
//! - `level.rs` - DetailLevel (minimal / standard / detailed / full)
//! - `optimization.rs` - OptimizationConfig 전역 설정

mod level;
mod optimization;

pub use level::{lenient, DetailLevel};
pub use optimization::{OptimizationConfig, OPTIMIZATION_CONFIG_FILE};
