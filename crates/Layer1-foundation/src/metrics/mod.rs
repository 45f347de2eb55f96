//! Metrics - 최적화 성능 측정
//!
//! - `recorder.rs` - 호출별 Metric 기록 (bounded ring)
//! - `aggregate.rs` - 기간별 집계 (operation / level 별)
//! - `report.rs` - 텍스트 리포트

mod aggregate;
mod recorder;
mod report;

pub use aggregate::{AggregatedMetrics, LevelMetrics, OperationMetrics};
pub use recorder::{reduction_percentage, Metric, MetricsRecorder, CACHE_LEVEL_LABEL};
pub use report::{render_report, EMPTY_REPORT};
