//! pare-core: Response Optimization Engine
//!
//! Layer2 - 응답 최적화 엔진
//!
//! # 주요 모듈
//!
//! - `presets`: operation별 필드 프리셋 (minimal / standard / detailed)
//! - `operations`: operation 분류와 기본 detail level
//! - `shaping`: 호출별 형태 설정 (ShapingConfig)
//! - `summarizer`: 배열 요약, 텍스트 자르기, 객체 평탄화
//! - `optimizer`: ResponseOptimizer (projection + cache + metrics)
//!
//! # 사용 예시
//!
//! ```ignore
//! use pare_core::{ResponseOptimizer, ShapingConfig};
//! use pare_foundation::DetailLevel;
//!
//! let optimizer = ResponseOptimizer::load()?;
//! optimizer.start_background_sweep()?;
//!
//! let cfg = ShapingConfig::new()
//!     .level(DetailLevel::Minimal)
//!     .max_items(20);
//!
//! // fetch 는 캐시 미스일 때만 실행
//! let cards = optimizer
//!     .optimize_with_cache("get_cards_in_list", &json!({"listId": id}), || api.cards(id), Some(&cfg))
//!     .await?;
//!
//! // 쓰기 후 stale 해진 읽기 캐시 제거
//! optimizer.invalidate_cache("update_card");
//!
//! println!("{}", optimizer.generate_report(None));
//! optimizer.shutdown().await;
//! ```

pub mod operations;
pub mod optimizer;
pub mod presets;
pub mod shaping;
pub mod summarizer;

// ============================================================================
// Engine
// ============================================================================
pub use optimizer::{
    EngineSettings, OptimizationStats, ResponseOptimizer, ResponseOptimizerBuilder,
};

// ============================================================================
// Presets / Shaping
// ============================================================================
pub use operations::{default_level_for, OperationKind};
pub use presets::{FieldPreset, OperationPresets, PresetRegistry};
pub use shaping::ShapingConfig;

// ============================================================================
// Summarizer
// ============================================================================
pub use summarizer::{
    describe, flatten_object, generate_stats, should_summarize, summarize_array,
    summary_response, truncate_content, ArraySummary, EntityKind, SummaryOptions, SummaryStats,
    TruncationResult,
};

// 엔진과 함께 쓰는 foundation 타입 re-export
pub use pare_foundation::{DetailLevel, Error, OptimizationConfig, Result};
