//! # pare-foundation
//!
//! Pare 기반 레이어:
//! - Config: 전역 최적화 설정 (OptimizationConfig, DetailLevel)
//! - Cache: 응답 캐시 (key, policy, TTL store, background sweep)
//! - Metrics: 호출별 크기 감소 기록, 집계, 리포트
//! - Tokenizer: 토큰 수 추정 (bytes / 4)
//! - Storage: JsonStore (설정 파일)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  pare-core  ResponseOptimizer                          │
//! │                     │                                   │
//! │          ┌──────────┼───────────┐                       │
//! │          ▼          ▼           ▼                       │
//! │   ResponseCache  CachePolicy  MetricsRecorder           │
//! │        ▲                        │                       │
//! │   CacheSweeper            TokenEstimator                │
//! │                                                         │
//! │   OptimizationConfig ◄── JsonStore + env overrides      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod tokenizer;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{DetailLevel, OptimizationConfig, OPTIMIZATION_CONFIG_FILE};

// ============================================================================
// Cache
// ============================================================================
pub use cache::{
    canonical_json, CacheEntry, CacheKey, CachePolicy, CacheSweeper, ResponseCache,
    ResponseCacheConfig, ResponseCacheStats,
};

// ============================================================================
// Metrics
// ============================================================================
pub use metrics::{
    reduction_percentage, AggregatedMetrics, LevelMetrics, Metric, MetricsRecorder,
    OperationMetrics, CACHE_LEVEL_LABEL,
};

// ============================================================================
// Storage / Tokenizer
// ============================================================================
pub use storage::JsonStore;
pub use tokenizer::{serialized_len, ByteLengthEstimator, TokenEstimator};
