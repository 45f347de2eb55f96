//! Metrics recorder - 호출별 크기 감소 기록
//!
//! 최적화 호출마다 [`Metric`] 하나를 bounded ring 에 추가합니다.
//! ring 이 가득 차면 가장 오래된 항목을 버립니다.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::aggregate::{AggregatedMetrics, OperationMetrics};
use super::report::render_report;
use crate::config::OptimizationConfig;
use crate::tokenizer::{ByteLengthEstimator, TokenEstimator};

/// 캐시 히트 메트릭의 level 라벨
pub const CACHE_LEVEL_LABEL: &str = "cache";

/// 이 비율을 넘는 감소는 로그로 남김
const NOTABLE_REDUCTION_PCT: f64 = 50.0;

/// `(original - optimized) / original * 100`, original 이 0 이면 0
pub fn reduction_percentage(original: usize, optimized: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - optimized as f64) / original as f64 * 100.0
}

/// 최적화 호출 1건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub operation: String,
    /// Detail level 이름, 캐시 히트는 `cache`
    pub level: String,
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    pub reduction_pct: f64,
    pub elapsed: Duration,
    pub cache_hit: bool,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    pub fn new(
        operation: impl Into<String>,
        level: impl Into<String>,
        original_tokens: usize,
        optimized_tokens: usize,
        elapsed: Duration,
        cache_hit: bool,
    ) -> Self {
        Self {
            operation: operation.into(),
            level: level.into(),
            original_tokens,
            optimized_tokens,
            reduction_pct: reduction_percentage(original_tokens, optimized_tokens),
            elapsed,
            cache_hit,
            timestamp: Utc::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn tokens_saved(&self) -> i64 {
        self.original_tokens as i64 - self.optimized_tokens as i64
    }
}

/// 옵티마이저가 공유하는 메트릭 ring
#[derive(Debug)]
pub struct MetricsRecorder {
    enabled: AtomicBool,
    capacity: usize,
    estimator: Arc<dyn TokenEstimator>,
    metrics: Mutex<VecDeque<Metric>>,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl MetricsRecorder {
    pub fn new(capacity: usize) -> Self {
        Self::with_estimator(capacity, Arc::new(ByteLengthEstimator::new()))
    }

    /// capacity 는 최소 1
    pub fn with_estimator(capacity: usize, estimator: Arc<dyn TokenEstimator>) -> Self {
        let capacity = capacity.max(1);
        Self {
            enabled: AtomicBool::new(true),
            capacity,
            estimator,
            metrics: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// 설정값으로 크기/활성화 결정. `None` 이면 [`ByteLengthEstimator`] 사용
    pub fn from_config(
        config: &OptimizationConfig,
        estimator: Option<Arc<dyn TokenEstimator>>,
    ) -> Self {
        let recorder = match estimator {
            Some(estimator) => Self::with_estimator(config.metrics_capacity, estimator),
            None => Self::new(config.metrics_capacity),
        };
        recorder.set_enabled(config.enable_metrics);
        recorder
    }

    pub fn estimator(&self) -> &Arc<dyn TokenEstimator> {
        &self.estimator
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// 미리 계산된 토큰 추정치로 기록
    pub fn record(
        &self,
        operation: &str,
        original_estimate: usize,
        optimized_estimate: usize,
        level: &str,
        elapsed: Duration,
        cache_hit: bool,
    ) {
        if !self.is_enabled() {
            return;
        }
        self.push(Metric::new(
            operation,
            level,
            original_estimate,
            optimized_estimate,
            elapsed,
            cache_hit,
        ));
    }

    /// 설정된 추정기로 양쪽을 추정해서 기록
    pub fn record_values(
        &self,
        operation: &str,
        original: &Value,
        optimized: &Value,
        level: &str,
        elapsed: Duration,
        cache_hit: bool,
    ) {
        if !self.is_enabled() {
            return;
        }
        let original_estimate = self.estimator.estimate(original);
        let optimized_estimate = self.estimator.estimate(optimized);
        self.record(
            operation,
            original_estimate,
            optimized_estimate,
            level,
            elapsed,
            cache_hit,
        );
    }

    pub fn push(&self, metric: Metric) {
        if metric.reduction_pct > NOTABLE_REDUCTION_PCT {
            debug!(
                operation = %metric.operation,
                level = %metric.level,
                original = metric.original_tokens,
                optimized = metric.optimized_tokens,
                reduction = format!("{:.1}%", metric.reduction_pct),
                "Significant response reduction"
            );
        }

        let mut metrics = self.metrics.lock();
        if metrics.len() >= self.capacity {
            metrics.pop_front();
        }
        metrics.push_back(metric);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// 현재 기준 `window` 이내 메트릭 집계 (`None` 이면 전체)
    pub fn aggregate(&self, window: Option<Duration>) -> AggregatedMetrics {
        let cutoff = window
            .and_then(|w| chrono::Duration::from_std(w).ok())
            .and_then(|w| Utc::now().checked_sub_signed(w));

        let metrics = self.metrics.lock();
        match cutoff {
            Some(cutoff) => {
                AggregatedMetrics::from_metrics(metrics.iter().filter(|m| m.timestamp >= cutoff))
            }
            None => AggregatedMetrics::from_metrics(metrics.iter()),
        }
    }

    pub fn operation_metrics(
        &self,
        operation: &str,
        window: Option<Duration>,
    ) -> Option<OperationMetrics> {
        self.aggregate(window).by_operation.remove(operation)
    }

    pub fn top_operations_by_reduction(&self, limit: usize) -> Vec<(String, OperationMetrics)> {
        self.aggregate(None).top_operations(limit)
    }

    /// 텍스트 성능 리포트
    pub fn generate_report(&self, window: Option<Duration>) -> String {
        render_report(&self.aggregate(window))
    }

    /// ring 스냅샷 (오래된 순)
    pub fn export(&self) -> Vec<Metric> {
        self.metrics.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.lock().is_empty()
    }

    pub fn clear(&self) {
        self.metrics.lock().clear();
    }
}
