//! Windowed aggregation over recorded metrics

use serde::Serialize;
use std::collections::BTreeMap;

use super::recorder::Metric;

/// Per-operation breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMetrics {
    pub calls: usize,
    /// Running mean of per-call reduction percentage
    pub avg_reduction: f64,
    /// Running mean of elapsed milliseconds
    pub avg_elapsed_ms: f64,
    pub cache_hits: usize,
}

impl OperationMetrics {
    fn observe(&mut self, metric: &Metric) {
        let n = self.calls as f64;
        self.avg_reduction = (self.avg_reduction * n + metric.reduction_pct) / (n + 1.0);
        self.avg_elapsed_ms = (self.avg_elapsed_ms * n + metric.elapsed_ms()) / (n + 1.0);
        self.calls += 1;
        if metric.cache_hit {
            self.cache_hits += 1;
        }
    }
}

/// Per-level breakdown (`minimal`, `standard`, ..., `cache`)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelMetrics {
    pub calls: usize,
    pub avg_reduction: f64,
    /// Sum of `original - optimized`; negative when shaping grew the output
    pub tokens_saved: i64,
}

impl LevelMetrics {
    fn observe(&mut self, metric: &Metric) {
        let n = self.calls as f64;
        self.avg_reduction = (self.avg_reduction * n + metric.reduction_pct) / (n + 1.0);
        self.calls += 1;
        self.tokens_saved += metric.tokens_saved();
    }
}

/// Aggregated view over a window of metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub total_calls: usize,
    pub avg_reduction_pct: f64,
    pub avg_elapsed_ms: f64,
    pub total_original_tokens: u64,
    pub total_optimized_tokens: u64,
    /// Fraction of calls served from the cache (0.0 - 1.0)
    pub cache_hit_rate: f64,
    pub by_operation: BTreeMap<String, OperationMetrics>,
    pub by_level: BTreeMap<String, LevelMetrics>,
}

impl AggregatedMetrics {
    pub fn from_metrics<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a Metric>,
    {
        let mut agg = Self::default();
        let mut total_reduction = 0.0;
        let mut total_elapsed = 0.0;
        let mut cache_hits = 0usize;

        for metric in metrics {
            agg.total_calls += 1;
            agg.total_original_tokens += metric.original_tokens as u64;
            agg.total_optimized_tokens += metric.optimized_tokens as u64;
            total_reduction += metric.reduction_pct;
            total_elapsed += metric.elapsed_ms();
            if metric.cache_hit {
                cache_hits += 1;
            }

            agg.by_operation
                .entry(metric.operation.clone())
                .or_default()
                .observe(metric);
            agg.by_level
                .entry(metric.level.clone())
                .or_default()
                .observe(metric);
        }

        if agg.total_calls > 0 {
            let n = agg.total_calls as f64;
            agg.avg_reduction_pct = total_reduction / n;
            agg.avg_elapsed_ms = total_elapsed / n;
            agg.cache_hit_rate = cache_hits as f64 / n;
        }

        agg
    }

    pub fn is_empty(&self) -> bool {
        self.total_calls == 0
    }

    pub fn tokens_saved(&self) -> i64 {
        self.total_original_tokens as i64 - self.total_optimized_tokens as i64
    }

    /// Operations sorted by mean reduction, highest first
    pub fn top_operations(&self, limit: usize) -> Vec<(String, OperationMetrics)> {
        let mut ops: Vec<(String, OperationMetrics)> = self
            .by_operation
            .iter()
            .map(|(op, m)| (op.clone(), m.clone()))
            .collect();
        ops.sort_by(|a, b| b.1.avg_reduction.total_cmp(&a.1.avg_reduction));
        ops.truncate(limit);
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn metric(op: &str, level: &str, original: usize, optimized: usize, ms: u64) -> Metric {
        Metric::new(op, level, original, optimized, Duration::from_millis(ms), false)
    }

    #[test]
    fn test_empty() {
        let agg = AggregatedMetrics::from_metrics(&Vec::<Metric>::new());
        assert!(agg.is_empty());
        assert_eq!(agg.avg_reduction_pct, 0.0);
        assert_eq!(agg.cache_hit_rate, 0.0);
    }

    #[test]
    fn test_running_means() {
        let metrics = vec![
            metric("get_card", "minimal", 100, 20, 2),
            metric("get_card", "minimal", 100, 60, 4),
            metric("get_board", "standard", 200, 100, 6),
        ];
        let agg = AggregatedMetrics::from_metrics(&metrics);

        assert_eq!(agg.total_calls, 3);
        assert_eq!(agg.total_original_tokens, 400);
        assert_eq!(agg.total_optimized_tokens, 180);
        assert_eq!(agg.tokens_saved(), 220);
        assert!((agg.avg_reduction_pct - (80.0 + 40.0 + 50.0) / 3.0).abs() < 1e-9);
        assert!((agg.avg_elapsed_ms - 4.0).abs() < 1e-9);

        let card = &agg.by_operation["get_card"];
        assert_eq!(card.calls, 2);
        assert!((card.avg_reduction - 60.0).abs() < 1e-9);
        assert!((card.avg_elapsed_ms - 3.0).abs() < 1e-9);

        let minimal = &agg.by_level["minimal"];
        assert_eq!(minimal.calls, 2);
        assert_eq!(minimal.tokens_saved, 120);
    }

    #[test]
    fn test_cache_hit_rate_and_top() {
        let mut hit = metric("get_me", "cache", 10, 10, 0);
        hit.cache_hit = true;
        let metrics = vec![
            metric("get_me", "standard", 100, 90, 1),
            hit,
            metric("get_cards_in_list", "minimal", 100, 5, 1),
        ];
        let agg = AggregatedMetrics::from_metrics(&metrics);

        assert!((agg.cache_hit_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(agg.by_operation["get_me"].cache_hits, 1);

        let top = agg.top_operations(1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, "get_cards_in_list");
    }
}
