//! ResponseOptimizer - the response optimization engine
//!
//! ```text
//! optimize_with_cache(op, params, fetch, cfg)
//!   │
//!   ├─ cacheable? ── hit ──► record(cache) ──► return
//!   │
//!   ├─ fetch().await?            (errors propagate, nothing cached)
//!   ├─ optimize(data, op, cfg)
//!   │     null → full → no preset → maxItems/summarize → fields
//!   │     → preset → excludeFields → truncate → flatten
//!   ├─ cache.insert(ttl_for(op)) (failures logged, ignored)
//!   └─ return
//! ```
//!
//! The cache and metrics recorder are plain `Arc`s handed in at build time,
//! so several optimizers can share them and tests can inspect them.

pub mod projection;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use pare_foundation::{
    reduction_percentage, serialized_len, AggregatedMetrics, CacheKey, CachePolicy, CacheSweeper,
    DetailLevel, JsonStore, MetricsRecorder, OptimizationConfig, ResponseCache,
    ResponseCacheConfig, ResponseCacheStats, Result, TokenEstimator, CACHE_LEVEL_LABEL,
};

use crate::presets::PresetRegistry;
use crate::shaping::ShapingConfig;
use crate::summarizer::{flatten_object, summary_response, SummaryOptions, DEFAULT_FLATTEN_DEPTH};
use projection::{drop_fields, select_fields, truncate_descriptions};

/// Preset overrides looked up next to `optimization.json`
const PRESET_OVERRIDE_FILES: &[&str] = &["presets.json", "presets.toml"];

// ============================================================================
// Settings
// ============================================================================

/// Mutable engine switches, seeded from [`OptimizationConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub enabled: bool,
    pub default_level: DetailLevel,
    pub enable_summarization: bool,
    pub enable_caching: bool,
    /// Serialized bytes above which arrays are auto-summarized
    pub max_response_size: usize,
    pub summary_sample_items: usize,
    pub cache_cleanup_interval: Duration,
}

impl From<&OptimizationConfig> for EngineSettings {
    fn from(config: &OptimizationConfig) -> Self {
        Self {
            enabled: config.enabled,
            default_level: config.default_level,
            enable_summarization: config.enable_summarization,
            enable_caching: config.enable_caching,
            max_response_size: config.max_response_size,
            summary_sample_items: config.summary_sample_items,
            cache_cleanup_interval: config.cache_cleanup_interval(),
        }
    }
}

impl EngineSettings {
    /// Per-call level, else the default. With optimization switched off and
    /// no explicit level, data passes through as if `full` was requested.
    pub fn resolve_level(&self, cfg: Option<&ShapingConfig>) -> DetailLevel {
        match cfg.and_then(|c| c.level) {
            Some(level) => level,
            None if !self.enabled => DetailLevel::Full,
            None => self.default_level,
        }
    }
}

/// Size comparison between two versions of a response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStats {
    /// Serialized bytes
    pub original_size: usize,
    pub optimized_size: usize,
    /// Rounded to a whole percent
    pub reduction_percentage: f64,
    /// Byte delta / 4, rounded
    pub estimated_token_reduction: i64,
}

// ============================================================================
// ResponseOptimizer
// ============================================================================

#[derive(Debug)]
pub struct ResponseOptimizer {
    settings: RwLock<EngineSettings>,
    presets: Arc<PresetRegistry>,
    policy: Arc<CachePolicy>,
    cache: Arc<ResponseCache>,
    metrics: Arc<MetricsRecorder>,
    sweeper: Mutex<Option<CacheSweeper>>,
}

impl Default for ResponseOptimizer {
    fn default() -> Self {
        Self::new(OptimizationConfig::default())
    }
}

impl ResponseOptimizer {
    /// Built-in presets and cache policy, fresh cache and metrics
    pub fn new(config: OptimizationConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ResponseOptimizerBuilder {
        ResponseOptimizerBuilder::default()
    }

    /// Load `optimization.json` (project, then global, then env) and overlay
    /// any `presets.json`/`presets.toml` from the project config directory
    /// on the built-in presets.
    pub fn load() -> Result<Self> {
        let config = OptimizationConfig::load()?;
        let mut presets = PresetRegistry::builtin();

        if let Ok(project) = JsonStore::current_project() {
            for file in PRESET_OVERRIDE_FILES {
                if project.exists(file) {
                    let overrides = PresetRegistry::from_store(&project, file)?;
                    info!(file, operations = overrides.len(), "Applying preset overrides");
                    presets.merge(overrides);
                }
            }
        }

        Ok(Self::builder().config(config).presets(presets).build())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn settings(&self) -> EngineSettings {
        self.settings.read().clone()
    }

    pub fn presets(&self) -> &Arc<PresetRegistry> {
        &self.presets
    }

    pub fn policy(&self) -> &Arc<CachePolicy> {
        &self.policy
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    /// Operations with registered presets
    pub fn operations(&self) -> Vec<String> {
        self.presets.operations().map(str::to_string).collect()
    }

    pub fn resolve_level(&self, cfg: Option<&ShapingConfig>) -> DetailLevel {
        self.settings.read().resolve_level(cfg)
    }

    // ========================================================================
    // Runtime switches
    // ========================================================================

    pub fn set_enabled(&self, enabled: bool) {
        self.settings.write().enabled = enabled;
    }

    pub fn set_default_level(&self, level: DetailLevel) {
        self.settings.write().default_level = level;
    }

    pub fn set_caching_enabled(&self, enabled: bool) {
        self.settings.write().enable_caching = enabled;
    }

    pub fn set_summarization_enabled(&self, enabled: bool) {
        self.settings.write().enable_summarization = enabled;
    }

    pub fn set_metrics_enabled(&self, enabled: bool) {
        self.metrics.set_enabled(enabled);
    }

    // ========================================================================
    // Optimize
    // ========================================================================

    /// Shape `data` for `operation`. Never fails: anything the engine cannot
    /// shape is returned unchanged.
    pub fn optimize(&self, data: Value, operation: &str, cfg: Option<&ShapingConfig>) -> Value {
        let started = Instant::now();
        let settings = self.settings();
        let level = settings.resolve_level(cfg);

        let estimator = self.metrics.estimator();
        let original_tokens = if self.metrics.is_enabled() {
            estimator.estimate(&data)
        } else {
            0
        };

        let optimized = self.shape(data, operation, cfg, &settings, level);

        if self.metrics.is_enabled() {
            self.metrics.record(
                operation,
                original_tokens,
                estimator.estimate(&optimized),
                level.as_str(),
                started.elapsed(),
                false,
            );
        }

        optimized
    }

    fn shape(
        &self,
        data: Value,
        operation: &str,
        cfg: Option<&ShapingConfig>,
        settings: &EngineSettings,
        level: DetailLevel,
    ) -> Value {
        if data.is_null() || level.is_full() {
            return data;
        }

        let Some(presets) = self.presets.get(operation) else {
            trace!(operation, "No presets registered, passing through");
            return data;
        };

        let mut data = data;

        if let Some(cfg) = cfg {
            if let (Value::Array(items), Some(n)) = (&mut data, cfg.max_items) {
                items.truncate(n);
            }

            if let Value::Array(items) = &data {
                let auto = settings.enable_summarization
                    && serialized_len(&data) > settings.max_response_size;
                if cfg.summarize || auto {
                    debug!(
                        operation,
                        items = items.len(),
                        requested = cfg.summarize,
                        "Summarizing array response"
                    );
                    let options = SummaryOptions {
                        include_stats: true,
                        max_sample_items: settings.summary_sample_items,
                    };
                    return summary_response(items, operation, &options);
                }
            }

            if !cfg.fields.is_empty() {
                return select_fields(&data, &cfg.fields);
            }
        }

        let mut shaped = match presets.for_level(level) {
            Some(preset) => preset.apply(&data),
            None => data,
        };

        if let Some(cfg) = cfg {
            shaped = drop_fields(&shaped, &cfg.exclude_fields);

            if let Some(limit) = cfg.truncate_descriptions.filter(|&l| l > 0) {
                shaped = truncate_descriptions(&shaped, limit);
            }

            if cfg.flatten_nested {
                shaped = match shaped {
                    Value::Array(items) => Value::Array(
                        items
                            .iter()
                            .map(|v| flatten_object(v, DEFAULT_FLATTEN_DEPTH))
                            .collect(),
                    ),
                    other => flatten_object(&other, DEFAULT_FLATTEN_DEPTH),
                };
            }
        }

        shaped
    }

    // ========================================================================
    // Cached optimize
    // ========================================================================

    /// Serve from cache when possible, otherwise fetch, optimize and store.
    ///
    /// `fetch` runs at most once and only on a miss. Its error is returned
    /// unchanged and nothing is cached.
    pub async fn optimize_with_cache<F, Fut, E>(
        &self,
        operation: &str,
        params: &Value,
        fetch: F,
        cfg: Option<&ShapingConfig>,
    ) -> std::result::Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, E>>,
    {
        let key = self.cache_key(operation, params, cfg);

        if let Some(key) = &key {
            if let Some(hit) = self.cache.get_key(key) {
                trace!(operation, "Serving optimized response from cache");
                self.metrics.record_values(
                    operation,
                    &hit,
                    &hit,
                    CACHE_LEVEL_LABEL,
                    Duration::ZERO,
                    true,
                );
                return Ok(hit);
            }
        }

        let data = fetch().await?;
        let optimized = self.optimize(data, operation, cfg);

        if let Some(key) = key {
            let ttl = self.policy.ttl_for(operation);
            if let Err(e) = self.cache.insert(key, optimized.clone(), Some(ttl)) {
                warn!(operation, error = %e, "Skipping cache store");
            }
        }

        Ok(optimized)
    }

    /// `None` when caching is off, the operation is not cacheable, or the
    /// key cannot be derived
    fn cache_key(
        &self,
        operation: &str,
        params: &Value,
        cfg: Option<&ShapingConfig>,
    ) -> Option<CacheKey> {
        let settings = self.settings.read();
        if !settings.enable_caching || !self.policy.is_cacheable(operation) {
            return None;
        }

        let level = settings.resolve_level(cfg);
        let variant = match cfg {
            Some(cfg) => cfg.cache_variant(level),
            None => json!({ "level": level }),
        };

        match CacheKey::new(operation, params, &variant) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(operation, error = %e, "Cannot derive cache key, bypassing cache");
                None
            }
        }
    }

    /// Drop cached reads made stale by `write_operation`
    pub fn invalidate_cache(&self, write_operation: &str) -> usize {
        let removed: usize = self
            .policy
            .invalidation_targets(write_operation)
            .iter()
            .map(|read| self.cache.invalidate_by_operation(read))
            .sum();

        if removed > 0 {
            debug!(operation = write_operation, removed, "Invalidated stale reads");
        }
        removed
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> ResponseCacheStats {
        self.cache.stats()
    }

    // ========================================================================
    // Metrics
    // ========================================================================

    pub fn performance_metrics(&self, window: Option<Duration>) -> AggregatedMetrics {
        self.metrics.aggregate(window)
    }

    pub fn generate_report(&self, window: Option<Duration>) -> String {
        self.metrics.generate_report(window)
    }

    /// Compare two versions of a response by serialized size
    pub fn optimization_stats(&self, original: &Value, optimized: &Value) -> OptimizationStats {
        let original_size = serialized_len(original);
        let optimized_size = serialized_len(optimized);
        let delta = original_size as f64 - optimized_size as f64;

        OptimizationStats {
            original_size,
            optimized_size,
            reduction_percentage: reduction_percentage(original_size, optimized_size).round(),
            estimated_token_reduction: (delta / 4.0).round() as i64,
        }
    }

    // ========================================================================
    // Background sweep
    // ========================================================================

    /// Start the periodic expiry sweep on the current tokio runtime.
    ///
    /// Returns `false` if a sweep is already running.
    pub fn start_background_sweep(&self) -> Result<bool> {
        let mut slot = self.sweeper.lock();
        if slot.as_ref().map(CacheSweeper::is_running).unwrap_or(false) {
            return Ok(false);
        }

        let interval = self.settings.read().cache_cleanup_interval;
        *slot = Some(CacheSweeper::start(&self.cache, interval)?);
        debug!(interval_ms = interval.as_millis() as u64, "Started cache sweeper");
        Ok(true)
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .map(CacheSweeper::is_running)
            .unwrap_or(false)
    }

    /// Stop the sweep and drop all cached entries
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }
        self.cache.clear();
        debug!("Response optimizer shut down");
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Default)]
pub struct ResponseOptimizerBuilder {
    config: OptimizationConfig,
    presets: Option<Arc<PresetRegistry>>,
    policy: Option<Arc<CachePolicy>>,
    cache: Option<Arc<ResponseCache>>,
    metrics: Option<Arc<MetricsRecorder>>,
    estimator: Option<Arc<dyn TokenEstimator>>,
}

impl ResponseOptimizerBuilder {
    pub fn config(mut self, config: OptimizationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn presets(mut self, presets: impl Into<Arc<PresetRegistry>>) -> Self {
        self.presets = Some(presets.into());
        self
    }

    pub fn policy(mut self, policy: impl Into<Arc<CachePolicy>>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    /// Share an existing cache; otherwise one is sized from the config
    pub fn cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Share an existing recorder; otherwise one is built from the config
    pub fn metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Estimator for a config-built recorder. Ignored with [`metrics`](Self::metrics).
    pub fn estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn build(self) -> ResponseOptimizer {
        let config = self.config;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ResponseCache::with_config(ResponseCacheConfig::from(&config))));

        let estimator = self.estimator;
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(MetricsRecorder::from_config(&config, estimator)));

        ResponseOptimizer {
            settings: RwLock::new(EngineSettings::from(&config)),
            presets: self
                .presets
                .unwrap_or_else(|| Arc::new(PresetRegistry::builtin())),
            policy: self
                .policy
                .unwrap_or_else(|| Arc::new(CachePolicy::builtin())),
            cache,
            metrics,
            sweeper: Mutex::new(None),
        }
    }
}
