//! OptimizationConfig - 전역 최적화 설정
//!
//! 로드 순서:
//!
//! ```text
//! .pare/optimization.json        (프로젝트, 있으면 우선)
//!   └─ ~/.config/pare/optimization.json   (글로벌)
//!        └─ Default
//!             └─ 환경 변수 override (ENABLE_CACHING, CACHE_MAX_SIZE, ...)
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::level::{lenient, DetailLevel};
use crate::storage::JsonStore;
use crate::{Error, Result};

/// 설정 파일 이름
pub const OPTIMIZATION_CONFIG_FILE: &str = "optimization.json";

/// 전역 최적화 설정 (엔진 생성 시 한 번 읽음)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConfig {
    /// 전체 스위치. 꺼지면 호출별로 level 을 명시한 경우만 최적화
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub default_level: DetailLevel,

    /// 이 직렬화 크기를 넘는 배열은 자동 요약
    #[serde(default = "default_max_response_size")]
    pub max_response_size: usize,

    #[serde(default = "default_true")]
    pub enable_summarization: bool,

    #[serde(default = "default_true")]
    pub enable_caching: bool,

    #[serde(default = "default_cache_max_size")]
    pub cache_max_size: usize,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_default_ttl_secs: u64,

    #[serde(default = "default_cleanup_interval_ms")]
    pub cache_cleanup_interval_ms: u64,

    /// 0 = 무제한
    #[serde(default)]
    pub cache_max_entry_bytes: usize,

    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    #[serde(default = "default_metrics_capacity")]
    pub metrics_capacity: usize,

    /// 배열 요약에 남길 샘플 수
    #[serde(default = "default_summary_sample_items")]
    pub summary_sample_items: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_response_size() -> usize {
    10_000
}

fn default_cache_max_size() -> usize {
    1_000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cleanup_interval_ms() -> u64 {
    60_000
}

fn default_metrics_capacity() -> usize {
    10_000
}

fn default_summary_sample_items() -> usize {
    5
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_level: DetailLevel::Standard,
            max_response_size: default_max_response_size(),
            enable_summarization: true,
            enable_caching: true,
            cache_max_size: default_cache_max_size(),
            cache_default_ttl_secs: default_cache_ttl_secs(),
            cache_cleanup_interval_ms: default_cleanup_interval_ms(),
            cache_max_entry_bytes: 0,
            enable_metrics: true,
            metrics_capacity: default_metrics_capacity(),
            summary_sample_items: default_summary_sample_items(),
        }
    }
}

impl OptimizationConfig {
    // ========================================================================
    // Load
    // ========================================================================

    /// 프로젝트 → 글로벌 → 기본값 순으로 로드 후 환경 변수 적용
    pub fn load() -> Result<Self> {
        let mut config = None;

        if let Ok(project) = JsonStore::current_project() {
            config = project.load_optional::<Self>(OPTIMIZATION_CONFIG_FILE)?;
        }

        if config.is_none() {
            if let Ok(global) = JsonStore::global() {
                config = global.load_optional::<Self>(OPTIMIZATION_CONFIG_FILE)?;
            }
        }

        let mut config = config.unwrap_or_default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 특정 저장소에서 로드 (환경 변수 미적용)
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        let config = store
            .load_optional::<Self>(OPTIMIZATION_CONFIG_FILE)?
            .unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(OPTIMIZATION_CONFIG_FILE, self)
    }

    // ========================================================================
    // Overrides
    // ========================================================================

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// 임의의 key lookup 으로 override 적용. 파싱 실패 값은 로그만 남기고
    /// 현재 값을 유지
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_bool(&lookup, "ENABLE_RESPONSE_OPTIMIZATION", &mut self.enabled);
        override_bool(&lookup, "ENABLE_SUMMARIZATION", &mut self.enable_summarization);
        override_bool(&lookup, "ENABLE_CACHING", &mut self.enable_caching);
        override_bool(&lookup, "ENABLE_METRICS", &mut self.enable_metrics);
        override_num(&lookup, "MAX_RESPONSE_SIZE", &mut self.max_response_size);
        override_num(&lookup, "CACHE_MAX_SIZE", &mut self.cache_max_size);
        override_num(&lookup, "CACHE_DEFAULT_TTL", &mut self.cache_default_ttl_secs);
        override_num(
            &lookup,
            "CACHE_CLEANUP_INTERVAL",
            &mut self.cache_cleanup_interval_ms,
        );

        if let Some(raw) = lookup("DEFAULT_OPTIMIZATION_LEVEL") {
            match DetailLevel::parse_lenient(&raw) {
                Some(level) => self.default_level = level,
                None => tracing::warn!(
                    value = %raw,
                    keep = %self.default_level,
                    "Unknown DEFAULT_OPTIMIZATION_LEVEL, keeping configured level"
                ),
            }
        }
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    pub fn cache_default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_default_ttl_secs)
    }

    pub fn cache_cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cache_cleanup_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_cleanup_interval_ms == 0 {
            return Err(Error::Config(
                "cacheCleanupIntervalMs must be greater than zero".to_string(),
            ));
        }
        if self.metrics_capacity == 0 {
            return Err(Error::Config(
                "metricsCapacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn override_bool<F>(lookup: &F, key: &str, target: &mut bool)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        match parse_bool(&raw) {
            Some(value) => *target = value,
            None => tracing::warn!(key, value = %raw, "Ignoring unparsable boolean override"),
        }
    }
}

fn override_num<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!(key, value = %raw, "Ignoring unparsable numeric override"),
        }
    }
}
