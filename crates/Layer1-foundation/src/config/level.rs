//! Detail level - 응답 충실도 단계

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// 최적화 후 응답이 얼마나 남는지
///
/// 충실도 오름차순. `Full` 은 항상 입력을 그대로 반환
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Minimal,
    #[default]
    Standard,
    Detailed,
    Full,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Minimal => "minimal",
            DetailLevel::Standard => "standard",
            DetailLevel::Detailed => "detailed",
            DetailLevel::Full => "full",
        }
    }

    /// 대소문자 무시 파싱 (실패해도 에러 없음)
    ///
    /// `smart` 는 `standard` 의 예전 이름. 알 수 없는 값은 `None` 을 반환하고
    /// 호출자가 설정된 기본값을 사용
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Some(DetailLevel::Minimal),
            "standard" | "smart" => Some(DetailLevel::Standard),
            "detailed" => Some(DetailLevel::Detailed),
            "full" => Some(DetailLevel::Full),
            _ => None,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, DetailLevel::Full)
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s).ok_or_else(|| Error::InvalidLevel(s.to_string()))
    }
}

// ============================================================================
// Lenient serde helpers
// ============================================================================

/// 알 수 없는 level 문자열을 문서 전체 실패 대신 "level 없음" 으로 처리하는
/// deserializer
pub mod lenient {
    use super::*;

    /// `Option<DetailLevel>` 필드용. 알 수 없는 값은 `None`
    pub fn option<'de, D>(deserializer: D) -> Result<Option<DetailLevel>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| {
            let level = DetailLevel::parse_lenient(&s);
            if level.is_none() {
                tracing::warn!(value = %s, "Ignoring unknown detail level");
            }
            level
        }))
    }

    /// `DetailLevel` 필드용. 알 수 없는 값은 기본값
    pub fn or_default<'de, D>(deserializer: D) -> Result<DetailLevel, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(option(deserializer)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(DetailLevel::Minimal < DetailLevel::Standard);
        assert!(DetailLevel::Standard < DetailLevel::Detailed);
        assert!(DetailLevel::Detailed < DetailLevel::Full);
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(
            DetailLevel::parse_lenient(" Minimal "),
            Some(DetailLevel::Minimal)
        );
        assert_eq!(
            DetailLevel::parse_lenient("smart"),
            Some(DetailLevel::Standard)
        );
        assert_eq!(DetailLevel::parse_lenient("FULL"), Some(DetailLevel::Full));
        assert_eq!(DetailLevel::parse_lenient("verbose"), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "verbose".parse::<DetailLevel>().unwrap_err();
        assert!(matches!(err, Error::InvalidLevel(ref s) if s == "verbose"));
        assert_eq!(
            "detailed".parse::<DetailLevel>().unwrap(),
            DetailLevel::Detailed
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DetailLevel::Detailed).unwrap();
        assert_eq!(json, "\"detailed\"");
        let level: DetailLevel = serde_json::from_str("\"minimal\"").unwrap();
        assert_eq!(level, DetailLevel::Minimal);
    }

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default, deserialize_with = "lenient::option")]
        level: Option<DetailLevel>,
    }

    #[test]
    fn test_lenient_option() {
        let wrapped: Wrapper = serde_json::from_str(r#"{"level": "bogus"}"#).unwrap();
        assert_eq!(wrapped.level, None);

        let wrapped: Wrapper = serde_json::from_str(r#"{"level": "Detailed"}"#).unwrap();
        assert_eq!(wrapped.level, Some(DetailLevel::Detailed));

        let wrapped: Wrapper = serde_json::from_str(r#"{"level": null}"#).unwrap();
        assert_eq!(wrapped.level, None);

        let wrapped: Wrapper = serde_json::from_str("{}").unwrap();
        assert_eq!(wrapped.level, None);
    }
}
