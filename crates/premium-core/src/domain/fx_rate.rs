//! 환율 관측 및 주기별 스냅샷.

use crate::types::Rate;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 통화쌍 환율의 단일 관측. 기록 이후 불변입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRate {
    /// 통화쌍 (예: "HKDCNY")
    pub currency_pair: String,
    /// 환율
    pub rate: Rate,
    /// 관측 시각
    pub observed_at: DateTime<Utc>,
    /// 거래일
    pub trade_date: NaiveDate,
    /// 데이터 출처 태그
    pub source: String,
}

/// 스냅샷에 담긴 환율의 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FxOrigin {
    /// 이번 갱신 주기에 새로 가져온 값
    Fetched,
    /// 신선도 한도 내의 마지막 성공 값
    Cached,
    /// 설정된 기본 환율
    Default,
}

impl fmt::Display for FxOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FxOrigin::Fetched => write!(f, "fetched"),
            FxOrigin::Cached => write!(f, "cached"),
            FxOrigin::Default => write!(f, "default"),
        }
    }
}

/// 한 수집 주기에 명시적으로 전달되는 환율 스냅샷.
///
/// 전역 가변 상태 대신 주기마다 값으로 전달되므로 각 주기의 계산이
/// 재현 가능하고 격리 테스트가 가능합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxSnapshot {
    /// 환율
    pub rate: Rate,
    /// 관측 시각 (기본 환율이면 스냅샷 생성 시각)
    pub observed_at: DateTime<Utc>,
    /// 값의 출처
    pub origin: FxOrigin,
}

impl FxSnapshot {
    /// 관측 시각이 신선도 한도를 벗어났는지 확인합니다.
    pub fn is_stale(&self, now: DateTime<Utc>, bound: Duration) -> bool {
        let age = now.signed_duration_since(self.observed_at);
        age > chrono::Duration::from_std(bound).unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_staleness() {
        let observed = Utc.with_ymd_and_hms(2024, 1, 10, 2, 0, 0).unwrap();
        let snap = FxSnapshot {
            rate: dec!(0.9123),
            observed_at: observed,
            origin: FxOrigin::Fetched,
        };

        let bound = Duration::from_secs(600);
        assert!(!snap.is_stale(observed + chrono::Duration::seconds(599), bound));
        assert!(snap.is_stale(observed + chrono::Duration::seconds(601), bound));
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(FxOrigin::Fetched.to_string(), "fetched");
        assert_eq!(FxOrigin::Default.to_string(), "default");
    }
}
