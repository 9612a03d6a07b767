//! 시세 관측 레코드.

use crate::types::{DecimalExt, Market, Price};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 시장에서의 단일 시세 관측.
///
/// 기록 이후 불변이며 `(종목, 시장, 관측 시각)` 당 한 건만 존재합니다.
/// 관측 시각은 수집 주기 경계로 버킷된 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// 종목 코드
    pub stock_code: String,
    /// 시장 구분
    pub market: Market,
    /// 현재가
    pub current: Price,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 전일 종가
    pub prev_close: Price,
    /// 거래량
    pub volume: Option<i64>,
    /// 거래대금
    pub turnover: Option<Decimal>,
    /// 관측 시각 (주기 경계로 버킷됨)
    pub observed_at: DateTime<Utc>,
    /// 거래일 (시장 세션 경계 기준)
    pub trade_date: NaiveDate,
    /// 데이터 출처 태그
    pub source: String,
}

impl Quote {
    /// 전일 종가 대비 등락률(%)을 반환합니다.
    ///
    /// 전일 종가가 0 이하이면 `None`입니다.
    pub fn change_rate(&self) -> Option<Decimal> {
        if self.prev_close <= Decimal::ZERO {
            return None;
        }
        let rate = (self.current - self.prev_close) / self.prev_close * Decimal::from(100);
        Some(rate.round_half_up(4))
    }
}

/// 타임스탬프를 수집 주기 경계로 내림 버킷합니다.
///
/// 시세 소스의 세밀한 타임스탬프를 주기 단위로 정규화해야
/// `(종목, 시각)` 중복 제거가 성립합니다.
pub fn bucket_to_cycle(ts: DateTime<Utc>, interval_secs: u64) -> DateTime<Utc> {
    let secs = interval_secs.max(1) as i64;
    let bucketed = ts.timestamp().div_euclid(secs) * secs;
    DateTime::from_timestamp(bucketed, 0).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_quote() -> Quote {
        Quote {
            stock_code: "600036".to_string(),
            market: Market::A,
            current: dec!(33.50),
            open: dec!(33.00),
            high: dec!(33.80),
            low: dec!(32.90),
            prev_close: dec!(33.00),
            volume: Some(12_345_678),
            turnover: Some(dec!(412345678.50)),
            observed_at: Utc.with_ymd_and_hms(2024, 1, 10, 2, 30, 0).unwrap(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            source: "tencent".to_string(),
        }
    }

    #[test]
    fn test_change_rate() {
        let q = sample_quote();
        // (33.50 - 33.00) / 33.00 * 100 = 1.5152%
        assert_eq!(q.change_rate(), Some(dec!(1.5152)));

        let mut zero_prev = q;
        zero_prev.prev_close = Decimal::ZERO;
        assert_eq!(zero_prev.change_rate(), None);
    }

    #[test]
    fn test_bucket_to_cycle() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 10, 2, 30, 17).unwrap();
        let bucketed = bucket_to_cycle(ts, 30);
        assert_eq!(bucketed, Utc.with_ymd_and_hms(2024, 1, 10, 2, 30, 0).unwrap());

        // 경계값은 그대로 유지
        let exact = Utc.with_ymd_and_hms(2024, 1, 10, 2, 30, 30).unwrap();
        assert_eq!(bucket_to_cycle(exact, 30), exact);
    }

    #[test]
    fn test_bucket_dedups_within_cycle() {
        let a = Utc.with_ymd_and_hms(2024, 1, 10, 2, 30, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 10, 2, 30, 29).unwrap();
        assert_eq!(bucket_to_cycle(a, 30), bucket_to_cycle(b, 30));
    }
}
