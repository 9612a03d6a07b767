//! 일중 프리미엄 표본의 일별 통계 집계.

use crate::domain::PremiumSample;
use crate::types::{DecimalExt, PREMIUM_SCALE};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 (종목, 거래일)의 통계 요약.
///
/// 표본 집합의 순수 함수이므로 같은 표본으로 다시 계산하면
/// 항상 같은 결과가 나옵니다 (멱등 upsert의 근거).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// 종목 코드 (A주 코드 기준)
    pub stock_code: String,
    /// 거래일
    pub trade_date: NaiveDate,
    /// 개장 프리미엄율 (시간순 첫 표본)
    pub open: Decimal,
    /// 마감 프리미엄율 (시간순 마지막 표본)
    pub close: Decimal,
    /// 최고 프리미엄율
    pub max: Decimal,
    /// 최저 프리미엄율
    pub min: Decimal,
    /// 평균 프리미엄율
    pub avg: Decimal,
    /// 95% 분위수 (선형 보간)
    pub percentile_95: Decimal,
    /// 5% 분위수 (선형 보간)
    pub percentile_5: Decimal,
    /// 사용한 표본 수
    pub record_count: usize,
}

impl DailySummary {
    /// 하루치 표본으로 요약을 계산합니다.
    ///
    /// 표본이 없으면 `None`을 반환합니다. 0으로 채운 행과 구분해야 하므로
    /// 호출 측은 이를 별도의 "데이터 없음" 결과로 다뤄야 합니다.
    pub fn from_samples(
        stock_code: impl Into<String>,
        trade_date: NaiveDate,
        samples: &[PremiumSample],
    ) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        // 시간순 정렬 (입력 순서에 의존하지 않음)
        let mut ordered: Vec<&PremiumSample> = samples.iter().collect();
        ordered.sort_by_key(|s| s.observed_at);

        let rates: Vec<Decimal> = ordered.iter().map(|s| s.premium_rate).collect();
        let open = rates[0];
        let close = *rates.last().expect("non-empty");
        let max = rates.iter().copied().max().expect("non-empty");
        let min = rates.iter().copied().min().expect("non-empty");

        let sum: Decimal = rates.iter().copied().sum();
        let avg = (sum / Decimal::from(rates.len())).round_half_up(PREMIUM_SCALE);

        let mut sorted = rates.clone();
        sorted.sort();
        let percentile_95 = interpolated_percentile(&sorted, 95);
        let percentile_5 = interpolated_percentile(&sorted, 5);

        Some(Self {
            stock_code: stock_code.into(),
            trade_date,
            open,
            close,
            max,
            min,
            avg,
            percentile_95,
            percentile_5,
            record_count: rates.len(),
        })
    }
}

/// 정렬된 값 목록의 보간 분위수를 계산합니다.
///
/// 순위는 `p/100 * (n-1)`이며, 정수가 아니면 인접한 두 값을
/// 선형 보간합니다 (nearest-rank 방식이 아님).
fn interpolated_percentile(sorted: &[Decimal], p: u32) -> Decimal {
    debug_assert!(!sorted.is_empty() && p <= 100);
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let position = Decimal::from(p) * Decimal::from(n - 1) / Decimal::from(100);
    let lower = position.floor();
    let lower_idx = lower.to_usize().unwrap_or(0).min(n - 1);
    let upper_idx = (lower_idx + 1).min(n - 1);
    let weight = position - lower;

    if weight.is_zero() || lower_idx == upper_idx {
        return sorted[lower_idx];
    }

    let lower_value = sorted[lower_idx];
    let upper_value = sorted[upper_idx];
    (lower_value + (upper_value - lower_value) * weight).round_half_up(PREMIUM_SCALE)
}
