//! 프리미엄율 계산 및 표본 레코드.

use crate::domain::FxSnapshot;
use crate::types::{DecimalExt, Price, Rate, PREMIUM_SCALE};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A주 가격, H주 가격, 환율로 프리미엄율(%)을 계산합니다.
///
/// ```text
/// h_cny    = h_price * fx_rate
/// premium  = (a_price - h_cny) / h_cny * 100
/// ```
///
/// 환산된 H주 가격이 0 이하이면 계산할 수 없으므로 `None`을 반환합니다.
/// 결과는 소수 4자리로 사사오입합니다.
pub fn premium_rate(a_price: Price, h_price: Price, fx_rate: Rate) -> Option<Decimal> {
    let h_cny = h_price * fx_rate;
    if h_cny <= Decimal::ZERO {
        return None;
    }
    let rate = (a_price - h_cny) / h_cny * Decimal::from(100);
    Some(rate.round_half_up(PREMIUM_SCALE))
}

/// 한 수집 주기에서 파생된 프리미엄 표본.
///
/// 출력뿐 아니라 입력(A주가, H주가, 환율)을 함께 저장하므로 공식 재적용으로
/// 독립 검증이 가능합니다. `(종목, 시각)` 당 한 건만 존재합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumSample {
    /// 종목 코드 (A주 코드 기준)
    pub stock_code: String,
    /// A주 가격 (CNY)
    pub a_price: Price,
    /// H주 가격 (HKD)
    pub h_price: Price,
    /// 사용한 환율 (HKD→CNY)
    pub fx_rate: Rate,
    /// 계산된 프리미엄율(%)
    pub premium_rate: Decimal,
    /// 표본 시각 (주기 경계)
    pub observed_at: DateTime<Utc>,
    /// 거래일
    pub trade_date: NaiveDate,
}

impl PremiumSample {
    /// 같은 주기에 수집된 양쪽 시세와 환율 스냅샷으로 표본을 만듭니다.
    ///
    /// 환산 H주가가 0 이하이면 표본을 만들지 않습니다.
    pub fn compute(
        stock_code: impl Into<String>,
        a_price: Price,
        h_price: Price,
        fx: &FxSnapshot,
        observed_at: DateTime<Utc>,
        trade_date: NaiveDate,
    ) -> Option<Self> {
        let rate = premium_rate(a_price, h_price, fx.rate)?;
        Some(Self {
            stock_code: stock_code.into(),
            a_price,
            h_price,
            fx_rate: fx.rate,
            premium_rate: rate,
            observed_at,
            trade_date,
        })
    }

    /// 저장된 입력으로 공식을 재적용해 저장된 프리미엄율과 일치하는지 검증합니다.
    pub fn is_consistent(&self) -> bool {
        premium_rate(self.a_price, self.h_price, self.fx_rate)
            .map(|r| r == self.premium_rate)
            .unwrap_or(false)
    }
}
