//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 영구 저장되는 모든 금융 값은 이진 부동소수점이 아닌 Decimal을 사용합니다.

use rust_decimal::{Decimal, RoundingStrategy};

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 환율 타입.
pub type Rate = Decimal;

/// 프리미엄율 저장 소수 자릿수.
pub const PREMIUM_SCALE: u32 = 4;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 지정된 소수점 자릿수로 반올림합니다 (사사오입).
    fn round_half_up(&self, dp: u32) -> Decimal;

    /// 퍼센트 문자열로 변환합니다 (예: "5.25%").
    fn to_percent_string(&self) -> String;
}

impl DecimalExt for Decimal {
    fn round_half_up(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    }

    fn to_percent_string(&self) -> String {
        format!("{:.2}%", self)
    }
}
