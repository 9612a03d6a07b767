//! 시장 및 종목 코드 타입.
//!
//! 이 모듈은 듀얼 리스팅 관련 타입을 정의합니다:
//! - `Market` - 시장 구분 (A주 / H주)
//! - 종목 코드 헬퍼 (거래소 접두사, 시장 추정)

use serde::{Deserialize, Serialize};
use std::fmt;

/// 시장 구분.
///
/// 같은 회사가 본토(상해/심천)와 홍콩에 동시 상장된 경우
/// 두 시장의 시세를 각각 수집합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// A주 시장 (상해/심천, CNY 표시)
    A,
    /// H주 시장 (홍콩, HKD 표시)
    H,
}

impl Market {
    /// 시세 표시 통화를 반환합니다.
    pub fn currency(&self) -> &'static str {
        match self {
            Market::A => "CNY",
            Market::H => "HKD",
        }
    }

    /// 반대쪽 시장을 반환합니다.
    pub fn counterpart(&self) -> Market {
        match self {
            Market::A => Market::H,
            Market::H => Market::A,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::A => write!(f, "A"),
            Market::H => write!(f, "H"),
        }
    }
}

impl std::str::FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(Market::A),
            "H" => Ok(Market::H),
            _ => Err(format!("Unknown market: {}", s)),
        }
    }
}

/// 거래소 접두사가 포함된 전체 시세 코드를 만듭니다.
///
/// A주는 코드 첫 자리로 상해(6)와 심천을 구분하고, H주는 `hk` 접두사를 씁니다.
/// 예: `600036` → `sh600036`, `000001` → `sz000001`, `00939` → `hk00939`.
pub fn full_quote_code(code: &str, market: Market) -> String {
    match market {
        Market::A => {
            if code.starts_with('6') {
                format!("sh{}", code)
            } else {
                format!("sz{}", code)
            }
        }
        Market::H => format!("hk{}", code),
    }
}

/// 코드 형태로 시장을 추정합니다.
///
/// 6자리 숫자는 A주, 5자리 숫자는 H주로 판단합니다.
pub fn infer_market(code: &str) -> Option<Market> {
    if !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match code.len() {
        6 => Some(Market::A),
        5 => Some(Market::H),
        _ => None,
    }
}
