//! 듀얼 리스팅 종목 연결.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 상장 거래소 (A주 레그 기준).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    /// 상해증권거래소
    Sh,
    /// 심천증권거래소
    Sz,
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exchange::Sh => write!(f, "SH"),
            Exchange::Sz => write!(f, "SZ"),
        }
    }
}

impl std::str::FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SH" => Ok(Exchange::Sh),
            "SZ" => Ok(Exchange::Sz),
            _ => Err(format!("Unknown exchange: {}", s)),
        }
    }
}

/// 하나의 회사를 A주 코드와 H주 코드로 잇는 불변 연결.
///
/// 설정 관리가 소유하며 파이프라인은 읽기만 합니다. 비활성화하면
/// 이후 수집이 중단되지만 과거 데이터는 남습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLink {
    /// A주 종목 코드 (6자리)
    pub a_code: String,
    /// H주 종목 코드 (5자리)
    pub h_code: String,
    /// 종목명
    pub name: String,
    /// A주 상장 거래소
    pub exchange: Exchange,
    /// 소속 업종
    pub industry: Option<String>,
    /// 활성 여부
    pub active: bool,
}

impl StockLink {
    /// 새 연결을 생성합니다.
    pub fn new(
        a_code: impl Into<String>,
        h_code: impl Into<String>,
        name: impl Into<String>,
        exchange: Exchange,
    ) -> Self {
        Self {
            a_code: a_code.into(),
            h_code: h_code.into(),
            name: name.into(),
            exchange,
            industry: None,
            active: true,
        }
    }

    /// 업종을 설정합니다.
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// 수집 대상인지 확인합니다.
    ///
    /// 양쪽 코드가 모두 있는 활성 연결만 수집 및 프리미엄 계산에 포함됩니다.
    pub fn is_collectable(&self) -> bool {
        self.active && !self.a_code.is_empty() && !self.h_code.is_empty()
    }
}
