//! # Premium Core
//!
//! A/H 프리미엄 추적 시스템의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 듀얼 리스팅 종목 연결 (A주 + H주)
//! - 시세 및 환율 관측 레코드
//! - 프리미엄 계산 (Decimal 고정소수점)
//! - 일별 통계 집계
//! - 시장별 거래 세션 캘린더
//! - 에러 타입 및 로깅 인프라

pub mod calendar;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use calendar::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
