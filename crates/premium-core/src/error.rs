//! 프리미엄 추적 시스템의 에러 타입.
//!
//! 이 모듈은 수집 파이프라인 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 파이프라인 에러.
#[derive(Debug, Error)]
pub enum PremiumError {
    /// 설정 에러 (기동 시 치명적)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("타임아웃: {0}")]
    Timeout(String),

    /// 요청 한도 초과
    #[error("요청 한도 초과: {0}")]
    RateLimit(String),

    /// 응답 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 집계 대상 표본 없음
    #[error("표본 없음: {0}")]
    NoData(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 파이프라인 작업을 위한 Result 타입.
pub type PremiumResult<T> = Result<T, PremiumError>;

impl PremiumError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PremiumError::Network(_) | PremiumError::Timeout(_) | PremiumError::RateLimit(_)
        )
    }

    /// 기동을 중단해야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PremiumError::Config(_))
    }
}

impl From<serde_json::Error> for PremiumError {
    fn from(err: serde_json::Error) -> Self {
        PremiumError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let network_err = PremiumError::Network("timeout".to_string());
        assert!(network_err.is_retryable());

        let parse_err = PremiumError::Parse("bad payload".to_string());
        assert!(!parse_err.is_retryable());

        let no_data = PremiumError::NoData("600036/2026-08-06".to_string());
        assert!(!no_data.is_retryable());
    }

    #[test]
    fn test_error_fatal() {
        let config_err = PremiumError::Config("invalid session window".to_string());
        assert!(config_err.is_fatal());

        let network_err = PremiumError::Network("connection refused".to_string());
        assert!(!network_err.is_fatal());
    }
}
