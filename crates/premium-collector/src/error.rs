//! 에러 타입 정의.

use premium_core::PremiumError;
use premium_data::{DataError, TencentError};
use thiserror::Error;

/// Collector 에러 타입.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 데이터 저장소 에러
    #[error("Storage error: {0}")]
    Data(#[from] DataError),

    /// 외부 데이터 소스 에러
    #[error("Data source error: {0}")]
    Source(#[from] TencentError),

    /// 도메인 에러
    #[error("Domain error: {0}")]
    Core(#[from] PremiumError),

    /// 일반 에러
    #[error("Error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<std::env::VarError> for CollectorError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭.
pub type Result<T> = std::result::Result<T, CollectorError>;
