//! DB 설정 행 기반 런타임 설정.
//!
//! 설정 행은 외부에서 관리됩니다. 매 주기 시작 시점에 다시 읽으므로
//! 수집 on/off, 주기, 기본 환율 변경이 재시작 없이 반영됩니다.
//! 행이 없거나 조회에 실패하면 환경변수 기본값을 사용합니다.

use crate::config::CollectorConfig;
use premium_data::{ConfigRepository, Database};
use rust_decimal::Decimal;
use tracing::warn;

/// 설정 키.
pub mod keys {
    /// 수집 활성화 플래그 (bool)
    pub const COLLECT_ENABLED: &str = "collect.enabled";
    /// 수집 주기 초 (int)
    pub const COLLECT_INTERVAL_SECS: &str = "collect.interval_secs";
    /// 기본 환율 (decimal)
    pub const FX_DEFAULT_RATE: &str = "fx.default_rate";
}

/// 주기 시작 시점에 적용되는 런타임 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// 수집 활성화 여부
    pub enabled: bool,
    /// 수집 주기 (초)
    pub interval_secs: u64,
    /// 기본 환율
    pub default_fx_rate: Decimal,
}

impl RuntimeSettings {
    /// 환경변수 기본값만으로 설정을 만듭니다.
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self {
            enabled: config.collect.enabled,
            interval_secs: config.collect.interval_secs,
            default_fx_rate: config.fx.default_rate,
        }
    }

    /// DB 설정 행을 읽어 런타임 설정을 만듭니다.
    ///
    /// 조회 실패는 치명적이지 않으며 기본값으로 계속합니다.
    pub async fn load(db: &Database, config: &CollectorConfig) -> Self {
        let repo = ConfigRepository::new(db.clone());
        let defaults = Self::from_config(config);

        let enabled = match repo.get_bool(keys::COLLECT_ENABLED).await {
            Ok(value) => value.unwrap_or(defaults.enabled),
            Err(e) => {
                warn!(error = %e, "설정 조회 실패, 기본값 사용");
                defaults.enabled
            }
        };

        let interval_secs = repo
            .get_u64(keys::COLLECT_INTERVAL_SECS)
            .await
            .ok()
            .flatten()
            .filter(|&v| v > 0)
            .unwrap_or(defaults.interval_secs);

        let default_fx_rate = repo
            .get_decimal(keys::FX_DEFAULT_RATE)
            .await
            .ok()
            .flatten()
            .filter(|v| *v > Decimal::ZERO)
            .unwrap_or(defaults.default_fx_rate);

        Self {
            enabled,
            interval_secs,
            default_fx_rate,
        }
    }
}
