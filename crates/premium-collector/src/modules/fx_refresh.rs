//! HKD→CNY 환율 갱신 모듈.
//!
//! 갱신 태스크는 자체 주기로 환율을 가져와 저장하고, 수집 주기는
//! 네트워크 없이 저장된 최신값으로 스냅샷을 만듭니다. 폴백 순서:
//! (a) 신선도 한도 내의 마지막 성공값, (b) 설정된 기본 환율.
//! 신선한 환율을 기다리며 프리미엄 계산을 막는 일은 없습니다.

use crate::config::CollectorConfig;
use crate::runtime::RuntimeSettings;
use crate::Result;
use chrono::Utc;
use premium_core::{FxOrigin, FxRate, FxSnapshot, Market, TradingCalendar};
use premium_data::{with_retry, Database, FxRateRepository, RetryPolicy, TencentError, TencentFetcher};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// 데이터 출처 태그.
const SOURCE: &str = "tencent";

/// 소스에서 환율을 새로 가져와 저장하고 스냅샷을 반환합니다.
///
/// 가져오기에 실패하면 저장 없이 폴백 스냅샷을 반환합니다.
/// 저장 실패는 스냅샷 유효성에 영향을 주지 않습니다 (경고 후 계속).
pub async fn refresh_fx_rate(
    db: &Database,
    fetcher: &TencentFetcher,
    calendar: &TradingCalendar,
    config: &CollectorConfig,
    settings: &RuntimeSettings,
) -> Result<FxSnapshot> {
    let policy = RetryPolicy::new(
        config.collect.retry_max_attempts,
        config.collect.retry_base_delay_ms,
    );
    let pair = config.fx.currency_pair.as_str();
    let now = Utc::now();

    let fetched = with_retry(&policy, "fx_fetch", |e: &TencentError| e.is_retryable(), || {
        fetcher.fetch_fx_rate(pair)
    })
    .await;

    match fetched {
        Ok(rate) if rate > Decimal::ZERO => {
            let record = FxRate {
                currency_pair: pair.to_string(),
                rate,
                observed_at: now,
                trade_date: calendar.trading_date(Market::A, now),
                source: SOURCE.to_string(),
            };
            if let Err(e) = FxRateRepository::new(db.clone()).append(&record).await {
                warn!(error = %e, "환율 저장 실패, 스냅샷은 유지");
            }
            debug!(pair = pair, rate = %rate, "환율 갱신 성공");
            Ok(FxSnapshot {
                rate,
                observed_at: now,
                origin: FxOrigin::Fetched,
            })
        }
        Ok(bad) => {
            warn!(pair = pair, rate = %bad, "비정상 환율 수신, 폴백 사용");
            Ok(load_snapshot(db, config, settings).await)
        }
        Err(e) => {
            warn!(pair = pair, error = %e, "환율 조회 실패, 폴백 사용");
            Ok(load_snapshot(db, config, settings).await)
        }
    }
}

/// 네트워크 없이 현재 유효한 환율 스냅샷을 만듭니다.
///
/// 수집 주기마다 호출되어 프리미엄 계산에 명시적으로 전달됩니다.
pub async fn load_snapshot(
    db: &Database,
    config: &CollectorConfig,
    settings: &RuntimeSettings,
) -> FxSnapshot {
    let now = Utc::now();
    let latest = FxRateRepository::new(db.clone())
        .latest(&config.fx.currency_pair)
        .await;

    match latest {
        Ok(Some(record)) => {
            let candidate = FxSnapshot {
                rate: record.rate,
                observed_at: record.observed_at,
                origin: FxOrigin::Cached,
            };
            if candidate.is_stale(now, config.fx.staleness_bound()) {
                debug!(
                    observed_at = %record.observed_at,
                    "저장된 환율이 신선도 한도를 벗어남, 기본 환율 사용"
                );
                default_snapshot(settings)
            } else {
                candidate
            }
        }
        Ok(None) => default_snapshot(settings),
        Err(e) => {
            warn!(error = %e, "환율 조회 실패, 기본 환율 사용");
            default_snapshot(settings)
        }
    }
}

fn default_snapshot(settings: &RuntimeSettings) -> FxSnapshot {
    FxSnapshot {
        rate: settings.default_fx_rate,
        observed_at: Utc::now(),
        origin: FxOrigin::Default,
    }
}
