//! 데몬 스케줄러.
//!
//! 세 개의 독립 주기 태스크를 한 루프에서 돌립니다:
//! - 시세 수집 주기
//! - 환율 갱신
//! - 일별 롤업 트리거 (H주 마감 경계 이후 1회 + 전일 보정)
//!
//! 주기 시작마다 DB 설정을 다시 읽으므로 수집 on/off와 주기 변경이
//! 재시작 없이 반영됩니다. 종료 신호를 받으면 진행 중인 주기의
//! 트랜잭션은 롤백되고 루프를 빠져나갑니다.

use crate::config::CollectorConfig;
use crate::modules;
use crate::runtime::RuntimeSettings;
use crate::Result;
use chrono::{NaiveDate, Utc};
use premium_core::{previous_trading_day, Market, TradingCalendar};
use premium_data::{Database, TencentFetcher};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// 데몬 모드를 실행합니다. ctrl-c 신호로 종료합니다.
pub async fn run_daemon(
    db: &Database,
    fetcher: &TencentFetcher,
    calendar: &TradingCalendar,
    config: &CollectorConfig,
) -> Result<()> {
    info!(
        collect_interval_secs = config.collect.interval_secs,
        fx_interval_secs = config.fx.interval_secs,
        "=== 데몬 모드 시작 ==="
    );

    let mut collect_interval = new_interval(config.collect.interval());
    let mut fx_interval = new_interval(config.fx.interval());
    let mut rollup_interval = new_interval(config.rollup.check_interval());

    let mut current_interval_secs = config.collect.interval_secs;
    // 마감 롤업/전일 보정을 각각 하루 1회로 제한
    let mut close_rollup_done: Option<NaiveDate> = None;
    let mut catchup_done: Option<NaiveDate> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("종료 신호 수신, 데몬 종료 중...");
                break;
            }
            _ = collect_interval.tick() => {
                let settings = RuntimeSettings::load(db, config).await;

                if settings.interval_secs != current_interval_secs {
                    info!(
                        old_secs = current_interval_secs,
                        new_secs = settings.interval_secs,
                        "수집 주기 변경 반영"
                    );
                    current_interval_secs = settings.interval_secs;
                    collect_interval = new_interval(Duration::from_secs(current_interval_secs));
                }

                match modules::run_cycle(db, fetcher, calendar, config, &settings).await {
                    Ok(stats) if stats.skipped => {
                        debug!("수집 주기 건너뜀");
                    }
                    Ok(stats) => stats.log_summary("시세 수집"),
                    Err(e) => error!(error = %e, "수집 주기 실패"),
                }
            }
            _ = fx_interval.tick() => {
                let settings = RuntimeSettings::load(db, config).await;
                if !settings.enabled {
                    debug!("수집 비활성화, 환율 갱신 건너뜀");
                    continue;
                }
                match modules::refresh_fx_rate(db, fetcher, calendar, config, &settings).await {
                    Ok(snapshot) => {
                        debug!(rate = %snapshot.rate, origin = %snapshot.origin, "환율 갱신");
                    }
                    Err(e) => error!(error = %e, "환율 갱신 실패"),
                }
            }
            _ = rollup_interval.tick() => {
                let now = Utc::now();

                // H주 마감 경계 이후 당일 통계 생성 (하루 1회)
                let h_date = calendar.trading_date(Market::H, now);
                if calendar.is_after_close(Market::H, now) && close_rollup_done != Some(h_date) {
                    match modules::rollup_all(db, h_date).await {
                        Ok(stats) => {
                            stats.log_summary("마감 롤업");
                            close_rollup_done = Some(h_date);
                        }
                        Err(e) => error!(trade_date = %h_date, error = %e, "마감 롤업 실패"),
                    }
                }

                // 전일 보정: 직전 거래일 통계 재계산 (멱등, 하루 1회)
                if config.rollup.catchup {
                    let prev = previous_trading_day(calendar.trading_date(Market::A, now));
                    if catchup_done != Some(prev) {
                        match modules::rollup_all(db, prev).await {
                            Ok(stats) => {
                                stats.log_summary("전일 보정 롤업");
                                catchup_done = Some(prev);
                            }
                            Err(e) => error!(trade_date = %prev, error = %e, "전일 보정 롤업 실패"),
                        }
                    }
                }
            }
        }
    }

    info!("데몬 종료");
    Ok(())
}

fn new_interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
