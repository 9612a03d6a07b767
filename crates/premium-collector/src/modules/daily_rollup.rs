//! 일별 통계 롤업 모듈.
//!
//! 한 (종목, 거래일)의 프리미엄 표본 전체를 읽어 통계 한 행으로
//! upsert합니다. 결과는 표본 집합의 순수 함수이므로 같은 표본으로
//! 다시 실행해도 같은 행이 나옵니다 (멱등). 표본이 없으면 0으로 채운
//! 행 대신 별도의 "데이터 없음" 결과를 반환합니다.

use crate::stats::RollupStats;
use crate::Result;
use chrono::NaiveDate;
use premium_core::{DailySummary, PremiumSample};
use premium_data::{Database, DailyStatRepository, PremiumSampleRepository, StockLinkRepository};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// 한 종목의 롤업 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollupOutcome {
    /// 통계 행을 upsert함
    Upserted(DailySummary),
    /// 해당 거래일에 표본 없음 (행을 쓰지 않음)
    NoData,
}

/// 한 (종목, 거래일)의 통계를 재계산해 upsert합니다.
pub async fn rollup_stock(
    db: &Database,
    stock_code: &str,
    trade_date: NaiveDate,
) -> Result<RollupOutcome> {
    let samples: Vec<PremiumSample> = PremiumSampleRepository::new(db.clone())
        .get_by_stock_and_date(stock_code, trade_date)
        .await?
        .iter()
        .map(|r| r.to_sample())
        .collect();

    match DailySummary::from_samples(stock_code, trade_date, &samples) {
        Some(summary) => {
            DailyStatRepository::new(db.clone()).upsert(&summary).await?;
            debug!(
                stock_code = stock_code,
                trade_date = %trade_date,
                record_count = summary.record_count,
                "통계 upsert 완료"
            );
            Ok(RollupOutcome::Upserted(summary))
        }
        None => {
            warn!(
                stock_code = stock_code,
                trade_date = %trade_date,
                "표본 없음, 통계 행을 쓰지 않음"
            );
            Ok(RollupOutcome::NoData)
        }
    }
}

/// 모든 활성 연결의 거래일 통계를 생성합니다.
///
/// 종목 단위로 격리되어 한 종목의 실패가 다른 종목을 막지 않습니다.
pub async fn rollup_all(db: &Database, trade_date: NaiveDate) -> Result<RollupStats> {
    let start = Instant::now();
    let mut stats = RollupStats::new();

    info!(trade_date = %trade_date, "일별 통계 생성 시작");

    let links = StockLinkRepository::new(db.clone()).list_active_pairs().await?;
    stats.stocks = links.len();

    for link in &links {
        match rollup_stock(db, &link.a_code, trade_date).await {
            Ok(RollupOutcome::Upserted(_)) => stats.upserted += 1,
            Ok(RollupOutcome::NoData) => stats.no_data += 1,
            Err(e) => {
                stats.errors += 1;
                error!(
                    stock_code = %link.a_code,
                    trade_date = %trade_date,
                    error = %e,
                    "종목 통계 생성 실패"
                );
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}
