//! 시세 수집 주기 모듈.
//!
//! 한 주기의 흐름: 활성 연결 조회 → 개장 시장의 레그별 시세 조회
//! (배치 우선, 누락분 개별 보충, 동시성 한도 적용) → 주기 경계로
//! 타임스탬프 버킷 → 환율 스냅샷과 결합해 프리미엄 표본 계산 →
//! 단일 트랜잭션으로 저장.
//!
//! 두 시장은 독립적으로 개폐되므로 한 주기에 A주 시세만 있고
//! H주 짝이 없을 수 있습니다. 그 경우 해당 연결의 표본은 만들지
//! 않습니다 (부분 데이터를 보간하거나 이월하지 않음).

use crate::config::CollectorConfig;
use crate::modules::fx_refresh;
use crate::runtime::RuntimeSettings;
use crate::stats::CycleStats;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use premium_core::{bucket_to_cycle, FxSnapshot, Market, PremiumSample, Quote, StockLink, TradingCalendar};
use premium_data::{
    with_retry, Database, DataError, RetryPolicy, StockLinkRepository, TencentError,
    TencentFetcher, TencentQuote,
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, warn};

/// 데이터 출처 태그.
const SOURCE: &str = "tencent";

/// 한 수집 주기를 실행합니다.
///
/// 단일 종목의 실패는 주기의 다른 종목에 영향을 주지 않습니다.
/// 저장은 주기 단위 트랜잭션이므로 중단 시 부분 반영이 없습니다.
pub async fn run_cycle(
    db: &Database,
    fetcher: &TencentFetcher,
    calendar: &TradingCalendar,
    config: &CollectorConfig,
    settings: &RuntimeSettings,
) -> Result<CycleStats> {
    let start = Instant::now();
    let mut stats = CycleStats::new();

    if !settings.enabled {
        debug!("수집 비활성화, 주기 건너뜀");
        return Ok(CycleStats::skipped());
    }

    let now = Utc::now();
    let a_open = calendar.is_open(Market::A, now);
    let h_open = calendar.is_open(Market::H, now);
    if !a_open && !h_open {
        debug!("양 시장 모두 휴장, 주기 건너뜀");
        return Ok(CycleStats::skipped());
    }

    let links: Vec<StockLink> = StockLinkRepository::new(db.clone())
        .list_active_pairs()
        .await?
        .iter()
        .map(|r| r.to_link())
        .collect();
    stats.links = links.len();

    if links.is_empty() {
        warn!("수집할 종목 연결이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let cycle_ts = bucket_to_cycle(now, settings.interval_secs);
    let policy = RetryPolicy::new(
        config.collect.retry_max_attempts,
        config.collect.retry_base_delay_ms,
    );

    // 개장 시장의 레그만 조회 (시장별 독립 개폐)
    let mut a_raw: HashMap<String, TencentQuote> = HashMap::new();
    if a_open {
        let codes: Vec<String> = links.iter().map(|l| l.a_code.clone()).collect();
        a_raw = fetch_leg(fetcher, &codes, Market::A, &policy, config).await;
        stats.missed += codes.len() - a_raw.len();
    }

    let mut h_raw: HashMap<String, TencentQuote> = HashMap::new();
    if h_open {
        let codes: Vec<String> = links.iter().map(|l| l.h_code.clone()).collect();
        h_raw = fetch_leg(fetcher, &codes, Market::H, &policy, config).await;
        stats.missed += codes.len() - h_raw.len();
    }

    stats.a_quotes = a_raw.len();
    stats.h_quotes = h_raw.len();

    // 도메인 시세로 변환 (주기 경계 타임스탬프 + 시장별 거래일)
    let a_date = calendar.trading_date(Market::A, now);
    let h_date = calendar.trading_date(Market::H, now);
    let quotes: Vec<Quote> = a_raw
        .values()
        .map(|q| to_quote(q, cycle_ts, a_date))
        .chain(h_raw.values().map(|q| to_quote(q, cycle_ts, h_date)))
        .collect();

    // 주기별 환율 스냅샷 (네트워크 대기 없음)
    let fx = fx_refresh::load_snapshot(db, config, settings).await;
    debug!(rate = %fx.rate, origin = %fx.origin, "환율 스냅샷");

    let samples = build_samples(&links, &a_raw, &h_raw, &fx, cycle_ts, a_date);
    stats.samples = samples.len();

    // 주기 단위 원자적 저장, 재시도 소진 시 전부 버리고 다음 주기로
    let flush = with_retry(&policy, "cycle_flush", DataError::is_retryable, || {
        flush_cycle(db, &quotes, &samples)
    })
    .await;

    if let Err(e) = flush {
        stats.dropped = quotes.len() + samples.len();
        stats.samples = 0;
        error!(error = %e, dropped = stats.dropped, "주기 저장 실패, 행 버림");
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 한 시장 레그의 시세를 조회합니다.
///
/// 배치 요청(청크)을 동시성 한도 내에서 실행하고, 배치에서 빠진
/// 종목은 개별 조회로 보충합니다. 재시도를 소진한 종목은 이번 주기의
/// 누락 관측으로 남습니다.
async fn fetch_leg(
    fetcher: &TencentFetcher,
    codes: &[String],
    market: Market,
    policy: &RetryPolicy,
    config: &CollectorConfig,
) -> HashMap<String, TencentQuote> {
    let worker_limit = config.collect.worker_limit.max(1);
    let batch_size = config.collect.batch_size.max(1);

    let requests: Vec<(String, Market)> =
        codes.iter().map(|c| (c.clone(), market)).collect();
    let mut fetched: HashMap<String, TencentQuote> = HashMap::new();

    // 1단계: 배치 조회
    let batches: Vec<std::result::Result<Vec<TencentQuote>, TencentError>> =
        stream::iter(requests.chunks(batch_size).map(|chunk| {
            with_retry(policy, "quote_batch", TencentError::is_retryable, move || {
                fetcher.fetch_quotes(chunk)
            })
        }))
        .buffer_unordered(worker_limit)
        .collect()
        .await;

    for result in batches {
        match result {
            Ok(quotes) => {
                for quote in quotes {
                    fetched.insert(quote.code.clone(), quote);
                }
            }
            Err(e) => {
                warn!(market = %market, error = %e, "배치 조회 실패, 개별 조회로 폴백");
            }
        }
    }

    // 2단계: 배치에서 빠진 종목 개별 보충
    let missing: Vec<&String> = codes.iter().filter(|c| !fetched.contains_key(*c)).collect();
    if missing.is_empty() {
        return fetched;
    }

    let singles: Vec<(String, std::result::Result<TencentQuote, TencentError>)> =
        stream::iter(missing.into_iter().map(|code| async move {
            let result =
                with_retry(policy, "quote_fetch", TencentError::is_retryable, || {
                    fetcher.fetch_quote(code, market)
                })
                .await;
            (code.clone(), result)
        }))
        .buffer_unordered(worker_limit)
        .collect()
        .await;

    for (code, result) in singles {
        match result {
            Ok(quote) => {
                fetched.insert(code, quote);
            }
            Err(e) => {
                warn!(code = %code, market = %market, error = %e, "시세 조회 실패, 이번 주기 관측 누락");
            }
        }
    }

    fetched
}

/// 소스 원본 값을 도메인 시세로 변환합니다.
fn to_quote(raw: &TencentQuote, observed_at: DateTime<Utc>, trade_date: NaiveDate) -> Quote {
    Quote {
        stock_code: raw.code.clone(),
        market: raw.market,
        current: raw.current,
        open: raw.open,
        high: raw.high,
        low: raw.low,
        prev_close: raw.prev_close,
        volume: raw.volume,
        turnover: raw.turnover,
        observed_at,
        trade_date,
        source: SOURCE.to_string(),
    }
}

/// 양쪽 레그가 모두 수락된 연결의 프리미엄 표본을 만듭니다.
///
/// 어느 한쪽 시세가 없는 연결은 이번 주기에 표본을 만들지 않습니다.
pub fn build_samples(
    links: &[StockLink],
    a_quotes: &HashMap<String, TencentQuote>,
    h_quotes: &HashMap<String, TencentQuote>,
    fx: &FxSnapshot,
    observed_at: DateTime<Utc>,
    trade_date: NaiveDate,
) -> Vec<PremiumSample> {
    links
        .iter()
        .filter_map(|link| {
            let a = a_quotes.get(&link.a_code)?;
            let h = h_quotes.get(&link.h_code)?;
            PremiumSample::compute(
                link.a_code.as_str(),
                a.current,
                h.current,
                fx,
                observed_at,
                trade_date,
            )
        })
        .collect()
}

/// 한 주기의 모든 행을 단일 트랜잭션으로 기록합니다.
async fn flush_cycle(
    db: &Database,
    quotes: &[Quote],
    samples: &[PremiumSample],
) -> premium_data::Result<(u64, u64)> {
    let mut writer = db.begin_cycle().await?;
    for quote in quotes {
        writer.append_quote(quote).await?;
    }
    for sample in samples {
        writer.append_sample(sample).await?;
    }
    writer.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use premium_core::{Exchange, FxOrigin};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn raw_quote(code: &str, market: Market, current: Decimal) -> TencentQuote {
        TencentQuote {
            code: code.to_string(),
            market,
            current,
            open: current,
            high: current,
            low: current,
            prev_close: current,
            volume: Some(1000),
            turnover: None,
        }
    }

    fn fx_snapshot() -> FxSnapshot {
        FxSnapshot {
            rate: dec!(0.9),
            observed_at: Utc.with_ymd_and_hms(2024, 1, 10, 2, 0, 0).unwrap(),
            origin: FxOrigin::Fetched,
        }
    }

    fn cycle_args() -> (DateTime<Utc>, NaiveDate) {
        (
            Utc.with_ymd_and_hms(2024, 1, 10, 2, 30, 0).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
    }

    #[test]
    fn test_build_samples_pairs_both_legs() {
        let links = vec![StockLink::new("600036", "03968", "招商银行", Exchange::Sh)];
        let mut a_quotes = HashMap::new();
        a_quotes.insert("600036".to_string(), raw_quote("600036", Market::A, dec!(10)));
        let mut h_quotes = HashMap::new();
        h_quotes.insert("03968".to_string(), raw_quote("03968", Market::H, dec!(10)));

        let (ts, date) = cycle_args();
        let samples = build_samples(&links, &a_quotes, &h_quotes, &fx_snapshot(), ts, date);

        assert_eq!(samples.len(), 1);
        // h_cny = 9, (10 - 9) / 9 * 100 = 11.1111%
        assert_eq!(samples[0].premium_rate, dec!(11.1111));
        assert_eq!(samples[0].stock_code, "600036");
        assert!(samples[0].is_consistent());
    }

    #[test]
    fn test_missing_counterpart_yields_no_sample() {
        let links = vec![StockLink::new("600036", "03968", "招商银行", Exchange::Sh)];
        let mut a_quotes = HashMap::new();
        a_quotes.insert("600036".to_string(), raw_quote("600036", Market::A, dec!(10)));
        // H 시장 휴장으로 H 레그 시세 없음
        let h_quotes = HashMap::new();

        let (ts, date) = cycle_args();
        let samples = build_samples(&links, &a_quotes, &h_quotes, &fx_snapshot(), ts, date);

        assert!(samples.is_empty());
    }

    #[test]
    fn test_zero_h_price_yields_no_sample() {
        let links = vec![StockLink::new("600036", "03968", "招商银行", Exchange::Sh)];
        let mut a_quotes = HashMap::new();
        a_quotes.insert("600036".to_string(), raw_quote("600036", Market::A, dec!(10)));
        let mut h_quotes = HashMap::new();
        h_quotes.insert(
            "03968".to_string(),
            raw_quote("03968", Market::H, Decimal::ZERO),
        );

        let (ts, date) = cycle_args();
        let samples = build_samples(&links, &a_quotes, &h_quotes, &fx_snapshot(), ts, date);

        assert!(samples.is_empty());
    }

    #[test]
    fn test_to_quote_conversion() {
        let raw = raw_quote("600036", Market::A, dec!(33.50));
        let (ts, date) = cycle_args();
        let quote = to_quote(&raw, ts, date);

        assert_eq!(quote.stock_code, "600036");
        assert_eq!(quote.market, Market::A);
        assert_eq!(quote.observed_at, ts);
        assert_eq!(quote.trade_date, date);
        assert_eq!(quote.source, "tencent");
    }
}
