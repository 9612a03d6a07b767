//! Standalone premium collector CLI.

use clap::{Parser, Subcommand};
use premium_collector::{modules, scheduler, CollectorConfig, RuntimeSettings};
use premium_core::Market;
use premium_data::{Database, DatabaseConfig, TencentFetcher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "premium-collector")]
#[command(about = "A/H Premium Data Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 수집 주기 1회 실행 (개장 시장의 시세 + 프리미엄 표본)
    Collect,

    /// 환율 1회 갱신 (HKD→CNY)
    RefreshFx,

    /// 일별 통계 롤업 (과거 재계산용)
    Rollup {
        /// 거래일 (YYYY-MM-DD, 생략 시 오늘)
        #[arg(long)]
        date: Option<String>,

        /// 특정 종목만 (A주 코드, 생략 시 전체)
        #[arg(long)]
        stock: Option<String>,
    },

    /// 데이터베이스 마이그레이션 실행
    Migrate,

    /// 데몬 모드: 수집/환율/롤업 태스크를 주기 실행
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("premium_collector={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("A/H Premium Collector 시작");

    // 설정 로드 (잘못된 세션 설정은 여기서 치명적)
    let config = CollectorConfig::from_env()?;
    let calendar = config.build_calendar()?;
    tracing::debug!(database_url = %config.database_url, "설정 로드 완료");

    // DB 연결
    let db = Database::connect(&DatabaseConfig::from_url(config.database_url.as_str())).await?;
    tracing::info!("데이터베이스 연결 성공");

    let fetcher = TencentFetcher::new(config.collect.request_timeout());

    // 명령 실행
    match cli.command {
        Commands::Collect => {
            let settings = RuntimeSettings::load(&db, &config).await;
            let stats = modules::run_cycle(&db, &fetcher, &calendar, &config, &settings).await?;
            if stats.skipped {
                tracing::info!("수집 비활성화 또는 전 시장 휴장, 주기 건너뜀");
            } else {
                stats.log_summary("시세 수집");
            }
        }
        Commands::RefreshFx => {
            let settings = RuntimeSettings::load(&db, &config).await;
            let snapshot =
                modules::refresh_fx_rate(&db, &fetcher, &calendar, &config, &settings).await?;
            tracing::info!(rate = %snapshot.rate, origin = %snapshot.origin, "환율 갱신 완료");
        }
        Commands::Rollup { date, stock } => {
            let trade_date = match date {
                Some(s) => chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| format!("잘못된 날짜 형식 ({}): {}", s, e))?,
                None => calendar.trading_date(Market::A, chrono::Utc::now()),
            };

            match stock {
                Some(code) => {
                    match modules::rollup_stock(&db, &code, trade_date).await? {
                        modules::RollupOutcome::Upserted(summary) => {
                            tracing::info!(
                                stock_code = %code,
                                trade_date = %trade_date,
                                open = %summary.open,
                                close = %summary.close,
                                record_count = summary.record_count,
                                "통계 생성 완료"
                            );
                        }
                        modules::RollupOutcome::NoData => {
                            tracing::warn!(
                                stock_code = %code,
                                trade_date = %trade_date,
                                "표본 없음, 통계를 생성하지 않음"
                            );
                            return Err("No samples for the requested (stock, date)".into());
                        }
                    }
                }
                None => {
                    let stats = modules::rollup_all(&db, trade_date).await?;
                    stats.log_summary("수동 롤업");
                }
            }
        }
        Commands::Migrate => {
            db.migrate().await?;
            tracing::info!("마이그레이션 완료");
        }
        Commands::Daemon => {
            scheduler::run_daemon(&db, &fetcher, &calendar, &config).await?;
        }
    }

    db.pool().close().await;
    tracing::info!("A/H Premium Collector 종료");

    Ok(())
}
