//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::Result;
use premium_core::{
    default_a_sessions, default_h_sessions, MarketSessions, SessionWindow, TradingCalendar,
};
use rust_decimal::Decimal;
use std::time::Duration;

/// Collector 전체 설정.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 시세 수집 설정
    pub collect: CollectConfig,
    /// 환율 갱신 설정
    pub fx: FxConfig,
    /// 일별 롤업 설정
    pub rollup: RollupConfig,
    /// 시장 세션 설정 (미지정 항목은 기본 세션 사용)
    pub sessions: SessionsConfig,
}

/// 시세 수집 설정.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// 수집 활성화 기본값 (DB 설정이 없을 때)
    pub enabled: bool,
    /// 수집 주기 (초)
    pub interval_secs: u64,
    /// 동시 요청 상한 (업스트림 호출 제한 준수용)
    pub worker_limit: usize,
    /// 배치 요청당 종목 수
    pub batch_size: usize,
    /// 요청 타임아웃 (밀리초)
    pub request_timeout_ms: u64,
    /// 재시도 최대 횟수
    pub retry_max_attempts: u32,
    /// 재시도 기본 대기 (밀리초)
    pub retry_base_delay_ms: u64,
}

/// 환율 갱신 설정.
#[derive(Debug, Clone)]
pub struct FxConfig {
    /// 통화쌍
    pub currency_pair: String,
    /// 갱신 주기 (초)
    pub interval_secs: u64,
    /// 저장된 환율의 신선도 한도 (초)
    pub staleness_secs: u64,
    /// 기본 환율 (폴백 최후 단계)
    pub default_rate: Decimal,
}

/// 일별 롤업 설정.
#[derive(Debug, Clone)]
pub struct RollupConfig {
    /// 마감 경계 확인 주기 (초)
    pub check_interval_secs: u64,
    /// 전일 보정 롤업 활성화
    pub catchup: bool,
}

/// 시장 세션 설정 ("HH:MM-HH:MM" / "HH:MM" 문자열).
#[derive(Debug, Clone, Default)]
pub struct SessionsConfig {
    pub a_morning: Option<String>,
    pub a_afternoon: Option<String>,
    pub a_close_boundary: Option<String>,
    pub h_morning: Option<String>,
    pub h_afternoon: Option<String>,
    pub h_close_boundary: Option<String>,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        Ok(Self {
            database_url,
            collect: CollectConfig {
                enabled: env_var_bool("COLLECT_ENABLED", true),
                interval_secs: env_var_parse("COLLECT_INTERVAL_SECS", 30),
                worker_limit: env_var_parse("COLLECT_WORKER_LIMIT", 8),
                batch_size: env_var_parse("COLLECT_BATCH_SIZE", 40),
                request_timeout_ms: env_var_parse("COLLECT_REQUEST_TIMEOUT_MS", 5000),
                retry_max_attempts: env_var_parse("COLLECT_RETRY_MAX_ATTEMPTS", 3),
                retry_base_delay_ms: env_var_parse("COLLECT_RETRY_BASE_DELAY_MS", 500),
            },
            fx: FxConfig {
                currency_pair: std::env::var("FX_CURRENCY_PAIR")
                    .unwrap_or_else(|_| "HKDCNY".to_string()),
                interval_secs: env_var_parse("FX_INTERVAL_SECS", 300),
                staleness_secs: env_var_parse("FX_STALENESS_SECS", 600),
                default_rate: env_var_parse("FX_DEFAULT_RATE", Decimal::new(9, 1)),
            },
            rollup: RollupConfig {
                check_interval_secs: env_var_parse("ROLLUP_CHECK_INTERVAL_SECS", 60),
                catchup: env_var_bool("ROLLUP_CATCHUP", true),
            },
            sessions: SessionsConfig {
                a_morning: std::env::var("A_SESSION_MORNING").ok(),
                a_afternoon: std::env::var("A_SESSION_AFTERNOON").ok(),
                a_close_boundary: std::env::var("A_CLOSE_BOUNDARY").ok(),
                h_morning: std::env::var("H_SESSION_MORNING").ok(),
                h_afternoon: std::env::var("H_SESSION_AFTERNOON").ok(),
                h_close_boundary: std::env::var("H_CLOSE_BOUNDARY").ok(),
            },
        })
    }

    /// 세션 설정으로 거래 캘린더를 만듭니다.
    ///
    /// 잘못된 세션 문자열은 기동 시점 에러입니다.
    pub fn build_calendar(&self) -> Result<TradingCalendar> {
        let a = apply_overrides(
            default_a_sessions(),
            &self.sessions.a_morning,
            &self.sessions.a_afternoon,
            &self.sessions.a_close_boundary,
        )?;
        let h = apply_overrides(
            default_h_sessions(),
            &self.sessions.h_morning,
            &self.sessions.h_afternoon,
            &self.sessions.h_close_boundary,
        )?;
        TradingCalendar::new(a, h).map_err(Into::into)
    }
}

fn apply_overrides(
    mut sessions: MarketSessions,
    morning: &Option<String>,
    afternoon: &Option<String>,
    close_boundary: &Option<String>,
) -> Result<MarketSessions> {
    if let Some(s) = morning {
        sessions.morning = s.parse::<SessionWindow>()?;
    }
    if let Some(s) = afternoon {
        sessions.afternoon = s.parse::<SessionWindow>()?;
    }
    if let Some(s) = close_boundary {
        sessions.close_boundary = chrono::NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map_err(|e| CollectorError::Config(format!("마감 경계 파싱 실패 ({}): {}", s, e)))?;
    }
    Ok(sessions)
}

impl CollectConfig {
    /// 수집 주기를 Duration으로 반환.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// 요청 타임아웃을 Duration으로 반환.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl FxConfig {
    /// 갱신 주기를 Duration으로 반환.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// 신선도 한도를 Duration으로 반환.
    pub fn staleness_bound(&self) -> Duration {
        Duration::from_secs(self.staleness_secs)
    }
}

impl RollupConfig {
    /// 확인 주기를 Duration으로 반환.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용).
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱.
fn env_var_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
