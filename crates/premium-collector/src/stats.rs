//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 한 수집 주기의 통계.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleStats {
    /// 수집 대상 연결 수
    pub links: usize,
    /// 수락된 A주 시세 수
    pub a_quotes: usize,
    /// 수락된 H주 시세 수
    pub h_quotes: usize,
    /// 재시도 소진으로 놓친 관측 수
    pub missed: usize,
    /// 계산된 프리미엄 표본 수
    pub samples: usize,
    /// 저장 실패로 버린 행 수
    pub dropped: usize,
    /// 주기 전체를 건너뜀 (수집 비활성/전 시장 휴장)
    pub skipped: bool,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CycleStats {
    /// 새 통계 객체 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 건너뛴 주기 통계 생성.
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// 통계 요약 로그 출력.
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            links = self.links,
            a_quotes = self.a_quotes,
            h_quotes = self.h_quotes,
            missed = self.missed,
            samples = self.samples,
            dropped = self.dropped,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "주기 완료"
        );
    }
}

/// 일별 롤업 통계.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollupStats {
    /// 대상 종목 수
    pub stocks: usize,
    /// upsert된 통계 행 수
    pub upserted: usize,
    /// 표본 없음으로 건너뛴 종목 수
    pub no_data: usize,
    /// 에러 종목 수
    pub errors: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RollupStats {
    /// 새 통계 객체 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 통계 요약 로그 출력.
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            stocks = self.stocks,
            upserted = self.upserted,
            no_data = self.no_data,
            errors = self.errors,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "롤업 완료"
        );
    }
}
