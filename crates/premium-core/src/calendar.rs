//! 시장별 거래 세션 캘린더.
//!
//! A주(상해/심천)와 H주(홍콩)는 세션 시간과 마감 기준이 서로 다릅니다:
//! - A주: 09:30–11:30 / 13:00–15:00 (Asia/Shanghai)
//! - H주: 09:30–12:00 / 13:00–16:00 (Asia/Hong_Kong)
//!
//! 개장 여부는 타임스탬프의 순수 함수로 판정합니다. 상태를 갖는 객체가 아니므로
//! 인스턴스 간 드리프트가 없습니다. 잘못된 세션 설정은 생성 시점에 거부됩니다.

use crate::error::{PremiumError, PremiumResult};
use crate::types::Market;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// 단일 세션 구간 (개장–폐장).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    /// 세션 시작 (현지 시각)
    pub open: NaiveTime,
    /// 세션 종료 (현지 시각)
    pub close: NaiveTime,
}

impl SessionWindow {
    /// 새 세션 구간을 생성합니다.
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    /// 현지 시각이 세션 구간 안에 있는지 확인합니다.
    pub fn contains(&self, t: NaiveTime) -> bool {
        t >= self.open && t < self.close
    }
}

impl std::str::FromStr for SessionWindow {
    type Err = PremiumError;

    /// "09:30-11:30" 형식 문자열에서 세션 구간을 파싱합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (open, close) = s
            .split_once('-')
            .ok_or_else(|| PremiumError::Config(format!("잘못된 세션 형식: {}", s)))?;
        let open = NaiveTime::parse_from_str(open.trim(), "%H:%M")
            .map_err(|e| PremiumError::Config(format!("세션 시작 시각 파싱 실패 ({}): {}", s, e)))?;
        let close = NaiveTime::parse_from_str(close.trim(), "%H:%M")
            .map_err(|e| PremiumError::Config(format!("세션 종료 시각 파싱 실패 ({}): {}", s, e)))?;
        Ok(Self { open, close })
    }
}

/// 한 시장의 세션 설정.
#[derive(Debug, Clone)]
pub struct MarketSessions {
    /// 시장 현지 시간대
    pub tz: Tz,
    /// 오전 세션
    pub morning: SessionWindow,
    /// 오후 세션
    pub afternoon: SessionWindow,
    /// 일별 마감 경계 (이 시각 이후 해당 일의 집계 가능)
    pub close_boundary: NaiveTime,
}

impl MarketSessions {
    /// 세션 설정의 일관성을 검증합니다.
    ///
    /// 잘못된 설정은 기동 시점에 치명적이며 호출 시점에는 실패하지 않습니다.
    pub fn validate(&self) -> PremiumResult<()> {
        if self.morning.open >= self.morning.close {
            return Err(PremiumError::Config(format!(
                "오전 세션 구간이 비어 있습니다: {}-{}",
                self.morning.open, self.morning.close
            )));
        }
        if self.afternoon.open >= self.afternoon.close {
            return Err(PremiumError::Config(format!(
                "오후 세션 구간이 비어 있습니다: {}-{}",
                self.afternoon.open, self.afternoon.close
            )));
        }
        if self.morning.close > self.afternoon.open {
            return Err(PremiumError::Config(
                "오전 세션 종료가 오후 세션 시작보다 늦습니다".to_string(),
            ));
        }
        if self.close_boundary < self.afternoon.close {
            return Err(PremiumError::Config(
                "마감 경계가 오후 세션 종료보다 빠릅니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 현지 시각이 세션 안인지 확인합니다.
    fn in_session(&self, t: NaiveTime) -> bool {
        self.morning.contains(t) || self.afternoon.contains(t)
    }
}

/// A/H 두 시장의 거래 캘린더.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    a: MarketSessions,
    h: MarketSessions,
}

impl TradingCalendar {
    /// 주어진 세션 설정으로 캘린더를 생성합니다.
    ///
    /// 설정이 유효하지 않으면 에러를 반환합니다 (기동 시 치명적).
    pub fn new(a: MarketSessions, h: MarketSessions) -> PremiumResult<Self> {
        a.validate()?;
        h.validate()?;
        Ok(Self { a, h })
    }

    /// 기본 세션 설정으로 캘린더를 생성합니다.
    pub fn with_defaults() -> Self {
        // 기본값은 항상 유효
        Self {
            a: default_a_sessions(),
            h: default_h_sessions(),
        }
    }

    /// 시장의 세션 설정을 반환합니다.
    pub fn sessions(&self, market: Market) -> &MarketSessions {
        match market {
            Market::A => &self.a,
            Market::H => &self.h,
        }
    }

    /// 주어진 시각에 시장이 개장 중인지 확인합니다.
    ///
    /// 주말은 항상 휴장입니다.
    pub fn is_open(&self, market: Market, ts: DateTime<Utc>) -> bool {
        let sessions = self.sessions(market);
        let local = ts.with_timezone(&sessions.tz);
        if is_weekend(local.weekday()) {
            return false;
        }
        sessions.in_session(local.time())
    }

    /// 주어진 시각이 속하는 거래일을 반환합니다.
    ///
    /// 세션이 자정을 넘지 않으므로 시장 현지 날짜가 곧 거래일입니다.
    pub fn trading_date(&self, market: Market, ts: DateTime<Utc>) -> NaiveDate {
        let sessions = self.sessions(market);
        ts.with_timezone(&sessions.tz).date_naive()
    }

    /// 주어진 시각이 해당 거래일의 마감 경계를 지났는지 확인합니다.
    pub fn is_after_close(&self, market: Market, ts: DateTime<Utc>) -> bool {
        let sessions = self.sessions(market);
        let local = ts.with_timezone(&sessions.tz);
        !is_weekend(local.weekday()) && local.time() >= sessions.close_boundary
    }
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// 직전 거래일을 반환합니다 (주말 건너뜀).
pub fn previous_trading_day(date: NaiveDate) -> NaiveDate {
    let mut d = date - chrono::Duration::days(1);
    while is_weekend(d.weekday()) {
        d -= chrono::Duration::days(1);
    }
    d
}

fn is_weekend(w: Weekday) -> bool {
    w == Weekday::Sat || w == Weekday::Sun
}

/// A주 기본 세션 (Asia/Shanghai).
pub fn default_a_sessions() -> MarketSessions {
    MarketSessions {
        tz: chrono_tz::Asia::Shanghai,
        morning: SessionWindow::new(t(9, 30), t(11, 30)),
        afternoon: SessionWindow::new(t(13, 0), t(15, 0)),
        close_boundary: t(15, 30),
    }
}

/// H주 기본 세션 (Asia/Hong_Kong).
pub fn default_h_sessions() -> MarketSessions {
    MarketSessions {
        tz: chrono_tz::Asia::Hong_Kong,
        morning: SessionWindow::new(t(9, 30), t(12, 0)),
        afternoon: SessionWindow::new(t(13, 0), t(16, 0)),
        close_boundary: t(16, 30),
    }
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time literal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_a_market_sessions() {
        let cal = TradingCalendar::with_defaults();
        // 2024-01-10은 수요일. 10:00 CST = 02:00 UTC
        assert!(cal.is_open(Market::A, utc(2024, 1, 10, 2, 0)));
        // 11:45 CST는 점심 휴장
        assert!(!cal.is_open(Market::A, utc(2024, 1, 10, 3, 45)));
        // 14:30 CST = 06:30 UTC
        assert!(cal.is_open(Market::A, utc(2024, 1, 10, 6, 30)));
        // 15:30 CST 폐장 후
        assert!(!cal.is_open(Market::A, utc(2024, 1, 10, 7, 30)));
    }

    #[test]
    fn test_markets_close_independently() {
        let cal = TradingCalendar::with_defaults();
        // 11:45 현지: A주는 점심 휴장, H주는 오전 세션 중 (12:00까지)
        let ts = utc(2024, 1, 10, 3, 45);
        assert!(!cal.is_open(Market::A, ts));
        assert!(cal.is_open(Market::H, ts));
        // 15:30 현지: A주 폐장, H주 오후 세션 중
        let ts = utc(2024, 1, 10, 7, 30);
        assert!(!cal.is_open(Market::A, ts));
        assert!(cal.is_open(Market::H, ts));
    }

    #[test]
    fn test_weekend_closed() {
        let cal = TradingCalendar::with_defaults();
        // 2024-01-13은 토요일, 개장 시간대라도 휴장
        assert!(!cal.is_open(Market::A, utc(2024, 1, 13, 2, 0)));
        assert!(!cal.is_open(Market::H, utc(2024, 1, 13, 2, 0)));
        assert!(!cal.is_after_close(Market::H, utc(2024, 1, 13, 10, 0)));
    }

    #[test]
    fn test_after_close_boundary() {
        let cal = TradingCalendar::with_defaults();
        // 16:00 HKT = 08:00 UTC, 마감 경계는 16:30
        assert!(!cal.is_after_close(Market::H, utc(2024, 1, 10, 8, 0)));
        // 16:30 HKT = 08:30 UTC
        assert!(cal.is_after_close(Market::H, utc(2024, 1, 10, 8, 30)));
        // A주 마감 경계 15:30 CST = 07:30 UTC
        assert!(cal.is_after_close(Market::A, utc(2024, 1, 10, 7, 30)));
    }

    #[test]
    fn test_trading_date_uses_market_tz() {
        let cal = TradingCalendar::with_defaults();
        // 18:00 UTC = 다음날 02:00 CST
        let ts = utc(2024, 1, 10, 18, 0);
        assert_eq!(
            cal.trading_date(Market::A, ts),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
        // 02:00 UTC = 같은 날 10:00 CST
        let ts = utc(2024, 1, 10, 2, 0);
        assert_eq!(
            cal.trading_date(Market::A, ts),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_previous_trading_day_skips_weekend() {
        // 2024-01-15는 월요일 → 직전 거래일은 금요일 12일
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            previous_trading_day(monday),
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
        );
        // 화요일은 전날 월요일
        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        assert_eq!(
            previous_trading_day(tuesday),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_session_window_parse() {
        let w: SessionWindow = "09:30-11:30".parse().unwrap();
        assert_eq!(w.open, t(9, 30));
        assert_eq!(w.close, t(11, 30));
        assert!("0930-1130".parse::<SessionWindow>().is_err());
    }

    #[test]
    fn test_invalid_sessions_rejected() {
        let mut a = default_a_sessions();
        a.morning = SessionWindow::new(t(11, 30), t(9, 30));
        assert!(TradingCalendar::new(a, default_h_sessions()).is_err());

        let mut h = default_h_sessions();
        h.close_boundary = t(12, 0);
        assert!(TradingCalendar::new(default_a_sessions(), h).is_err());
    }
}
