//! 腾讯财经(Tencent Finance) 시세/환율 소스.
//!
//! A주/H주 실시간 시세와 HKD→CNY 환율을 같은 엔드포인트에서 가져옵니다.
//!
//! ## 응답 형식
//! - 시세: `v_sh600036="1~招商银行~600036~33.50~33.00~33.10~...";` (`~` 구분 필드)
//! - 환율: `r_hkdcny="0.9123";`
//!
//! 코드를 쉼표로 이어 붙이면 한 요청으로 여러 종목을 조회할 수 있습니다.
//!
//! ## 사용 예시
//! ```rust,ignore
//! let fetcher = TencentFetcher::new(Duration::from_secs(5));
//! let quote = fetcher.fetch_quote("600036", Market::A).await?;
//! let rate = fetcher.fetch_fx_rate("HKDCNY").await?;
//! ```

use premium_core::{full_quote_code, Market};
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// 기본 엔드포인트.
const DEFAULT_BASE_URL: &str = "https://qt.gtimg.cn/q=";

/// 시세 페이로드의 최소 필드 수 (고가/저가는 33/34번 필드).
const MIN_QUOTE_FIELDS: usize = 35;

/// Tencent 소스 에러.
#[derive(Debug, Error)]
pub enum TencentError {
    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("응답 파싱 실패: {0}")]
    Parse(String),

    #[error("데이터 없음: {code}")]
    Empty { code: String },
}

impl TencentError {
    /// 재시도 가능한 에러인지 확인합니다 (네트워크/타임아웃만).
    pub fn is_retryable(&self) -> bool {
        matches!(self, TencentError::Http(_))
    }
}

/// 소스에서 받은 시세 원본 값.
///
/// 관측 시각과 거래일은 수집기가 주기 경계와 캘린더로 채우므로
/// 여기에는 가격 필드만 담습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TencentQuote {
    /// 종목 코드 (접두사 없는 원코드)
    pub code: String,
    /// 시장 구분
    pub market: Market,
    /// 현재가
    pub current: Decimal,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 전일 종가
    pub prev_close: Decimal,
    /// 거래량
    pub volume: Option<i64>,
    /// 거래대금
    pub turnover: Option<Decimal>,
}

/// Tencent Finance 시세/환율 수집기.
pub struct TencentFetcher {
    client: Client,
    base_url: String,
}

impl TencentFetcher {
    /// 기본 엔드포인트로 생성합니다.
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// 커스텀 엔드포인트로 생성합니다 (테스트용).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .expect("HTTP 클라이언트 생성 실패");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// 단일 종목의 현재 시세를 조회합니다.
    pub async fn fetch_quote(&self, code: &str, market: Market) -> Result<TencentQuote, TencentError> {
        let url = format!("{}{}", self.base_url, full_quote_code(code, market));
        debug!(url = %url, "Fetching quote");

        let body = self.client.get(&url).send().await?.text().await?;
        let line = body
            .lines()
            .find(|l| l.contains('='))
            .ok_or_else(|| TencentError::Empty { code: code.to_string() })?;

        parse_quote_payload(line, code, market)
    }

    /// 여러 종목의 시세를 한 요청으로 조회합니다.
    ///
    /// 파싱에 실패한 행은 건너뛰므로 결과가 요청보다 적을 수 있습니다.
    /// 빠진 종목은 호출 측이 개별 조회로 보충합니다.
    pub async fn fetch_quotes(
        &self,
        requests: &[(String, Market)],
    ) -> Result<Vec<TencentQuote>, TencentError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let joined: Vec<String> = requests
            .iter()
            .map(|(code, market)| full_quote_code(code, *market))
            .collect();
        let url = format!("{}{}", self.base_url, joined.join(","));
        debug!(count = requests.len(), "Fetching quote batch");

        let body = self.client.get(&url).send().await?.text().await?;

        let mut quotes = Vec::with_capacity(requests.len());
        for line in body.lines().filter(|l| l.contains('=')) {
            let Some((code, market)) = extract_code(line) else {
                continue;
            };
            // 요청하지 않은 코드는 무시
            if !requests.iter().any(|(c, m)| *c == code && *m == market) {
                continue;
            }
            match parse_quote_payload(line, &code, market) {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    debug!(code = %code, error = %e, "Skipping malformed quote line");
                }
            }
        }

        Ok(quotes)
    }

    /// 통화쌍 환율을 조회합니다 (예: "HKDCNY").
    pub async fn fetch_fx_rate(&self, currency_pair: &str) -> Result<Decimal, TencentError> {
        let code = format!("r_{}", currency_pair.to_lowercase());
        let url = format!("{}{}", self.base_url, code);
        debug!(url = %url, "Fetching fx rate");

        let body = self.client.get(&url).send().await?.text().await?;
        parse_fx_payload(&body, currency_pair)
    }
}

/// 시세 응답 한 줄에서 변수명 부분의 종목 코드와 시장을 추출합니다.
///
/// `v_sh600036="..."` → `("600036", Market::A)`.
fn extract_code(line: &str) -> Option<(String, Market)> {
    let name = line.trim_start().strip_prefix("v_")?;
    let name = name.split('=').next()?;
    if let Some(code) = name.strip_prefix("hk") {
        return Some((code.to_string(), Market::H));
    }
    let code = name.strip_prefix("sh").or_else(|| name.strip_prefix("sz"))?;
    Some((code.to_string(), Market::A))
}

/// `~` 구분 시세 페이로드를 파싱합니다.
///
/// 필드 배치: 3=현재가, 4=전일 종가, 5=시가, 6=거래량, 33=고가, 34=저가,
/// 37=거래대금(선택).
fn parse_quote_payload(
    line: &str,
    code: &str,
    market: Market,
) -> Result<TencentQuote, TencentError> {
    let (_, payload) = line
        .split_once('=')
        .ok_or_else(|| TencentError::Parse(format!("'='가 없는 행: {}", line)))?;
    let content = payload.trim().trim_end_matches(';').trim_matches('"');
    if content.is_empty() {
        return Err(TencentError::Empty { code: code.to_string() });
    }

    let fields: Vec<&str> = content.split('~').collect();
    if fields.len() < MIN_QUOTE_FIELDS {
        return Err(TencentError::Parse(format!(
            "필드 수 부족 ({} < {}): {}",
            fields.len(),
            MIN_QUOTE_FIELDS,
            code
        )));
    }

    let decimal_field = |idx: usize, name: &str| -> Result<Decimal, TencentError> {
        fields[idx]
            .parse()
            .map_err(|_| TencentError::Parse(format!("{} 파싱 실패: {:?}", name, fields[idx])))
    };

    Ok(TencentQuote {
        code: code.to_string(),
        market,
        current: decimal_field(3, "현재가")?,
        prev_close: decimal_field(4, "전일 종가")?,
        open: decimal_field(5, "시가")?,
        volume: fields[6].parse().ok(),
        high: decimal_field(33, "고가")?,
        low: decimal_field(34, "저가")?,
        turnover: fields.get(37).and_then(|f| f.parse().ok()),
    })
}

/// 환율 페이로드를 파싱합니다. 형식: `r_hkdcny="0.9123";`
fn parse_fx_payload(data: &str, currency_pair: &str) -> Result<Decimal, TencentError> {
    let (_, payload) = data
        .split_once('=')
        .ok_or_else(|| TencentError::Parse(format!("'='가 없는 환율 응답: {}", currency_pair)))?;
    let content = payload.trim().trim_end_matches(';').trim_matches('"');
    if content.is_empty() {
        return Err(TencentError::Empty {
            code: currency_pair.to_string(),
        });
    }

    content
        .parse()
        .map_err(|_| TencentError::Parse(format!("환율 파싱 실패: {:?}", content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// 실제 응답과 같은 배치의 테스트 페이로드를 만듭니다.
    fn quote_line(prefix: &str, code: &str, current: &str, prev: &str, open: &str) -> String {
        let mut fields = vec!["1".to_string(), "测试".to_string(), code.to_string()];
        fields.push(current.to_string()); // 3: 현재가
        fields.push(prev.to_string()); // 4: 전일 종가
        fields.push(open.to_string()); // 5: 시가
        fields.push("123456".to_string()); // 6: 거래량
        for _ in 7..33 {
            fields.push("0".to_string());
        }
        fields.push("34.00".to_string()); // 33: 고가
        fields.push("32.50".to_string()); // 34: 저가
        fields.push("0".to_string()); // 35
        fields.push("0".to_string()); // 36
        fields.push("412345.67".to_string()); // 37: 거래대금
        format!("v_{}{}=\"{}\";", prefix, code, fields.join("~"))
    }

    #[test]
    fn test_parse_quote_payload() {
        let line = quote_line("sh", "600036", "33.50", "33.00", "33.10");
        let quote = parse_quote_payload(&line, "600036", Market::A).unwrap();

        assert_eq!(quote.current, dec!(33.50));
        assert_eq!(quote.prev_close, dec!(33.00));
        assert_eq!(quote.open, dec!(33.10));
        assert_eq!(quote.high, dec!(34.00));
        assert_eq!(quote.low, dec!(32.50));
        assert_eq!(quote.volume, Some(123456));
        assert_eq!(quote.turnover, Some(dec!(412345.67)));
    }

    #[test]
    fn test_parse_rejects_short_payload() {
        let line = "v_sh600036=\"1~测试~600036~33.50\";";
        assert!(matches!(
            parse_quote_payload(line, "600036", Market::A),
            Err(TencentError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_payload() {
        let line = "v_sh600036=\"\";";
        assert!(matches!(
            parse_quote_payload(line, "600036", Market::A),
            Err(TencentError::Empty { .. })
        ));
    }

    #[test]
    fn test_extract_code() {
        assert_eq!(
            extract_code("v_sh600036=\"...\""),
            Some(("600036".to_string(), Market::A))
        );
        assert_eq!(
            extract_code("v_hk03968=\"...\""),
            Some(("03968".to_string(), Market::H))
        );
        assert_eq!(extract_code("r_hkdcny=\"0.9\""), None);
    }

    #[test]
    fn test_parse_fx_payload() {
        assert_eq!(
            parse_fx_payload("r_hkdcny=\"0.9123\";", "HKDCNY").unwrap(),
            dec!(0.9123)
        );
        assert!(parse_fx_payload("r_hkdcny=\"\";", "HKDCNY").is_err());
        assert!(parse_fx_payload("garbage", "HKDCNY").is_err());
    }

    #[tokio::test]
    async fn test_fetch_quote_via_mock() {
        let mut server = mockito::Server::new_async().await;
        let body = quote_line("sh", "600036", "33.50", "33.00", "33.10");
        let mock = server
            .mock("GET", "/q=sh600036")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let fetcher = TencentFetcher::with_base_url(
            format!("{}/q=", server.url()),
            Duration::from_secs(5),
        );
        let quote = fetcher.fetch_quote("600036", Market::A).await.unwrap();

        assert_eq!(quote.code, "600036");
        assert_eq!(quote.current, dec!(33.50));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_quotes_batch_skips_bad_lines() {
        let mut server = mockito::Server::new_async().await;
        let good = quote_line("sh", "600036", "33.50", "33.00", "33.10");
        let bad = "v_hk03968=\"1~招商银行~03968\";".to_string();
        let mock = server
            .mock("GET", "/q=sh600036,hk03968")
            .with_status(200)
            .with_body(format!("{}\n{}", good, bad))
            .create_async()
            .await;

        let fetcher = TencentFetcher::with_base_url(
            format!("{}/q=", server.url()),
            Duration::from_secs(5),
        );
        let quotes = fetcher
            .fetch_quotes(&[
                ("600036".to_string(), Market::A),
                ("03968".to_string(), Market::H),
            ])
            .await
            .unwrap();

        // 손상된 H주 행은 건너뛰고 A주만 반환
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].code, "600036");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_fx_rate_via_mock() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/q=r_hkdcny")
            .with_status(200)
            .with_body("r_hkdcny=\"0.9123\";")
            .create_async()
            .await;

        let fetcher = TencentFetcher::with_base_url(
            format!("{}/q=", server.url()),
            Duration::from_secs(5),
        );
        let rate = fetcher.fetch_fx_rate("HKDCNY").await.unwrap();

        assert_eq!(rate, dec!(0.9123));
        mock.assert_async().await;
    }
}
