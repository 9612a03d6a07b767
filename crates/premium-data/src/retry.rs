//! 재사용 가능한 한정 재시도 정책.
//!
//! 수집기와 환율 갱신이 같은 정책을 공유합니다. 호출 측이
//! 재시도 가능/불가 오류의 분류 함수를 넘기므로 호출 지점마다
//! 백오프 로직을 중복하지 않습니다.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 한정 재시도 정책 (최대 횟수 + 지수 백오프 + 지터).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 시간
    pub base_delay: Duration,
    /// 백오프 상한
    pub max_delay: Duration,
    /// 지터 적용 여부
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 새 정책을 생성합니다.
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms),
            ..Default::default()
        }
    }

    /// n번째 시도 실패 후 대기 시간을 계산합니다 (attempt는 1부터).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.max_delay);

        if !self.jitter || backoff.is_zero() {
            return backoff;
        }
        // 상한 20% 지터로 동시 재시도 몰림 완화
        let jitter_cap = (backoff.as_millis() as u64 / 5).max(1);
        let jitter = rand::thread_rng().gen_range(0..=jitter_cap);
        backoff + Duration::from_millis(jitter)
    }
}

/// 작업을 정책에 따라 재시도합니다.
///
/// `is_retryable`이 `false`를 반환하는 오류는 즉시 전파합니다.
/// 마지막 시도의 오류가 최종 결과입니다.
pub async fn with_retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    op: &str,
    is_retryable: R,
    mut f: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts || !is_retryable(&err) {
                    return Err(err);
                }
                let delay = policy.delay(attempt);
                warn!(
                    op = op,
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "재시도 대기"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (retryable={})", self.retryable)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let policy = RetryPolicy::new(3, 100);
        let calls = AtomicU32::new(0);

        let result: Result<u32, TestError> = with_retry(&policy, "test", |_| true, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(TestError { retryable: true })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempts() {
        let policy = RetryPolicy::new(3, 10);
        let calls = AtomicU32::new(0);

        let result: Result<u32, TestError> = with_retry(&policy, "test", |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError { retryable: true }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_error_not_retried() {
        let policy = RetryPolicy::new(5, 10);
        let calls = AtomicU32::new(0);

        let result: Result<u32, TestError> =
            with_retry(&policy, "test", |e: &TestError| e.retryable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { retryable: false }) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            jitter: false,
        };

        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        // 상한에서 잘림
        assert_eq!(policy.delay(3), Duration::from_millis(350));
    }
}
