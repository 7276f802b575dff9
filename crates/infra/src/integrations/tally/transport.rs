//! Transport seam and the bounded retry loop

use std::time::Duration;

use async_trait::async_trait;
use tallybridge_domain::{Result, TallyConfig, TallyError};
use tracing::{debug, warn};

use super::context::CallContext;
use crate::http::HttpClient;

/// Largest exponent applied to the retry delay.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Sends one XML payload and returns the raw response body.
///
/// Implementations make exactly one attempt and classify failures with
/// [`TallyError::is_retryable`]; retrying happens in [`send_with_retry`].
#[async_trait]
pub trait XmlTransport: Send + Sync {
    async fn post_xml(&self, payload: &str) -> Result<String>;

    /// URL the transport posts to, for logging.
    fn endpoint(&self) -> &str;
}

/// [`XmlTransport`] over the pooled HTTP client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: HttpClient,
    url: String,
}

impl HttpTransport {
    /// Validates `url` and builds a pooled client with `timeout` per
    /// request.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Self::with_client(http, url)
    }

    pub fn with_client(http: HttpClient, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        url::Url::parse(&url)
            .map_err(|err| TallyError::RequestFailed(format!("invalid Tally URL {url:?}: {err}")))?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl XmlTransport for HttpTransport {
    async fn post_xml(&self, payload: &str) -> Result<String> {
        self.http.post_xml(self.url.as_str(), payload).await
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Retry budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self { max_retries, retry_delay }
    }

    pub const fn from_config(config: &TallyConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the `retry`-th retry (1-based): `retry_delay * 2^(retry-1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.retry_delay.saturating_mul(1u32 << shift)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TallyConfig::default())
    }
}

/// Post `payload`, retrying connection failures and timeouts.
///
/// The context is checked before every attempt and raced against every
/// attempt and backoff sleep; once it ends the call fails with
/// [`TallyError::Timeout`] and no further attempt is made.
///
/// # Errors
/// - The first non-retryable error, unchanged
/// - [`TallyError::RetryExhausted`] after `max_retries + 1` retryable
///   failures
pub async fn send_with_retry(
    transport: &dyn XmlTransport,
    ctx: &CallContext,
    policy: &RetryPolicy,
    payload: &str,
) -> Result<String> {
    let attempts = policy.max_attempts();
    let mut last_error: Option<TallyError> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let backoff = policy.backoff(attempt);
            warn!(
                attempt = attempt + 1,
                backoff_ms = backoff.as_millis() as u64,
                error = last_error.as_ref().map(ToString::to_string).unwrap_or_default(),
                "retrying tally request"
            );
            ctx.sleep(backoff).await?;
        }

        if let Some(err) = ctx.err() {
            return Err(err);
        }

        debug!(attempt = attempt + 1, endpoint = transport.endpoint(), "sending tally request");

        match ctx.run(transport.post_xml(payload)).await {
            Ok(body) => return Ok(body),
            Err(err) if err.is_retryable() && !ctx.is_done() => {
                debug!(attempt = attempt + 1, error = %err, "tally attempt failed");
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    let last = last_error
        .unwrap_or_else(|| TallyError::ConnectionFailed("no attempt was made".to_string()));
    Err(TallyError::RetryExhausted { attempts, last: Box::new(last) })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;
    use tallybridge_domain::TallyErrorKind;
    use tokio::time::Instant;

    use super::*;

    /// Replays scripted outcomes and records when each attempt happened.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<String>>>,
        calls: AtomicU32,
        started: Instant,
        attempt_times: Mutex<Vec<Duration>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                started: Instant::now(),
                attempt_times: Mutex::new(Vec::new()),
            }
        }

        fn failing_then_ok(failures: usize) -> Self {
            let mut script: Vec<Result<String>> = (0..failures)
                .map(|i| Err(TallyError::ConnectionFailed(format!("refused #{i}"))))
                .collect();
            script.push(Ok("<ENVELOPE/>".to_string()));
            Self::new(script)
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl XmlTransport for ScriptedTransport {
        async fn post_xml(&self, _payload: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.attempt_times.lock().push(self.started.elapsed());
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TallyError::ConnectionFailed("script exhausted".into())))
        }

        fn endpoint(&self) -> &str {
            "scripted://tally"
        }
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(100))
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = policy(5);
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(800));
        assert_eq!(policy.max_attempts(), 6);
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(u32::MAX, Duration::from_secs(u64::MAX / 2));
        assert_eq!(policy.backoff(u32::MAX), Duration::MAX);
        assert_eq!(policy.max_attempts(), u32::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_k_failures_within_budget() {
        for k in 0..=3 {
            let transport = ScriptedTransport::failing_then_ok(k);
            let body = send_with_retry(&transport, &CallContext::new(), &policy(3), "<ENVELOPE/>")
                .await
                .expect("eventual success");

            assert_eq!(body, "<ENVELOPE/>");
            assert_eq!(transport.calls(), k as u32 + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_retries_plus_one_attempts() {
        let transport = ScriptedTransport::failing_then_ok(10);

        let err = send_with_retry(&transport, &CallContext::new(), &policy(2), "<ENVELOPE/>")
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 3);
        match err {
            TallyError::RetryExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert_eq!(last.kind(), TallyErrorKind::ConnectionFailed);
                assert!(last.to_string().contains("refused #2"));
            }
            other => panic!("expected retry exhaustion, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_follow_exponential_schedule() {
        let transport = ScriptedTransport::failing_then_ok(3);

        send_with_retry(&transport, &CallContext::new(), &policy(3), "<ENVELOPE/>")
            .await
            .expect("success on fourth attempt");

        let times = transport.attempt_times.lock().clone();
        let expected = [0, 100, 300, 700].map(Duration::from_millis);
        assert_eq!(times.len(), expected.len());
        for (actual, expected) in times.iter().zip(expected) {
            assert!(
                *actual >= expected && *actual < expected + Duration::from_millis(5),
                "attempt at {actual:?}, expected {expected:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_return_immediately() {
        let transport = ScriptedTransport::new(vec![
            Err(TallyError::ResponseParseFailed("garbage".into())),
            Ok("<ENVELOPE/>".into()),
        ]);

        let err = send_with_retry(&transport, &CallContext::new(), &policy(3), "<ENVELOPE/>")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), TallyErrorKind::ResponseParseFailed);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_stops_further_attempts() {
        let transport = ScriptedTransport::failing_then_ok(5);
        let ctx = CallContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = send_with_retry(&transport, &ctx, &policy(3), "<ENVELOPE/>").await.unwrap_err();

        assert!(err.is_timeout(), "expected timeout, got {err:?}");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_context_makes_no_attempt() {
        let transport = ScriptedTransport::failing_then_ok(0);
        let ctx = CallContext::with_timeout(Duration::ZERO);

        let err = send_with_retry(&transport, &ctx, &policy(3), "<ENVELOPE/>").await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn http_transport_rejects_invalid_urls() {
        let err = HttpTransport::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind(), TallyErrorKind::RequestFailed);

        let transport = HttpTransport::new("http://localhost:9000", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:9000");
    }
}
