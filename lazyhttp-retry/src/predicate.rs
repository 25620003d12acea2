use http::StatusCode;
use reqwest::Response;

/// Decides, from a response alone, whether the request should be sent again.
///
/// A [`RetryPredicate`] only looks at responses. Requests that fail to produce a response at
/// all are never retried by [`RetryTransport`](crate::RetryTransport).
///
/// Any `Fn(&Response) -> bool` is a predicate:
///
/// ```
/// use std::time::Duration;
/// use http::StatusCode;
/// use lazyhttp_retry::{LimitedTriesBackoff, RetryTransport};
///
/// // Retry while the server answers 503, at most 5 attempts 25ms apart.
/// let transport = RetryTransport::builder()
///     .with_predicate(|res: &reqwest::Response| res.status() == StatusCode::SERVICE_UNAVAILABLE)
///     .with_backoff(|| LimitedTriesBackoff::new(Duration::from_millis(25), 5))
///     .build();
/// ```
pub trait RetryPredicate: Send + Sync + 'static {
    fn should_retry(&self, res: &Response) -> bool;
}

impl<F> RetryPredicate for F
where
    F: Fn(&Response) -> bool + Send + Sync + 'static,
{
    fn should_retry(&self, res: &Response) -> bool {
        self(res)
    }
}

/// The default [`RetryPredicate`] for [`RetryTransport`](crate::RetryTransport): nothing is
/// retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn should_retry(&self, _res: &Response) -> bool {
        false
    }
}

/// Retries whenever the response status is one of the given codes.
#[derive(Debug, Clone)]
pub struct RetryOnStatus {
    statuses: Vec<StatusCode>,
}

impl RetryOnStatus {
    pub fn new(statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        RetryOnStatus {
            statuses: statuses.into_iter().collect(),
        }
    }
}

impl RetryPredicate for RetryOnStatus {
    fn should_retry(&self, res: &Response) -> bool {
        self.statuses.contains(&res.status())
    }
}

/// Retries responses whose status says the failure might resolve by itself, see
/// [`is_transient_status`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientStatus;

impl RetryPredicate for TransientStatus {
    fn should_retry(&self, res: &Response) -> bool {
        is_transient_status(res.status())
    }
}

/// Will only report transient if:
/// * The status was 5XX (server error)
/// * The status was 408 (request timeout) or 429 (too many requests)
pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}
