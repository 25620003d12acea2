//! `RetryTransport` resends requests whose responses a predicate deems worth retrying.

use http::Extensions;
use lazyhttp::{Context, Error, Result, Transport};
use reqwest::{Client, Request, Response};

use crate::backoff::{BackoffFactory, NoopBackoff};
use crate::predicate::{NeverRetry, RetryPredicate};

/// `RetryTransport` wraps another [`Transport`] and sends a request again for as long as its
/// [`RetryPredicate`] asks for it and the [`Backoff`](crate::Backoff) of the current sequence
/// allows it.
///
/// Retries are driven by responses only. A send that fails to produce a response ends the
/// call with that error, whichever attempt it was. When the backoff runs out while the
/// predicate still wants a retry, the last response is returned as a success; inspect it to
/// tell "gave up" apart from "succeeded".
///
/// Waits between attempts are cut short by the request's [`Context`], if one was attached.
///
///```rust
///     use std::time::Duration;
///     use http::StatusCode;
///     use lazyhttp::ClientBuilder;
///     use lazyhttp_retry::{LimitedTriesBackoff, RetryOnStatus, RetryTransport};
///
///     let transport = RetryTransport::builder()
///         .with_predicate(RetryOnStatus::new([StatusCode::SERVICE_UNAVAILABLE]))
///         .with_backoff(|| LimitedTriesBackoff::new(Duration::from_millis(100), 5))
///         .build();
///
///     let client = ClientBuilder::default().with_transport(transport).build();
///```
///
/// Only requests that can be cloned are retried. A request with a streaming body is sent
/// once and its response returned as is.
pub struct RetryTransport<T = Client> {
    inner: T,
    predicate: Box<dyn RetryPredicate>,
    backoff: Box<dyn BackoffFactory>,
}

impl RetryTransport<Client> {
    /// Starts from a fresh [`reqwest::Client`] that never retries.
    pub fn builder() -> RetryTransportBuilder<Client> {
        RetryTransportBuilder {
            inner: Client::new(),
            predicate: Box::new(NeverRetry),
            backoff: Box::new(NoopBackoff::new),
        }
    }
}

impl Default for RetryTransport<Client> {
    fn default() -> Self {
        RetryTransport::builder().build()
    }
}

impl<T> RetryTransport<T> {
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RetryTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryTransport")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Configures a [`RetryTransport`]. Every setting is independent of the others.
pub struct RetryTransportBuilder<T> {
    inner: T,
    predicate: Box<dyn RetryPredicate>,
    backoff: Box<dyn BackoffFactory>,
}

impl<T: Transport> RetryTransportBuilder<T> {
    /// Send attempts through `inner` instead.
    pub fn with_transport<U: Transport>(self, inner: U) -> RetryTransportBuilder<U> {
        RetryTransportBuilder {
            inner,
            predicate: self.predicate,
            backoff: self.backoff,
        }
    }

    pub fn with_predicate<P: RetryPredicate>(mut self, predicate: P) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    /// Called once per request to pace that request's attempts.
    pub fn with_backoff<F: BackoffFactory>(mut self, factory: F) -> Self {
        self.backoff = Box::new(factory);
        self
    }

    pub fn build(self) -> RetryTransport<T> {
        RetryTransport {
            inner: self.inner,
            predicate: self.predicate,
            backoff: self.backoff,
        }
    }
}

#[async_trait::async_trait]
impl<T: Transport> Transport for RetryTransport<T> {
    async fn round_trip(&self, req: Request, extensions: &mut Extensions) -> Result<Response> {
        // Cloning the request object before-the-fact is not ideal..
        // However, if the body of the request is not static, e.g of type `Bytes`,
        // the Clone operation should be of constant complexity and not O(N)
        // since the byte abstraction is a shared pointer over a buffer.
        let mut replay = req.try_clone();
        let mut res = self.inner.round_trip(req, extensions).await?;

        let mut backoff = self.backoff.backoff();
        let mut n_past_retries: u32 = 0;

        while self.predicate.should_retry(&res) {
            let Some(wait) = backoff.next_backoff() else {
                tracing::debug!(
                    attempts = n_past_retries + 1,
                    status = %res.status(),
                    "Backoff exhausted, returning the last response"
                );
                return Ok(res);
            };
            let Some(req) = replay.take() else {
                tracing::warn!(
                    status = %res.status(),
                    "Request object is not clonable. Are you passing a streaming body? Not retrying"
                );
                return Ok(res);
            };

            // The superseded response is closed before the next attempt goes out.
            drop(res);

            n_past_retries += 1;
            tracing::warn!(
                "Retry attempt #{}. Sleeping {:?} before the next attempt",
                n_past_retries,
                wait
            );
            match extensions.get::<Context>().cloned() {
                Some(ctx) => tokio::select! {
                    biased;
                    err = ctx.done() => return Err(Error::from(err)),
                    _ = tokio::time::sleep(wait) => {}
                },
                None => tokio::time::sleep(wait).await,
            }

            replay = req.try_clone();
            res = self.inner.round_trip(req, extensions).await?;
        }

        Ok(res)
    }
}
