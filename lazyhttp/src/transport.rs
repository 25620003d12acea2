use http::Extensions;
use reqwest::{Client, Request, Response};
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};

/// A `Transport` sends one request and obtains one response, without interpreting redirects,
/// authentication, cookies or status codes.
///
/// [`HttpClient`] hands every request to its transport. The default transport is the pooled
/// [`reqwest::Client`]; decorators such as a retrying transport wrap another `Transport` and
/// implement the trait themselves, so they can be stacked.
///
/// # Example
///
/// ```
/// use http::Extensions;
/// use reqwest::{Request, Response};
/// use lazyhttp::{Result, Transport};
///
/// struct LoggingTransport<T>(T);
///
/// #[async_trait::async_trait]
/// impl<T: Transport> Transport for LoggingTransport<T> {
///     async fn round_trip(&self, req: Request, extensions: &mut Extensions) -> Result<Response> {
///         println!("Request started {:?}", req);
///         let res = self.0.round_trip(req, extensions).await;
///         println!("Result: {:?}", res);
///         res
///     }
/// }
/// ```
///
/// [`HttpClient`]: crate::HttpClient
#[async_trait::async_trait]
pub trait Transport: 'static + Send + Sync {
    /// Executes a single HTTP transaction.
    ///
    /// An `Err` is reserved for failing to obtain a response at all; any response, whatever
    /// its status, is an `Ok`. Implementations must not modify the request beyond consuming
    /// it, and must drop every response they do not return.
    ///
    /// `extensions` carries per-request values, such as the [`Context`], down the stack.
    async fn round_trip(&self, req: Request, extensions: &mut Extensions) -> Result<Response>;
}

/// The default transport. Honours a [`Context`] found in `extensions` while the request is in
/// flight.
#[async_trait::async_trait]
impl Transport for Client {
    async fn round_trip(&self, req: Request, extensions: &mut Extensions) -> Result<Response> {
        match extensions.get::<Context>().cloned() {
            Some(ctx) => tokio::select! {
                biased;
                err = ctx.done() => Err(Error::from(err)),
                res = self.execute(req) => res.map_err(Error::from),
            },
            None => self.execute(req).await.map_err(Error::from),
        }
    }
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn round_trip(&self, req: Request, extensions: &mut Extensions) -> Result<Response> {
        (**self).round_trip(req, extensions).await
    }
}
