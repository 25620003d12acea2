use http::Extensions;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Body, Client, Method, Request, Response, Url};
use std::fmt::{self, Display};
use std::sync::Arc;

#[cfg(any(feature = "query", feature = "form", feature = "json"))]
use serde::Serialize;

#[cfg(feature = "multipart")]
use reqwest::multipart;

use crate::context::Context;
use crate::error::Result;
use crate::transport::Transport;

/// A `ClientBuilder` is used to build a [`HttpClient`].
///
/// ```
/// use lazyhttp::ClientBuilder;
/// use reqwest::Url;
///
/// let client = ClientBuilder::default()
///     .with_host(Url::parse("http://localhost:8080").unwrap())
///     .build();
/// ```
///
/// [`HttpClient`]: crate::HttpClient
pub struct ClientBuilder {
    client: Client,
    transport: Option<Arc<dyn Transport>>,
    host: Option<Url>,
}

impl ClientBuilder {
    /// The given client builds requests and, unless [`with_transport`] is used, sends them.
    ///
    /// [`with_transport`]: Self::with_transport
    pub fn new(client: Client) -> Self {
        ClientBuilder {
            client,
            transport: None,
            host: None,
        }
    }

    /// This method allows creating a ClientBuilder
    /// from an existing HttpClient instance
    pub fn from_client(client: HttpClient) -> Self {
        Self {
            client: client.inner,
            transport: Some(client.transport),
            host: client.host,
        }
    }

    /// Resolve every request URL against `host`.
    ///
    /// Relative references such as `/some/path/` end up on the host, absolute URLs are left
    /// untouched.
    pub fn with_host(mut self, host: Url) -> Self {
        self.host = Some(host);
        self
    }

    /// Send requests through `transport` instead of the wrapped [`reqwest::Client`].
    ///
    /// If you need to keep a reference to the transport after attaching, use
    /// [`with_arc_transport`].
    ///
    /// [`with_arc_transport`]: Self::with_arc_transport
    pub fn with_transport<T>(self, transport: T) -> Self
    where
        T: Transport,
    {
        self.with_arc_transport(Arc::new(transport))
    }

    /// Replace the transport. [`with_transport`] is more ergonomic if you don't need the `Arc`.
    ///
    /// [`with_transport`]: Self::with_transport
    pub fn with_arc_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Returns a `HttpClient` using this builder configuration.
    pub fn build(self) -> HttpClient {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(self.client.clone()),
        };
        HttpClient {
            inner: self.client,
            transport,
            host: self.host,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder::new(Client::new())
    }
}

/// `HttpClient` builds requests with a [`reqwest::Client`] and sends them through its
/// [`Transport`].
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    transport: Arc<dyn Transport>,
    host: Option<Url>,
}

impl HttpClient {
    /// See [`ClientBuilder`] for a more ergonomic way to build `HttpClient` instances.
    pub fn new<T>(client: Client, transport: T) -> Self
    where
        T: Transport,
    {
        HttpClient {
            inner: client,
            transport: Arc::new(transport),
            host: None,
        }
    }

    /// The host request URLs are resolved against, if any.
    pub fn host(&self) -> Option<&Url> {
        self.host.as_ref()
    }

    /// Start a `GET` request. See [`request`](Self::request) for how `url` is resolved.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a `POST` request. See [`request`](Self::request) for how `url` is resolved.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start a `PUT` request. See [`request`](Self::request) for how `url` is resolved.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a `PATCH` request. See [`request`](Self::request) for how `url` is resolved.
    pub fn patch<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a `DELETE` request. See [`request`](Self::request) for how `url` is resolved.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start a `HEAD` request. See [`request`](Self::request) for how `url` is resolved.
    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Start building a `Request` with the `Method` and `url`.
    ///
    /// With a bound host, `url` is joined against it: `"/users"` on `http://api.local/v1/`
    /// becomes `http://api.local/users` and `"users"` becomes `http://api.local/v1/users`.
    /// Absolute URLs keep their own host. Without a bound host `url` must be absolute.
    ///
    /// # Errors
    ///
    /// A `url` that resolves to nothing parseable surfaces as an error from `send` or `build`.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            inner: self.inner.request(method, self.resolve(url.as_ref())),
            transport: self.transport.clone(),
            host: self.host.clone(),
            extensions: Extensions::new(),
        }
    }

    /// Start building a `Request` bound to `ctx`.
    pub fn request_with_context<U: AsRef<str>>(
        &self,
        ctx: Context,
        method: Method,
        url: U,
    ) -> RequestBuilder {
        self.request(method, url).context(ctx)
    }

    /// Executes a `Request`.
    ///
    /// A `Request` can be built manually with `Request::new()` or obtained
    /// from a RequestBuilder with `RequestBuilder::build()`.
    ///
    /// You should prefer to use the `RequestBuilder` and
    /// `RequestBuilder::send()`.
    ///
    /// # Errors
    ///
    /// This method fails if the transport could not obtain a response.
    pub async fn execute(&self, req: Request) -> Result<Response> {
        let mut ext = Extensions::new();
        self.execute_with_extensions(req, &mut ext).await
    }

    /// Executes a `Request` bound to `ctx`.
    ///
    /// # Errors
    ///
    /// This method fails if the transport could not obtain a response, or if `ctx` is done
    /// before it does.
    pub async fn execute_with_context(&self, req: Request, ctx: Context) -> Result<Response> {
        let mut ext = Extensions::new();
        ext.insert(ctx);
        self.execute_with_extensions(req, &mut ext).await
    }

    /// Executes a `Request` with initial [`Extensions`].
    ///
    /// # Errors
    ///
    /// This method fails if the transport could not obtain a response.
    pub async fn execute_with_extensions(
        &self,
        req: Request,
        ext: &mut Extensions,
    ) -> Result<Response> {
        self.transport.round_trip(req, ext).await
    }

    fn resolve(&self, url: &str) -> String {
        match &self.host {
            // A reference that cannot be joined is passed on as is, reqwest reports it when
            // the request is built.
            Some(host) => host
                .join(url)
                .map(String::from)
                .unwrap_or_else(|_| url.to_owned()),
            None => url.to_owned(),
        }
    }
}

/// Create a `HttpClient` that sends through the given client.
impl From<Client> for HttpClient {
    fn from(client: Client) -> Self {
        ClientBuilder::new(client).build()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        ClientBuilder::default().build()
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // skipping transport field for now
        f.debug_struct("HttpClient")
            .field("inner", &self.inner)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

mod service {
    use std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    };

    use crate::Result;
    use http::Extensions;
    use reqwest::{Request, Response};

    use crate::HttpClient;

    type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

    // this is meant to be semi-private, same as reqwest's pending
    pub struct Pending {
        inner: BoxFuture<'static, Result<Response>>,
    }

    impl Unpin for Pending {}

    impl Future for Pending {
        type Output = Result<Response>;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            self.inner.as_mut().poll(cx)
        }
    }

    fn pending(client: &HttpClient, req: Request) -> Pending {
        let transport = client.transport.clone();
        Pending {
            inner: Box::pin(async move {
                let mut extensions = Extensions::new();
                transport.round_trip(req, &mut extensions).await
            }),
        }
    }

    impl tower_service::Service<Request> for HttpClient {
        type Response = Response;
        type Error = crate::Error;
        type Future = Pending;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request) -> Self::Future {
            pending(self, req)
        }
    }

    impl tower_service::Service<Request> for &'_ HttpClient {
        type Response = Response;
        type Error = crate::Error;
        type Future = Pending;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request) -> Self::Future {
            pending(self, req)
        }
    }
}

/// This is a wrapper around [`reqwest::RequestBuilder`] exposing the same API.
#[must_use = "RequestBuilder does nothing until you 'send' it"]
pub struct RequestBuilder {
    inner: reqwest::RequestBuilder,
    transport: Arc<dyn Transport>,
    host: Option<Url>,
    extensions: Extensions,
}

impl RequestBuilder {
    /// Assemble a builder starting from an existing `HttpClient` and a `Request`.
    pub fn from_parts(client: HttpClient, request: Request) -> RequestBuilder {
        let inner = reqwest::RequestBuilder::from_parts(client.inner, request);
        RequestBuilder {
            inner,
            transport: client.transport,
            host: client.host,
            extensions: Extensions::new(),
        }
    }

    /// Add a `Header` to this Request.
    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        RequestBuilder {
            inner: self.inner.header(key, value),
            ..self
        }
    }

    /// Add a set of Headers to the existing ones on this Request.
    ///
    /// The headers will be merged in to any already set.
    pub fn headers(self, headers: HeaderMap) -> Self {
        RequestBuilder {
            inner: self.inner.headers(headers),
            ..self
        }
    }

    /// Enable HTTP basic authentication.
    pub fn basic_auth<U, P>(self, username: U, password: Option<P>) -> Self
    where
        U: Display,
        P: Display,
    {
        RequestBuilder {
            inner: self.inner.basic_auth(username, password),
            ..self
        }
    }

    /// Enable HTTP bearer authentication.
    pub fn bearer_auth<T>(self, token: T) -> Self
    where
        T: Display,
    {
        RequestBuilder {
            inner: self.inner.bearer_auth(token),
            ..self
        }
    }

    /// Set the request body.
    ///
    /// Bodies built from bytes or strings can be replayed by a retrying transport, streaming
    /// bodies cannot.
    pub fn body<T: Into<Body>>(self, body: T) -> Self {
        RequestBuilder {
            inner: self.inner.body(body),
            ..self
        }
    }

    /// Enables a request timeout.
    ///
    /// The timeout applies to each attempt separately. Use [`context`](Self::context) with a
    /// deadline to bound the request as a whole.
    pub fn timeout(self, timeout: std::time::Duration) -> Self {
        RequestBuilder {
            inner: self.inner.timeout(timeout),
            ..self
        }
    }

    #[cfg(feature = "multipart")]
    #[cfg_attr(docsrs, doc(cfg(feature = "multipart")))]
    pub fn multipart(self, multipart: multipart::Form) -> Self {
        RequestBuilder {
            inner: self.inner.multipart(multipart),
            ..self
        }
    }

    /// Modify the query string of the URL.
    ///
    /// This method appends and does not overwrite.
    #[cfg(feature = "query")]
    #[cfg_attr(docsrs, doc(cfg(feature = "query")))]
    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        RequestBuilder {
            inner: self.inner.query(query),
            ..self
        }
    }

    /// Send a form body.
    #[cfg(feature = "form")]
    #[cfg_attr(docsrs, doc(cfg(feature = "form")))]
    pub fn form<T: Serialize + ?Sized>(self, form: &T) -> Self {
        RequestBuilder {
            inner: self.inner.form(form),
            ..self
        }
    }

    /// Send a JSON body.
    #[cfg(feature = "json")]
    #[cfg_attr(docsrs, doc(cfg(feature = "json")))]
    pub fn json<T: Serialize + ?Sized>(self, json: &T) -> Self {
        RequestBuilder {
            inner: self.inner.json(json),
            ..self
        }
    }

    /// Bind the request to a cancellation [`Context`].
    ///
    /// Transports observe the context while sending and while waiting between attempts.
    pub fn context(self, ctx: Context) -> Self {
        self.with_extension(ctx)
    }

    /// Build a `Request`, which can be inspected, modified and executed with
    /// `HttpClient::execute()`.
    pub fn build(self) -> reqwest::Result<Request> {
        self.inner.build()
    }

    /// Build a `Request`, which can be inspected, modified and executed with
    /// `HttpClient::execute()`.
    ///
    /// This is similar to [`RequestBuilder::build()`], but also returns the
    /// embedded `HttpClient`.
    pub fn build_split(self) -> (HttpClient, reqwest::Result<Request>) {
        let Self {
            inner,
            transport,
            host,
            ..
        } = self;
        let (inner, req) = inner.build_split();
        let client = HttpClient {
            inner,
            transport,
            host,
        };
        (client, req)
    }

    /// Inserts the extension into this request builder
    pub fn with_extension<T: Send + Sync + Clone + 'static>(mut self, extension: T) -> Self {
        self.extensions.insert(extension);
        self
    }

    /// Returns a mutable reference to the internal set of extensions for this request
    pub fn extensions(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Constructs the Request and sends it through the client's transport.
    ///
    /// # Errors
    ///
    /// This method fails if the request cannot be built or the transport could not obtain a
    /// response.
    pub async fn send(mut self) -> Result<Response> {
        let mut extensions = std::mem::take(self.extensions());
        let (client, req) = self.build_split();
        client.execute_with_extensions(req?, &mut extensions).await
    }

    /// Attempt to clone the RequestBuilder.
    ///
    /// `None` is returned if the RequestBuilder can not be cloned,
    /// i.e. if the request body is a stream.
    pub fn try_clone(&self) -> Option<Self> {
        self.inner.try_clone().map(|inner| RequestBuilder {
            inner,
            transport: self.transport.clone(),
            host: self.host.clone(),
            extensions: self.extensions.clone(),
        })
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // skipping transport field for now
        f.debug_struct("RequestBuilder")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
