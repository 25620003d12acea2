use std::sync::Arc;
use std::time::Duration;

use http::Extensions;
use lazyhttp::{body, Context, Error, Transport};
use lazyhttp_retry::{LimitedTriesBackoff, NoopBackoff, RetryTransport};
use reqwest::{Body, Method, Request, Response, Url};

use crate::helpers::{Attempt, ScriptedTransport};

fn request() -> Request {
    Request::new(Method::GET, Url::parse("http://127.0.0.1:1/foo").unwrap())
}

fn always(_: &Response) -> bool {
    true
}

fn limited(tries: u32) -> impl Fn() -> LimitedTriesBackoff + Send + Sync + 'static {
    move || LimitedTriesBackoff::new(Duration::from_millis(1), tries)
}

#[tokio::test]
async fn noop_backoff_sends_once_even_when_predicate_wants_more() {
    let inner = Arc::new(ScriptedTransport::new([Attempt::Status(503)]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(always)
        .with_backoff(NoopBackoff::new)
        .build();

    let res = transport
        .round_trip(request(), &mut Extensions::new())
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    assert_eq!(inner.sends(), 1);
}

#[tokio::test]
async fn limited_tries_sends_exactly_n_times_and_returns_last_response() {
    let inner = Arc::new(ScriptedTransport::new(vec![Attempt::Status(503); 10]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(always)
        .with_backoff(limited(4))
        .build();

    let res = transport
        .round_trip(request(), &mut Extensions::new())
        .await
        .expect("exhausted retries are not an error");

    assert_eq!(res.status(), 503);
    assert_eq!(inner.sends(), 4);
    assert_eq!(&body::decode_bytes(res).await.unwrap()[..], b"attempt 4");
}

#[tokio::test]
async fn predicate_false_on_first_response_returns_it_unchanged() {
    let inner = Arc::new(ScriptedTransport::new([Attempt::Status(201)]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(|res: &Response| res.status() == 503)
        .with_backoff(limited(5))
        .build();

    let res = transport
        .round_trip(request(), &mut Extensions::new())
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    assert_eq!(inner.sends(), 1);
    assert_eq!(&body::decode_bytes(res).await.unwrap()[..], b"attempt 1");
}

#[tokio::test]
async fn failure_on_first_send_is_not_retried() {
    let inner = Arc::new(ScriptedTransport::new([Attempt::Fail("connection refused")]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(always)
        .with_backoff(limited(5))
        .build();

    let err = transport
        .round_trip(request(), &mut Extensions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(err.to_string(), "Transport error: connection refused");
    assert_eq!(inner.sends(), 1);
}

#[tokio::test]
async fn failure_on_a_retry_ends_the_sequence() {
    let inner = Arc::new(ScriptedTransport::new([
        Attempt::Status(503),
        Attempt::Fail("connection reset"),
        Attempt::Status(200),
    ]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(always)
        .with_backoff(limited(5))
        .build();

    let err = transport
        .round_trip(request(), &mut Extensions::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Transport error: connection reset");
    assert_eq!(inner.sends(), 2);
}

#[tokio::test]
async fn streaming_body_is_sent_once() {
    let inner = Arc::new(ScriptedTransport::new(vec![Attempt::Status(503); 5]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(always)
        .with_backoff(limited(5))
        .build();

    let chunks = futures::stream::iter([Ok::<_, std::io::Error>("part one"), Ok("part two")]);
    let mut req = Request::new(Method::POST, Url::parse("http://127.0.0.1:1/upload").unwrap());
    *req.body_mut() = Some(Body::wrap_stream(chunks));
    assert!(req.try_clone().is_none());

    let res = transport
        .round_trip(req, &mut Extensions::new())
        .await
        .expect("a request that cannot be replayed returns its first response");

    assert_eq!(res.status(), 503);
    assert_eq!(inner.sends(), 1);
}

#[tokio::test]
async fn stops_as_soon_as_predicate_is_satisfied() {
    let inner = Arc::new(ScriptedTransport::new([
        Attempt::Status(503),
        Attempt::Status(503),
        Attempt::Status(200),
    ]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(|res: &Response| res.status() == 503)
        .with_backoff(limited(10))
        .build();

    let res = transport
        .round_trip(request(), &mut Extensions::new())
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(inner.sends(), 3);
}

#[tokio::test]
async fn cancellation_while_waiting_aborts_before_second_send() {
    let inner = Arc::new(ScriptedTransport::new([Attempt::Status(503)]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(always)
        .with_backoff(|| LimitedTriesBackoff::new(Duration::from_secs(30), 5))
        .build();

    let ctx = Context::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let mut extensions = Extensions::new();
    extensions.insert(ctx);
    let err = transport
        .round_trip(request(), &mut extensions)
        .await
        .unwrap_err();

    assert!(err.is_canceled());
    assert_eq!(inner.sends(), 1);
}

#[tokio::test]
async fn deadline_while_waiting_aborts_before_second_send() {
    let inner = Arc::new(ScriptedTransport::new([Attempt::Status(503)]));
    let transport = RetryTransport::builder()
        .with_transport(inner.clone())
        .with_predicate(always)
        .with_backoff(|| LimitedTriesBackoff::new(Duration::from_secs(30), 5))
        .build();

    let mut extensions = Extensions::new();
    extensions.insert(Context::with_timeout(Duration::from_millis(50)));
    let err = transport
        .round_trip(request(), &mut extensions)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(inner.sends(), 1);
}

#[tokio::test]
async fn retry_transports_stack() {
    let inner = Arc::new(ScriptedTransport::new(vec![Attempt::Status(503); 10]));
    let transport = RetryTransport::builder()
        .with_transport(
            RetryTransport::builder()
                .with_transport(inner.clone())
                .with_predicate(always)
                .with_backoff(limited(2))
                .build(),
        )
        .with_predicate(always)
        .with_backoff(limited(3))
        .build();

    let res = transport
        .round_trip(request(), &mut Extensions::new())
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    assert_eq!(inner.sends(), 6);
}
