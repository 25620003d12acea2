//! Helpers that consume a [`Response`] body.
//!
//! Every helper takes the response by value, so the body is closed once the helper returns,
//! whether it succeeded or not. None of them limit how much is read; check
//! [`Response::content_length`] first, or stream with [`Response::chunk`], if the peer is
//! not trusted.

use bytes::Bytes;
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Reads the body to the end and throws it away.
///
/// Use this when a response is not otherwise consumed, so the underlying connection can go
/// back to the pool.
pub async fn discard(mut response: Response) {
    loop {
        match response.chunk().await {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(error) => {
                tracing::debug!(%error, "failed to drain response body");
                break;
            }
        }
    }
}

/// Reads the whole body into memory.
pub async fn decode_bytes(response: Response) -> Result<Bytes> {
    response.bytes().await.map_err(Error::ReadBody)
}

/// Reads the whole body and deserializes it as JSON.
///
/// ```no_run
/// # async fn run() -> lazyhttp::Result<()> {
/// #[derive(serde::Deserialize)]
/// struct Reply {
///     value: String,
/// }
///
/// let client = lazyhttp::HttpClient::default();
/// let res = client.get("http://localhost:8080/value").send().await?;
/// let reply: Reply = lazyhttp::body::decode_json(res).await?;
/// println!("{}", reply.value);
/// # Ok(())
/// # }
/// ```
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = decode_bytes(response).await?;
    serde_json::from_slice(&bytes).map_err(Error::Decode)
}
