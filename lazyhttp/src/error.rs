use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::context::ContextError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A custom transport failed to obtain a response
    #[error("Transport error: {0}")]
    Transport(#[from] anyhow::Error),
    /// Error from the underlying reqwest client
    #[error("Request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The request context was cancelled or its deadline passed
    #[error(transparent)]
    Context(#[from] ContextError),
    /// The response body could not be read to the end
    #[error("error reading response body: {0}")]
    ReadBody(#[source] reqwest::Error),
    /// The response body is not the expected JSON
    #[error("error unmarshaling response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl Error {
    pub fn transport<E>(err: E) -> Self
    where
        E: 'static + Send + Sync + std::error::Error,
    {
        Error::Transport(err.into())
    }

    /// Returns a possible URL related to this error.
    pub fn url(&self) -> Option<&Url> {
        match self {
            Error::Reqwest(e) | Error::ReadBody(e) => e.url(),
            _ => None,
        }
    }

    /// Returns true if the request context was cancelled.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Context(ContextError::Canceled))
    }

    /// Returns true if the error is related to a timeout, either reqwest's own or an
    /// expired context deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Context(e) => *e == ContextError::DeadlineExceeded,
            Error::Reqwest(e) | Error::ReadBody(e) => e.is_timeout(),
            _ => false,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    /// Returns true if the error is related to connect
    pub fn is_connect(&self) -> bool {
        match self {
            Error::Reqwest(e) => e.is_connect(),
            _ => false,
        }
    }

    /// Returns true if the error came from one of the body helpers.
    pub fn is_body(&self) -> bool {
        matches!(self, Error::ReadBody(_) | Error::Decode(_))
    }

    /// Returns the status code, if the error was generated from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Reqwest(e) | Error::ReadBody(e) => e.status(),
            _ => None,
        }
    }
}
