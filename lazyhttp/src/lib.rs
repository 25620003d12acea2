//! This crate provides [`HttpClient`], a thin wrapper around [`reqwest::Client`] that sends
//! every request through a pluggable [`Transport`].
//!
//! You'll want to instantiate [`HttpClient`] using [`ClientBuilder`], optionally bind it to a
//! host and swap in your own transport, and from then on sending requests is the same as with
//! reqwest. Requests can be bound to a [`Context`] to cancel them or give them a deadline, and
//! the [`body`] helpers consume what comes back:
//!
//! ```no_run
//! use std::time::Duration;
//! use lazyhttp::{ClientBuilder, Context};
//! use reqwest::Url;
//!
//! #[derive(serde::Deserialize)]
//! struct Reply {
//!     value: String,
//! }
//!
//! async fn run() -> lazyhttp::Result<()> {
//!     let client = ClientBuilder::default()
//!         .with_host(Url::parse("http://localhost:8080").unwrap())
//!         .build();
//!     let res = client
//!         .get("/some/path/")
//!         .context(Context::with_timeout(Duration::from_secs(5)))
//!         .send()
//!         .await?;
//!     let reply: Reply = lazyhttp::body::decode_json(res).await?;
//!     println!("{}", reply.value);
//!     Ok(())
//! }
//! ```
//!
//! Retrying transports live in the `lazyhttp-retry` crate.
pub mod body;
mod client;
mod context;
mod error;
mod transport;

pub use client::{ClientBuilder, HttpClient, RequestBuilder};
pub use context::{Context, ContextError};
pub use error::{Error, Result};
pub use transport::Transport;
