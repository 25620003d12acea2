//! Retry support for [`lazyhttp`].
//!
//! [`RetryTransport`] decorates any [`lazyhttp::Transport`]: a [`RetryPredicate`] looks at each
//! response and decides whether another attempt is wanted, a [`Backoff`] built fresh for every
//! request decides whether one is allowed and how long to wait for it.
mod backoff;
mod predicate;
mod transport;

pub use retry_policies::policies;

pub use backoff::{Backoff, BackoffFactory, LimitedTriesBackoff, NoopBackoff, PolicyBackoff};
pub use predicate::{
    is_transient_status, NeverRetry, RetryOnStatus, RetryPredicate, TransientStatus,
};
pub use transport::{RetryTransport, RetryTransportBuilder};
