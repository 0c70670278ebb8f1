//! Error types surfaced by the load pipeline.
//!
//! Errors are `Clone` on purpose: single-flight shares one load outcome
//! with every concurrent caller, so failure sources are kept behind an
//! `Arc`. Peer-side failures (`PeerTransport`, `MissingPeerValue`) are
//! normally swallowed by the orchestrator's local-load fallback and only
//! reach callers through peer getters used directly.

use std::sync::Arc;
use thiserror::Error;

use crate::peer::DynError;

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures a [`Group::get`](crate::Group::get) caller can observe.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The local loader failed for the requested key.
    #[error("local loader failed: {0}")]
    Loader(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// The peer answered but its response carried no value field.
    #[error("peer response missing value field")]
    MissingPeerValue,

    /// The fetch from the owning peer failed at the transport level.
    #[error("peer fetch failed: {0}")]
    PeerTransport(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Wraps a local-loader failure.
    pub(crate) fn loader(source: DynError) -> Self {
        Error::Loader(Arc::from(source))
    }

    /// Wraps a peer transport failure.
    pub(crate) fn transport(source: DynError) -> Self {
        Error::PeerTransport(Arc::from(source))
    }
}
