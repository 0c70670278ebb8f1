//! Collaborator contracts: the local loader and the peer fetch path.
//!
//! The orchestrator is generic over three seams:
//!
//! - [`Getter`]: the authoritative local source a node loads owned keys
//!   from. Called at most once concurrently per key.
//! - [`PeerPicker`]: routes a key to the peer that owns it, or reports
//!   that this node is the owner. [`PeerPool`](crate::PeerPool)
//!   implements this over a mutex-guarded [`HashRing`](crate::HashRing)
//!   compared against the local identity.
//! - [`PeerGetter`]: a handle that fetches a value from one remote peer.
//!
//! The request/response envelopes mirror the established groupcache wire
//! contract (`{group, key}` in, `{value, minute_qps}` out); transports
//! serve them under [`DEFAULT_BASE_PATH`] as `GET <base>/<group>/<key>`.
//! Encoding and connection handling belong to the transport crate, not
//! here.

use crate::bytes::ByteView;
use core::fmt;
use std::sync::Arc;

/// Default URL prefix peers serve the fetch endpoint under, kept
/// byte-compatible with existing groupcache deployments.
pub const DEFAULT_BASE_PATH: &str = "/_groupcache/";

/// Boxed error type collaborators hand back across the seams.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The authoritative local value source.
///
/// Single-flight guarantees at most one concurrent call per key. The
/// returned view is taken by the orchestrator; implementations must not
/// retain it.
pub trait Getter: Send + Sync {
    /// Loads the value for `key` from the authoritative source.
    fn get(&self, key: &[u8]) -> Result<ByteView, DynError>;
}

/// Any matching closure is a [`Getter`].
///
/// ```
/// use peercache::{ByteView, DynError, Getter};
///
/// let loader = |key: &[u8]| -> Result<ByteView, DynError> {
///     Ok(ByteView::copy_from_slice(key))
/// };
/// assert_eq!(loader.get(b"echo").unwrap().as_slice(), b"echo");
/// ```
impl<F> Getter for F
where
    F: Fn(&[u8]) -> Result<ByteView, DynError> + Send + Sync,
{
    fn get(&self, key: &[u8]) -> Result<ByteView, DynError> {
        self(key)
    }
}

/// Fetch request sent to the peer owning a key.
#[derive(Debug, Clone, Copy)]
pub struct PeerRequest<'a> {
    /// Group name; doubles as the path segment on the wire.
    pub group: &'a str,
    /// The requested key.
    pub key: &'a [u8],
}

/// A peer's answer to a [`PeerRequest`].
#[derive(Debug, Clone, Default)]
pub struct PeerResponse {
    /// The value bytes. Absent on the wire means the peer violated the
    /// contract and is reported as [`Error::MissingPeerValue`](crate::Error).
    pub value: Option<Vec<u8>>,
    /// The peer's per-minute request rate for this key. Unused by the
    /// core; carried for wire compatibility.
    pub minute_qps: f64,
}

/// A handle capable of fetching values from one specific peer.
pub trait PeerGetter: Send + Sync {
    /// Identity of the peer, in URL form (e.g. `http://host:port`).
    /// Identities compare by byte content.
    fn name(&self) -> &str;

    /// Fetches `request.key` from this peer.
    fn get(&self, request: &PeerRequest<'_>) -> Result<PeerResponse, DynError>;
}

/// Routes keys to their owning peer.
pub trait PeerPicker: Send + Sync {
    /// Returns a getter for the peer owning `key`, or `None` when this
    /// node is the owner and must load locally.
    fn pick_peer(&self, key: &[u8]) -> Option<Arc<dyn PeerGetter>>;
}

/// A picker for nodes running without a peer group: every key is owned
/// locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPeers;

impl PeerPicker for NoPeers {
    fn pick_peer(&self, _key: &[u8]) -> Option<Arc<dyn PeerGetter>> {
        None
    }
}

impl fmt::Display for PeerRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.group,
            String::from_utf8_lossy(self.key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_getter() {
        let loader = |key: &[u8]| -> Result<ByteView, DynError> {
            if key == b"missing" {
                Err("no such key".into())
            } else {
                Ok(ByteView::copy_from_slice(key))
            }
        };

        assert_eq!(loader.get(b"k").unwrap().as_slice(), b"k");
        assert!(loader.get(b"missing").is_err());
    }

    #[test]
    fn test_no_peers_owns_everything() {
        let picker = NoPeers;
        assert!(picker.pick_peer(b"any").is_none());
        assert!(picker.pick_peer(b"").is_none());
    }

    #[test]
    fn test_request_display() {
        let request = PeerRequest {
            group: "g1",
            key: b"user:42",
        };
        assert_eq!(request.to_string(), "g1/user:42");
    }
}
