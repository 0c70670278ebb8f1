//! Immutable byte-string handles.
//!
//! [`ByteView`] is the currency of the whole crate: cache keys, cache
//! values, ring member names and single-flight results are all byte views.
//! A view is either a borrow of program-static memory or a shared,
//! reference-counted heap buffer; cloning either variant is cheap and never
//! copies the contents.
//!
//! | Variant | Backing | Clone cost |
//! |---------|---------|------------|
//! | static  | `&'static [u8]` | pointer copy |
//! | shared  | `Arc<[u8]>` | atomic increment |
//!
//! Views compare and hash by content, so a `ByteView` built from a static
//! string and one built from an owned buffer with the same bytes are equal
//! and collide in a map. `Borrow<[u8]>` lets keyed maps be probed with a
//! plain slice without constructing a view.
//!
//! # Thread Safety
//!
//! Clone and drop are thread-safe (the shared arm uses an atomic
//! refcount). The contents are immutable, so a view can cross thread
//! boundaries freely; it is not a synchronization primitive.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable, cheaply clonable byte string.
///
/// # Examples
///
/// ```
/// use peercache::ByteView;
///
/// let a = ByteView::from_static(b"hello");
/// let b = ByteView::from(b"hello".to_vec());
///
/// // Equality is by content, not by backing storage.
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 5);
///
/// // Clones share storage.
/// let c = b.clone();
/// assert_eq!(c.as_slice(), b.as_slice());
/// ```
#[derive(Clone)]
pub struct ByteView {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    /// Borrowed view into program-static memory. Dropping it is a no-op.
    Static(&'static [u8]),
    /// Shared ownership of a heap buffer. The buffer is freed when the
    /// last clone is dropped.
    Shared(Arc<[u8]>),
}

impl ByteView {
    /// Creates a non-owning view of static memory.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        ByteView {
            inner: Inner::Static(bytes),
        }
    }

    /// Creates an owning view by copying `bytes` into a fresh shared
    /// buffer.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        ByteView {
            inner: Inner::Shared(Arc::from(bytes)),
        }
    }

    /// Returns the number of bytes in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Returns the underlying bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match &self.inner {
            Inner::Static(bytes) => bytes,
            Inner::Shared(bytes) => bytes,
        }
    }

    /// Copies the contents into a freshly allocated `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Number of live handles sharing the heap buffer, or `None` for a
    /// static view. Only visible to unit tests.
    #[cfg(test)]
    fn shared_refs(&self) -> Option<usize> {
        match &self.inner {
            Inner::Static(_) => None,
            Inner::Shared(bytes) => Some(Arc::strong_count(bytes)),
        }
    }
}

impl Default for ByteView {
    /// An empty static view.
    fn default() -> Self {
        ByteView::from_static(b"")
    }
}

impl From<Vec<u8>> for ByteView {
    /// Takes ownership of `bytes` as a shared buffer.
    fn from(bytes: Vec<u8>) -> Self {
        ByteView {
            inner: Inner::Shared(Arc::from(bytes)),
        }
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        ByteView::from(s.into_bytes())
    }
}

impl From<&'static str> for ByteView {
    fn from(s: &'static str) -> Self {
        ByteView::from_static(s.as_bytes())
    }
}

impl AsRef<[u8]> for ByteView {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Borrow<[u8]> for ByteView {
    #[inline]
    fn borrow(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for ByteView {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for ByteView {}

impl PartialEq<[u8]> for ByteView {
    #[inline]
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl PartialEq<str> for ByteView {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl Hash for ByteView {
    /// Hashes the content only, matching the `Hash` impl of `[u8]` so the
    /// `Borrow<[u8]>` contract holds for slice lookups.
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({:?})", String::from_utf8_lossy(self.as_slice()))
    }
}
