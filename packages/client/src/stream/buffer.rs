//! Request body buffers.

use bytes::Bytes;

/// A request body chunk handed to [`send_data`](super::StreamHandle::send_data).
///
/// `Owned` buffers are copied out of the caller's allocation; `Shared`
/// buffers are zero-copy and the caller guarantees the bytes stay valid and
/// unmodified until the exchange observes its completion signal (`Bytes`
/// makes that guarantee structural).
#[derive(Debug, Clone)]
pub enum DataBuffer {
    Owned(Vec<u8>),
    Shared(Bytes),
}

impl DataBuffer {
    /// Number of addressable bytes; `send_data` lengths must satisfy
    /// `0 <= length <= capacity()`.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match self {
            DataBuffer::Owned(v) => v.len(),
            DataBuffer::Shared(b) => b.len(),
        }
    }

    /// Returns the first `length` bytes as a cheap `Bytes` handle.
    ///
    /// Callers must have checked `length <= capacity()`.
    pub(crate) fn slice_to(&self, length: usize) -> Bytes {
        match self {
            DataBuffer::Owned(v) => Bytes::copy_from_slice(&v[..length]),
            DataBuffer::Shared(b) => b.slice(..length),
        }
    }
}

impl From<Vec<u8>> for DataBuffer {
    fn from(v: Vec<u8>) -> Self {
        DataBuffer::Owned(v)
    }
}

impl From<&[u8]> for DataBuffer {
    fn from(v: &[u8]) -> Self {
        DataBuffer::Owned(v.to_vec())
    }
}

impl From<Bytes> for DataBuffer {
    fn from(b: Bytes) -> Self {
        DataBuffer::Shared(b)
    }
}
