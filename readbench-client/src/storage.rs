use std::fmt;
use std::io;

use bytes::Bytes;
use futures_util::stream::BoxStream;

/// The type of [`Stream`](futures_util::Stream) returned by [`Storage::read`].
///
/// Each item is a chunk of the object payload, in order. The stream ends when the requested range
/// has been delivered. An `Err` item means the read failed midway.
pub type ClientStream = BoxStream<'static, io::Result<Bytes>>;

/// A type-erased [`Storage`] instance.
pub type BoxedStorage = Box<dyn Storage>;

/// The capabilities a storage client offers to the benchmark.
///
/// Implementations are interchangeable, so the benchmark can run the same read patterns against
/// each of them without knowing which protocol is used underneath.
#[async_trait::async_trait]
pub trait Storage: fmt::Debug + Send + Sync + 'static {
    /// The client name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Looks up the metadata of the object at the given path.
    async fn metadata(&self, path: &ObjectPath) -> crate::Result<ObjectMetadata>;

    /// Opens a streaming read session over the given range of an object.
    async fn read(&self, path: &ObjectPath, range: ReadRange) -> crate::Result<ClientStream>;
}

/// The location of an object: a bucket and an object name within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    /// The bucket name, without any `projects/_/buckets/` prefix.
    pub bucket: String,
    /// The object name. May contain `/` and other reserved characters.
    pub object: String,
}

impl ObjectPath {
    /// Creates a new path from a bucket and object name.
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.object)
    }
}

/// Metadata of a stored object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// The size of the object in bytes.
    pub size: u64,
}

/// The byte range requested by a read session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadRange {
    /// The whole object.
    Full,
    /// `length` bytes starting at `offset`.
    Bounded {
        /// The first byte to read.
        offset: u64,
        /// The number of bytes to read.
        length: u64,
    },
}

impl ReadRange {
    /// Creates a bounded range of `length` bytes starting at `offset`.
    pub fn bounded(offset: u64, length: u64) -> Self {
        Self::Bounded { offset, length }
    }

    /// Renders this range as an HTTP `Range` header value, or `None` for full reads.
    ///
    /// HTTP ranges are inclusive on both ends. An empty bounded range has no representation and
    /// yields `None` as well; callers are expected to skip such reads.
    pub fn to_header_value(self) -> Option<String> {
        match self {
            Self::Full => None,
            Self::Bounded { length: 0, .. } => None,
            Self::Bounded { offset, length } => {
                Some(format!("bytes={offset}-{}", offset + length - 1))
            }
        }
    }

    /// Resolves this range against a payload of `len` bytes, returning `start..end`.
    pub fn resolve(self, len: u64) -> std::ops::Range<u64> {
        match self {
            Self::Full => 0..len,
            Self::Bounded { offset, length } => {
                let start = offset.min(len);
                let end = offset.saturating_add(length).min(len);
                start..end
            }
        }
    }
}
