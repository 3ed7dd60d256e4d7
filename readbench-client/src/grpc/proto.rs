//! Message definitions for the parts of `google.storage.v2` used by [`GrpcStorage`].
//!
//! Field tags match `google/storage/v2/storage.proto`. Fields we never read or set are omitted,
//! which protobuf decoding tolerates.
//!
//! [`GrpcStorage`]: super::GrpcStorage

/// Request message for `GetObject`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct GetObjectRequest {
    /// Name of the bucket in which the object resides, as `projects/_/buckets/{bucket}`.
    #[prost(string, tag = "1")]
    pub bucket: String,
    /// Name of the object.
    #[prost(string, tag = "2")]
    pub object: String,
    /// If present, selects a specific revision of this object.
    #[prost(int64, tag = "3")]
    pub generation: i64,
}

/// Request message for `ReadObject`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadObjectRequest {
    /// The name of the bucket containing the object to read.
    #[prost(string, tag = "1")]
    pub bucket: String,
    /// The name of the object to read.
    #[prost(string, tag = "2")]
    pub object: String,
    /// If present, selects a specific revision of this object.
    #[prost(int64, tag = "3")]
    pub generation: i64,
    /// The offset for the first byte to return in the read.
    #[prost(int64, tag = "4")]
    pub read_offset: i64,
    /// The maximum number of bytes to return. `0` means no limit.
    #[prost(int64, tag = "5")]
    pub read_limit: i64,
}

/// Response message for `ReadObject`, one per streamed chunk.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadObjectResponse {
    /// A portion of the data for the object.
    #[prost(message, optional, tag = "1")]
    pub checksummed_data: Option<ChecksummedData>,
    /// Metadata of the object, only sent in the first response.
    #[prost(message, optional, tag = "4")]
    pub metadata: Option<Object>,
}

/// Message used to convey content being read or written, along with an optional checksum.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ChecksummedData {
    /// The data.
    #[prost(bytes = "bytes", tag = "1")]
    pub content: bytes::Bytes,
    /// CRC32C digest of the content.
    #[prost(fixed32, optional, tag = "2")]
    pub crc32c: Option<u32>,
}

/// An object.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Object {
    /// The name of this object.
    #[prost(string, tag = "1")]
    pub name: String,
    /// The name of the bucket containing this object.
    #[prost(string, tag = "2")]
    pub bucket: String,
    /// The content generation of this object.
    #[prost(int64, tag = "3")]
    pub generation: i64,
    /// Content-Length of the object data in bytes.
    #[prost(int64, tag = "6")]
    pub size: i64,
}
