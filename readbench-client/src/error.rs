/// Errors that can happen within the readbench-client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any error emitted from the underlying [`reqwest`] client.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// A non-OK status returned by the gRPC API.
    #[error(transparent)]
    Status(#[from] tonic::Status),
    /// Errors establishing or configuring the gRPC channel.
    #[error(transparent)]
    Transport(#[from] tonic::transport::Error),
    /// A request header that cannot be sent as gRPC metadata.
    #[error(transparent)]
    InvalidMetadata(#[from] tonic::metadata::errors::InvalidMetadataValue),
    /// IO errors related to payload streaming.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Errors loading credentials or minting access tokens.
    #[error(transparent)]
    Auth(#[from] gcp_auth::Error),
    /// Errors decoding JSON responses.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Error when URL manipulation fails.
    #[error("invalid url: {message}")]
    InvalidUrl {
        /// The URL error message.
        message: String,
    },
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// The service returned a response that could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl {
            message: err.to_string(),
        }
    }
}

/// A convenience alias that defaults our [`Error`] type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
