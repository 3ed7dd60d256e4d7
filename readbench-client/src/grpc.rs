//! A [`Storage`] implementation over the `google.storage.v2` gRPC API.

use std::io;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use http::uri::PathAndQuery;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use crate::{ClientStream, Credentials, ObjectMetadata, ObjectPath, ReadRange, Storage};

mod proto;

const USER_AGENT: &str = concat!("readbench-client/", env!("CARGO_PKG_VERSION"));

const GET_OBJECT: &str = "/google.storage.v2.Storage/GetObject";
const READ_OBJECT: &str = "/google.storage.v2.Storage/ReadObject";

/// Header used by the service to route requests to the bucket's location.
const REQUEST_PARAMS: &str = "x-goog-request-params";

/// Reads objects through the `google.storage.v2` gRPC API.
///
/// The underlying channel connects lazily on the first request, so construction never touches the
/// network.
#[derive(Debug, Clone)]
pub struct GrpcStorage {
    channel: Channel,
    credentials: Credentials,
}

impl GrpcStorage {
    /// Creates a client for the service at `endpoint`, e.g. `https://storage.googleapis.com`.
    ///
    /// TLS with the bundled web PKI roots is enabled for `https` endpoints. Must be called from
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if `endpoint` is not a valid URI or TLS cannot be configured.
    pub fn new(endpoint: &str, credentials: Credentials) -> crate::Result<Self> {
        let mut endpoint = Endpoint::from_shared(endpoint.to_owned())?.user_agent(USER_AGENT)?;
        if endpoint.uri().scheme_str() == Some("https") {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_webpki_roots())?;
        }

        Ok(Self {
            channel: endpoint.connect_lazy(),
            credentials,
        })
    }

    async fn request<T>(&self, message: T, path: &ObjectPath) -> crate::Result<tonic::Request<T>> {
        let mut request = tonic::Request::new(message);

        let params = format!("bucket={}", encode_param(&bucket_name(path)));
        request
            .metadata_mut()
            .insert(REQUEST_PARAMS, MetadataValue::try_from(params)?);

        if let Some(authorization) = self.credentials.authorization().await? {
            request
                .metadata_mut()
                .insert("authorization", MetadataValue::try_from(authorization)?);
        }

        Ok(request)
    }

    async fn ready(&self) -> crate::Result<Grpc<Channel>> {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready().await?;
        Ok(grpc)
    }
}

#[async_trait]
impl Storage for GrpcStorage {
    fn name(&self) -> &'static str {
        "grpc"
    }

    #[tracing::instrument(level = "trace", fields(%path), skip_all)]
    async fn metadata(&self, path: &ObjectPath) -> crate::Result<ObjectMetadata> {
        let message = proto::GetObjectRequest {
            bucket: bucket_name(path),
            object: path.object.clone(),
            ..Default::default()
        };
        let request = self.request(message, path).await?;

        let mut grpc = self.ready().await?;
        let response: tonic::Response<proto::Object> = grpc
            .unary(
                request,
                PathAndQuery::from_static(GET_OBJECT),
                ProstCodec::default(),
            )
            .await
            .map_err(|status| not_found(status, path))?;

        let object = response.into_inner();
        let size = u64::try_from(object.size).map_err(|_| {
            crate::Error::MalformedResponse(format!("invalid object size `{}`", object.size))
        })?;

        Ok(ObjectMetadata { size })
    }

    #[tracing::instrument(level = "trace", fields(%path, ?range), skip_all)]
    async fn read(&self, path: &ObjectPath, range: ReadRange) -> crate::Result<ClientStream> {
        let (read_offset, read_limit) = match range {
            ReadRange::Full => (0, 0),
            ReadRange::Bounded { length: 0, .. } => {
                return Ok(futures_util::stream::empty().boxed());
            }
            ReadRange::Bounded { offset, length } => (to_i64(offset)?, to_i64(length)?),
        };

        let message = proto::ReadObjectRequest {
            bucket: bucket_name(path),
            object: path.object.clone(),
            read_offset,
            read_limit,
            ..Default::default()
        };
        let request = self.request(message, path).await?;

        let mut grpc = self.ready().await?;
        let response: tonic::Response<tonic::Streaming<proto::ReadObjectResponse>> = grpc
            .server_streaming(
                request,
                PathAndQuery::from_static(READ_OBJECT),
                ProstCodec::default(),
            )
            .await
            .map_err(|status| not_found(status, path))?;

        let stream = response
            .into_inner()
            .map_ok(|message| {
                message
                    .checksummed_data
                    .map(|data| data.content)
                    .unwrap_or_default()
            })
            .map_err(io::Error::other);

        Ok(stream.boxed())
    }
}

/// Full resource name of the bucket, as the v2 API expects it.
fn bucket_name(path: &ObjectPath) -> String {
    format!("projects/_/buckets/{}", path.bucket)
}

fn encode_param(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn to_i64(value: u64) -> crate::Result<i64> {
    i64::try_from(value).map_err(|_| {
        crate::Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("range bound {value} exceeds the supported maximum"),
        ))
    })
}

fn not_found(status: tonic::Status, path: &ObjectPath) -> crate::Error {
    match status.code() {
        tonic::Code::NotFound => crate::Error::NotFound(path.to_string()),
        _ => crate::Error::Status(status),
    }
}
