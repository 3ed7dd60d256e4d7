//! A [`Storage`] implementation over the JSON API.

use std::io;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::{StatusCode, header};
use serde::Deserialize;
use url::Url;

use crate::{ClientStream, Credentials, ObjectMetadata, ObjectPath, ReadRange, Storage};

const USER_AGENT: &str = concat!("readbench-client/", env!("CARGO_PKG_VERSION"));

/// The subset of the JSON object resource we care about.
#[derive(Debug, Deserialize)]
struct ObjectResource {
    /// The JSON API encodes 64-bit integers as decimal strings.
    size: String,
}

/// Reads objects through the JSON API.
///
/// Metadata comes from `GET /storage/v1/b/{bucket}/o/{object}`, payloads from the same URL with
/// `alt=media` and an HTTP `Range` header for bounded reads.
#[derive(Debug)]
pub struct RestStorage {
    reqwest: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
}

impl RestStorage {
    /// Creates a client for the service at `endpoint`, e.g. `https://storage.googleapis.com`.
    ///
    /// No connect or read timeouts are configured, so a stalled transfer blocks the caller.
    ///
    /// # Errors
    ///
    /// Fails if `endpoint` is not a valid base URL or the [`reqwest::Client`] fails to build.
    pub fn new(endpoint: &str, credentials: Credentials) -> crate::Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(crate::Error::InvalidUrl {
                message: format!("`{endpoint}` cannot be used as a base URL"),
            });
        }

        let reqwest = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            reqwest,
            endpoint,
            credentials,
        })
    }

    fn object_url(&self, path: &ObjectPath) -> crate::Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| crate::Error::InvalidUrl {
                message: format!("`{}` cannot be used as a base URL", self.endpoint),
            })?
            .pop_if_empty()
            // segments are percent-encoded, including any `/` in the object name
            .extend(["storage", "v1", "b", path.bucket.as_str(), "o", path.object.as_str()]);
        Ok(url)
    }

    async fn get(&self, url: Url) -> crate::Result<reqwest::RequestBuilder> {
        let mut builder = self.reqwest.get(url);
        if let Some(authorization) = self.credentials.authorization().await? {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        Ok(builder)
    }
}

#[async_trait]
impl Storage for RestStorage {
    fn name(&self) -> &'static str {
        "rest"
    }

    #[tracing::instrument(level = "trace", fields(%path), skip_all)]
    async fn metadata(&self, path: &ObjectPath) -> crate::Result<ObjectMetadata> {
        let url = self.object_url(path)?;
        let response = self.get(url).await?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(crate::Error::NotFound(path.to_string()));
        }

        let body = response.error_for_status()?.bytes().await?;
        let resource: ObjectResource = serde_json::from_slice(&body)?;
        let size = resource.size.parse().map_err(|_| {
            crate::Error::MalformedResponse(format!("invalid object size `{}`", resource.size))
        })?;

        Ok(ObjectMetadata { size })
    }

    #[tracing::instrument(level = "trace", fields(%path, ?range), skip_all)]
    async fn read(&self, path: &ObjectPath, range: ReadRange) -> crate::Result<ClientStream> {
        if let ReadRange::Bounded { length: 0, .. } = range {
            return Ok(futures_util::stream::empty().boxed());
        }

        let mut url = self.object_url(path)?;
        url.query_pairs_mut().append_pair("alt", "media");

        let mut builder = self.get(url).await?;
        if let Some(value) = range.to_header_value() {
            builder = builder.header(header::RANGE, value);
        }

        let response = builder.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(crate::Error::NotFound(path.to_string()));
        }
        let response = response.error_for_status()?;

        Ok(response.bytes_stream().map_err(io::Error::other).boxed())
    }
}
