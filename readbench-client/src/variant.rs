use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BoxedStorage, Credentials, GrpcStorage, RestStorage};

/// The production endpoint, serving both protocols.
pub const PRODUCTION_ENDPOINT: &str = "https://storage.googleapis.com";

/// Service endpoints per protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Base URL of the JSON API.
    pub rest: String,
    /// URI of the gRPC API.
    pub grpc: String,
}

impl Endpoints {
    /// The public production endpoints.
    pub fn production() -> Self {
        Self {
            rest: PRODUCTION_ENDPOINT.to_owned(),
            grpc: PRODUCTION_ENDPOINT.to_owned(),
        }
    }

    /// The default ports of a locally running storage testbench.
    pub fn testbench() -> Self {
        Self {
            rest: "http://localhost:9000".to_owned(),
            grpc: "http://localhost:8000".to_owned(),
        }
    }
}

/// The available [`Storage`](crate::Storage) implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// [`GrpcStorage`].
    Grpc,
    /// [`RestStorage`].
    Rest,
}

impl Variant {
    /// All variants, in the order they are benchmarked by default.
    pub const ALL: [Variant; 2] = [Variant::Grpc, Variant::Rest];

    /// A human readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Variant::Grpc => "GRPC Client",
            Variant::Rest => "JSON Client",
        }
    }

    /// Constructs the storage client for this variant.
    ///
    /// The gRPC variant must be constructed from within a tokio runtime.
    pub fn connect(
        self,
        endpoints: &Endpoints,
        credentials: Credentials,
    ) -> crate::Result<BoxedStorage> {
        Ok(match self {
            Variant::Grpc => Box::new(GrpcStorage::new(&endpoints.grpc, credentials)?),
            Variant::Rest => Box::new(RestStorage::new(&endpoints.rest, credentials)?),
        })
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
