//! Runs [`RestStorage`] against an in-process fake of the JSON API.

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bytes::Bytes;
use futures_util::TryStreamExt;
use readbench_client::{
    Credentials, Endpoints, Error, ObjectPath, ReadRange, RestStorage, Storage, Variant,
};

#[derive(Debug, Default)]
struct FakeApi {
    objects: HashMap<(String, String), Bytes>,
    ranges: Mutex<Vec<Option<String>>>,
}

#[derive(Debug)]
struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    api: Arc<FakeApi>,
}

impl TestServer {
    async fn new(objects: &[(&str, &str, &[u8])]) -> Self {
        let api = Arc::new(FakeApi {
            objects: objects
                .iter()
                .map(|(bucket, object, payload)| {
                    let key = (bucket.to_string(), object.to_string());
                    (key, Bytes::copy_from_slice(payload))
                })
                .collect(),
            ranges: Mutex::default(),
        });

        let app = Router::new()
            .route("/storage/v1/b/{bucket}/o/{object}", get(get_object))
            .with_state(Arc::clone(&api));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            socket,
            api,
        }
    }

    fn endpoint(&self) -> String {
        format!("http://{}", self.socket)
    }

    fn ranges(&self) -> Vec<Option<String>> {
        self.api.ranges.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn get_object(
    State(api): State<Arc<FakeApi>>,
    Path((bucket, object)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let Some(payload) = api.objects.get(&(bucket, object.clone())) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if params.get("alt").map(String::as_str) != Some("media") {
        let body = format!(r#"{{"name":"{object}","size":"{}"}}"#, payload.len());
        return ([(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    api.ranges.lock().unwrap().push(range.clone());

    let Some(range) = range else {
        return payload.clone().into_response();
    };

    let (start, end) = range
        .strip_prefix("bytes=")
        .and_then(|range| range.split_once('-'))
        .and_then(|(start, end)| Some((start.parse::<usize>().ok()?, end.parse::<usize>().ok()?)))
        .unwrap();
    let end = (end + 1).min(payload.len());

    (StatusCode::PARTIAL_CONTENT, payload.slice(start..end)).into_response()
}

async fn read_all(storage: &dyn Storage, path: &ObjectPath, range: ReadRange) -> Vec<u8> {
    let stream = storage.read(path, range).await.unwrap();
    let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
    chunks.concat()
}

#[tokio::test]
async fn reads_metadata() {
    let server = TestServer::new(&[("bucket", "dir/object", b"oh hai!")]).await;
    let storage = RestStorage::new(&server.endpoint(), Credentials::anonymous()).unwrap();

    let metadata = storage
        .metadata(&ObjectPath::new("bucket", "dir/object"))
        .await
        .unwrap();

    assert_eq!(metadata.size, 7);
}

#[tokio::test]
async fn missing_object_is_not_found() {
    let server = TestServer::new(&[]).await;
    let storage = RestStorage::new(&server.endpoint(), Credentials::anonymous()).unwrap();
    let path = ObjectPath::new("bucket", "missing");

    assert!(matches!(
        storage.metadata(&path).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        storage.read(&path, ReadRange::Full).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn reads_full_and_bounded_ranges() {
    let payload: Vec<u8> = (0..100).collect();
    let server = TestServer::new(&[("bucket", "object", &payload)]).await;
    let storage = RestStorage::new(&server.endpoint(), Credentials::anonymous()).unwrap();
    let path = ObjectPath::new("bucket", "object");

    assert_eq!(read_all(&storage, &path, ReadRange::Full).await, payload);
    assert_eq!(
        read_all(&storage, &path, ReadRange::bounded(90, 10)).await,
        &payload[90..]
    );
    assert!(read_all(&storage, &path, ReadRange::bounded(5, 0)).await.is_empty());

    // the empty range never reaches the server
    assert_eq!(
        server.ranges(),
        vec![None, Some("bytes=90-99".to_owned())]
    );
}

#[tokio::test]
async fn variant_selects_rest_endpoint() {
    let server = TestServer::new(&[("bucket", "object", b"payload")]).await;
    let endpoints = Endpoints {
        rest: server.endpoint(),
        grpc: Endpoints::testbench().grpc,
    };
    let storage = Variant::Rest
        .connect(&endpoints, Credentials::anonymous())
        .unwrap();

    let path = ObjectPath::new("bucket", "object");
    assert_eq!(storage.metadata(&path).await.unwrap().size, 7);
    assert_eq!(
        read_all(storage.as_ref(), &path, ReadRange::bounded(0, 3)).await,
        b"pay"
    );
}
