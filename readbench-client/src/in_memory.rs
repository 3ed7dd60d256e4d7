//! An in-memory [`Storage`] with fault injection, for exercising callers without a network.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use crate::{ClientStream, ObjectMetadata, ObjectPath, ReadRange, Storage};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Default)]
struct Faults {
    /// Zero-based indices of `read` calls that fail to open.
    failing_reads: BTreeSet<usize>,
    /// Every stream fails after delivering this many bytes of its range.
    truncate_after: Option<u64>,
    failing_metadata: bool,
    read_count: usize,
}

/// A [`Storage`] implementation holding objects in memory.
///
/// Streams are split into fixed-size chunks, similar to what a network transport delivers. Faults
/// can be injected per read call or per stream, and all requested ranges are recorded so tests
/// can assert on the exact reads a caller issued.
#[derive(Debug)]
pub struct InMemoryStorage {
    objects: HashMap<ObjectPath, Bytes>,
    chunk_size: usize,
    faults: Mutex<Faults>,
    reads: Mutex<Vec<ReadRange>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            faults: Mutex::default(),
            reads: Mutex::default(),
        }
    }

    /// Adds an object with the given payload.
    pub fn with_object(mut self, path: ObjectPath, payload: impl Into<Bytes>) -> Self {
        self.objects.insert(path, payload.into());
        self
    }

    /// Sets the size of the chunks yielded by read streams. Must be non-zero.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Makes the `index`-th call to [`Storage::read`] (zero-based) fail to open.
    pub fn fail_read(&self, index: usize) {
        lock(&self.faults).failing_reads.insert(index);
    }

    /// Makes every read stream fail after delivering `bytes` bytes.
    pub fn fail_stream_after(&self, bytes: u64) {
        lock(&self.faults).truncate_after = Some(bytes);
    }

    /// Makes every metadata lookup fail.
    pub fn fail_metadata(&self) {
        lock(&self.faults).failing_metadata = true;
    }

    /// Returns the ranges of all read calls so far, in call order.
    pub fn reads(&self) -> Vec<ReadRange> {
        lock(&self.reads).clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn metadata(&self, path: &ObjectPath) -> crate::Result<ObjectMetadata> {
        if lock(&self.faults).failing_metadata {
            return Err(injected("metadata lookup").into());
        }

        let payload = self
            .objects
            .get(path)
            .ok_or_else(|| crate::Error::NotFound(path.to_string()))?;

        Ok(ObjectMetadata {
            size: payload.len() as u64,
        })
    }

    async fn read(&self, path: &ObjectPath, range: ReadRange) -> crate::Result<ClientStream> {
        lock(&self.reads).push(range);

        let truncate_after = {
            let mut faults = lock(&self.faults);
            let index = faults.read_count;
            faults.read_count += 1;
            if faults.failing_reads.contains(&index) {
                return Err(injected("read session").into());
            }
            faults.truncate_after
        };

        let payload = self
            .objects
            .get(path)
            .ok_or_else(|| crate::Error::NotFound(path.to_string()))?;

        let range = range.resolve(payload.len() as u64);
        let mut payload = payload.slice(range.start as usize..range.end as usize);

        let mut failure = None;
        if let Some(limit) = truncate_after
            && limit < payload.len() as u64
        {
            payload = payload.slice(..limit as usize);
            failure = Some(injected("read stream"));
        }

        let mut items: Vec<io::Result<Bytes>> = Vec::new();
        let mut offset = 0;
        while offset < payload.len() {
            let end = (offset + self.chunk_size).min(payload.len());
            items.push(Ok(payload.slice(offset..end)));
            offset = end;
        }
        items.extend(failure.map(Err));

        Ok(futures_util::stream::iter(items).boxed())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn injected(what: &str) -> io::Error {
    io::Error::other(format!("injected {what} failure"))
}

#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;

    use super::*;

    fn storage() -> (InMemoryStorage, ObjectPath) {
        let path = ObjectPath::new("bucket", "object");
        let payload: Vec<u8> = (0..=255).collect();
        let storage = InMemoryStorage::new()
            .with_object(path.clone(), payload)
            .with_chunk_size(100);
        (storage, path)
    }

    async fn collect(stream: ClientStream) -> io::Result<Vec<u8>> {
        let chunks: Vec<Bytes> = stream.try_collect().await?;
        Ok(chunks.concat())
    }

    #[tokio::test]
    async fn reads_ranges() {
        let (storage, path) = storage();

        let full = collect(storage.read(&path, ReadRange::Full).await.unwrap()).await;
        assert_eq!(full.unwrap().len(), 256);

        let bounded = collect(storage.read(&path, ReadRange::bounded(250, 10)).await.unwrap());
        assert_eq!(bounded.await.unwrap(), vec![250, 251, 252, 253, 254, 255]);

        assert_eq!(
            storage.reads(),
            vec![ReadRange::Full, ReadRange::bounded(250, 10)]
        );
        assert_eq!(storage.metadata(&path).await.unwrap().size, 256);
        assert_eq!(storage.name(), "in-memory");
    }

    #[tokio::test]
    async fn injects_faults() {
        let (storage, path) = storage();
        storage.fail_read(1);
        storage.fail_stream_after(150);

        let mut stream = storage.read(&path, ReadRange::Full).await.unwrap();
        let mut received = 0;
        let mut failed = false;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => received += chunk.len(),
                Err(_) => failed = true,
            }
        }
        assert_eq!(received, 150);
        assert!(failed);

        assert!(storage.read(&path, ReadRange::Full).await.is_err());
        assert!(storage.read(&path, ReadRange::bounded(0, 10)).await.is_ok());
    }

    #[tokio::test]
    async fn missing_objects() {
        let (storage, _) = storage();
        let missing = ObjectPath::new("bucket", "missing");

        assert!(matches!(
            storage.metadata(&missing).await,
            Err(crate::Error::NotFound(_))
        ));
        assert!(storage.read(&missing, ReadRange::Full).await.is_err());
    }
}
