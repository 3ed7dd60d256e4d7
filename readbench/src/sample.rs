//! Timed read operations against a [`Storage`] client.
//!
//! Each function performs one iteration of a read pattern and yields a [`Sample`]. Transport
//! errors never escape: they are logged and turned into [`Sample::Failed`].

use std::error::Error;
use std::io;
use std::time::{Duration, Instant};

use bytesize::MIB;
use rand::Rng;
use readbench_client::{ObjectPath, ReadRange, Storage};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

use crate::partition::{OffsetPartition, UsageError};

/// Size of the buffer that sequential reads are drained into.
pub const DEFAULT_BUFFER_SIZE: usize = 4 * MIB as usize;

/// The result of one benchmark iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// The read ran to completion.
    Completed {
        /// Wall-clock time of the whole iteration.
        elapsed: Duration,
        /// Bytes transferred.
        bytes: u64,
    },
    /// The read failed; `bytes` were transferred before the failure.
    Failed {
        /// Bytes transferred before the failure.
        bytes: u64,
    },
}

impl Sample {
    /// Bytes transferred, whether or not the read completed.
    pub fn bytes(&self) -> u64 {
        match *self {
            Sample::Completed { bytes, .. } | Sample::Failed { bytes } => bytes,
        }
    }

    /// Duration in whole milliseconds, or `None` for failed samples.
    pub fn elapsed_ms(&self) -> Option<u64> {
        match self {
            Sample::Completed { elapsed, .. } => Some(elapsed.as_millis() as u64),
            Sample::Failed { .. } => None,
        }
    }

    /// Returns `true` if this sample is excluded from statistics.
    pub fn is_failed(&self) -> bool {
        matches!(self, Sample::Failed { .. })
    }
}

/// Reads the whole object in a single session, draining it through a `buffer_size` buffer.
///
/// The timer includes opening the session.
pub async fn sequential_read(
    storage: &dyn Storage,
    path: &ObjectPath,
    buffer_size: usize,
) -> Sample {
    let start = Instant::now();

    let stream = match storage.read(path, ReadRange::Full).await {
        Ok(stream) => stream,
        Err(error) => {
            tracing::error!(
                error = &error as &dyn Error,
                %path,
                client = storage.name(),
                "error opening object for sequential read"
            );
            return Sample::Failed { bytes: 0 };
        }
    };

    let mut reader = StreamReader::new(stream);
    let mut buffer = vec![0; buffer_size.max(1)];
    let (bytes, result) = drain(&mut reader, &mut buffer, u64::MAX).await;

    if let Err(error) = result {
        tracing::error!(
            error = &error as &dyn Error,
            %path,
            client = storage.name(),
            bytes,
            "error during sequential read"
        );
        return Sample::Failed { bytes };
    }

    Sample::Completed {
        elapsed: start.elapsed(),
        bytes,
    }
}

/// Reads the object as shuffled, non-overlapping chunks of `read_size` bytes.
///
/// A single timer spans all chunks. The first chunk that fails to open or read aborts the
/// iteration; the remaining chunks are not attempted.
///
/// # Errors
///
/// Returns a [`UsageError`] without issuing any reads if either size is zero.
pub async fn random_read<R: Rng + ?Sized>(
    storage: &dyn Storage,
    path: &ObjectPath,
    object_size: u64,
    read_size: u64,
    rng: &mut R,
) -> Result<Sample, UsageError> {
    let mut partition = OffsetPartition::new(object_size, read_size)?;
    partition.shuffle(rng);

    let mut buffer = vec![0; read_size.min(DEFAULT_BUFFER_SIZE as u64) as usize];
    let mut bytes = 0;
    let start = Instant::now();

    for chunk in partition {
        let stream = match storage.read(path, chunk.range()).await {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(
                    error = &error as &dyn Error,
                    %path,
                    client = storage.name(),
                    offset = chunk.offset,
                    "error opening object for random read"
                );
                return Ok(Sample::Failed { bytes });
            }
        };

        let mut reader = StreamReader::new(stream);
        let (read, result) = drain(&mut reader, &mut buffer, chunk.length).await;
        bytes += read;

        if let Err(error) = result {
            tracing::error!(
                error = &error as &dyn Error,
                %path,
                client = storage.name(),
                offset = chunk.offset,
                "error during random read"
            );
            return Ok(Sample::Failed { bytes });
        }
        if read < chunk.length {
            tracing::warn!(
                %path,
                offset = chunk.offset,
                expected = chunk.length,
                read,
                "short read"
            );
        }
    }

    Ok(Sample::Completed {
        elapsed: start.elapsed(),
        bytes,
    })
}

/// Reads from `reader` until end-of-data or until `limit` bytes have been read.
///
/// Returns the bytes read along with the error that stopped the read, if any.
async fn drain<R>(reader: &mut R, buffer: &mut [u8], limit: u64) -> (u64, io::Result<()>)
where
    R: AsyncRead + Unpin,
{
    let mut total = 0;
    while total < limit {
        let want = (limit - total).min(buffer.len() as u64) as usize;
        match reader.read(&mut buffer[..want]).await {
            Ok(0) => break,
            Ok(read) => total += read as u64,
            Err(error) => return (total, Err(error)),
        }
    }
    (total, Ok(()))
}
