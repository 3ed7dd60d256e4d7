//! Splitting an object into non-overlapping read chunks.

use rand::Rng;
use rand::seq::SliceRandom;
use readbench_client::ReadRange;

/// Parameters that make a random read impossible to attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// The object has no bytes to partition.
    #[error("object size cannot be 0 for random reads")]
    EmptyObject,
    /// Chunks of zero bytes would never cover the object.
    #[error("read size cannot be 0 for random reads")]
    ZeroReadSize,
}

/// A contiguous span of an object, read by a single bounded read session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Offset of the first byte.
    pub offset: u64,
    /// Number of bytes in this chunk. Only the last chunk of a partition may be shorter than the
    /// read size.
    pub length: u64,
}

impl Chunk {
    /// The range to request for this chunk.
    pub fn range(&self) -> ReadRange {
        ReadRange::bounded(self.offset, self.length)
    }
}

/// Non-overlapping chunks covering `[0, object_size)` exactly once.
///
/// Chunks are created in ascending offset order; [`shuffle`](Self::shuffle) permutes the
/// visitation order without changing the covered bytes.
#[derive(Debug, Clone)]
pub struct OffsetPartition {
    chunks: Vec<Chunk>,
}

impl OffsetPartition {
    /// Partitions an object of `object_size` bytes into chunks of `read_size` bytes.
    pub fn new(object_size: u64, read_size: u64) -> Result<Self, UsageError> {
        if object_size == 0 {
            return Err(UsageError::EmptyObject);
        }
        if read_size == 0 {
            return Err(UsageError::ZeroReadSize);
        }

        let count = object_size.div_ceil(read_size);
        let mut chunks = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
        let mut offset = 0;
        while offset < object_size {
            let length = read_size.min(object_size - offset);
            chunks.push(Chunk { offset, length });
            offset += length;
        }

        Ok(Self { chunks })
    }

    /// Shuffles the visitation order using `rng`.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.chunks.shuffle(rng);
    }

    /// The chunks in visitation order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always `false`, since empty objects cannot be partitioned.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl IntoIterator for OffsetPartition {
    type Item = Chunk;
    type IntoIter = std::vec::IntoIter<Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn assert_covers(partition: &OffsetPartition, object_size: u64) {
        let mut chunks = partition.chunks().to_vec();
        chunks.sort_unstable_by_key(|chunk| chunk.offset);

        let mut expected_offset = 0;
        for chunk in &chunks {
            assert_eq!(chunk.offset, expected_offset, "gap or overlap at {chunk:?}");
            assert!(chunk.length > 0);
            expected_offset += chunk.length;
        }
        assert_eq!(expected_offset, object_size);

        let total: u64 = partition.chunks().iter().map(|chunk| chunk.length).sum();
        assert_eq!(total, object_size);
    }

    #[test]
    fn covers_object_exactly_once() {
        let mut rng = SmallRng::seed_from_u64(7);
        let sizes = [1, 2, 99, 100, 101, 1000, 4096, 10_000, 1 << 20];
        let read_sizes = [1, 3, 100, 1024, 4096, 1 << 20, 1 << 22];

        for object_size in sizes {
            for read_size in read_sizes {
                let mut partition = OffsetPartition::new(object_size, read_size).unwrap();
                assert_eq!(
                    partition.len() as u64,
                    object_size.div_ceil(read_size),
                    "size {object_size}, read size {read_size}"
                );
                partition.shuffle(&mut rng);
                assert_covers(&partition, object_size);
            }
        }
    }

    #[test]
    fn truncates_last_chunk() {
        let partition = OffsetPartition::new(250, 100).unwrap();
        assert_eq!(
            partition.chunks(),
            &[
                Chunk {
                    offset: 0,
                    length: 100
                },
                Chunk {
                    offset: 100,
                    length: 100
                },
                Chunk {
                    offset: 200,
                    length: 50
                },
            ]
        );
    }

    #[test]
    fn read_size_larger_than_object() {
        let partition = OffsetPartition::new(10, 1 << 20).unwrap();
        assert_eq!(partition.chunks(), &[Chunk { offset: 0, length: 10 }]);
    }

    #[test]
    fn shuffle_is_reproducible() {
        let shuffled = |seed| {
            let mut partition = OffsetPartition::new(100 * 1024, 1024).unwrap();
            partition.shuffle(&mut SmallRng::seed_from_u64(seed));
            partition.chunks().to_vec()
        };

        assert_eq!(shuffled(42), shuffled(42));
        assert_ne!(shuffled(42), shuffled(43));

        let ordered = OffsetPartition::new(100 * 1024, 1024).unwrap();
        assert_ne!(shuffled(42), ordered.chunks());
    }

    #[test]
    fn rejects_zero_sizes() {
        assert_eq!(
            OffsetPartition::new(0, 1024).unwrap_err(),
            UsageError::EmptyObject
        );
        assert_eq!(
            OffsetPartition::new(1024, 0).unwrap_err(),
            UsageError::ZeroReadSize
        );
    }
}
