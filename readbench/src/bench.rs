//! The benchmark driver: runs every read pattern against every client and reports the results.

use std::fmt;
use std::io::{self, Write};

use rand::rngs::SmallRng;
use readbench_client::{BoxedStorage, ObjectPath, Storage, Variant};

use crate::report;
use crate::sample::{random_read, sequential_read};

/// The read pattern of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// One continuous read of the whole object.
    Sequential,
    /// Bounded reads of `read_size` bytes at shuffled offsets.
    Random {
        /// Bytes per bounded read.
        read_size: u64,
    },
}

impl Pattern {
    /// The read size, or `0` if the pattern has none.
    pub fn read_size(self) -> u64 {
        match self {
            Pattern::Sequential => 0,
            Pattern::Random { read_size } => read_size,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Sequential => f.write_str("Sequential"),
            Pattern::Random { .. } => f.write_str("Random"),
        }
    }
}

/// Everything that stays fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDescriptor {
    /// Size of the object in bytes.
    pub object_size: u64,
    /// Bytes per bounded read, `0` if not applicable.
    pub read_size: u64,
    /// Requested number of iterations.
    pub iterations: u32,
    /// The client under test.
    pub variant: Variant,
    /// The read pattern.
    pub pattern: Pattern,
}

impl RunDescriptor {
    /// Label for the aggregate report, e.g. `Sequential (GRPC Client)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.pattern, self.variant.label())
    }
}

/// The outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// The parameters of the run.
    pub descriptor: RunDescriptor,
    /// Durations of the successful iterations in milliseconds, in iteration order.
    pub durations_ms: Vec<u64>,
}

impl RunResult {
    /// Number of iterations that were attempted.
    pub fn attempted(&self) -> u32 {
        self.descriptor.iterations
    }

    /// Number of iterations that succeeded.
    pub fn successful(&self) -> usize {
        self.durations_ms.len()
    }
}

/// Runs read patterns against storage clients, one iteration at a time, and writes progress and
/// aggregate reports to `out`.
#[derive(Debug)]
pub struct Benchmark<W> {
    path: ObjectPath,
    iterations: u32,
    buffer_size: usize,
    rng: SmallRng,
    out: W,
}

impl<W: Write> Benchmark<W> {
    /// Creates a benchmark of `iterations` iterations per run against the object at `path`.
    ///
    /// `rng` drives the shuffling of random reads.
    pub fn new(
        path: ObjectPath,
        iterations: u32,
        buffer_size: usize,
        rng: SmallRng,
        out: W,
    ) -> Self {
        Self {
            path,
            iterations,
            buffer_size,
            rng,
            out,
        }
    }

    /// Runs the full matrix: a sequential run per client, then a random run per client for each
    /// read size.
    pub async fn run_all(
        &mut self,
        clients: &[(Variant, BoxedStorage)],
        read_sizes: &[u64],
    ) -> io::Result<Vec<RunResult>> {
        let mut patterns = vec![Pattern::Sequential];
        patterns.extend(read_sizes.iter().map(|&read_size| Pattern::Random { read_size }));

        let mut results = Vec::new();
        for pattern in patterns {
            for (variant, storage) in clients {
                results.extend(self.run(storage.as_ref(), *variant, pattern).await?);
            }
        }

        Ok(results)
    }

    /// Runs all iterations of one pattern against one client.
    ///
    /// Returns `None` if the run was skipped, either because the object metadata could not be
    /// retrieved or because the pattern cannot be applied to the object. Errors are only returned
    /// when writing the report fails.
    pub async fn run(
        &mut self,
        storage: &dyn Storage,
        variant: Variant,
        pattern: Pattern,
    ) -> io::Result<Option<RunResult>> {
        let object_size = match storage.metadata(&self.path).await {
            Ok(metadata) => metadata.size,
            Err(error) => {
                tracing::error!(
                    error = &error as &dyn std::error::Error,
                    path = %self.path,
                    client = storage.name(),
                    %variant,
                    "error getting object metadata, skipping run"
                );
                return Ok(None);
            }
        };

        let descriptor = RunDescriptor {
            object_size,
            read_size: pattern.read_size(),
            iterations: self.iterations,
            variant,
            pattern,
        };

        if let Pattern::Random { read_size } = pattern
            && (object_size == 0 || read_size == 0)
        {
            tracing::error!(
                path = %self.path,
                client = storage.name(),
                %variant,
                object_size,
                read_size,
                "cannot run random reads with a zero size, skipping run"
            );
            return Ok(None);
        }

        report::print_header(&mut self.out, &descriptor, &self.path, self.buffer_size)?;

        let mut durations_ms = Vec::new();
        for index in 1..=self.iterations {
            let sample = match pattern {
                Pattern::Sequential => {
                    sequential_read(storage, &self.path, self.buffer_size).await
                }
                Pattern::Random { read_size } => {
                    let sample =
                        random_read(storage, &self.path, object_size, read_size, &mut self.rng);
                    match sample.await {
                        Ok(sample) => sample,
                        Err(error) => {
                            tracing::error!(
                                error = &error as &dyn std::error::Error,
                                index,
                                "skipping sample"
                            );
                            continue;
                        }
                    }
                }
            };

            tracing::debug!(
                client = storage.name(),
                index,
                ?sample,
                "iteration finished"
            );
            report::print_iteration(&mut self.out, index, pattern, &sample)?;
            durations_ms.extend(sample.elapsed_ms());
        }

        report::print_aggregate(
            &mut self.out,
            &descriptor.label(),
            descriptor.iterations,
            descriptor.object_size,
            descriptor.read_size,
            &durations_ms,
        )?;
        self.out.flush()?;

        Ok(Some(RunResult {
            descriptor,
            durations_ms,
        }))
    }

    /// Consumes the benchmark, returning the report writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}
