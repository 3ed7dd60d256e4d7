//! Descriptive statistics over sample durations.

use bytesize::MIB;

/// Latency statistics over the successful samples of a run, in milliseconds.
///
/// Percentiles use the nearest-rank method: they always select an existing sample instead of
/// interpolating between two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Number of samples.
    pub count: usize,
    /// Arithmetic mean.
    pub mean_ms: f64,
    /// Median, the sample at index `floor(0.5 * (count - 1))`.
    pub p50_ms: u64,
    /// The sample at index `floor(0.9 * (count - 1))`.
    pub p90_ms: u64,
    /// Fastest sample.
    pub min_ms: u64,
    /// Slowest sample.
    pub max_ms: u64,
}

impl Summary {
    /// Computes statistics over `durations_ms`, in any order.
    ///
    /// Returns `None` if there are no samples.
    pub fn compute(durations_ms: &[u64]) -> Option<Self> {
        if durations_ms.is_empty() {
            return None;
        }

        let mut sorted = durations_ms.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let total: u128 = sorted.iter().map(|&ms| u128::from(ms)).sum();

        Some(Self {
            count,
            mean_ms: total as f64 / count as f64,
            p50_ms: sorted[percentile_index(0.5, count)],
            p90_ms: sorted[percentile_index(0.9, count)],
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
        })
    }

    /// Average throughput in MB/s for reading an object of `object_size` bytes once per sample.
    pub fn throughput(&self, object_size: u64) -> f64 {
        throughput(object_size, self.mean_ms)
    }
}

/// Index of the nearest-rank percentile `quantile` in a sorted sequence of `count` elements.
///
/// `count` must be non-zero.
pub fn percentile_index(quantile: f64, count: usize) -> usize {
    let last = count - 1;
    let index = (quantile * last as f64).floor() as usize;
    index.min(last)
}

/// Throughput in MB/s for transferring `bytes` in `duration_ms`, or `0` for a zero duration.
pub fn throughput(bytes: u64, duration_ms: f64) -> f64 {
    if duration_ms > 0.0 {
        to_mb(bytes) / (duration_ms / 1000.0)
    } else {
        0.0
    }
}

/// Converts bytes to (binary) megabytes.
pub fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}
