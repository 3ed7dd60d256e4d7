//! A benchmark for object reads over the JSON and gRPC storage APIs.
//!
//! For every client variant, the benchmark reads a single object repeatedly using two patterns:
//!
//! - *Sequential*: one session streams the whole object through a fixed-size buffer.
//! - *Random*: the object is split into non-overlapping chunks of a given read size, which are
//!   fetched in shuffled order with one bounded read each.
//!
//! Each iteration yields a [`Sample`](sample::Sample). Failed iterations are reported and excluded
//! from the aggregate, which prints mean, median, p90, min and max latency along with the average
//! throughput. Everything runs sequentially; no two reads ever overlap.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod bench;
pub mod cli;
pub mod config;
pub mod observability;
pub mod partition;
pub mod report;
pub mod sample;
pub mod stats;

pub use crate::bench::Benchmark;
