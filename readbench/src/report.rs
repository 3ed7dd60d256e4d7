//! Text rendering of benchmark progress and results.

use std::io::{self, Write};
use std::time::SystemTime;

use bytesize::KIB;
use readbench_client::ObjectPath;
use yansi::Paint;

use crate::bench::{Pattern, RunDescriptor};
use crate::sample::Sample;
use crate::stats::{Summary, to_mb};

/// Prints the banner that opens a run.
pub fn print_header<W: Write>(
    out: &mut W,
    run: &RunDescriptor,
    path: &ObjectPath,
    buffer_size: usize,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", run.variant.label().bold().blue())?;

    let size_mb = to_mb(run.object_size);
    let banner = match run.pattern {
        Pattern::Sequential => format!(
            "==== Sequentially reading {path} ({size_mb:.2} MB) Buffer size: {} KB ====",
            buffer_size as u64 / KIB
        ),
        Pattern::Random { read_size } => format!(
            "==== Random reading {path} ({size_mb:.2} MB) Read size: {} KB ====",
            read_size / KIB
        ),
    };
    writeln!(out, "{}", banner.bold())
}

/// Prints the progress line for the `index`-th iteration (one-based).
pub fn print_iteration<W: Write>(
    out: &mut W,
    index: u32,
    pattern: Pattern,
    sample: &Sample,
) -> io::Result<()> {
    let timestamp = humantime::format_rfc3339_seconds(SystemTime::now());
    write!(out, "[{timestamp}] Iteration {index}: ")?;

    match (sample, pattern) {
        (Sample::Completed { elapsed, bytes }, _) => writeln!(
            out,
            "{:.2} MB in {} ms",
            to_mb(*bytes),
            elapsed.as_millis()
        ),
        (Sample::Failed { .. }, Pattern::Sequential) => writeln!(out, "{}", "Failed.".red()),
        (Sample::Failed { bytes }, Pattern::Random { .. }) => writeln!(
            out,
            "{} Read {:.2} MB before failure.",
            "Failed.".red(),
            to_mb(*bytes)
        ),
    }
}

/// Prints the aggregate block of a run.
///
/// `read_size` of `0` means the pattern has no read size. `durations_ms` holds the successful
/// samples only; if it is empty no statistics are computed.
pub fn print_aggregate<W: Write>(
    out: &mut W,
    label: &str,
    attempted: u32,
    object_size: u64,
    read_size: u64,
    durations_ms: &[u64],
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("==== {label} Read Aggregate Benchmark Results ====").bold()
    )?;
    writeln!(
        out,
        "File size: {:.2} MB ({object_size} bytes)",
        to_mb(object_size)
    )?;
    if read_size > 0 {
        writeln!(out, "Read size: {} KB", read_size / KIB)?;
    }
    writeln!(
        out,
        "Total successful iterations: {} / {attempted}",
        durations_ms.len()
    )?;

    let Some(summary) = Summary::compute(durations_ms) else {
        writeln!(
            out,
            "{}",
            "No successful iterations. No statistics available.".red()
        )?;
        return Ok(());
    };

    writeln!(out, "Average (mean) time: {:.2} ms", summary.mean_ms)?;
    writeln!(out, "P50 (median) time:   {} ms", summary.p50_ms)?;
    writeln!(out, "P90 time:            {} ms", summary.p90_ms)?;
    writeln!(out, "Min time:            {} ms", summary.min_ms)?;
    writeln!(out, "Max time:            {} ms", summary.max_ms)?;
    writeln!(
        out,
        "Average throughput:  {:.2} MB/s",
        summary.throughput(object_size).bold()
    )
}
