//! Benchmark object reads over the JSON and gRPC storage APIs.
//!
//! ```text
//! readbench [-c <config>] [--seed <n>] <bucket> <object> <iterations> [<credentials>]
//! ```
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    readbench::cli::execute()
}
