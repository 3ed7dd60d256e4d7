//! Command line entry point.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use argh::FromArgs;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use readbench_client::{Credentials, Endpoints, ObjectPath};

use crate::bench::Benchmark;
use crate::config::Config;
use crate::observability;

/// Benchmark sequential and random reads of an object over the JSON and gRPC storage APIs.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,

    /// seed for shuffling random read offsets, drawn from the OS if omitted
    #[argh(option)]
    pub seed: Option<u64>,

    /// name of the bucket holding the object
    #[argh(positional)]
    pub bucket: String,

    /// name of the object to read
    #[argh(positional)]
    pub object: String,

    /// number of iterations per run, must be positive
    #[argh(positional, from_str_fn(parse_iterations))]
    pub iterations: u32,

    /// path to a service account key file; without it the local testbench is used
    #[argh(positional)]
    pub credentials: Option<PathBuf>,
}

fn parse_iterations(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(0) => Err("number of iterations must be positive".to_owned()),
        Ok(iterations) => Ok(iterations),
        Err(err) => Err(format!("invalid number of iterations `{value}`: {err}")),
    }
}

/// What to read, where, and as whom.
#[derive(Debug)]
struct Target {
    credentials: Credentials,
    endpoints: Endpoints,
    path: ObjectPath,
}

impl Target {
    /// Uses the configured endpoints with the given credentials file, or falls back to the
    /// testbench endpoints and object without one.
    fn resolve(
        config: &Config,
        credentials: Option<&Path>,
        bucket: String,
        object: String,
    ) -> Result<Self> {
        let Some(file) = credentials else {
            let testbench = &config.testbench;
            return Ok(Self {
                credentials: Credentials::anonymous(),
                endpoints: testbench.endpoints.clone(),
                path: ObjectPath::new(&testbench.bucket, &testbench.object),
            });
        };

        let credentials = Credentials::from_file(file)
            .with_context(|| format!("failed to open credentials file `{}`", file.display()))?;

        Ok(Self {
            credentials,
            endpoints: config.endpoints.clone(),
            path: ObjectPath::new(bucket, object),
        })
    }
}

/// Bootstrap the runtime and execute the benchmark.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();
    let config = Config::load(args.config.as_deref())?;

    yansi::whenever(yansi::Condition::TTY_AND_COLOR);
    observability::init_tracing(&config);
    tracing::debug!(?config);

    // Credentials must be readable before any client is constructed.
    let Target {
        credentials,
        endpoints,
        path,
    } = Target::resolve(&config, args.credentials.as_deref(), args.bucket, args.object)?;

    if credentials.is_anonymous() {
        tracing::warn!(
            rest = %endpoints.rest,
            grpc = %endpoints.grpc,
            "no credentials given, sending unauthenticated requests for {path}"
        );
    }

    if config.variants.is_empty() {
        tracing::warn!("no variants configured, nothing will be benchmarked");
    }

    let rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let clients = config
            .variants
            .iter()
            .map(|&variant| {
                let storage = variant
                    .connect(&endpoints, credentials.clone())
                    .with_context(|| format!("failed to construct {variant}"))?;
                Ok((variant, storage))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut benchmark = Benchmark::new(
            path,
            args.iterations,
            config.buffer_size(),
            rng,
            io::stdout(),
        );
        let results = benchmark.run_all(&clients, &config.read_sizes()).await?;
        tracing::info!(runs = results.len(), "benchmark finished");

        Ok(())
    })
}
