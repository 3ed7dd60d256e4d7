//! Configuration for the benchmark.
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Environment variables (prefixed with `READBENCH__`)
//! 2. YAML configuration file (specified via `-c` or `--config` flag)
//! 3. Defaults
//!
//! Environment variables use double underscores (`__`) to denote nested configuration structures,
//! for example `READBENCH__ENDPOINTS__REST=http://localhost:9000` or
//! `READBENCH__READ_SIZES="[1 MiB, 256 KiB]"`.
//!
//! The same configuration in YAML:
//!
//! ```yaml
//! endpoints:
//!   rest: http://localhost:9000
//! read_sizes: [1 MiB, 256 KiB]
//! ```

use std::path::Path;

use anyhow::{Result, bail};
use bytesize::{ByteSize, KIB, MIB};
use figment::providers::{Env, Format, Serialized, Yaml};
use readbench_client::{Endpoints, Variant};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "READBENCH__";

/// The target used when no credentials are given.
///
/// Used in: [`Config::testbench`]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Testbench {
    /// Endpoints of the local storage testbench.
    ///
    /// # Default
    ///
    /// `http://localhost:9000` for REST, `http://localhost:8000` for gRPC
    pub endpoints: Endpoints,
    /// Bucket that replaces the one given on the command line.
    pub bucket: String,
    /// Object that replaces the one given on the command line.
    pub object: String,
}

impl Default for Testbench {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::testbench(),
            bucket: "test-bucket".to_owned(),
            object: "test-object".to_owned(),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty for a TTY, otherwise simplified.
    Auto,
    /// Compact output with colors.
    Pretty,
    /// Plain text without colors.
    Simplified,
    /// JSON lines.
    Json,
}

/// Logging configuration. Logs are always written to stderr.
///
/// Used in: [`Config::logging`]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logging {
    /// Minimum log level to output, unless overridden by `RUST_LOG`.
    ///
    /// # Default
    ///
    /// `INFO`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format.
    ///
    /// # Default
    ///
    /// `auto`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Benchmark configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Endpoints used when credentials are given.
    ///
    /// # Default
    ///
    /// `https://storage.googleapis.com` for both protocols
    pub endpoints: Endpoints,

    /// Target used when no credentials are given.
    pub testbench: Testbench,

    /// Size of the buffer that sequential reads are drained into. Must not be zero.
    ///
    /// # Default
    ///
    /// `4 MiB`
    pub buffer_size: ByteSize,

    /// Read sizes for random runs, one run per entry and client.
    ///
    /// # Default
    ///
    /// `[4 MiB, 2 MiB, 1 MiB, 100 KiB]`
    pub read_sizes: Vec<ByteSize>,

    /// Clients to benchmark, in order.
    ///
    /// # Default
    ///
    /// `[grpc, rest]`
    pub variants: Vec<Variant>,

    /// Logging configuration.
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::production(),
            testbench: Testbench::default(),
            buffer_size: ByteSize::mib(4),
            read_sizes: vec![
                ByteSize::b(4 * MIB),
                ByteSize::b(2 * MIB),
                ByteSize::b(MIB),
                ByteSize::b(100 * KIB),
            ],
            variants: Variant::ALL.to_vec(),
            logging: Logging::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from defaults, the YAML file at `path`, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.buffer_size.as_u64() == 0 {
            bail!("buffer_size cannot be 0");
        }
        if usize::try_from(self.buffer_size.as_u64()).is_err() {
            bail!("buffer_size {} is too large", self.buffer_size);
        }
        Ok(())
    }

    /// The sequential read buffer size in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.as_u64() as usize
    }

    /// The random read sizes in bytes.
    pub fn read_sizes(&self) -> Vec<u64> {
        self.read_sizes.iter().map(ByteSize::as_u64).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();

            assert_eq!(config.endpoints, Endpoints::production());
            assert_eq!(config.testbench.endpoints, Endpoints::testbench());
            assert_eq!(config.testbench.bucket, "test-bucket");
            assert_eq!(config.testbench.object, "test-object");
            assert_eq!(config.buffer_size(), 4 * 1024 * 1024);
            assert_eq!(
                config.read_sizes(),
                [4 * MIB, 2 * MIB, MIB, 100 * KIB].to_vec()
            );
            assert_eq!(config.variants, [Variant::Grpc, Variant::Rest]);
            assert_eq!(config.logging.level, LevelFilter::INFO);
            assert_eq!(config.logging.format, LogFormat::Auto);

            Ok(())
        });
    }

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("READBENCH__ENDPOINTS__REST", "http://localhost:8888");
            jail.set_env("READBENCH__TESTBENCH__BUCKET", "other-bucket");
            jail.set_env("READBENCH__BUFFER_SIZE", "1 MiB");
            jail.set_env("READBENCH__READ_SIZES", "[256 KiB]");
            jail.set_env("READBENCH__VARIANTS", "[rest]");
            jail.set_env("READBENCH__LOGGING__LEVEL", "debug");
            jail.set_env("READBENCH__LOGGING__FORMAT", "json");

            let config = Config::load(None).unwrap();

            assert_eq!(config.endpoints.rest, "http://localhost:8888");
            assert_eq!(config.endpoints.grpc, Endpoints::production().grpc);
            assert_eq!(config.testbench.bucket, "other-bucket");
            assert_eq!(config.buffer_size(), 1024 * 1024);
            assert_eq!(config.read_sizes(), vec![256 * KIB]);
            assert_eq!(config.variants, [Variant::Rest]);
            assert_eq!(config.logging.level, LevelFilter::DEBUG);
            assert_eq!(config.logging.format, LogFormat::Json);

            Ok(())
        });
    }

    #[test]
    fn configurable_via_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            endpoints:
                rest: http://localhost:9000
                grpc: http://localhost:8000
            buffer_size: 65536
            read_sizes: [1 MiB, 1000]
            variants: [grpc]
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|_jail| {
            let config = Config::load(Some(tempfile.path())).unwrap();

            assert_eq!(config.endpoints, Endpoints::testbench());
            assert_eq!(config.buffer_size(), 65536);
            assert_eq!(config.read_sizes(), vec![MIB, 1000]);
            assert_eq!(config.variants, [Variant::Grpc]);

            Ok(())
        });
    }

    #[test]
    fn rejects_zero_buffer() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("READBENCH__BUFFER_SIZE", "0");
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }
}
