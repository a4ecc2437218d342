//! Configuration for the ammo generator.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Command line flags (only `--seed` and the parameters of the single-file subcommands)
//! 2. Environment variables (prefixed with `AMMO__`)
//! 3. YAML configuration file (specified via `-c` or `--config` flag)
//! 4. Defaults
//!
//! # Environment Variables
//!
//! Environment variables use `AMMO__` as a prefix and double underscores (`__`) to denote nested
//! configuration structures. For example:
//!
//! - `AMMO__SEED=7` changes the seed of every generated file
//! - `AMMO__VALUE_LEN=1KiB` changes the default value length
//! - `AMMO__LOGGING__FORMAT=json` switches to JSON logs
//!
//! # YAML Configuration File
//!
//! The YAML file can additionally list the jobs executed by `make-ammo run`:
//!
//! ```yaml
//! seed: 0
//! value_len: 256 B
//!
//! jobs:
//!   - output: put.ammo
//!     mode: put
//!     shots: 1000000
//!   - output: get.ammo
//!     mode: get
//!     shots: 1000000
//!     population_size: 1000000
//!   - output: mixed.ammo
//!     mode: mixed
//!     shots: 1000000
//!     current_db_size: 1000000
//!     value_len: 4 KiB
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::thread::available_parallelism;

use ammo_workload::{DEFAULT_SEED, DEFAULT_VALUE_LEN, Workload};
use anyhow::{Context, Result};
use bytesize::ByteSize;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "AMMO__";

/// Log output format.
///
/// Controls how log messages are formatted. The format can be explicitly specified or
/// auto-detected based on whether output is to a TTY.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Compact output with colors.
    Pretty,

    /// Simplified plain text output.
    Simplified,

    /// Dump out JSON lines.
    Json,
}

/// The logging format parse error.
#[derive(Clone, Debug)]
pub struct FormatParseError(String);

impl fmt::Display for FormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"error parsing "{}" as format: expected one of "auto", "pretty", "simplified", "json""#,
            self.0
        )
    }
}

impl std::str::FromStr for LogFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let result = match s {
            "" => LogFormat::Auto,
            s if s.eq_ignore_ascii_case("auto") => LogFormat::Auto,
            s if s.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            s if s.eq_ignore_ascii_case("simplified") => LogFormat::Simplified,
            s if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            s => return Err(FormatParseError(s.into())),
        };

        Ok(result)
    }
}

impl std::error::Error for FormatParseError {}

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

/// Logging configuration.
///
/// Logs are always written to stderr, so they never mix with the summary on stdout.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// `RUST_LOG` takes precedence if it is set. `TRACE` logs every single record.
    ///
    /// # Default
    ///
    /// `INFO`
    ///
    /// # Environment Variable
    ///
    /// `AMMO__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format.
    ///
    /// # Default
    ///
    /// `Auto` (pretty for TTY, simplified otherwise)
    ///
    /// # Environment Variable
    ///
    /// `AMMO__LOGGING__FORMAT`
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

/// Sentry error reporting configuration.
///
/// Failed generations are reported as events when a DSN is configured.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Sentry {
    /// The DSN of the Sentry project. Reporting is disabled without it.
    pub dsn: Option<String>,

    /// The environment attached to events, such as `ci` or `staging`.
    pub environment: Option<String>,

    /// Share of events that are sent, between `0.0` and `1.0`.
    pub sample_rate: f32,
}

impl Sentry {
    /// Returns `true` if a DSN is configured.
    pub fn is_enabled(&self) -> bool {
        self.dsn.is_some()
    }
}

impl Default for Sentry {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
        }
    }
}

/// Configuration of the thread pool running generation jobs.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Runtime {
    /// Maximum number of files generated at the same time.
    ///
    /// # Default
    ///
    /// The available parallelism of the machine.
    ///
    /// # Environment Variable
    ///
    /// `AMMO__RUNTIME__MAX_JOBS`
    pub max_jobs: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            max_jobs: available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// The parameters of a single workload, tagged by its `mode`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum WorkloadConfig {
    /// See [`Workload::Put`].
    Put {
        /// Number of records.
        shots: u64,
        /// Overrides [`Config::value_len`].
        value_len: Option<ByteSize>,
    },
    /// See [`Workload::Get`].
    Get {
        /// Number of records.
        shots: u64,
        /// Number of keys assumed to exist.
        population_size: u64,
    },
    /// See [`Workload::Mixed`].
    Mixed {
        /// Number of records.
        shots: u64,
        /// Overrides [`Config::value_len`].
        value_len: Option<ByteSize>,
        /// Number of keys assumed to exist.
        current_db_size: u64,
    },
}

impl WorkloadConfig {
    /// Resolves the workload, falling back to `default_value_len` for unset value lengths.
    pub fn to_workload(&self, default_value_len: ByteSize) -> Result<Workload> {
        let value_len = |value_len: Option<ByteSize>| -> Result<usize> {
            let value_len = value_len.unwrap_or(default_value_len).as_u64();
            usize::try_from(value_len)
                .with_context(|| format!("value length {value_len} is too large"))
        };

        Ok(match *self {
            WorkloadConfig::Put { shots, value_len: len } => Workload::Put {
                shots,
                value_len: value_len(len)?,
            },
            WorkloadConfig::Get {
                shots,
                population_size,
            } => Workload::Get {
                shots,
                population_size,
            },
            WorkloadConfig::Mixed {
                shots,
                value_len: len,
                current_db_size,
            } => Workload::Mixed {
                shots,
                value_len: value_len(len)?,
                current_db_size,
            },
        })
    }
}

/// A single ammo file to generate.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Job {
    /// Path of the ammo file. Existing files are replaced.
    pub output: PathBuf,

    /// What to write into the file.
    #[serde(flatten)]
    pub workload: WorkloadConfig,
}

/// Main configuration struct for the ammo generator.
///
/// See the [module docs](self) for the sources configuration is loaded from.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Seed of the random sequence driving every job.
    ///
    /// Every job starts from this seed, so its output does not depend on the other jobs.
    ///
    /// # Default
    ///
    /// `0`
    ///
    /// # Environment Variable
    ///
    /// `AMMO__SEED`
    pub seed: u64,

    /// Value length for put requests of jobs that do not set their own.
    ///
    /// # Default
    ///
    /// `256 B`
    ///
    /// # Environment Variable
    ///
    /// `AMMO__VALUE_LEN`
    pub value_len: ByteSize,

    /// Configuration of the job runtime.
    pub runtime: Runtime,

    /// Logging configuration.
    pub logging: Logging,

    /// Sentry error reporting configuration.
    pub sentry: Sentry,

    /// The files generated by `make-ammo run`.
    pub jobs: Vec<Job>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            value_len: ByteSize::b(DEFAULT_VALUE_LEN as u64),
            runtime: Runtime::default(),
            logging: Logging::default(),
            sentry: Sentry::default(),
            jobs: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the provided arguments.
    ///
    /// Configuration is merged in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. YAML configuration file (if provided)
    /// 3. Environment variables (prefixed with `AMMO__`)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load configuration")?;

        Ok(config)
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

            assert_eq!(config.seed, DEFAULT_SEED);
            assert_eq!(config.value_len, ByteSize::b(256));
            assert_eq!(config.logging.level, LevelFilter::INFO);
            assert_eq!(config.logging.format, LogFormat::Auto);
            assert!(!config.sentry.is_enabled());
            assert!(config.runtime.max_jobs > 0);
            assert!(config.jobs.is_empty());

            Ok(())
        });
    }

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("AMMO__SEED", "7");
            jail.set_env("AMMO__VALUE_LEN", "1KiB");
            jail.set_env("AMMO__RUNTIME__MAX_JOBS", "3");
            jail.set_env("AMMO__LOGGING__LEVEL", "debug");
            jail.set_env("AMMO__LOGGING__FORMAT", "json");
            jail.set_env("AMMO__SENTRY__DSN", "https://key@sentry.example.com/1");
            jail.set_env("AMMO__SENTRY__SAMPLE_RATE", "0.5");

            let config = Config::load(None).unwrap();

            assert_eq!(config.seed, 7);
            assert_eq!(config.value_len, ByteSize::kib(1));
            assert_eq!(config.runtime.max_jobs, 3);
            assert_eq!(config.logging.level, LevelFilter::DEBUG);
            assert_eq!(config.logging.format, LogFormat::Json);
            assert!(config.sentry.is_enabled());
            assert_eq!(config.sentry.sample_rate, 0.5);

            Ok(())
        });
    }

    #[test]
    fn configurable_via_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            seed: 3
            value_len: 4 KiB
            jobs:
              - output: put.ammo
                mode: put
                shots: 100
              - output: get.ammo
                mode: get
                shots: 50
                population_size: 100
              - output: mixed.ammo
                mode: mixed
                shots: 10
                value_len: 16
                current_db_size: 100
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|_jail| {
            let config = Config::load(Some(tempfile.path())).unwrap();

            assert_eq!(config.seed, 3);
            assert_eq!(config.value_len, ByteSize::kib(4));
            assert_eq!(
                config.jobs,
                vec![
                    Job {
                        output: "put.ammo".into(),
                        workload: WorkloadConfig::Put {
                            shots: 100,
                            value_len: None,
                        },
                    },
                    Job {
                        output: "get.ammo".into(),
                        workload: WorkloadConfig::Get {
                            shots: 50,
                            population_size: 100,
                        },
                    },
                    Job {
                        output: "mixed.ammo".into(),
                        workload: WorkloadConfig::Mixed {
                            shots: 10,
                            value_len: Some(ByteSize::b(16)),
                            current_db_size: 100,
                        },
                    },
                ]
            );

            Ok(())
        });
    }

    #[test]
    fn configured_with_env_and_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            seed: 3
            logging:
              level: warn
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|jail| {
            jail.set_env("AMMO__SEED", "9");

            let config = Config::load(Some(tempfile.path())).unwrap();

            // Env should overwrite the yaml config
            assert_eq!(config.seed, 9);
            assert_eq!(config.logging.level, LevelFilter::WARN);
            assert_eq!(config.logging.format, LogFormat::Auto);

            Ok(())
        });
    }

    #[test]
    fn missing_config_file_fails() {
        figment::Jail::expect_with(|jail| {
            let path = jail.directory().join("missing.yaml");
            assert!(Config::load(Some(&path)).is_err());
            Ok(())
        });
    }

    #[test]
    fn job_value_len_falls_back_to_default() {
        let job = WorkloadConfig::Mixed {
            shots: 10,
            value_len: None,
            current_db_size: 5,
        };
        assert_eq!(
            job.to_workload(ByteSize::b(32)).unwrap(),
            Workload::Mixed {
                shots: 10,
                value_len: 32,
                current_db_size: 5,
            }
        );

        let job = WorkloadConfig::Put {
            shots: 10,
            value_len: Some(ByteSize::b(8)),
        };
        assert_eq!(
            job.to_workload(ByteSize::b(32)).unwrap(),
            Workload::Put {
                shots: 10,
                value_len: 8,
            }
        );
    }

    #[test]
    fn parses_log_formats() {
        assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Auto);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(
            "Simplified".parse::<LogFormat>().unwrap(),
            LogFormat::Simplified
        );
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
