use std::path::PathBuf;

use anyhow::{Result, bail};
use argh::FromArgs;
use bytesize::ByteSize;

use crate::config::{Config, Job, WorkloadConfig};
use crate::{jobs, observability};

/// Generate ammo files for load-testing the entity API of a key-value store.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,

    /// seed of the random sequence, overrides the configuration
    #[argh(option, short = 's')]
    pub seed: Option<u64>,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Put(PutCommand),
    Get(GetCommand),
    Mixed(MixedCommand),
    Run(RunCommand),
    Version(VersionCommand),
}

/// write puts to the distinct keys 0..shots in random order
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "put")]
struct PutCommand {
    /// number of requests
    #[argh(option, short = 'n')]
    shots: u64,

    /// length of every value, such as `256` or `4KiB`
    #[argh(option)]
    value_len: Option<ByteSize>,

    /// path of the ammo file to write
    #[argh(option, short = 'o')]
    output: PathBuf,
}

/// write gets of uniformly random keys of an existing population
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "get")]
struct GetCommand {
    /// number of requests
    #[argh(option, short = 'n')]
    shots: u64,

    /// number of keys in the store, starting at 0
    #[argh(option)]
    population_size: u64,

    /// path of the ammo file to write
    #[argh(option, short = 'o')]
    output: PathBuf,
}

/// write a random mix of gets of existing keys and puts of new keys
///
/// At most half of the requests are puts. They target the keys starting at the current database
/// size.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "mixed")]
struct MixedCommand {
    /// number of requests
    #[argh(option, short = 'n')]
    shots: u64,

    /// length of every value, such as `256` or `4KiB`
    #[argh(option)]
    value_len: Option<ByteSize>,

    /// number of keys in the store, starting at 0
    #[argh(option)]
    current_db_size: u64,

    /// path of the ammo file to write
    #[argh(option, short = 'o')]
    output: PathBuf,
}

/// generate every job listed in the configuration file
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "run")]
struct RunCommand {}

/// print the version of the generator
#[derive(Default, Debug, FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCommand {}

impl Command {
    /// The jobs to run for this command, taking the configured jobs for `run`.
    fn into_jobs(self, config: &mut Config) -> Result<Vec<Job>> {
        let job = match self {
            Command::Put(PutCommand {
                shots,
                value_len,
                output,
            }) => Job {
                output,
                workload: WorkloadConfig::Put { shots, value_len },
            },
            Command::Get(GetCommand {
                shots,
                population_size,
                output,
            }) => Job {
                output,
                workload: WorkloadConfig::Get {
                    shots,
                    population_size,
                },
            },
            Command::Mixed(MixedCommand {
                shots,
                value_len,
                current_db_size,
                output,
            }) => Job {
                output,
                workload: WorkloadConfig::Mixed {
                    shots,
                    value_len,
                    current_db_size,
                },
            },
            Command::Run(RunCommand {}) => {
                if config.jobs.is_empty() {
                    bail!("no jobs configured, add them to the `jobs` list of the config file");
                }
                return Ok(std::mem::take(&mut config.jobs));
            }
            Command::Version(VersionCommand {}) => unreachable!(),
        };

        Ok(vec![job])
    }
}

/// Bootstrap the runtime and execute the CLI command.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    // Special switch to just print the version and exit.
    if let Command::Version(_) = args.command {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    // Sentry should be initialized before creating the async runtime.
    let _sentry_guard = observability::init_sentry(&config);
    observability::init_tracing(&config);
    tracing::debug!(?config);

    let result = generate(args.command, config);
    if let Err(ref error) = result {
        tracing::error!("ammo generation failed: {error:#}");
    }

    result
}

fn generate(command: Command, mut config: Config) -> Result<()> {
    if config.runtime.max_jobs == 0 {
        bail!("runtime.max_jobs must be at least 1");
    }
    let jobs = command.into_jobs(&mut config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .thread_name("ammo-rt")
        .max_blocking_threads(config.runtime.max_jobs)
        .build()?;

    let reports = runtime.block_on(jobs::run(jobs, config.seed, config.value_len))?;
    jobs::print_reports(&reports);

    Ok(())
}
