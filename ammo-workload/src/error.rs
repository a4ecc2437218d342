//! Errors raised while generating ammo.

use thiserror::Error;

/// Errors that can occur while generating ammo.
#[derive(Debug, Error)]
pub enum AmmoError {
    /// The workload parameters cannot produce a well-formed ammo file.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    /// The output sink could not be created or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons for rejecting workload parameters.
///
/// All of these are detected before the first record is produced.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvalidArgument {
    /// More distinct keys were requested than the population holds.
    #[error("cannot sample {count} distinct keys from a population of {population}")]
    SampleTooLarge {
        /// Number of requested keys.
        count: u64,
        /// Size of the key population.
        population: u64,
    },

    /// Keys were requested from an empty population.
    #[error("key population must not be empty")]
    EmptyPopulation,

    /// Values must be at least one byte long.
    #[error("value length must be positive")]
    ZeroValueLength,

    /// The key range `[offset, offset + population)` does not fit into a key.
    #[error("key range starting at {offset} with {population} keys overflows")]
    RangeOverflow {
        /// First key of the range.
        offset: u64,
        /// Size of the key population.
        population: u64,
    },

    /// The population is too large to be sampled on this platform.
    #[error("population of {0} keys is too large to sample")]
    PopulationTooLarge(u64),
}

/// Result alias for ammo generation.
pub type Result<T, E = AmmoError> = std::result::Result<T, E>;
