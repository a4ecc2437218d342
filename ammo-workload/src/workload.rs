//! The workload shapes that can be rendered into an ammo file.
//!
//! A [`Workload`] describes what to generate; [`Workload::records`] turns it into a lazy stream of
//! [`AmmoRecord`]s driven by a single random sequence seeded for this pass. All parameters are
//! validated before the first draw, so a stream that was created successfully never fails.

use std::fmt;
use std::io::Write;
use std::path::Path;

use rand::Rng;

use crate::error::{InvalidArgument, Result};
use crate::request::{AmmoRecord, Request};
use crate::sampler::{AmmoRng, DistinctKeys, PutStream, UniformKeys, Values, seeded_rng};
use crate::writer::{AmmoWriter, WriteStats};

/// The seed used when none is configured.
pub const DEFAULT_SEED: u64 = 0;

/// The value length used when none is configured.
pub const DEFAULT_VALUE_LEN: usize = 256;

/// One of the supported request mixes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Workload {
    /// Fill an empty store: `shots` puts to the distinct keys `0..shots` in random order.
    Put {
        /// Number of records.
        shots: u64,
        /// Length of every value in bytes.
        value_len: usize,
    },
    /// Read random keys of a populated store, with repetition.
    Get {
        /// Number of records.
        shots: u64,
        /// Number of keys assumed to exist, starting at `0`.
        population_size: u64,
    },
    /// Interleave reads of existing keys with writes of new keys.
    ///
    /// At most `shots / 2` puts are emitted, to keys starting at `current_db_size`. Every shot
    /// flips a fair coin; once the puts are used up, the coin only decides between two reads.
    Mixed {
        /// Number of records.
        shots: u64,
        /// Length of every value in bytes.
        value_len: usize,
        /// Number of keys assumed to exist, starting at `0`.
        current_db_size: u64,
    },
}

impl Workload {
    /// The short name of the workload shape.
    pub fn name(&self) -> &'static str {
        match self {
            Workload::Put { .. } => "put",
            Workload::Get { .. } => "get",
            Workload::Mixed { .. } => "mixed",
        }
    }

    /// Validates the parameters and creates the record stream for a pass seeded with `seed`.
    pub fn records(&self, seed: u64) -> Result<Records, InvalidArgument> {
        let mut rng = seeded_rng(seed);

        let (shots, shape) = match *self {
            Workload::Put { shots, value_len } => {
                let values = Values::new(value_len, seed)?;
                let keys = DistinctKeys::sample(&mut rng, shots, None, 0)?;
                (shots, Shape::Put(PutStream::new(keys, values)))
            }
            Workload::Get {
                shots,
                population_size,
            } => (shots, Shape::Get(UniformKeys::new(population_size)?)),
            Workload::Mixed {
                shots,
                value_len,
                current_db_size,
            } => {
                let gets = UniformKeys::new(current_db_size)?;
                let values = Values::new(value_len, seed)?;
                let keys = DistinctKeys::sample(&mut rng, shots / 2, None, current_db_size)?;
                tracing::debug!(
                    max_puts = keys.len(),
                    first_new_key = current_db_size,
                    "prepared put stream"
                );
                let puts = PutStream::new(keys, values);
                (shots, Shape::Mixed { puts, gets })
            }
        };

        Ok(Records {
            rng,
            remaining: shots,
            shape,
        })
    }

    /// Generates the workload into `sink`.
    pub fn write_to<W: Write>(&self, seed: u64, sink: W) -> Result<WriteStats> {
        let records = self.records(seed)?;
        self.write_records(seed, records, AmmoWriter::new(sink))
    }

    /// Generates the workload into the file at `path`, replacing any existing file.
    ///
    /// The parameters are validated before the file is created.
    pub fn write_file(&self, seed: u64, path: &Path) -> Result<WriteStats> {
        let records = self.records(seed)?;
        let writer = AmmoWriter::create(path)?;
        self.write_records(seed, records, writer)
    }

    fn write_records<W: Write>(
        &self,
        seed: u64,
        records: Records,
        mut writer: AmmoWriter<W>,
    ) -> Result<WriteStats> {
        tracing::info!(workload = %self, seed, "generating ammo");

        writer.write_records(records)?;
        let stats = writer.finish()?;

        tracing::info!(
            records = stats.records,
            puts = stats.puts,
            gets = stats.gets,
            bytes = stats.bytes,
            "finished writing ammo"
        );
        Ok(stats)
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workload::Put { shots, value_len } => {
                write!(f, "put(shots={shots}, value_len={value_len})")
            }
            Workload::Get {
                shots,
                population_size,
            } => write!(f, "get(shots={shots}, population_size={population_size})"),
            Workload::Mixed {
                shots,
                value_len,
                current_db_size,
            } => write!(
                f,
                "mixed(shots={shots}, value_len={value_len}, current_db_size={current_db_size})"
            ),
        }
    }
}

#[derive(Debug)]
enum Shape {
    Put(PutStream),
    Get(UniformKeys),
    Mixed { puts: PutStream, gets: UniformKeys },
}

/// The lazily generated records of a [`Workload`].
///
/// Created by [`Workload::records`].
#[derive(Debug)]
pub struct Records {
    rng: AmmoRng,
    remaining: u64,
    shape: Shape,
}

impl Records {
    fn next_request(&mut self) -> Option<Request> {
        let request = match &mut self.shape {
            Shape::Put(puts) => {
                let (key, value) = puts.next()?;
                Request::Put { key, value }
            }
            Shape::Get(gets) => Request::Get {
                key: gets.draw(&mut self.rng),
            },
            Shape::Mixed { puts, gets } => {
                // The coin is always flipped first, then exactly one key is drawn or pulled.
                let is_get: bool = self.rng.random();
                if is_get {
                    Request::Get {
                        key: gets.draw(&mut self.rng),
                    }
                } else if let Some((key, value)) = puts.next() {
                    Request::Put { key, value }
                } else {
                    tracing::trace!("put stream exhausted, emitting get instead");
                    Request::Get {
                        key: gets.draw(&mut self.rng),
                    }
                }
            }
        };

        Some(request)
    }
}

impl Iterator for Records {
    type Item = AmmoRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        self.next_request().map(|request| request.encode())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}
