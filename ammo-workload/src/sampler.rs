//! Deterministic key and value sampling.
//!
//! All sampling draws from an explicit [`AmmoRng`] owned by the caller. Two passes that start from
//! the same seed and request the same keys produce the same sequence.

use bytes::Bytes;
use rand::distr::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::seq::index;
use rand::{Rng, RngCore, SeedableRng};

use crate::error::InvalidArgument;
use crate::key::Key;

/// The random sequence threaded through a single generation pass.
pub type AmmoRng = SmallRng;

/// Mixed into the run seed so values come from a stream independent of the key draws.
const VALUE_SEED_SALT: u64 = 0x7661_6c75_6573_0000;

/// Creates a fresh random sequence for a generation pass.
pub fn seeded_rng(seed: u64) -> AmmoRng {
    SmallRng::seed_from_u64(seed)
}

/// A simple random sample of distinct keys, yielded in selection order.
#[derive(Debug)]
pub struct DistinctKeys {
    keys: std::vec::IntoIter<Key>,
}

impl DistinctKeys {
    /// Selects `count` distinct keys from `[offset, offset + population)`.
    ///
    /// A `population` of `None` or zero means the population is exactly `count` keys.
    pub fn sample<R: Rng + ?Sized>(
        rng: &mut R,
        count: u64,
        population: Option<u64>,
        offset: u64,
    ) -> Result<Self, InvalidArgument> {
        let population = match population {
            Some(population) if population > 0 => population,
            _ => count,
        };

        if count > population {
            return Err(InvalidArgument::SampleTooLarge { count, population });
        }
        if offset.checked_add(population).is_none() {
            return Err(InvalidArgument::RangeOverflow { offset, population });
        }
        if count == 0 {
            return Ok(Self {
                keys: Vec::new().into_iter(),
            });
        }

        let Ok(length) = usize::try_from(population) else {
            return Err(InvalidArgument::PopulationTooLarge(population));
        };
        // `count <= population`, so this always fits.
        let amount = count as usize;

        let keys: Vec<_> = index::sample(rng, length, amount)
            .into_iter()
            .map(|idx| Key(offset + idx as u64))
            .collect();

        Ok(Self {
            keys: keys.into_iter(),
        })
    }
}

impl Iterator for DistinctKeys {
    type Item = Key;

    fn next(&mut self) -> Option<Self::Item> {
        self.keys.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl ExactSizeIterator for DistinctKeys {}

/// Uniform draws with replacement from `[0, population)`.
#[derive(Clone, Debug)]
pub struct UniformKeys {
    distribution: Uniform<u64>,
}

impl UniformKeys {
    /// Creates a sampler over `population` keys, which must not be empty.
    pub fn new(population: u64) -> Result<Self, InvalidArgument> {
        let distribution =
            Uniform::new(0, population).map_err(|_| InvalidArgument::EmptyPopulation)?;
        Ok(Self { distribution })
    }

    /// Draws a single key, advancing `rng` by one sample.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Key {
        Key(self.distribution.sample(rng))
    }

    /// An endless stream of independent draws.
    pub fn stream<'a, R: Rng + ?Sized>(&'a self, rng: &'a mut R) -> impl Iterator<Item = Key> + 'a {
        std::iter::repeat_with(move || self.draw(rng))
    }
}

/// Random values of a fixed length.
#[derive(Debug)]
pub struct Values {
    len: usize,
    rng: SmallRng,
}

impl Values {
    /// Creates a value source for the pass seeded with `seed`.
    pub fn new(len: usize, seed: u64) -> Result<Self, InvalidArgument> {
        if len == 0 {
            return Err(InvalidArgument::ZeroValueLength);
        }

        Ok(Self {
            len,
            rng: SmallRng::seed_from_u64(seed ^ VALUE_SEED_SALT),
        })
    }

    /// The length of every generated value in bytes.
    pub fn value_len(&self) -> usize {
        self.len
    }

    /// Fills a fresh value with random bytes.
    pub fn next_value(&mut self) -> Bytes {
        let mut value = vec![0; self.len];
        self.rng.fill_bytes(&mut value);
        Bytes::from(value)
    }
}

/// Distinct keys paired with freshly generated values.
///
/// The stream is finite. Pulling from an exhausted stream returns `None` and leaves the key
/// sequence untouched.
#[derive(Debug)]
pub struct PutStream {
    keys: DistinctKeys,
    values: Values,
}

impl PutStream {
    /// Combines a key sample with a value source.
    pub fn new(keys: DistinctKeys, values: Values) -> Self {
        Self { keys, values }
    }

    /// Number of puts left in the stream.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl Iterator for PutStream {
    type Item = (Key, Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        Some((key, self.values.next_value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}
