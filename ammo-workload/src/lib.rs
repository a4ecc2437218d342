//! Deterministic generation of load-testing ammo for the entity API of a key-value store.
//!
//! An ammo file is a concatenation of length-prefixed, tagged HTTP/1.1 requests that a load
//! generator replays against the store. This crate produces three shapes of traffic:
//!
//! - [`Workload::Put`] fills an empty store with distinct keys in random order.
//! - [`Workload::Get`] reads uniformly random keys of a populated store.
//! - [`Workload::Mixed`] interleaves reads of existing keys with writes of new keys.
//!
//! Every pass is driven by a single random sequence seeded from a caller-supplied seed, so the
//! same workload and seed always produce byte-identical output.
//!
//! ```no_run
//! use ammo_workload::{DEFAULT_SEED, Workload};
//!
//! let workload = Workload::Put { shots: 1_000, value_len: 256 };
//! let stats = workload.write_file(DEFAULT_SEED, "put.ammo".as_ref())?;
//! assert_eq!(stats.puts, 1_000);
//! # Ok::<_, ammo_workload::AmmoError>(())
//! ```
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod key;
pub mod request;
pub mod sampler;
pub mod workload;
pub mod writer;

pub use crate::error::{AmmoError, InvalidArgument};
pub use crate::key::Key;
pub use crate::request::{AmmoRecord, Request, Tag};
pub use crate::workload::{DEFAULT_SEED, DEFAULT_VALUE_LEN, Records, Workload};
pub use crate::writer::{AmmoWriter, WriteStats};
