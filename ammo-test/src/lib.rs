//! Helpers shared by the tests of the ammo crates.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod ammo;
pub mod tracing;
