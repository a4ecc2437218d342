//! Generates ammo files for load-testing the entity API of a key-value store.
//!
//! See `make-ammo --help` for the available commands.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    ammo_cli::cli::execute()
}
