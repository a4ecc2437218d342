//! Command line front end of the ammo generator.
//!
//! This builds on top of [`ammo_workload`] and adds configuration, logging and the concurrent
//! execution of several generation jobs, one ammo file each.

pub mod cli;
pub mod config;
pub mod jobs;
pub mod observability;
