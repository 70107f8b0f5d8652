//! Pulseboard library
//!
//! Exposes the sync engine and its building blocks, plus the CLI parsing used
//! by the binary and its integration tests.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod data;
pub mod fetch;
pub mod freshness;
pub mod indicator;
pub mod logging;
pub mod sync;
