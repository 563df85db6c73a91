//! Support library for the `aura` command-line tool.
//!
//! Holds the configuration file handling and the CLI error type so they can
//! be tested apart from the binary.

pub mod config;
pub mod error;
