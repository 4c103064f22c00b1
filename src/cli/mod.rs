//! CLI module for azprov
//!
//! Command definitions, argument parsing and the wiring of real services into
//! a provisioning run.

pub mod commands;

pub use commands::*;
