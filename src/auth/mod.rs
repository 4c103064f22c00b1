//! Authentication module for Azure services
//!
//! Service principal credentials are read from the environment and turned into
//! a token provider for Azure Resource Manager calls.

pub mod provider;

pub use provider::*;
