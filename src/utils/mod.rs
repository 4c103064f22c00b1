//! Utility functions module
//!
//! Name generation, connection string helpers and HTTP client setup.

pub mod helpers;
pub mod names;
pub mod network;

pub use helpers::*;
pub use names::*;
pub use network::*;
