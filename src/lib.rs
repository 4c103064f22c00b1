//! azprov - Azure web app provisioning walkthrough
//!
//! Creates a resource group, a storage account with uploaded blobs and a web
//! app wired to that storage, deploys an archive over FTP, warms the app up and
//! always deletes the resource group again.

pub mod auth;
pub mod azure;
pub mod blob;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod orchestrator;
pub mod utils;

// Re-export commonly used types
pub use error::{ProvisionError, Result};
pub use orchestrator::{Orchestrator, RunOutcome, Services};
