//! Azure Blob Storage uploads
//!
//! Files configured for a run are uploaded into a single container of the
//! storage account the run created.

pub mod manager;
pub mod models;

pub use manager::{AzureBlobStore, BlobStore};
pub use models::*;
