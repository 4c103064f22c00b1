//! General utility helper functions
//!
//! Connection string assembly and blob name derivation.

use crate::error::{ProvisionError, Result};

/// Build the conventional storage connection string for an account key
pub fn storage_connection_string(account_name: &str, account_key: &str) -> String {
    format!(
        "DefaultEndpointsProtocol=https;AccountName={};AccountKey={}",
        account_name, account_key
    )
}

/// Derive a blob name from a local file path by stripping every directory component.
///
/// Both `/` and `\` count as separators, and trailing or repeated separators are
/// ignored.
pub fn derive_blob_name(path: &str) -> Result<String> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
        .ok_or_else(|| {
            ProvisionError::invalid_argument(format!("Cannot derive a blob name from '{}'", path))
        })
}
