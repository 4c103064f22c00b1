//! Data models for blob storage operations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

use crate::utils::helpers::storage_connection_string;

/// Account name and key for a freshly created storage account
#[derive(Clone)]
pub struct StorageConnection {
    pub account_name: String,
    pub account_key: Zeroizing<String>,
}

impl StorageConnection {
    pub fn new<S: Into<String>>(account_name: S, account_key: S) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: Zeroizing::new(account_key.into()),
        }
    }

    pub fn connection_string(&self) -> Zeroizing<String> {
        Zeroizing::new(storage_connection_string(
            &self.account_name,
            &self.account_key,
        ))
    }
}

impl fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConnection")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .finish()
    }
}

/// Result of one completed upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedBlob {
    pub name: String,
    pub source: PathBuf,
    pub size: u64,
    pub content_type: String,
}
