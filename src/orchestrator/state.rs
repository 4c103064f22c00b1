//! Run states and outcomes

use std::fmt;

use crate::error::{ProvisionError, Result};

/// Linear progress of a run. Any failure jumps straight to `CleanedUp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProvisionState {
    Init,
    ResourceGroupCreated,
    StorageCreated,
    BlobsUploaded,
    WebAppCreated,
    Deployed,
    WarmedUp,
    CleanedUp,
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProvisionState::Init => "init",
            ProvisionState::ResourceGroupCreated => "resource group created",
            ProvisionState::StorageCreated => "storage created",
            ProvisionState::BlobsUploaded => "blobs uploaded",
            ProvisionState::WebAppCreated => "web app created",
            ProvisionState::Deployed => "deployed",
            ProvisionState::WarmedUp => "warmed up",
            ProvisionState::CleanedUp => "cleaned up",
        };
        f.write_str(label)
    }
}

/// What the cleanup phase did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted { resource_group: String },
    NothingToCleanUp,
    Failed { resource_group: String, reason: String },
}

/// Result of a full run; never carries a cleanup error in `error`
#[derive(Debug)]
pub struct RunOutcome {
    /// Last state reached before cleanup
    pub reached: ProvisionState,
    pub error: Option<ProvisionError>,
    pub cleanup: CleanupOutcome,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
