//! Run context and the resource group lease

use std::sync::Arc;

use super::interaction::Interaction;
use super::plan::RunPlan;
use super::reporter::Reporter;
use super::state::{CleanupOutcome, ProvisionState};
use crate::azure::models::{ResourceGroup, WebApp};
use crate::azure::operations::ResourceManager;
use crate::blob::manager::BlobStore;
use crate::blob::models::{StorageConnection, UploadedBlob};
use crate::deploy::ftp::ArchivePublisher;
use crate::deploy::probe::HttpProbe;
use crate::error::{ProvisionError, Result};

/// External collaborators of a run
#[derive(Clone)]
pub struct Services {
    pub resources: Arc<dyn ResourceManager>,
    pub blobs: Arc<dyn BlobStore>,
    pub publisher: Arc<dyn ArchivePublisher>,
    pub probe: Arc<dyn HttpProbe>,
    pub reporter: Arc<dyn Reporter>,
    pub interaction: Arc<dyn Interaction>,
}

/// Ownership of the run's resource group.
///
/// A lease is taken out under the planned name before the create request is
/// sent and confirmed once the group exists, so an interrupted create still
/// gets deleted by name. Releasing consumes the lease, so deletion can be
/// issued at most once.
#[derive(Debug)]
pub struct ResourceGroupLease {
    name: String,
    group: Option<ResourceGroup>,
}

impl ResourceGroupLease {
    pub fn new(group: ResourceGroup) -> Self {
        Self {
            name: group.name.clone(),
            group: Some(group),
        }
    }

    /// Lease on a group whose create request may still be in flight
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The created group, once the create request returned
    pub fn group(&self) -> Option<&ResourceGroup> {
        self.group.as_ref()
    }

    pub fn confirm(&mut self, group: ResourceGroup) {
        self.name = group.name.clone();
        self.group = Some(group);
    }

    /// Delete the resource group. Failures are reported and returned as an
    /// outcome, never as an error.
    pub async fn release(self, resources: &dyn ResourceManager, reporter: &dyn Reporter) -> CleanupOutcome {
        let name = self.name;
        reporter.info(&format!("Deleting Resource Group: {}", name));

        match resources.delete_resource_group(&name).await {
            Ok(()) => {
                reporter.success(&format!("Deleted Resource Group: {}", name));
                CleanupOutcome::Deleted {
                    resource_group: name,
                }
            }
            Err(e) => {
                reporter.error(&format!("Failed to delete Resource Group {}: {}", name, e));
                CleanupOutcome::Failed {
                    resource_group: name,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Mutable state threaded through the steps of one run
pub struct RunContext {
    pub plan: RunPlan,
    pub services: Services,
    pub state: ProvisionState,
    lease: Option<ResourceGroupLease>,
    pub storage: Option<StorageConnection>,
    pub uploaded: Vec<UploadedBlob>,
    pub web_app: Option<WebApp>,
    pub deployed_bytes: Option<u64>,
}

impl RunContext {
    pub fn new(plan: RunPlan, services: Services) -> Self {
        Self {
            plan,
            services,
            state: ProvisionState::Init,
            lease: None,
            storage: None,
            uploaded: Vec::new(),
            web_app: None,
            deployed_bytes: None,
        }
    }

    /// Take out a lease on the planned group before asking Azure to create it
    pub fn reserve_resource_group(&mut self, name: &str) {
        self.lease = Some(ResourceGroupLease::pending(name));
    }

    /// Forget a reservation whose create request left nothing behind
    pub fn cancel_reservation(&mut self) {
        if self.lease.as_ref().is_some_and(|lease| lease.group().is_none()) {
            self.lease = None;
        }
    }

    pub fn acquire_resource_group(&mut self, group: ResourceGroup) {
        match self.lease.as_mut() {
            Some(lease) => lease.confirm(group),
            None => self.lease = Some(ResourceGroupLease::new(group)),
        }
    }

    pub fn resource_group(&self) -> Result<&ResourceGroup> {
        self.lease
            .as_ref()
            .and_then(ResourceGroupLease::group)
            .ok_or_else(|| ProvisionError::invalid_argument("No resource group has been created"))
    }

    pub fn take_lease(&mut self) -> Option<ResourceGroupLease> {
        self.lease.take()
    }

    pub fn storage(&self) -> Result<&StorageConnection> {
        self.storage
            .as_ref()
            .ok_or_else(|| ProvisionError::invalid_argument("No storage account has been created"))
    }

    pub fn web_app(&self) -> Result<&WebApp> {
        self.web_app
            .as_ref()
            .ok_or_else(|| ProvisionError::invalid_argument("No web app has been created"))
    }
}
