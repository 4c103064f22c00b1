//! Blob upload into the run's storage account
//!
//! Uses the account key returned by the Resource Manager, so no data-plane role
//! assignment is needed on the freshly created account.

use async_trait::async_trait;
use azure_storage::StorageCredentials;
use azure_storage_blobs::prelude::*;
use std::path::Path;

use super::models::{StorageConnection, UploadedBlob};
use crate::error::{ProvisionError, Result};

/// Trait for blob storage access
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the container if it does not exist yet
    async fn ensure_container(&self, connection: &StorageConnection, container: &str) -> Result<()>;

    /// Upload a local file as a block blob, overwriting any existing blob
    async fn upload_file(
        &self,
        connection: &StorageConnection,
        container: &str,
        path: &Path,
        blob_name: &str,
    ) -> Result<UploadedBlob>;
}

/// Azure Blob Storage implementation
#[derive(Debug, Default, Clone)]
pub struct AzureBlobStore;

impl AzureBlobStore {
    pub fn new() -> Self {
        Self
    }

    fn container_client(connection: &StorageConnection, container: &str) -> ContainerClient {
        let credentials = StorageCredentials::access_key(
            connection.account_name.clone(),
            connection.account_key.as_str().to_string(),
        );
        ClientBuilder::new(connection.account_name.clone(), credentials).container_client(container)
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn ensure_container(&self, connection: &StorageConnection, container: &str) -> Result<()> {
        let client = Self::container_client(connection, container);

        let exists = client.exists().await.map_err(|e| {
            ProvisionError::azure_api(format!(
                "Failed to check container {}: {}",
                container, e
            ))
        })?;
        if exists {
            tracing::debug!("Container {} already exists", container);
            return Ok(());
        }

        match client.create().await {
            Ok(_) => {
                tracing::debug!("Created container {}", container);
                Ok(())
            }
            Err(e) if e.to_string().contains("ContainerAlreadyExists") => Ok(()),
            Err(e) => Err(ProvisionError::azure_api(format!(
                "Failed to create container {}: {}",
                container, e
            ))),
        }
    }

    async fn upload_file(
        &self,
        connection: &StorageConnection,
        container: &str,
        path: &Path,
        blob_name: &str,
    ) -> Result<UploadedBlob> {
        let content = tokio::fs::read(path).await?;
        let size = content.len() as u64;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        let blob_client = Self::container_client(connection, container).blob_client(blob_name);
        blob_client
            .put_block_blob(content)
            .content_type(content_type.clone())
            .await
            .map_err(|e| {
                ProvisionError::azure_api(format!("Failed to upload blob {}: {}", blob_name, e))
            })?;

        Ok(UploadedBlob {
            name: blob_name.to_string(),
            source: path.to_path_buf(),
            size,
            content_type,
        })
    }
}
