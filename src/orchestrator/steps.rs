//! Provisioning steps
//!
//! Each step does one piece of the provisioning sequence and records what it
//! created in the [`RunContext`]. The orchestrator runs them in order and stops
//! at the first error.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::context::RunContext;
use super::state::ProvisionState;
use crate::azure::models::{
    AppServicePlanRequest, ConnectionStringEntry, ConnectionStringType, StorageAccountRequest,
    WebAppRequest,
};
use crate::blob::models::{StorageConnection, UploadedBlob};
use crate::error::{ProvisionError, Result};
use crate::utils::helpers::derive_blob_name;

const BODY_PREVIEW_CHARS: usize = 200;

#[async_trait]
pub trait ProvisionStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// State the run is in once this step succeeds
    fn completes(&self) -> ProvisionState;

    async fn execute(&self, ctx: &mut RunContext) -> Result<()>;
}

/// The full provisioning sequence in order
pub fn default_steps() -> Vec<Box<dyn ProvisionStep>> {
    vec![
        Box::new(CreateResourceGroup),
        Box::new(CreateStorageAccount),
        Box::new(UploadBlobs),
        Box::new(CreateWebApp),
        Box::new(DeployArchive),
        Box::new(WarmUp),
    ]
}

pub struct CreateResourceGroup;

#[async_trait]
impl ProvisionStep for CreateResourceGroup {
    fn name(&self) -> &'static str {
        "create resource group"
    }

    fn completes(&self) -> ProvisionState {
        ProvisionState::ResourceGroupCreated
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let services = ctx.services.clone();
        let name = ctx.plan.resource_group.clone();
        let region = ctx.plan.region.clone();

        services
            .reporter
            .info(&format!("Creating resource group {} in {}...", name, region));
        ctx.reserve_resource_group(&name);
        let group = match services.resources.create_resource_group(&name, &region).await {
            Ok(group) => group,
            Err(e) => {
                if e.is_rejection() {
                    ctx.cancel_reservation();
                }
                return Err(e);
            }
        };
        services
            .reporter
            .success(&format!("Created resource group {}", group.name));

        ctx.acquire_resource_group(group);
        Ok(())
    }
}

pub struct CreateStorageAccount;

#[async_trait]
impl ProvisionStep for CreateStorageAccount {
    fn name(&self) -> &'static str {
        "create storage account"
    }

    fn completes(&self) -> ProvisionState {
        ProvisionState::StorageCreated
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let services = ctx.services.clone();
        let request = StorageAccountRequest {
            name: ctx.plan.storage_account.clone(),
            resource_group: ctx.resource_group()?.name.clone(),
            region: ctx.plan.region.clone(),
            sku: ctx.plan.storage_sku.clone(),
            kind: ctx.plan.storage_kind.clone(),
        };

        services
            .reporter
            .info(&format!("Creating storage account {}...", request.name));
        let account = services.resources.create_storage_account(&request).await?;
        services
            .reporter
            .success(&format!("Created storage account {}", account.name));

        let keys = services
            .resources
            .list_storage_keys(&request.resource_group, &account.name)
            .await?;
        let key = keys
            .into_iter()
            .next()
            .ok_or_else(|| ProvisionError::no_storage_keys(account.name.clone()))?;
        tracing::debug!("Using storage key {} of {}", key.key_name, account.name);

        ctx.storage = Some(StorageConnection::new(
            account.name,
            key.value.as_str().to_string(),
        ));
        Ok(())
    }
}

pub struct UploadBlobs;

#[async_trait]
impl ProvisionStep for UploadBlobs {
    fn name(&self) -> &'static str {
        "upload blobs"
    }

    fn completes(&self) -> ProvisionState {
        ProvisionState::BlobsUploaded
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let services = ctx.services.clone();
        let connection = ctx.storage()?.clone();
        let container = ctx.plan.container.clone();
        let jobs = upload_jobs(&ctx.plan.upload_files)?;
        let count = jobs.len();

        services.reporter.info(&format!(
            "Uploading {} blobs to container {}...",
            count, container
        ));
        services
            .blobs
            .ensure_container(&connection, &container)
            .await?;

        let uploaded: Vec<UploadedBlob> = stream::iter(jobs)
            .map(|(path, blob_name)| {
                let blobs = services.blobs.clone();
                let connection = connection.clone();
                let container = container.clone();
                async move {
                    tracing::debug!("Uploading {} as {}", path.display(), blob_name);
                    blobs
                        .upload_file(&connection, &container, &path, &blob_name)
                        .await
                }
            })
            .buffered(ctx.plan.max_concurrent_uploads)
            .try_collect()
            .await?;

        services
            .reporter
            .success(&format!("Uploaded {} blobs", uploaded.len()));
        ctx.uploaded = uploaded;
        Ok(())
    }
}

fn upload_jobs(files: &[PathBuf]) -> Result<Vec<(PathBuf, String)>> {
    files
        .iter()
        .map(|path| Ok((path.clone(), derive_blob_name(&path.to_string_lossy())?)))
        .collect()
}

pub struct CreateWebApp;

#[async_trait]
impl ProvisionStep for CreateWebApp {
    fn name(&self) -> &'static str {
        "create web app"
    }

    fn completes(&self) -> ProvisionState {
        ProvisionState::WebAppCreated
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let services = ctx.services.clone();
        let plan = &ctx.plan;

        let app_settings = BTreeMap::from([
            (plan.container_setting_name.clone(), plan.container.clone()),
            (plan.port_setting_name.clone(), plan.port_value.clone()),
        ]);
        let request = WebAppRequest {
            name: plan.web_app.clone(),
            resource_group: ctx.resource_group()?.name.clone(),
            region: plan.region.clone(),
            plan: AppServicePlanRequest {
                name: plan.app_service_plan.clone(),
                sku: plan.plan_sku.clone(),
            },
            connection_strings: vec![ConnectionStringEntry {
                name: plan.connection_string_name.clone(),
                value: ctx.storage()?.connection_string(),
                kind: ConnectionStringType::Custom,
            }],
            app_settings,
            runtime: plan.runtime.clone(),
        };

        services
            .reporter
            .info(&format!("Creating web app {}...", request.name));
        let app = services.resources.create_web_app(&request).await?;
        services
            .reporter
            .success(&format!("Created web app {} at {}", app.name, app.url()));

        ctx.web_app = Some(app);
        Ok(())
    }
}

pub struct DeployArchive;

#[async_trait]
impl ProvisionStep for DeployArchive {
    fn name(&self) -> &'static str {
        "deploy archive"
    }

    fn completes(&self) -> ProvisionState {
        ProvisionState::Deployed
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let services = ctx.services.clone();
        let app_name = ctx.web_app()?.name.clone();
        let resource_group = ctx.resource_group()?.name.clone();
        let archive = ctx.plan.deploy_archive.clone();
        let destination = ctx.plan.destination.clone();
        let archive_name = file_label(&archive);

        services.reporter.info(&format!(
            "Deploying {} to web app {}...",
            archive_name, app_name
        ));
        let profile = services
            .resources
            .get_publish_profile(&resource_group, &app_name)
            .await?;
        let written = services
            .publisher
            .publish(&profile, &archive, &destination)
            .await?;
        services.reporter.success(&format!(
            "Deployment of {} to {} completed ({} bytes)",
            archive_name,
            destination.display_path(),
            written
        ));

        ctx.deployed_bytes = Some(written);
        Ok(())
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Advisory probe of the deployed app. Never fails the run.
pub struct WarmUp;

#[async_trait]
impl ProvisionStep for WarmUp {
    fn name(&self) -> &'static str {
        "warm up"
    }

    fn completes(&self) -> ProvisionState {
        ProvisionState::WarmedUp
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        let services = ctx.services.clone();
        let url = ctx.web_app()?.url();
        let attempts = ctx.plan.warmup.attempts.max(1);
        let delay = ctx.plan.warmup.delay;

        services.reporter.info(&format!("Warming up {}...", url));
        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(delay).await;
            }

            match services.probe.get(&url).await {
                Ok(response) => services.reporter.info(&format!(
                    "Warm-up {}/{}: HTTP {} {}",
                    attempt,
                    attempts,
                    response.status,
                    preview(&response.body)
                )),
                Err(e) => services.reporter.warn(&format!(
                    "Warm-up request {}/{} failed: {}",
                    attempt, attempts, e
                )),
            }
        }

        Ok(())
    }
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    let mut preview: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
    if trimmed.chars().count() > BODY_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview.replace(['\r', '\n'], " ")
}
