//! Resource Manager operations
//!
//! The [`ResourceManager`] trait is the seam between the orchestrator and Azure:
//! resource groups, storage accounts, web apps and publishing profiles.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::arm::{ArmClient, PollSettings};
use super::models::{
    ResourceGroup, StorageAccount, StorageAccountRequest, StorageKey, WebApp, WebAppRequest,
};
use crate::auth::provider::AzureAuthProvider;
use crate::deploy::publish_profile::PublishProfile;
use crate::error::{ProvisionError, Result};

const RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";
const STORAGE_API_VERSION: &str = "2023-01-01";
const WEB_API_VERSION: &str = "2022-09-01";

/// Trait for the cloud resource operations a run needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// Create (or update) a resource group and wait until it exists
    async fn create_resource_group(&self, name: &str, region: &str) -> Result<ResourceGroup>;

    /// Delete a resource group and everything nested under it
    async fn delete_resource_group(&self, name: &str) -> Result<()>;

    /// Create a storage account and wait for provisioning to finish
    async fn create_storage_account(&self, request: &StorageAccountRequest) -> Result<StorageAccount>;

    /// List the access keys of a storage account
    async fn list_storage_keys(&self, resource_group: &str, account: &str) -> Result<Vec<StorageKey>>;

    /// Create the app service plan and the site on it
    async fn create_web_app(&self, request: &WebAppRequest) -> Result<WebApp>;

    /// Fetch the FTP publishing profile of a site
    async fn get_publish_profile(&self, resource_group: &str, app: &str) -> Result<PublishProfile>;
}

/// Azure Resource Manager implementation over the REST API
pub struct AzureResourceManager {
    arm: ArmClient,
}

impl AzureResourceManager {
    pub fn new(
        auth_provider: Arc<dyn AzureAuthProvider>,
        endpoint: &str,
        subscription_id: String,
        poll: PollSettings,
    ) -> Result<Self> {
        Ok(Self {
            arm: ArmClient::new(auth_provider, endpoint, subscription_id, poll)?,
        })
    }

    fn storage_account_path(&self, resource_group: &str, account: &str) -> String {
        self.arm.provider_path(
            resource_group,
            "Microsoft.Storage",
            &format!("storageAccounts/{}", account),
        )
    }

    fn site_path(&self, resource_group: &str, app: &str) -> String {
        self.arm
            .provider_path(resource_group, "Microsoft.Web", &format!("sites/{}", app))
    }

    fn server_farm_path(&self, resource_group: &str, plan: &str) -> String {
        self.arm.provider_path(
            resource_group,
            "Microsoft.Web",
            &format!("serverfarms/{}", plan),
        )
    }
}

#[async_trait]
impl ResourceManager for AzureResourceManager {
    async fn create_resource_group(&self, name: &str, region: &str) -> Result<ResourceGroup> {
        let path = self.arm.resource_group_path(name);
        let body = json!({ "location": region });

        let value = self
            .arm
            .put_resource(&path, RESOURCE_GROUP_API_VERSION, &body)
            .await?;
        parse_resource_group(&value)
    }

    async fn delete_resource_group(&self, name: &str) -> Result<()> {
        let path = self.arm.resource_group_path(name);
        self.arm
            .delete_resource(&path, RESOURCE_GROUP_API_VERSION)
            .await
    }

    async fn create_storage_account(&self, request: &StorageAccountRequest) -> Result<StorageAccount> {
        let path = self.storage_account_path(&request.resource_group, &request.name);

        let value = self
            .arm
            .put_resource(&path, STORAGE_API_VERSION, &request.to_arm_body())
            .await?;
        parse_storage_account(&value)
    }

    async fn list_storage_keys(&self, resource_group: &str, account: &str) -> Result<Vec<StorageKey>> {
        let path = format!("{}/listKeys", self.storage_account_path(resource_group, account));

        let body = self.arm.post_action(&path, STORAGE_API_VERSION, None).await?;
        parse_storage_keys(&body)
    }

    async fn create_web_app(&self, request: &WebAppRequest) -> Result<WebApp> {
        let plan_path = self.server_farm_path(&request.resource_group, &request.plan.name);
        tracing::debug!("Creating app service plan {}", request.plan.name);
        let plan = self
            .arm
            .put_resource(&plan_path, WEB_API_VERSION, &request.plan.to_arm_body(&request.region))
            .await?;
        let server_farm_id = plan
            .get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| plan_path.clone());

        let site_path = self.site_path(&request.resource_group, &request.name);
        let value = self
            .arm
            .put_resource(&site_path, WEB_API_VERSION, &request.to_arm_body(&server_farm_id))
            .await?;
        parse_web_app(&value)
    }

    async fn get_publish_profile(&self, resource_group: &str, app: &str) -> Result<PublishProfile> {
        let path = format!("{}/publishxml", self.site_path(resource_group, app));
        let body = json!({ "format": "Ftp" });

        let xml = self
            .arm
            .post_action(&path, WEB_API_VERSION, Some(&body))
            .await?;
        PublishProfile::parse_ftp(&xml)
    }
}

fn required_str<'a>(value: &'a Value, pointer: &str, what: &str) -> Result<&'a str> {
    value
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ProvisionError::serialization(format!("{} response is missing '{}'", what, pointer))
        })
}

pub(crate) fn parse_resource_group(value: &Value) -> Result<ResourceGroup> {
    Ok(ResourceGroup {
        id: required_str(value, "/id", "Resource group")?.to_string(),
        name: required_str(value, "/name", "Resource group")?.to_string(),
        region: required_str(value, "/location", "Resource group")?.to_string(),
    })
}

pub(crate) fn parse_storage_account(value: &Value) -> Result<StorageAccount> {
    Ok(StorageAccount {
        id: required_str(value, "/id", "Storage account")?.to_string(),
        name: required_str(value, "/name", "Storage account")?.to_string(),
        region: required_str(value, "/location", "Storage account")?.to_string(),
        sku: value
            .pointer("/sku/name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        primary_blob_endpoint: value
            .pointer("/properties/primaryEndpoints/blob")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

pub(crate) fn parse_storage_keys(body: &str) -> Result<Vec<StorageKey>> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        ProvisionError::serialization(format!("Failed to parse storage keys response: {}", e))
    })?;

    let keys = value
        .get("keys")
        .and_then(|k| k.as_array())
        .map(|keys| {
            keys.iter()
                .filter_map(|key| {
                    let name = key.get("keyName")?.as_str()?;
                    let secret = key.get("value")?.as_str()?;
                    let permissions = key
                        .get("permissions")
                        .and_then(|p| p.as_str())
                        .unwrap_or_default();
                    Some(StorageKey::new(name, secret, permissions))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(keys)
}

pub(crate) fn parse_web_app(value: &Value) -> Result<WebApp> {
    Ok(WebApp {
        id: required_str(value, "/id", "Web app")?.to_string(),
        name: required_str(value, "/name", "Web app")?.to_string(),
        region: required_str(value, "/location", "Web app")?.to_string(),
        default_host_name: required_str(value, "/properties/defaultHostName", "Web app")?
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_keys() {
        let body = r#"{"keys":[
            {"keyName":"key1","value":"Zmlyc3Q=","permissions":"FULL"},
            {"keyName":"key2","value":"c2Vjb25k","permissions":"FULL"}
        ]}"#;
        let keys = parse_storage_keys(body).unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].key_name, "key1");
        assert_eq!(keys[0].value.as_str(), "Zmlyc3Q=");
    }

    #[test]
    fn test_parse_storage_keys_empty() {
        assert!(parse_storage_keys(r#"{"keys":[]}"#).unwrap().is_empty());
        assert!(parse_storage_keys(r#"{}"#).unwrap().is_empty());
        assert!(parse_storage_keys("not json").is_err());
    }

    #[test]
    fn test_parse_web_app_requires_host_name() {
        let value = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/sites/webapp-1",
            "name": "webapp-1",
            "location": "West US",
            "properties": { "defaultHostName": "webapp-1.azurewebsites.net" }
        });
        let app = parse_web_app(&value).unwrap();
        assert_eq!(app.default_host_name, "webapp-1.azurewebsites.net");

        let missing = json!({ "id": "x", "name": "webapp-1", "location": "West US" });
        let err = parse_web_app(&missing).unwrap_err();
        assert!(err.to_string().contains("defaultHostName"));
    }

    #[test]
    fn test_parse_storage_account() {
        let value = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/stg1",
            "name": "stg1",
            "location": "westus",
            "sku": { "name": "Standard_LRS" },
            "properties": { "primaryEndpoints": { "blob": "https://stg1.blob.core.windows.net/" } }
        });
        let account = parse_storage_account(&value).unwrap();
        assert_eq!(account.sku, "Standard_LRS");
        assert_eq!(
            account.primary_blob_endpoint.as_deref(),
            Some("https://stg1.blob.core.windows.net/")
        );
    }
}
