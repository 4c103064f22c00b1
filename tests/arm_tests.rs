//! Resource Manager REST calls against a local mock server

use async_trait::async_trait;
use azure_core::auth::AccessToken;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

use azprov::auth::AzureAuthProvider;
use azprov::azure::{
    AppServicePlanRequest, AzureResourceManager, ConnectionStringEntry, ConnectionStringType,
    PollSettings, ResourceManager, SiteRuntime, StorageAccountRequest, WebAppRequest,
};
use azprov::error::{ProvisionError, Result};

const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000001";
const TOKEN: &str = "test-access-token";

struct StaticAuth;

#[async_trait]
impl AzureAuthProvider for StaticAuth {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken> {
        Ok(static_token())
    }

    async fn get_tenant_id(&self) -> Result<String> {
        Ok("tenant".to_string())
    }
}

fn static_token() -> AccessToken {
    AccessToken::new(
        TOKEN.to_string(),
        OffsetDateTime::now_utc() + time::Duration::hours(1),
    )
}

fn manager(server: &ServerGuard) -> AzureResourceManager {
    manager_with_timeout(server, Duration::from_secs(5))
}

fn manager_with_timeout(server: &ServerGuard, timeout: Duration) -> AzureResourceManager {
    AzureResourceManager::new(
        Arc::new(StaticAuth),
        &server.url(),
        SUBSCRIPTION.to_string(),
        PollSettings {
            interval: Duration::from_millis(10),
            timeout,
        },
    )
    .unwrap()
}

fn path(suffix: &str, api_version: &str) -> Matcher {
    Matcher::Regex(format!(
        r"^/subscriptions/{}/resourcegroups/{}\?api-version={}$",
        SUBSCRIPTION,
        regex::escape(suffix),
        api_version
    ))
}

#[cfg(test)]
mod resource_group_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_resource_group() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", path("rgNEMV1234", "2021-04-01"))
            .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
            .match_body(Matcher::Json(json!({ "location": "westus" })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": format!("/subscriptions/{}/resourceGroups/rgNEMV1234", SUBSCRIPTION),
                    "name": "rgNEMV1234",
                    "location": "westus",
                    "properties": { "provisioningState": "Succeeded" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let group = manager(&server)
            .create_resource_group("rgNEMV1234", "westus")
            .await
            .unwrap();

        assert_eq!(group.name, "rgNEMV1234");
        assert_eq!(group.region, "westus");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_resource_group_conflict() {
        let mut server = Server::new_async().await;
        server
            .mock("PUT", path("rg1", "2021-04-01"))
            .with_status(409)
            .with_body(
                json!({ "error": { "code": "ResourceGroupBeingDeleted", "message": "rg1 is being deleted." } })
                    .to_string(),
            )
            .create_async()
            .await;

        let err = manager(&server)
            .create_resource_group("rg1", "westus")
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::AzureApiError(_)));
        assert!(err.to_string().contains("HTTP 409 (ResourceGroupBeingDeleted)"));
    }

    #[tokio::test]
    async fn test_delete_missing_group_is_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", path("rg1", "2021-04-01"))
            .with_status(404)
            .create_async()
            .await;

        manager(&server).delete_resource_group("rg1").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_waits_for_location() {
        let mut server = Server::new_async().await;
        let location = format!("{}/operationresults/delete-1", server.url());
        server
            .mock("DELETE", path("rg1", "2021-04-01"))
            .with_status(202)
            .with_header("location", location.as_str())
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/operationresults/delete-1")
            .with_status(200)
            .create_async()
            .await;

        manager(&server).delete_resource_group("rg1").await.unwrap();
        poll.assert_async().await;
    }
}

#[cfg(test)]
mod storage_tests {
    use super::*;

    const ACCOUNT_PATH: &str = "rg1/providers/Microsoft.Storage/storageAccounts/stgwebapp42";

    #[tokio::test]
    async fn test_create_storage_account_polls_location() {
        let mut server = Server::new_async().await;
        let location = format!("{}/operations/storage-1", server.url());
        server
            .mock("PUT", path(ACCOUNT_PATH, "2023-01-01"))
            .match_body(Matcher::PartialJson(json!({
                "sku": { "name": "Standard_LRS" },
                "kind": "StorageV2",
                "location": "westus"
            })))
            .with_status(202)
            .with_header("location", location.as_str())
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/operations/storage-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "/subscriptions/s/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/stgwebapp42",
                    "name": "stgwebapp42",
                    "location": "westus",
                    "sku": { "name": "Standard_LRS" },
                    "properties": { "primaryEndpoints": { "blob": "https://stgwebapp42.blob.core.windows.net/" } }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let request = StorageAccountRequest {
            name: "stgwebapp42".to_string(),
            resource_group: "rg1".to_string(),
            region: "westus".to_string(),
            sku: "Standard_LRS".to_string(),
            kind: "StorageV2".to_string(),
        };
        let account = manager(&server).create_storage_account(&request).await.unwrap();

        assert_eq!(account.name, "stgwebapp42");
        assert_eq!(
            account.primary_blob_endpoint.as_deref(),
            Some("https://stgwebapp42.blob.core.windows.net/")
        );
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_storage_keys() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", path(&format!("{}/listKeys", ACCOUNT_PATH), "2023-01-01"))
            .with_status(200)
            .with_body(
                json!({ "keys": [
                    { "keyName": "key1", "value": "Zmlyc3Q=", "permissions": "FULL" },
                    { "keyName": "key2", "value": "c2Vjb25k", "permissions": "FULL" }
                ] })
                .to_string(),
            )
            .create_async()
            .await;

        let keys = manager(&server)
            .list_storage_keys("rg1", "stgwebapp42")
            .await
            .unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].key_name, "key1");
        assert_eq!(keys[0].value.as_str(), "Zmlyc3Q=");
    }

    #[tokio::test]
    async fn test_failed_async_operation_surfaces_error() {
        let mut server = Server::new_async().await;
        let operation = format!("{}/asyncoperations/op-1", server.url());
        server
            .mock("PUT", path(ACCOUNT_PATH, "2023-01-01"))
            .with_status(201)
            .with_header("azure-asyncoperation", operation.as_str())
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("GET", "/asyncoperations/op-1")
            .with_status(200)
            .with_body(
                json!({ "status": "Failed", "error": { "message": "Quota exceeded" } }).to_string(),
            )
            .create_async()
            .await;

        let request = StorageAccountRequest {
            name: "stgwebapp42".to_string(),
            resource_group: "rg1".to_string(),
            region: "westus".to_string(),
            sku: "Standard_LRS".to_string(),
            kind: "StorageV2".to_string(),
        };
        let err = manager(&server)
            .create_storage_account(&request)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Quota exceeded"));
    }

    #[tokio::test]
    async fn test_operation_stuck_in_progress_times_out() {
        let mut server = Server::new_async().await;
        let operation = format!("{}/asyncoperations/op-2", server.url());
        server
            .mock("PUT", path(ACCOUNT_PATH, "2023-01-01"))
            .with_status(201)
            .with_header("azure-asyncoperation", operation.as_str())
            .with_body("{}")
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/asyncoperations/op-2")
            .with_status(200)
            .with_body(json!({ "status": "InProgress" }).to_string())
            .expect_at_least(1)
            .create_async()
            .await;

        let request = StorageAccountRequest {
            name: "stgwebapp42".to_string(),
            resource_group: "rg1".to_string(),
            region: "westus".to_string(),
            sku: "Standard_LRS".to_string(),
            kind: "StorageV2".to_string(),
        };
        let err = manager_with_timeout(&server, Duration::from_millis(50))
            .create_storage_account(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Timeout(_)), "unexpected error: {}", err);
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_location_stuck_accepted_times_out() {
        let mut server = Server::new_async().await;
        let location = format!("{}/operations/storage-2", server.url());
        server
            .mock("PUT", path(ACCOUNT_PATH, "2023-01-01"))
            .with_status(202)
            .with_header("location", location.as_str())
            .create_async()
            .await;
        server
            .mock("GET", "/operations/storage-2")
            .with_status(202)
            .create_async()
            .await;

        let request = StorageAccountRequest {
            name: "stgwebapp42".to_string(),
            resource_group: "rg1".to_string(),
            region: "westus".to_string(),
            sku: "Standard_LRS".to_string(),
            kind: "StorageV2".to_string(),
        };
        let err = manager_with_timeout(&server, Duration::from_millis(50))
            .create_storage_account(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Timeout(_)), "unexpected error: {}", err);
    }
}

#[cfg(test)]
mod web_app_tests {
    use super::*;
    use std::collections::BTreeMap;
    use zeroize::Zeroizing;

    const PLAN_PATH: &str = "rg1/providers/Microsoft.Web/serverfarms/plan-7";
    const SITE_PATH: &str = "rg1/providers/Microsoft.Web/sites/webapp-7";

    fn site_body() -> String {
        json!({
            "id": "/subscriptions/s/resourceGroups/rg1/providers/Microsoft.Web/sites/webapp-7",
            "name": "webapp-7",
            "location": "westus",
            "properties": { "defaultHostName": "webapp-7.azurewebsites.net" }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_web_app_with_async_operation() {
        let mut server = Server::new_async().await;
        let operation = format!("{}/asyncoperations/site-1", server.url());
        let plan = server
            .mock("PUT", path(PLAN_PATH, "2022-09-01"))
            .with_status(200)
            .with_body(json!({ "id": "/serverfarms/plan-7", "name": "plan-7" }).to_string())
            .create_async()
            .await;
        let site = server
            .mock("PUT", path(SITE_PATH, "2022-09-01"))
            .match_body(Matcher::PartialJson(json!({
                "location": "westus",
                "properties": {
                    "serverFarmId": "/serverfarms/plan-7",
                    "siteConfig": { "javaContainer": "TOMCAT" }
                }
            })))
            .with_status(201)
            .with_header("azure-asyncoperation", operation.as_str())
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("GET", "/asyncoperations/site-1")
            .with_status(200)
            .with_body(json!({ "status": "Succeeded" }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", path(SITE_PATH, "2022-09-01"))
            .with_status(200)
            .with_body(site_body())
            .create_async()
            .await;

        let request = WebAppRequest {
            name: "webapp-7".to_string(),
            resource_group: "rg1".to_string(),
            region: "westus".to_string(),
            plan: AppServicePlanRequest {
                name: "plan-7".to_string(),
                sku: "B1".to_string(),
            },
            connection_strings: vec![ConnectionStringEntry {
                name: "storage.connectionString".to_string(),
                value: Zeroizing::new("DefaultEndpointsProtocol=https;AccountName=a;AccountKey=k".to_string()),
                kind: ConnectionStringType::Custom,
            }],
            app_settings: BTreeMap::from([("PORT".to_string(), "8080".to_string())]),
            runtime: SiteRuntime {
                java_version: "1.8".to_string(),
                java_container: "TOMCAT".to_string(),
                java_container_version: "9.0".to_string(),
            },
        };
        let app = manager(&server).create_web_app(&request).await.unwrap();

        assert_eq!(app.default_host_name, "webapp-7.azurewebsites.net");
        assert_eq!(app.url(), "http://webapp-7.azurewebsites.net");
        plan.assert_async().await;
        site.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_publish_profile() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", path(&format!("{}/publishxml", SITE_PATH), "2022-09-01"))
            .match_body(Matcher::Json(json!({ "format": "Ftp" })))
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(
                r#"<publishData><publishProfile profileName="webapp-7 - FTP" publishMethod="FTP" publishUrl="ftp://waws.ftp.azurewebsites.windows.net/site/wwwroot" ftpPassiveMode="True" userName="webapp-7\$webapp-7" userPWD="pa55"/></publishData>"#,
            )
            .create_async()
            .await;

        let profile = manager(&server)
            .get_publish_profile("rg1", "webapp-7")
            .await
            .unwrap();

        assert_eq!(profile.user_name, r"webapp-7\$webapp-7");
        assert_eq!(profile.password.as_str(), "pa55");
        assert!(profile.passive_mode);
    }
}
