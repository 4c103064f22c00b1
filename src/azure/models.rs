//! Resource Manager data models
//!
//! Handles for the resources a run creates and the requests used to create them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageAccountRequest {
    pub name: String,
    pub resource_group: String,
    pub region: String,
    pub sku: String,
    pub kind: String,
}

impl StorageAccountRequest {
    pub fn to_arm_body(&self) -> Value {
        json!({
            "location": self.region,
            "kind": self.kind,
            "sku": { "name": self.sku },
            "properties": {
                "minimumTlsVersion": "TLS1_2",
                "supportsHttpsTrafficOnly": true
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageAccount {
    pub id: String,
    pub name: String,
    pub region: String,
    pub sku: String,
    pub primary_blob_endpoint: Option<String>,
}

/// One entry of the storage account key list
#[derive(Clone)]
pub struct StorageKey {
    pub key_name: String,
    pub value: Zeroizing<String>,
    pub permissions: String,
}

impl StorageKey {
    pub fn new<S: Into<String>>(key_name: S, value: S, permissions: S) -> Self {
        Self {
            key_name: key_name.into(),
            value: Zeroizing::new(value.into()),
            permissions: permissions.into(),
        }
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageKey")
            .field("key_name", &self.key_name)
            .field("value", &"<redacted>")
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// Connection string kind written into the site config. Storage connection
/// strings are always `Custom`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectionStringType {
    Custom,
}

impl ConnectionStringType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStringType::Custom => "Custom",
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct ConnectionStringEntry {
    pub name: String,
    pub value: Zeroizing<String>,
    pub kind: ConnectionStringType,
}

impl fmt::Debug for ConnectionStringEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionStringEntry")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteRuntime {
    pub java_version: String,
    pub java_container: String,
    pub java_container_version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppServicePlanRequest {
    pub name: String,
    pub sku: String,
}

impl AppServicePlanRequest {
    pub fn to_arm_body(&self, region: &str) -> Value {
        json!({
            "location": region,
            "kind": "app",
            "sku": { "name": self.sku },
            "properties": {}
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebAppRequest {
    pub name: String,
    pub resource_group: String,
    pub region: String,
    pub plan: AppServicePlanRequest,
    pub connection_strings: Vec<ConnectionStringEntry>,
    pub app_settings: BTreeMap<String, String>,
    pub runtime: SiteRuntime,
}

impl WebAppRequest {
    /// Site body for the ARM PUT, given the id of the already created plan
    pub fn to_arm_body(&self, server_farm_id: &str) -> Value {
        let connection_strings: Vec<Value> = self
            .connection_strings
            .iter()
            .map(|entry| {
                json!({
                    "name": entry.name,
                    "connectionString": entry.value.as_str(),
                    "type": entry.kind.as_str()
                })
            })
            .collect();

        let app_settings: Vec<Value> = self
            .app_settings
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();

        json!({
            "location": self.region,
            "kind": "app",
            "properties": {
                "serverFarmId": server_farm_id,
                "siteConfig": {
                    "connectionStrings": connection_strings,
                    "appSettings": app_settings,
                    "javaVersion": self.runtime.java_version,
                    "javaContainer": self.runtime.java_container,
                    "javaContainerVersion": self.runtime.java_container_version
                }
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebApp {
    pub id: String,
    pub name: String,
    pub region: String,
    pub default_host_name: String,
}

impl WebApp {
    /// Public URL of the app
    pub fn url(&self) -> String {
        format!("http://{}", self.default_host_name)
    }
}
