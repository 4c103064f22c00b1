//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use crate::error::{ProvisionError, Result};
use crate::utils::names::{
    validate_container_prefix, validate_resource_group_prefix, validate_storage_account_prefix,
    validate_web_app_prefix,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefixes for every generated resource name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NamePrefixes {
    pub resource_group: String,
    pub storage_account: String,
    pub container: String,
    pub web_app: String,
    pub app_service_plan: String,
}

impl Default for NamePrefixes {
    fn default() -> Self {
        Self {
            resource_group: "rgNEMV".to_string(),
            storage_account: "stgwebapp".to_string(),
            container: "jarfiles".to_string(),
            web_app: "webapp-".to_string(),
            app_service_plan: "plan-".to_string(),
        }
    }
}

/// Java runtime fields written into the site config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub java_version: String,
    pub java_container: String,
    pub java_container_version: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            java_version: "1.8".to_string(),
            java_container: "TOMCAT".to_string(),
            java_container_version: "9.0".to_string(),
        }
    }
}

/// Post-deployment probe of the public app URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarmupConfig {
    pub attempts: u32,
    pub delay_secs: u64,
    pub timeout_secs: u64,
    pub headers: BTreeMap<String, String>,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            attempts: 2,
            delay_secs: 5,
            timeout_secs: 300,
            headers: BTreeMap::new(),
        }
    }
}

impl WarmupConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Debug logging, also switched on by `DEBUG=true`
    pub debug: bool,
    pub region: String,
    pub prefixes: NamePrefixes,
    pub storage_sku: String,
    pub storage_kind: String,
    pub plan_sku: String,
    /// Base directory that relative asset paths are resolved against
    pub asset_root: PathBuf,
    /// Files uploaded as blobs, in order
    pub upload_files: Vec<PathBuf>,
    /// Archive pushed to the web app over FTP
    pub deploy_archive: PathBuf,
    pub deploy_remote_dir: String,
    pub deploy_remote_name: String,
    pub connection_string_name: String,
    pub container_setting_name: String,
    pub port_setting_name: String,
    pub port_value: String,
    pub runtime: RuntimeConfig,
    pub warmup: WarmupConfig,
    pub max_concurrent_uploads: usize,
    pub management_endpoint: String,
    pub poll_interval_secs: u64,
    pub operation_timeout_secs: u64,
    pub pause_before_cleanup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            region: "westus".to_string(),
            prefixes: NamePrefixes::default(),
            storage_sku: "Standard_LRS".to_string(),
            storage_kind: "StorageV2".to_string(),
            plan_sku: "B1".to_string(),
            asset_root: PathBuf::from("."),
            upload_files: vec![
                PathBuf::from("assets/helloworld.war"),
                PathBuf::from("assets/install_apache.sh"),
            ],
            deploy_archive: PathBuf::from("assets/azure-samples-blob-traverser.war"),
            deploy_remote_dir: "webapps".to_string(),
            deploy_remote_name: "ROOT.war".to_string(),
            connection_string_name: "storage.connectionString".to_string(),
            container_setting_name: "storage.containerName".to_string(),
            port_setting_name: "PORT".to_string(),
            port_value: "8080".to_string(),
            runtime: RuntimeConfig::default(),
            warmup: WarmupConfig::default(),
            max_concurrent_uploads: 1,
            management_endpoint: "https://management.azure.com".to_string(),
            poll_interval_secs: 5,
            operation_timeout_secs: 1800,
            pause_before_cleanup: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(ProvisionError::config("Region is required"));
        }

        validate_resource_group_prefix(&self.prefixes.resource_group)?;
        validate_container_prefix(&self.prefixes.container)?;
        validate_web_app_prefix(&self.prefixes.web_app)?;
        validate_web_app_prefix(&self.prefixes.app_service_plan)?;
        validate_storage_account_prefix(&self.prefixes.storage_account)?;

        if self.upload_files.is_empty() {
            return Err(ProvisionError::config("At least one upload file is required"));
        }

        if self.deploy_remote_name.trim().is_empty() {
            return Err(ProvisionError::config("Deploy remote name is required"));
        }

        if self.warmup.attempts == 0 {
            return Err(ProvisionError::config("Warm-up attempts must be at least 1"));
        }

        if self.max_concurrent_uploads == 0 {
            return Err(ProvisionError::config(
                "max_concurrent_uploads must be at least 1",
            ));
        }

        url::Url::parse(&self.management_endpoint).map_err(|e| {
            ProvisionError::config(format!(
                "Invalid management endpoint '{}': {}",
                self.management_endpoint, e
            ))
        })?;

        Ok(())
    }

    /// Resolve an asset path against `asset_root` unless it is already absolute
    pub fn resolve_asset(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_root.join(path)
        }
    }

    pub fn resolved_upload_files(&self) -> Vec<PathBuf> {
        self.upload_files
            .iter()
            .map(|path| self.resolve_asset(path))
            .collect()
    }

    pub fn resolved_deploy_archive(&self) -> PathBuf {
        self.resolve_asset(&self.deploy_archive)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| ProvisionError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("azprov").join("azprov.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| ProvisionError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("azprov").join("azprov.toml"))
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ProvisionError::serialization(e.to_string()))
    }
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (applied by the caller)
/// 2. Environment variables
/// 3. Configuration file (explicit path, `AZPROV_CONFIG`, or the default location)
/// 4. Default values
pub async fn load_config(explicit_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    let config_path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(ProvisionError::config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            Some(path.to_path_buf())
        }
        None => match std::env::var("AZPROV_CONFIG") {
            Ok(value) if !value.is_empty() => Some(PathBuf::from(value)),
            _ => {
                let default_path = Config::get_config_path()?;
                default_path.exists().then_some(default_path)
            }
        },
    };

    if let Some(path) = config_path {
        tracing::debug!("Loading configuration from {}", path.display());
        config = load_from_file(&path).await?;
    }

    load_from_env(&mut config);

    Ok(config)
}

pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    match toml::from_str::<Config>(&contents) {
        Ok(config) => Ok(config),
        Err(toml_error) => match serde_json::from_str::<Config>(&contents) {
            Ok(config) => Ok(config),
            Err(_) => Err(toml_error.into()),
        },
    }
}

fn load_from_env(config: &mut Config) {
    if let Ok(value) = std::env::var("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Ok(value) = std::env::var("AZPROV_REGION") {
        if !value.is_empty() {
            config.region = value;
        }
    }

    if let Ok(value) = std::env::var("AZPROV_ASSET_ROOT") {
        if !value.is_empty() {
            config.asset_root = PathBuf::from(value);
        }
    }
}

pub async fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(path, config.to_toml()?).await?;

    Ok(())
}

/// Write the default configuration, never overwriting an existing file.
/// Returns whether a file was written.
pub async fn init_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    save_config(&Config::default(), path).await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upload_files.len(), 2);
        assert_eq!(config.warmup.attempts, 2);
        assert_eq!(config.warmup.delay(), Duration::from_secs(5));
        assert_eq!(config.warmup.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.upload_files.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prefixes.storage_account = "Storage-Account".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.warmup.attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prefixes.web_app = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.management_endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_prefixes_azure_would_refuse() {
        let mut config = Config::default();
        config.prefixes.container = "JarFiles".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ProvisionError::ConfigError(_)));
        assert!(err.to_string().contains("Container prefix 'JarFiles'"));

        let mut config = Config::default();
        config.prefixes.web_app = "web_app".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prefixes.app_service_plan = "plan.".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prefixes.resource_group = "rg nemv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_asset() {
        let mut config = Config::default();
        config.asset_root = PathBuf::from("/srv/project");

        assert_eq!(
            config.resolve_asset(Path::new("assets/helloworld.war")),
            PathBuf::from("/srv/project/assets/helloworld.war")
        );
        assert_eq!(
            config.resolve_asset(Path::new("/tmp/ROOT.war")),
            PathBuf::from("/tmp/ROOT.war")
        );
        assert_eq!(
            config.resolved_deploy_archive(),
            PathBuf::from("/srv/project/assets/azure-samples-blob-traverser.war")
        );
    }

    #[tokio::test]
    async fn test_load_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("azprov.toml");
        tokio::fs::write(
            &path,
            r#"
region = "northeurope"
upload_files = ["one.war"]

[warmup]
attempts = 3
"#,
        )
        .await
        .unwrap();

        let config = load_from_file(&path).await.unwrap();
        assert_eq!(config.region, "northeurope");
        assert_eq!(config.upload_files, vec![PathBuf::from("one.war")]);
        assert_eq!(config.warmup.attempts, 3);
        assert_eq!(config.warmup.delay_secs, 5);
        assert_eq!(config.storage_sku, "Standard_LRS");
    }

    #[tokio::test]
    async fn test_load_json_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("azprov.json");
        tokio::fs::write(&path, r#"{"region": "eastus2", "plan_sku": "S1"}"#)
            .await
            .unwrap();

        let config = load_from_file(&path).await.unwrap();
        assert_eq!(config.region, "eastus2");
        assert_eq!(config.plan_sku, "S1");
    }

    #[tokio::test]
    async fn test_init_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("azprov.toml");

        assert!(init_default_config(&path).await.unwrap());
        assert!(!init_default_config(&path).await.unwrap());

        let config = load_from_file(&path).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_missing_explicit_path_is_config_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml")))
            .await
            .unwrap_err();
        assert!(err.is_setup_error());
    }
}
