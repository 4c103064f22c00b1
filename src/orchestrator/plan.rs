//! Run plan
//!
//! Everything a run needs to know up front: generated resource names, local
//! files and site settings. Built once from [`Config`] before anything is created.

use std::path::PathBuf;
use std::time::Duration;

use crate::azure::models::SiteRuntime;
use crate::config::Config;
use crate::deploy::ftp::RemoteDestination;
use crate::error::{ProvisionError, Result};
use crate::utils::names::NameGenerator;

#[derive(Debug, Clone, PartialEq)]
pub struct WarmupPlan {
    pub attempts: u32,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub region: String,
    pub resource_group: String,
    pub storage_account: String,
    pub container: String,
    pub web_app: String,
    pub app_service_plan: String,
    pub storage_sku: String,
    pub storage_kind: String,
    pub plan_sku: String,
    pub upload_files: Vec<PathBuf>,
    pub deploy_archive: PathBuf,
    pub destination: RemoteDestination,
    pub connection_string_name: String,
    pub container_setting_name: String,
    pub port_setting_name: String,
    pub port_value: String,
    pub runtime: SiteRuntime,
    pub warmup: WarmupPlan,
    pub max_concurrent_uploads: usize,
    pub pause_before_cleanup: bool,
}

impl RunPlan {
    pub fn from_config(config: &Config, names: &mut NameGenerator) -> Result<Self> {
        let prefixes = &config.prefixes;

        Ok(Self {
            region: config.region.clone(),
            resource_group: names.next_name(&prefixes.resource_group)?,
            storage_account: names.next_name(&prefixes.storage_account)?,
            container: names.next_name(&prefixes.container)?,
            web_app: names.next_name(&prefixes.web_app)?,
            app_service_plan: names.next_name(&prefixes.app_service_plan)?,
            storage_sku: config.storage_sku.clone(),
            storage_kind: config.storage_kind.clone(),
            plan_sku: config.plan_sku.clone(),
            upload_files: config.resolved_upload_files(),
            deploy_archive: config.resolved_deploy_archive(),
            destination: RemoteDestination {
                remote_dir: config.deploy_remote_dir.clone(),
                remote_name: config.deploy_remote_name.clone(),
            },
            connection_string_name: config.connection_string_name.clone(),
            container_setting_name: config.container_setting_name.clone(),
            port_setting_name: config.port_setting_name.clone(),
            port_value: config.port_value.clone(),
            runtime: SiteRuntime {
                java_version: config.runtime.java_version.clone(),
                java_container: config.runtime.java_container.clone(),
                java_container_version: config.runtime.java_container_version.clone(),
            },
            warmup: WarmupPlan {
                attempts: config.warmup.attempts,
                delay: config.warmup.delay(),
            },
            max_concurrent_uploads: config.max_concurrent_uploads.max(1),
            pause_before_cleanup: config.pause_before_cleanup,
        })
    }

    /// Fail before provisioning if any local input is missing
    pub fn verify_local_files(&self) -> Result<()> {
        let missing: Vec<String> = self
            .upload_files
            .iter()
            .chain(std::iter::once(&self.deploy_archive))
            .filter(|path| !path.is_file())
            .map(|path| path.display().to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProvisionError::config(format!(
                "Missing local files: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_names_use_prefixes() {
        let config = Config::default();
        let mut names = NameGenerator::with_seed(11);
        let plan = RunPlan::from_config(&config, &mut names).unwrap();

        assert!(plan.resource_group.starts_with("rgNEMV"));
        assert!(plan.storage_account.starts_with("stgwebapp"));
        assert!(plan.container.starts_with("jarfiles"));
        assert!(plan.web_app.starts_with("webapp-"));
        assert!(plan.app_service_plan.starts_with("plan-"));
        assert_eq!(names.issued().len(), 5);
        assert_eq!(plan.destination.display_path(), "webapps/ROOT.war");
        assert_eq!(plan.warmup.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_verify_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.asset_root = dir.path().to_path_buf();
        config.upload_files = vec![PathBuf::from("a.war"), PathBuf::from("b.sh")];
        config.deploy_archive = PathBuf::from("c.war");

        let plan = RunPlan::from_config(&config, &mut NameGenerator::with_seed(2)).unwrap();
        let err = plan.verify_local_files().unwrap_err();
        assert!(err.is_setup_error());
        assert!(err.to_string().contains("a.war"));
        assert!(err.to_string().contains("c.war"));

        for name in ["a.war", "b.sh", "c.war"] {
            std::fs::write(dir.path().join(name), b"data").unwrap();
        }
        assert!(plan.verify_local_files().is_ok());
    }
}
