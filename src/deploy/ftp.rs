//! Archive deployment over FTP
//!
//! The transfer itself is blocking (`suppaftp::FtpStream`) and runs on tokio's
//! blocking pool so the runtime is never stalled by a slow upload.

use async_trait::async_trait;
use std::io::Cursor;
use std::path::Path;
use suppaftp::types::FileType;
use suppaftp::{FtpStream, Mode};
use zeroize::Zeroizing;

use super::publish_profile::PublishProfile;
use crate::error::{ProvisionError, Result};

const DEFAULT_FTP_PORT: u16 = 21;

/// Where the archive lands relative to the profile's publish directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDestination {
    pub remote_dir: String,
    pub remote_name: String,
}

impl RemoteDestination {
    pub fn display_path(&self) -> String {
        if self.remote_dir.is_empty() {
            self.remote_name.clone()
        } else {
            format!("{}/{}", self.remote_dir.trim_end_matches('/'), self.remote_name)
        }
    }
}

/// Host, port and base directory parsed from a publish URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpTarget {
    pub host: String,
    pub port: u16,
    pub base_path: String,
}

impl FtpTarget {
    pub fn from_publish_url(publish_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(publish_url)?;
        if parsed.scheme() != "ftp" {
            return Err(ProvisionError::invalid_publish_profile(format!(
                "unsupported publish URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ProvisionError::invalid_publish_profile("publish URL has no host"))?
            .to_string();

        Ok(Self {
            host,
            port: parsed.port().unwrap_or(DEFAULT_FTP_PORT),
            base_path: parsed.path().to_string(),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Trait for pushing an application archive to a web app
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchivePublisher: Send + Sync {
    /// Upload `archive`, returning the number of bytes written
    async fn publish(
        &self,
        profile: &PublishProfile,
        archive: &Path,
        destination: &RemoteDestination,
    ) -> Result<u64>;
}

/// Publisher that uses the FTP credentials from the publish profile
#[derive(Debug, Default, Clone)]
pub struct FtpPublisher;

impl FtpPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArchivePublisher for FtpPublisher {
    async fn publish(
        &self,
        profile: &PublishProfile,
        archive: &Path,
        destination: &RemoteDestination,
    ) -> Result<u64> {
        let contents = tokio::fs::read(archive).await.map_err(|e| {
            ProvisionError::deployment(format!("Failed to read archive {}: {}", archive.display(), e))
        })?;
        let target = FtpTarget::from_publish_url(&profile.publish_url)?;
        let user_name = profile.user_name.clone();
        let password = profile.password.clone();
        let passive = profile.passive_mode;
        let destination = destination.clone();

        tracing::debug!(
            "Uploading {} bytes to ftp://{}{}/{}",
            contents.len(),
            target.address(),
            target.base_path,
            destination.display_path()
        );

        tokio::task::spawn_blocking(move || {
            upload_blocking(&target, &user_name, &password, passive, &destination, contents)
        })
        .await
        .map_err(|e| ProvisionError::deployment(format!("FTP upload task failed: {}", e)))?
    }
}

fn upload_blocking(
    target: &FtpTarget,
    user_name: &str,
    password: &Zeroizing<String>,
    passive: bool,
    destination: &RemoteDestination,
    contents: Vec<u8>,
) -> Result<u64> {
    let mut ftp = FtpStream::connect(target.address())?;
    if !passive {
        ftp.set_mode(Mode::Active);
    }
    ftp.login(user_name, password.as_str())?;
    ftp.transfer_type(FileType::Binary)?;

    if !target.base_path.is_empty() && target.base_path != "/" {
        ftp.cwd(&target.base_path)?;
    }

    if !destination.remote_dir.is_empty() && ftp.cwd(&destination.remote_dir).is_err() {
        ftp.mkdir(&destination.remote_dir)?;
        ftp.cwd(&destination.remote_dir)?;
    }

    let written = ftp.put_file(&destination.remote_name, &mut Cursor::new(contents))?;

    if let Err(e) = ftp.quit() {
        tracing::warn!("FTP session did not close cleanly: {}", e);
    }

    Ok(written)
}
