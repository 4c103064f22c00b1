//! Application deployment
//!
//! Publishing profile parsing, FTP archive upload and the HTTP warm-up probe.

pub mod ftp;
pub mod probe;
pub mod publish_profile;

pub use ftp::{ArchivePublisher, FtpPublisher, FtpTarget, RemoteDestination};
pub use probe::{HttpProbe, ProbeResponse, ReqwestProbe};
pub use publish_profile::PublishProfile;
