use thiserror::Error;

/// Main error type for azprov operations
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage account '{account}' returned no access keys")]
    NoStorageKeys { account: String },

    #[error("Invalid publish profile: {0}")]
    InvalidPublishProfile(String),

    #[error("Deployment failed: {0}")]
    DeploymentError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Terminal interaction failed: {0}")]
    InteractionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("FTP error: {0}")]
    FtpError(#[from] suppaftp::FtpError),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ProvisionError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn no_storage_keys<S: Into<String>>(account: S) -> Self {
        Self::NoStorageKeys {
            account: account.into(),
        }
    }

    pub fn invalid_publish_profile<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPublishProfile(msg.into())
    }

    pub fn deployment<S: Into<String>>(msg: S) -> Self {
        Self::DeploymentError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn interaction<S: Into<String>>(msg: S) -> Self {
        Self::InteractionError(msg.into())
    }

    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Errors raised before any cloud resource could have been created.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationError(_)
                | Self::ConfigError(_)
                | Self::TomlError(_)
                | Self::InvalidArgument(_)
        )
    }

    /// Azure refused the request outright, so it left nothing behind.
    /// Timeouts, transport failures and cancellation leave the outcome unknown.
    pub fn is_rejection(&self) -> bool {
        self.is_setup_error() || matches!(self, Self::AzureApiError(_))
    }
}

/// Result type alias for azprov operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Convert Azure Core errors to ProvisionError
impl From<azure_core::Error> for ProvisionError {
    fn from(error: azure_core::Error) -> Self {
        Self::AzureApiError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_errors_are_classified() {
        assert!(ProvisionError::config("missing region").is_setup_error());
        assert!(ProvisionError::authentication("bad secret").is_setup_error());
        assert!(!ProvisionError::azure_api("HTTP 409: conflict").is_setup_error());
        assert!(!ProvisionError::no_storage_keys("stg1").is_setup_error());
        assert!(!ProvisionError::Cancelled.is_setup_error());
        assert!(!ProvisionError::interaction("stdin closed").is_setup_error());
    }

    #[test]
    fn test_rejections_leave_nothing_behind() {
        assert!(ProvisionError::azure_api("HTTP 409: conflict").is_rejection());
        assert!(ProvisionError::authentication("bad secret").is_rejection());
        assert!(!ProvisionError::timeout("creating rg1").is_rejection());
        assert!(!ProvisionError::network("connection reset").is_rejection());
        assert!(!ProvisionError::Cancelled.is_rejection());
    }

    #[test]
    fn test_error_messages() {
        let err = ProvisionError::no_storage_keys("stgwebapp42");
        assert_eq!(
            err.to_string(),
            "Storage account 'stgwebapp42' returned no access keys"
        );
        assert_eq!(
            ProvisionError::timeout("deleting rg1").to_string(),
            "Operation timed out: deleting rg1"
        );
    }
}
