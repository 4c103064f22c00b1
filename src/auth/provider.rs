//! Authentication provider trait and implementations
//!
//! This module defines the authentication provider trait and the client secret
//! implementation used for service principal logins.

use crate::error::{ProvisionError, Result};
use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_identity::ClientSecretCredential;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

pub const CLIENT_ID_VAR: &str = "CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";
pub const TENANT_ID_VAR: &str = "TENANT_ID";
pub const SUBSCRIPTION_ID_VAR: &str = "SUBSCRIPTION_ID";

const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Service principal credentials for a run
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: Zeroizing<String>,
    pub tenant_id: String,
    pub subscription_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl Credentials {
    /// Read all four required variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    ProvisionError::config(format!(
                        "Environment variable {} is required",
                        name
                    ))
                })
        };

        Ok(Self {
            client_id: required(CLIENT_ID_VAR)?,
            client_secret: Zeroizing::new(required(CLIENT_SECRET_VAR)?),
            tenant_id: required(TENANT_ID_VAR)?,
            subscription_id: required(SUBSCRIPTION_ID_VAR)?,
        })
    }
}

/// Trait for Azure authentication providers
#[async_trait]
pub trait AzureAuthProvider: Send + Sync {
    /// Get an access token for the specified scopes
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;

    /// Get the tenant ID
    async fn get_tenant_id(&self) -> Result<String>;
}

/// Client Secret Authentication Provider
pub struct ClientSecretProvider {
    credential: Arc<ClientSecretCredential>,
    tenant_id: String,
}

impl ClientSecretProvider {
    /// Create a new ClientSecretProvider
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let authority_url = url::Url::parse(AUTHORITY_HOST)
            .map_err(|e| ProvisionError::config(format!("Invalid authority URL: {}", e)))?;

        let credential = Arc::new(ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority_url,
            credentials.tenant_id.clone(),
            credentials.client_id.clone(),
            credentials.client_secret.as_str().to_string(),
        ));

        Ok(Self {
            credential,
            tenant_id: credentials.tenant_id.clone(),
        })
    }
}

#[async_trait]
impl AzureAuthProvider for ClientSecretProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| ProvisionError::authentication(format!("Failed to get token: {}", e)))
    }

    async fn get_tenant_id(&self) -> Result<String> {
        Ok(self.tenant_id.clone())
    }
}
