//! Azure Resource Manager REST client
//!
//! Thin wrapper over `reqwest` that authorizes requests with a management token,
//! turns ARM error bodies into [`ProvisionError`]s and waits for long-running
//! operations to reach a terminal state.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, LOCATION, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::auth::provider::AzureAuthProvider;
use crate::error::{ProvisionError, Result};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};

const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";
const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Polling behaviour for long-running operations
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(1800),
        }
    }
}

pub struct ArmClient {
    auth_provider: Arc<dyn AzureAuthProvider>,
    http_client: Client,
    endpoint: String,
    subscription_id: String,
    poll: PollSettings,
}

impl ArmClient {
    pub fn new(
        auth_provider: Arc<dyn AzureAuthProvider>,
        endpoint: &str,
        subscription_id: String,
        poll: PollSettings,
    ) -> Result<Self> {
        let http_client = create_http_client(&NetworkConfig::default())?;

        Ok(Self {
            auth_provider,
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            subscription_id,
            poll,
        })
    }

    /// `/subscriptions/{id}/resourcegroups/{group}`
    pub fn resource_group_path(&self, resource_group: &str) -> String {
        format!(
            "/subscriptions/{}/resourcegroups/{}",
            self.subscription_id, resource_group
        )
    }

    /// Path of a resource under a provider namespace in a resource group
    pub fn provider_path(&self, resource_group: &str, provider: &str, resource: &str) -> String {
        format!(
            "{}/providers/{}/{}",
            self.resource_group_path(resource_group),
            provider,
            resource
        )
    }

    /// Build Azure Resource Manager URL
    pub fn build_arm_url(&self, path: &str, api_version: &str) -> String {
        format!("{}{}?api-version={}", self.endpoint, path, api_version)
    }

    async fn get_management_token(&self) -> Result<String> {
        let token = self.auth_provider.get_token(&[MANAGEMENT_SCOPE]).await?;
        Ok(token.token.secret().to_string())
    }

    async fn create_headers(&self) -> Result<HeaderMap> {
        let token = self.get_management_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", token).parse().map_err(|e| {
                ProvisionError::authentication(format!("Invalid token format: {}", e))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Response> {
        let headers = self.create_headers().await?;
        let mut request = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))
    }

    /// Parse Azure error response
    pub fn parse_azure_error(status: u16, body: &str) -> ProvisionError {
        if let Ok(error_json) = serde_json::from_str::<Value>(body) {
            if let Some(error) = error_json.get("error") {
                let code = error.get("code").and_then(|c| c.as_str());
                if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
                    return match code {
                        Some(code) => ProvisionError::azure_api(format!(
                            "HTTP {} ({}): {}",
                            status, code, message
                        )),
                        None => ProvisionError::azure_api(format!("HTTP {}: {}", status, message)),
                    };
                }
            }
        }
        ProvisionError::azure_api(format!("HTTP {}: {}", status, body))
    }

    async fn error_from_response(response: Response) -> ProvisionError {
        let status_code = response.status().as_u16();
        let error_body = response.text().await.unwrap_or_default();
        Self::parse_azure_error(status_code, &error_body)
    }

    /// PUT a resource and return its final representation once provisioning finishes
    pub async fn put_resource(&self, path: &str, api_version: &str, body: &Value) -> Result<Value> {
        let url = self.build_arm_url(path, api_version);
        let response = self.send(Method::PUT, &url, Some(body)).await?;

        match self.wait_for_completion(response, Some(&url)).await? {
            Some(resource) => Ok(resource),
            None => Err(ProvisionError::azure_api(format!(
                "Resource Manager returned no body for {}",
                path
            ))),
        }
    }

    /// DELETE a resource and wait until the deletion has finished
    pub async fn delete_resource(&self, path: &str, api_version: &str) -> Result<()> {
        let url = self.build_arm_url(path, api_version);
        let response = self.send(Method::DELETE, &url, None).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("{} was already gone", path);
            return Ok(());
        }

        self.wait_for_completion(response, None).await?;
        Ok(())
    }

    /// POST an action (`listKeys`, `publishxml`, ...) and return the raw body
    pub async fn post_action(
        &self,
        path: &str,
        api_version: &str,
        body: Option<&Value>,
    ) -> Result<String> {
        let url = self.build_arm_url(path, api_version);
        let response = self.send(Method::POST, &url, body).await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .text()
            .await
            .map_err(|e| ProvisionError::network(format!("Failed to read response from {}: {}", path, e)))
    }

    /// Follow an ARM response to its terminal state.
    ///
    /// `resource_url` is fetched after an `Azure-AsyncOperation` completes so that
    /// the caller gets the final resource body; deletes pass `None`.
    async fn wait_for_completion(
        &self,
        response: Response,
        resource_url: Option<&str>,
    ) -> Result<Option<Value>> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let async_operation = header_value(response.headers(), ASYNC_OPERATION_HEADER);
        let location = header_value(response.headers(), LOCATION.as_str());
        let interval = retry_after(response.headers()).unwrap_or(self.poll.interval);
        let pending = status == StatusCode::ACCEPTED || status == StatusCode::CREATED;

        if pending {
            if let Some(operation_url) = async_operation {
                self.poll_async_operation(&operation_url, interval).await?;
                return match resource_url {
                    Some(url) => self.get_json(url).await.map(Some),
                    None => Ok(None),
                };
            }
            if status == StatusCode::ACCEPTED {
                if let Some(location_url) = location {
                    return self.poll_location(&location_url, interval).await;
                }
            }
        }

        read_optional_json(response).await
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.send(Method::GET, url, None).await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        read_optional_json(response)
            .await?
            .ok_or_else(|| ProvisionError::azure_api(format!("Empty response body from {}", url)))
    }

    async fn poll_async_operation(&self, operation_url: &str, interval: Duration) -> Result<()> {
        let deadline = Instant::now() + self.poll.timeout;
        let mut interval = interval;

        loop {
            if Instant::now() >= deadline {
                return Err(ProvisionError::timeout(format!(
                    "long-running operation {}",
                    operation_url
                )));
            }
            sleep(interval).await;

            let response = self.send(Method::GET, operation_url, None).await?;
            if !response.status().is_success() {
                return Err(Self::error_from_response(response).await);
            }
            interval = retry_after(response.headers()).unwrap_or(self.poll.interval);

            let body = read_optional_json(response).await?.unwrap_or(Value::Null);
            match body.get("status").and_then(|s| s.as_str()) {
                Some("Succeeded") => return Ok(()),
                Some(terminal @ ("Failed" | "Canceled")) => {
                    let message = body
                        .pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .unwrap_or("no error details");
                    return Err(ProvisionError::azure_api(format!(
                        "Operation {}: {}",
                        terminal.to_lowercase(),
                        message
                    )));
                }
                other => tracing::debug!("Operation still running (status: {:?})", other),
            }
        }
    }

    async fn poll_location(&self, location_url: &str, interval: Duration) -> Result<Option<Value>> {
        let deadline = Instant::now() + self.poll.timeout;
        let mut interval = interval;

        loop {
            if Instant::now() >= deadline {
                return Err(ProvisionError::timeout(format!(
                    "long-running operation {}",
                    location_url
                )));
            }
            sleep(interval).await;

            let response = self.send(Method::GET, location_url, None).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::error_from_response(response).await);
            }
            if status == StatusCode::ACCEPTED {
                interval = retry_after(response.headers()).unwrap_or(self.poll.interval);
                continue;
            }
            return read_optional_json(response).await;
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

async fn read_optional_json(response: Response) -> Result<Option<Value>> {
    let text = response
        .text()
        .await
        .map_err(|e| ProvisionError::network(format!("Failed to read response body: {}", e)))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| ProvisionError::serialization(format!("Failed to parse ARM response: {}", e)))
}
