//! HTTP warm-up probe
//!
//! Plain GET requests against the deployed app, used to trigger its startup.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{ProvisionError, Result};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

/// Trait for issuing warm-up requests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn get(&self, url: &str) -> Result<ProbeResponse>;
}

/// reqwest-backed probe with a fixed timeout and optional extra headers
pub struct ReqwestProbe {
    client: Client,
    headers: HeaderMap,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration, headers: &BTreeMap<String, String>) -> Result<Self> {
        let client = create_http_client(&NetworkConfig::with_request_timeout(timeout))?;

        Ok(Self {
            client,
            headers: build_header_map(headers)?,
        })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn get(&self, url: &str) -> Result<ProbeResponse> {
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProvisionError::network(format!("Failed to read body from {}: {}", url, e)))?;

        Ok(ProbeResponse { status, body })
    }
}

fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ProvisionError::config(format!("Invalid header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            ProvisionError::config(format!("Invalid value for header '{}': {}", name, e))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
