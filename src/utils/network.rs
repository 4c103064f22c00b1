use crate::error::{ProvisionError, Result};
use reqwest::Client;
use std::time::Duration;

/// Configuration for HTTP clients talking to Azure and to the deployed app
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("azprov/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl NetworkConfig {
    /// Same defaults with a different overall request timeout
    pub fn with_request_timeout(timeout: Duration) -> Self {
        Self {
            request_timeout: timeout,
            ..Self::default()
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| ProvisionError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a transport-level reqwest failure into a readable error naming the host
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> ProvisionError {
    let host = extract_host(url);

    if error.is_timeout() {
        return ProvisionError::timeout(format!("request to '{}' timed out", host));
    }

    if error.is_connect() {
        if is_dns_resolution_error(error) {
            return ProvisionError::network(format!(
                "Unable to resolve host '{}'. Check your network connection and DNS settings.",
                host
            ));
        }

        return ProvisionError::network(format!("Failed to connect to '{}': {}", host, error));
    }

    let lowered = error.to_string().to_lowercase();
    if lowered.contains("ssl") || lowered.contains("tls") || lowered.contains("certificate") {
        return ProvisionError::network(format!(
            "SSL/TLS connection error when accessing '{}': {}",
            host, error
        ));
    }

    ProvisionError::network(format!("Network error when accessing '{}': {}", host, error))
}

fn is_dns_resolution_error(error: &reqwest::Error) -> bool {
    let error_msg = error.to_string().to_lowercase();
    let dns_indicators = [
        "dns",
        "name resolution",
        "resolve",
        "lookup",
        "name or service not known",
        "nodename nor servname provided",
        "no such host",
        "getaddrinfo failed",
    ];

    dns_indicators
        .iter()
        .any(|&indicator| error_msg.contains(indicator))
}

fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        assert_eq!(
            extract_host("https://management.azure.com/subscriptions/abc?api-version=1"),
            "management.azure.com"
        );
        assert_eq!(extract_host("not a url"), "not a url");
    }

    #[test]
    fn test_request_timeout_override() {
        let config = NetworkConfig::with_request_timeout(Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("azprov/"));
    }
}
