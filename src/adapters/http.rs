use crate::config::file_config::AppConfig;
use crate::core::PageSource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// HTTP transport for the CloudView connector listing.
#[derive(Debug, Clone)]
pub struct CloudViewClient {
    client: Client,
    url: Url,
    username: String,
    password: String,
}

impl CloudViewClient {
    pub fn new(
        base_url: &str,
        endpoint: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
        verify_ssl: bool,
    ) -> Result<Self> {
        let joined = format!("{}{}", base_url.trim_end_matches('/'), endpoint);
        let url = Url::parse(&joined).map_err(|e| EtlError::InvalidConfigValueError {
            field: "qualys.base_url".to_string(),
            value: joined.clone(),
            reason: e.to_string(),
        })?;

        if !verify_ssl {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()?;

        Ok(Self {
            client,
            url,
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.qualys.base_url,
            &config.api.endpoint,
            config.qualys.username.clone(),
            config.qualys.password.clone(),
            Duration::from_secs(config.qualys.timeout_seconds),
            config.qualys.verify_ssl,
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// One listing page exactly as the API returned it.
    pub async fn fetch_raw(&self, page: u32, per_page: u32) -> Result<Value> {
        tracing::debug!(url = %self.url, page, per_page, "Requesting connector page");

        let response = self
            .client
            .get(self.url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("pageNumber", page), ("pageSize", per_page)])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        if !status.is_success() {
            return Err(EtlError::HttpStatus {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| EtlError::malformed("body", format!("response is not JSON: {}", e)))
    }
}

#[async_trait]
impl PageSource for CloudViewClient {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Value> {
        self.fetch_raw(page, per_page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = CloudViewClient::new(
            "https://qualysguard.qg2.apps.qualys.eu/",
            "/cloudview-api/rest/v1/aws/connectors",
            "user",
            "pass",
            Duration::from_secs(5),
            true,
        )
        .unwrap();
        assert_eq!(
            client.url().as_str(),
            "https://qualysguard.qg2.apps.qualys.eu/cloudview-api/rest/v1/aws/connectors"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = CloudViewClient::new(
            "qualys",
            "/connectors",
            "user",
            "pass",
            Duration::from_secs(5),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_from_default_config() {
        let client = CloudViewClient::from_config(&AppConfig::default()).unwrap();
        assert_eq!(client.url().path(), "/cloudview-api/rest/v1/aws/connectors");
    }
}
