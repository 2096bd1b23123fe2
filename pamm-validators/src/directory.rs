use std::time::Duration;

use async_trait::async_trait;
use pamm_types::constants::{DEFAULT_NETWORK, DEFAULT_REQUEST_TIMEOUT, VALIDATORS_APP_BASE_URL};
use reqwest::Client;
use serde_json::Value;

use crate::error::FetchError;

/// Source of raw validator metadata records.
#[async_trait]
pub trait ValidatorDirectory: Send + Sync {
    /// Fetch the raw JSON record of one validator.
    async fn fetch(&self, validator_id: &str) -> Result<Value, FetchError>;
}

/// validators.app REST client.
pub struct ValidatorsAppClient {
    client: Client,
    base_url: String,
    network: String,
    token: String,
}

impl ValidatorsAppClient {
    pub fn new(token: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_options(token, VALIDATORS_APP_BASE_URL, DEFAULT_NETWORK, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_options(
        token: impl Into<String>,
        base_url: &str,
        network: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            network: network.to_string(),
            token: token.into(),
        })
    }

    /// Endpoint for a single validator.
    pub fn url(&self, validator_id: &str) -> String {
        format!(
            "{}/validators/{}/{}.json",
            self.base_url, self.network, validator_id
        )
    }
}

#[async_trait]
impl ValidatorDirectory for ValidatorsAppClient {
    async fn fetch(&self, validator_id: &str) -> Result<Value, FetchError> {
        let url = self.url(validator_id);
        tracing::debug!(%url, "requesting validator metadata");
        let response = self
            .client
            .get(&url)
            .header("Token", &self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}
