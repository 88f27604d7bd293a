use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{Result, StripError};
use crate::config::HttpConfig;
use crate::fetcher::Fetcher;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StripError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StripError::fetch(url, format!("HTTP status {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StripError::fetch(url, e))?;

        Ok(body.to_vec())
    }
}
