// src/ingest/http.rs
use reqwest::Client;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::ingest::types::AdapterError;

/// Shared client: descriptive User-Agent and a bounded per-request timeout.
#[derive(Clone, Debug)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(cfg: &FeedConfig) -> Result<Self, reqwest::Error> {
        Self::new(&cfg.user_agent, Duration::from_secs(cfg.timeout_secs))
    }

    /// GET `url` and return the body. Non-2xx maps to `AdapterError::Fetch`.
    pub async fn fetch_text(&self, url: &str) -> Result<String, AdapterError> {
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| AdapterError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AdapterError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().await.map_err(|source| AdapterError::Transport {
            url: url.to_string(),
            source,
        })
    }
}
