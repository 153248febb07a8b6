use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::logging::log_feed_failure;

/// Source of raw feed samples. `None` means "no data this cycle".
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Option<String>;
}

/// Published-spreadsheet CSV export over HTTP.
pub struct HttpFeed {
    client: Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.feed_url.clone(),
            Duration::from_secs(cfg.request_timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_text(&self) -> Result<String> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| anyhow!("send: {}", e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("status: {}", status.as_u16()));
        }
        resp.text().await.map_err(|e| anyhow!("body: {}", e))
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Option<String> {
        match self.fetch_text().await {
            Ok(body) => Some(body),
            Err(e) => {
                let msg = e.to_string();
                let stage = msg.split(':').next().unwrap_or("send");
                log_feed_failure(stage, &msg);
                None
            }
        }
    }
}
