//! HTTP client for the public EPG services
//!
//! Day listings come from the listing service (`{base}/channel/{id}/{date}/{part}.json`),
//! now/next from the EPG service (`{base}/channel/json/{id}/now/nn/4`). Both
//! answer with `{"listings": {"<id>": [...]}}`.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use crate::config::{SkyConfig, DEFAULT_LISTINGS_BASE_URL, DEFAULT_NOW_NEXT_BASE_URL};
use crate::error::{ApiError, Result};
use crate::listings::ProgrammeSource;
use crate::programme::{ListingsPayload, Programme};

/// [`ProgrammeSource`] backed by the Sky EPG web services
#[derive(Debug, Clone)]
pub struct SkyEpgClient {
    http: reqwest::Client,
    listings_base_url: String,
    now_next_base_url: String,
}

impl SkyEpgClient {
    pub fn new(listings_base_url: impl Into<String>, now_next_base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), listings_base_url, now_next_base_url)
    }

    pub fn with_http(
        http: reqwest::Client,
        listings_base_url: impl Into<String>,
        now_next_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            listings_base_url: trim_base(listings_base_url.into()),
            now_next_base_url: trim_base(now_next_base_url.into()),
        }
    }

    /// Client for the base URLs in `config`. Per-request timeouts are left to
    /// the [`crate::ListingAggregator`].
    pub fn from_config(config: &SkyConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self::with_http(http, &config.listings_base_url, &config.now_next_base_url)
    }

    pub fn listing_part_url(&self, channel_id: u32, date: NaiveDate, part: u8) -> String {
        format!(
            "{}/channel/{}/{}/{}.json",
            self.listings_base_url,
            channel_id,
            date.format("%Y-%m-%d"),
            part
        )
    }

    pub fn now_next_url(&self, channel_id: u32) -> String {
        format!("{}/channel/json/{}/now/nn/4", self.now_next_base_url, channel_id)
    }

    async fn get_programmes(&self, url: &str, channel_id: u32) -> Result<Vec<Programme>> {
        tracing::debug!(%url, "Fetching programmes");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::NetworkError(format!("HTTP {} from {}", status, url)));
        }

        serde_json::from_str::<ListingsPayload>(&body)?.into_programmes(channel_id)
    }
}

impl Default for SkyEpgClient {
    fn default() -> Self {
        Self::new(DEFAULT_LISTINGS_BASE_URL, DEFAULT_NOW_NEXT_BASE_URL)
    }
}

#[async_trait]
impl ProgrammeSource for SkyEpgClient {
    async fn fetch_listing_part(
        &self,
        channel_id: u32,
        date: NaiveDate,
        part: u8,
    ) -> Result<Vec<Programme>> {
        let url = self.listing_part_url(channel_id, date, part);
        self.get_programmes(&url, channel_id).await
    }

    async fn fetch_now_next(&self, channel_id: u32) -> Result<Vec<Programme>> {
        let url = self.now_next_url(channel_id);
        self.get_programmes(&url, channel_id).await
    }
}

fn trim_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}
