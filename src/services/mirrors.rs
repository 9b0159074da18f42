// src/services/mirrors.rs

//! Alternate-source fetching: web cache and web archive.
//!
//! When the origin site blocks or breaks, a copy of the article often
//! survives in a search-engine cache or the Wayback Machine. The cache is a
//! plain prefix fetch; the archive needs an availability lookup first, then
//! a fetch of the closest snapshot.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Archive snapshots wrap the page in a replay chrome; these elements are
/// stripped before extraction.
pub const ARCHIVE_STRIP_SELECTORS: &[&str] = &["#wm-ipp-base", "#wm-ipp", "#donato", "#playback"];

#[derive(Debug, Deserialize)]
struct WaybackAvailability {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<ClosestSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ClosestSnapshot {
    #[serde(default)]
    available: bool,
    url: String,
}

/// Client for cache and archive copies of an article URL.
pub struct MirrorClient {
    client: Client,
    cache_base: String,
    archive_base: String,
}

impl MirrorClient {
    pub fn new(config: &Config) -> Self {
        let alternate = &config.tiers.alternate;
        let client = Client::builder()
            .user_agent(&config.global.user_agent)
            .timeout(Duration::from_secs(alternate.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            cache_base: alternate.cache_base.clone(),
            archive_base: alternate.archive_base.clone(),
        }
    }

    /// Fetch the web-cache copy of a URL.
    pub async fn fetch_cached(&self, url: &str) -> Result<String> {
        let cache_url = format!("{}{}", self.cache_base, url);
        self.fetch_html("cache", &cache_url).await
    }

    /// Fetch the closest archived snapshot of a URL, if one exists.
    pub async fn fetch_archived(&self, url: &str) -> Result<String> {
        let availability_url = format!("{}{}", self.archive_base, url);
        let response = self.client.get(&availability_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api("archive", format!("availability lookup: {status}")));
        }

        let availability: WaybackAvailability = response.json().await?;
        let snapshot = availability
            .archived_snapshots
            .closest
            .filter(|s| s.available && !s.url.is_empty())
            .ok_or_else(|| AppError::api("archive", "no snapshot available"))?;

        log::debug!("Archive snapshot for {}: {}", url, snapshot.url);
        self.fetch_html("archive", &snapshot.url).await
    }

    async fn fetch_html(&self, service: &str, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api(service, format!("{status} for {url}")));
        }
        Ok(response.text().await?)
    }
}
