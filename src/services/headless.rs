// src/services/headless.rs

//! Headless-browser rendering client.
//!
//! Talks to a Browserless-compatible service: POST `{base}/content` with the
//! target URL and navigation options, get the fully rendered HTML back.
//! JavaScript-built news pages that serve an empty shell over plain HTTP
//! become extractable this way.

use std::time::Duration;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::Config;

/// How long the browser waits for the content selector to appear.
const SELECTOR_WAIT_MS: u64 = 10_000;

/// Client for a Browserless-style `/content` endpoint.
pub struct HeadlessClient {
    client: Client,
    endpoint: String,
    token: String,
    content_selector: String,
    goto_timeout_ms: u64,
}

impl HeadlessClient {
    pub fn new(config: &Config) -> Self {
        let headless = &config.tiers.headless;
        let client = Client::builder()
            .user_agent(&config.global.user_agent)
            .timeout(Duration::from_secs(headless.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: headless.endpoint.trim_end_matches('/').to_string(),
            token: headless.token.clone(),
            content_selector: headless.content_selector.clone(),
            goto_timeout_ms: headless.timeout_secs.saturating_mul(1000),
        }
    }

    /// Render a page and return its final HTML.
    ///
    /// The first attempt waits for the configured content selector. Pages
    /// that never produce it (paywalls, unusual layouts) get one retry
    /// without the wait so whatever did render still comes back.
    pub async fn render(&self, url: &str) -> Result<String> {
        match self.request(url, true).await {
            Ok(html) => Ok(html),
            Err(e) => {
                log::debug!("Headless render with selector wait failed ({}), retrying without", e);
                self.request(url, false).await
            }
        }
    }

    async fn request(&self, url: &str, wait_for_selector: bool) -> Result<String> {
        let mut endpoint = format!("{}/content", self.endpoint);
        if !self.token.is_empty() {
            endpoint.push_str(&format!("?token={}", self.token));
        }

        let mut body = serde_json::json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": "networkidle2",
                "timeout": self.goto_timeout_ms,
            },
        });
        if wait_for_selector && !self.content_selector.is_empty() {
            body["waitForSelector"] = serde_json::json!({
                "selector": self.content_selector,
                "timeout": SELECTOR_WAIT_MS,
            });
        }

        let response = self.client.post(&endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::api("headless", format!("{status}: {message}")));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn make_client(endpoint: &str) -> HeadlessClient {
        let mut config = Config::default();
        config.tiers.headless.endpoint = endpoint.to_string();
        config.tiers.headless.token = "secret".to_string();
        HeadlessClient::new(&config)
    }

    #[tokio::test]
    async fn test_render_posts_url_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/content"))
            .and(query_param("token", "secret"))
            .and(body_partial_json(json!({
                "url": "https://example.com/bao",
                "waitForSelector": { "selector": "article" },
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>rendered</body></html>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server.uri());
        let html = client.render("https://example.com/bao").await.unwrap();
        assert!(html.contains("rendered"));
    }

    #[tokio::test]
    async fn test_render_retries_without_selector_wait() {
        let server = MockServer::start().await;
        // First attempt carries waitForSelector and fails.
        Mock::given(method("POST"))
            .and(path("/content"))
            .and(body_partial_json(json!({ "waitForSelector": { "selector": "article" } })))
            .respond_with(ResponseTemplate::new(500).set_body_string("wait timed out"))
            .expect(1)
            .mount(&server)
            .await;
        // Retry without the wait succeeds.
        Mock::given(method("POST"))
            .and(path("/content"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>late render</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server.uri());
        let html = client.render("https://example.com/spa").await.unwrap();
        assert!(html.contains("late render"));
    }

    #[tokio::test]
    async fn test_render_fails_when_both_attempts_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("no workers"))
            .expect(2)
            .mount(&server)
            .await;

        let client = make_client(&server.uri());
        let err = client.render("https://example.com/x").await.unwrap_err();
        assert!(matches!(err, AppError::Api { ref service, .. } if service == "headless"));
    }
}
