// src/pipeline/extract.rs

//! Tiered article extraction.
//!
//! Tiers run strictly in order: static DOM, headless rendering, generic
//! fulltext, LLM reconstruction, mirror copies. The first candidate that
//! clears the content guards at full article length ends the cascade;
//! otherwise the longest rejected candidate is carried forward and reported
//! as a partial, or as a snippet when it tripped the teaser-pattern guard.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use reqwest::Client;
use url::Url;

use crate::capabilities::Capabilities;
use crate::error::AppError;
use crate::models::{Config, ExtractionResult, ExtractionStatus, ExtractionTier, PageMetadata};
use crate::pipeline::guards::{ContentGuards, GuardVerdict};
use crate::pipeline::stats::ExtractionStats;
use crate::services::{
    ARCHIVE_STRIP_SELECTORS, DomExtractor, HeadlessClient, LlmClient, MirrorClient,
};

/// Why a tier produced no candidate.
#[derive(Debug)]
pub enum TierError {
    /// The tier cannot run in this configuration: feature compiled out,
    /// endpoint or key missing, or an input precondition is not met.
    Unavailable,
    /// The tier ran and came back empty-handed.
    Failed(String),
}

/// Text produced by a single tier, before guard evaluation.
#[derive(Debug, Clone)]
pub struct TierCandidate {
    pub tier: ExtractionTier,
    pub text: String,
}

/// State carried across the tiers of a single extraction.
#[derive(Default)]
struct Cascade {
    metadata: Option<PageMetadata>,
    page_html: Option<String>,
    best: Option<(TierCandidate, GuardVerdict)>,
    last_error: Option<String>,
}

/// Orchestrates the tier cascade for one URL at a time.
///
/// Construction is cheap apart from the shared HTTP client; the extractor is
/// `Send + Sync` and meant to be wrapped in an [`Arc`] and shared across
/// concurrent extractions.
pub struct Extractor {
    config: Arc<Config>,
    client: Client,
    guards: ContentGuards,
    capabilities: Capabilities,
    dom: DomExtractor,
    headless: Option<HeadlessClient>,
    llm: Option<LlmClient>,
    mirrors: Option<MirrorClient>,
    stats: Arc<ExtractionStats>,
}

impl Extractor {
    pub fn new(config: Arc<Config>) -> Self {
        let client = Client::builder()
            .user_agent(&config.global.user_agent)
            .timeout(Duration::from_secs(config.global.request_timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        let capabilities = Capabilities::resolve(&config);
        capabilities.log_summary();

        Self {
            guards: ContentGuards::new(config.guards.clone()),
            dom: DomExtractor::new(Arc::clone(&config)),
            headless: capabilities.headless.then(|| HeadlessClient::new(&config)),
            llm: capabilities.ai.then(|| LlmClient::new(&config)),
            mirrors: capabilities.alternate.then(|| MirrorClient::new(&config)),
            stats: Arc::new(ExtractionStats::new()),
            client,
            capabilities,
            config,
        }
    }

    /// Per-process counters, shared across all extractions on this instance.
    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    /// Runs the full tier cascade for one URL. Never fails outright: every
    /// outcome, including an invalid URL, is folded into the result.
    pub async fn extract(&self, url: &str, language: &str) -> ExtractionResult {
        let started = Instant::now();

        if !is_valid_url(url) {
            log::warn!("Rejected invalid URL: {url:?}");
            self.stats.record(ExtractionTier::Failed, false);
            return ExtractionResult::failed("Invalid URL", elapsed_ms(&started));
        }

        log::info!("Extracting {url}");
        let mut cascade = Cascade::default();

        let outcome = self
            .tier1_dom(url, &mut cascade.metadata, &mut cascade.page_html)
            .await;
        if let Some(result) = self.judge(ExtractionTier::Tier1Dom, outcome, &mut cascade, &started)
        {
            return result;
        }

        let outcome = self.tier2_headless(url, &mut cascade.metadata).await;
        if let Some(result) =
            self.judge(ExtractionTier::Tier2Headless, outcome, &mut cascade, &started)
        {
            return result;
        }

        let page_html = cascade.page_html.take();
        let outcome = self
            .tier3_fulltext(url, page_html.as_deref(), &mut cascade.metadata)
            .await;
        if let Some(result) =
            self.judge(ExtractionTier::Tier3Trafilatura, outcome, &mut cascade, &started)
        {
            return result;
        }

        let partial = cascade.best.as_ref().map(|(c, _)| c.clone());
        let outcome = self
            .tier4_ai(url, partial.as_ref(), &cascade.metadata, language)
            .await;
        if let Some(result) = self.judge(ExtractionTier::Tier4Ai, outcome, &mut cascade, &started) {
            return result;
        }

        let outcome = self.tier5_alternate(url, &mut cascade.metadata).await;
        if let Some(result) =
            self.judge(ExtractionTier::Tier5Alternate, outcome, &mut cascade, &started)
        {
            return result;
        }

        self.epilogue(url, cascade, &started)
    }

    /// Extracts a batch of URLs with bounded concurrency, preserving input
    /// order in the output.
    pub async fn extract_batch(&self, urls: &[String], language: &str) -> Vec<ExtractionResult> {
        let concurrency = self.config.global.max_concurrent.max(1);
        stream::iter(urls)
            .map(|url| self.extract(url, language))
            .buffered(concurrency)
            .collect()
            .await
    }

    /// Fetch the raw page and run the DOM strategies over it.
    async fn tier1_dom(
        &self,
        url: &str,
        metadata: &mut Option<PageMetadata>,
        page_html: &mut Option<String>,
    ) -> Result<TierCandidate, TierError> {
        if !self.config.tiers.dom.enabled {
            return Err(TierError::Unavailable);
        }

        let html = self
            .fetch_page(url, self.config.tiers.dom.timeout_secs)
            .await
            .map_err(|e| TierError::Failed(e.to_string()))?;

        merge_metadata(metadata, self.dom.extract_metadata(&html, url));
        let text = self.dom.extract_article(&html, url, &[]);
        // Keep the fetched document around so the fulltext tier can reprocess
        // it without a second request.
        *page_html = Some(html);

        let text = text.ok_or_else(|| TierError::Failed("no article content in DOM".to_string()))?;
        Ok(TierCandidate {
            tier: ExtractionTier::Tier1Dom,
            text,
        })
    }

    /// Render the page in a remote browser, then reuse the DOM strategies.
    async fn tier2_headless(
        &self,
        url: &str,
        metadata: &mut Option<PageMetadata>,
    ) -> Result<TierCandidate, TierError> {
        let Some(headless) = &self.headless else {
            return Err(TierError::Unavailable);
        };

        let html = headless
            .render(url)
            .await
            .map_err(|e| TierError::Failed(e.to_string()))?;
        merge_metadata(metadata, self.dom.extract_metadata(&html, url));

        let text = self
            .dom
            .extract_article(&html, url, &[])
            .ok_or_else(|| TierError::Failed("no article content in rendered DOM".to_string()))?;
        Ok(TierCandidate {
            tier: ExtractionTier::Tier2Headless,
            text,
        })
    }

    /// Generic fulltext extraction over the whole document, without
    /// site-specific selectors.
    #[cfg(feature = "fulltext")]
    async fn tier3_fulltext(
        &self,
        url: &str,
        page_html: Option<&str>,
        metadata: &mut Option<PageMetadata>,
    ) -> Result<TierCandidate, TierError> {
        use spider_transformations::transformation::content::{
            ReturnFormat, TransformConfig, TransformInput, transform_content_input,
        };

        if !self.capabilities.fulltext {
            return Err(TierError::Unavailable);
        }

        let fetched;
        let html = match page_html {
            Some(html) => html,
            None => {
                fetched = self
                    .fetch_page(url, self.config.tiers.fulltext.timeout_secs)
                    .await
                    .map_err(|e| TierError::Failed(e.to_string()))?;
                merge_metadata(metadata, self.dom.extract_metadata(&fetched, url));
                &fetched
            }
        };

        let parsed_url = Url::parse(url).ok();
        let transform = TransformConfig {
            readability: true,
            main_content: true,
            return_format: ReturnFormat::Markdown,
            filter_images: true,
            filter_svg: true,
            clean_html: true,
        };
        let input = TransformInput {
            url: parsed_url.as_ref(),
            content: html.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        };

        let text = transform_content_input(input, &transform);
        if text.trim().is_empty() {
            return Err(TierError::Failed("empty fulltext output".to_string()));
        }
        Ok(TierCandidate {
            tier: ExtractionTier::Tier3Trafilatura,
            text,
        })
    }

    #[cfg(not(feature = "fulltext"))]
    async fn tier3_fulltext(
        &self,
        _url: &str,
        _page_html: Option<&str>,
        _metadata: &mut Option<PageMetadata>,
    ) -> Result<TierCandidate, TierError> {
        Err(TierError::Unavailable)
    }

    /// Ask the LLM to reconstruct the article from the best partial text.
    /// Skipped entirely unless a sufficiently long partial exists.
    async fn tier4_ai(
        &self,
        url: &str,
        best_partial: Option<&TierCandidate>,
        metadata: &Option<PageMetadata>,
        language: &str,
    ) -> Result<TierCandidate, TierError> {
        let Some(llm) = &self.llm else {
            return Err(TierError::Unavailable);
        };
        let Some(partial) = best_partial else {
            return Err(TierError::Unavailable);
        };
        if partial.text.chars().count() < self.config.tiers.ai.min_partial_length {
            return Err(TierError::Unavailable);
        }

        let title = metadata.as_ref().map_or("", |m| m.title.as_str());
        let text = llm
            .reconstruct_article(url, title, &partial.text, language)
            .await
            .map_err(|e| TierError::Failed(e.to_string()))?;
        Ok(TierCandidate {
            tier: ExtractionTier::Tier4Ai,
            text,
        })
    }

    /// Fetch a mirror copy of the page: web cache first, then the most
    /// recent archive snapshot.
    async fn tier5_alternate(
        &self,
        url: &str,
        metadata: &mut Option<PageMetadata>,
    ) -> Result<TierCandidate, TierError> {
        let Some(mirrors) = &self.mirrors else {
            return Err(TierError::Unavailable);
        };
        let strip: Vec<String> = ARCHIVE_STRIP_SELECTORS
            .iter()
            .map(|s| s.to_string())
            .collect();

        match mirrors.fetch_cached(url).await {
            Ok(html) => {
                merge_metadata(metadata, self.dom.extract_metadata(&html, url));
                if let Some(text) = self.dom.extract_article(&html, url, &strip) {
                    return Ok(TierCandidate {
                        tier: ExtractionTier::Tier5Alternate,
                        text,
                    });
                }
                log::debug!("Cache copy of {url} had no extractable content");
            }
            Err(e) => log::debug!("Cache fetch failed for {url}: {e}"),
        }

        let html = mirrors
            .fetch_archived(url)
            .await
            .map_err(|e| TierError::Failed(e.to_string()))?;
        merge_metadata(metadata, self.dom.extract_metadata(&html, url));

        let text = self
            .dom
            .extract_article(&html, url, &strip)
            .ok_or_else(|| TierError::Failed("no article content in archive snapshot".to_string()))?;
        Ok(TierCandidate {
            tier: ExtractionTier::Tier5Alternate,
            text,
        })
    }

    async fn fetch_page(&self, url: &str, timeout_secs: u64) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api("origin", format!("{status} for {url}")));
        }
        Ok(response.text().await?)
    }

    /// Applies the acceptance rule to one tier outcome. Returns a final
    /// result on success; otherwise records the candidate as the running
    /// best partial (longest text wins) and lets the cascade continue.
    fn judge(
        &self,
        tier: ExtractionTier,
        outcome: Result<TierCandidate, TierError>,
        cascade: &mut Cascade,
        started: &Instant,
    ) -> Option<ExtractionResult> {
        let candidate = match outcome {
            Ok(candidate) => candidate,
            Err(TierError::Unavailable) => {
                log::debug!("{} unavailable, skipping", tier.as_str());
                return None;
            }
            Err(TierError::Failed(reason)) => {
                log::warn!("{} failed: {reason}", tier.as_str());
                cascade.last_error = Some(reason);
                return None;
            }
        };

        let title = cascade
            .metadata
            .as_ref()
            .map_or("", |m| m.title.as_str());
        let verdict = self.guards.validate(&candidate.text, title);
        let chars = candidate.text.chars().count();

        if verdict.overall_pass && chars >= self.config.global.min_article_length {
            log::info!("{} accepted with {chars} chars", candidate.tier.as_str());
            self.stats.record(candidate.tier, true);
            return Some(self.build_result(
                candidate,
                verdict,
                &cascade.metadata,
                ExtractionStatus::Success,
                String::new(),
                started,
            ));
        }

        log::debug!(
            "{} rejected at {chars} chars: {:?}",
            candidate.tier.as_str(),
            verdict.failed
        );
        let longer = cascade
            .best
            .as_ref()
            .map_or(true, |(held, _)| chars > held.text.chars().count());
        if longer && !candidate.text.trim().is_empty() {
            cascade.best = Some((candidate, verdict));
        }
        None
    }

    /// Settles the result once every tier has had its turn.
    fn epilogue(&self, url: &str, cascade: Cascade, started: &Instant) -> ExtractionResult {
        match cascade.best {
            None => {
                log::warn!("All extraction tiers exhausted for {url}");
                self.stats.record(ExtractionTier::Failed, false);
                let error = match cascade.last_error {
                    Some(reason) => format!("All extraction tiers exhausted: {reason}"),
                    None => "All extraction tiers exhausted".to_string(),
                };
                ExtractionResult::failed(error, elapsed_ms(started))
            }
            Some((candidate, verdict)) => {
                let status = if verdict.has_failed("no_snippet_patterns") {
                    ExtractionStatus::Snippet
                } else {
                    ExtractionStatus::Partial
                };
                log::info!(
                    "Keeping {} text from {} for {url}",
                    status.as_str(),
                    candidate.tier.as_str()
                );
                self.stats.record(candidate.tier, false);
                self.build_result(
                    candidate,
                    verdict,
                    &cascade.metadata,
                    status,
                    String::new(),
                    started,
                )
            }
        }
    }

    fn build_result(
        &self,
        candidate: TierCandidate,
        verdict: GuardVerdict,
        metadata: &Option<PageMetadata>,
        status: ExtractionStatus,
        error: String,
        started: &Instant,
    ) -> ExtractionResult {
        let meta = metadata.clone().unwrap_or_default();
        let word_count = ExtractionResult::count_words(&candidate.text);
        let char_count = candidate.text.chars().count();
        ExtractionResult {
            success: status == ExtractionStatus::Success,
            status,
            tier_used: candidate.tier,
            full_text: candidate.text,
            title: meta.title,
            authors: meta.authors,
            images: meta.images,
            publish_date: meta.publish_date,
            word_count,
            char_count,
            guards_passed: verdict.passed,
            guards_failed: verdict.failed,
            error,
            extraction_time_ms: elapsed_ms(started),
        }
    }
}

/// Later tiers may see richer documents than earlier ones; take fresh
/// metadata whenever the held copy is absent or has no title.
fn merge_metadata(slot: &mut Option<PageMetadata>, fresh: PageMetadata) {
    match slot {
        None => *slot = Some(fresh),
        Some(held) if held.title.trim().is_empty() && !fresh.title.trim().is_empty() => {
            *slot = Some(fresh)
        }
        Some(_) => {}
    }
}

fn is_valid_url(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

fn elapsed_ms(started: &Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.tiers.headless.enabled = false;
        config.tiers.ai.enabled = false;
        config.tiers.alternate.enabled = false;
        config
    }

    fn make_extractor(config: Config) -> Extractor {
        Extractor::new(Arc::new(config))
    }

    fn storm_paragraphs() -> [&'static str; 4] {
        [
            "Bão số ba đổ bộ vào khu vực ven biển miền trung sáng nay với sức gió \
             mạnh cấp mười hai giật cấp mười lăm khiến nhiều ngôi nhà bị tốc mái \
             và hàng loạt cây xanh gãy đổ trên các tuyến phố chính của thành phố",
            "Chính quyền địa phương đã sơ tán khẩn cấp hàng nghìn hộ dân ra khỏi \
             vùng nguy hiểm đồng thời huy động lực lượng cứu hộ túc trực tại những \
             điểm xung yếu để ứng phó kịp thời khi tình huống xấu xảy ra",
            "Theo trung tâm dự báo khí tượng thủy văn quốc gia hoàn lưu bão sẽ tiếp \
             tục gây mưa rất to cho các tỉnh từ thanh hóa đến quảng bình trong hai \
             ngày tới người dân cần chủ động phòng tránh lũ quét và sạt lở đất",
            "Các hồ chứa thủy điện trong khu vực đã được lệnh xả lũ đón đỉnh nhằm \
             bảo đảm an toàn cho vùng hạ du trong khi các đơn vị quân đội được huy \
             động hỗ trợ người dân chằng chống nhà cửa và thu hoạch lúa chạy bão",
        ]
    }

    /// A clean article page: four long paragraphs plus the usual page chrome.
    fn article_page() -> String {
        let body = storm_paragraphs()
            .iter()
            .map(|p| format!("<p>{p}</p>"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "<html><head>\
             <title>Bão số 3 đổ bộ miền Trung - Tin nhanh</title>\
             <meta property=\"og:title\" content=\"Bão số 3 đổ bộ miền Trung\">\
             <meta name=\"author\" content=\"Trần Văn An\">\
             <meta property=\"article:published_time\" content=\"2026-08-20T09:30:00+07:00\">\
             </head><body>\
             <nav><a href=\"/\">Trang chủ</a></nav>\
             <article>{body}</article>\
             <footer>Liên hệ quảng cáo</footer>\
             </body></html>"
        )
    }

    /// An SPA shell with no server-rendered content at all.
    const SPA_SHELL: &str = "<html><head><title></title></head><body>\
                             <div id=\"app\"></div>\
                             <script src=\"/bundle.js\"></script>\
                             </body></html>";

    fn chat_completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn test_url_validation_rules() {
        assert!(is_valid_url("https://vnexpress.net/bao-so-3.html"));
        assert!(is_valid_url("http://localhost:8080/x"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("   "));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url("/relative/path"));
    }

    #[test]
    fn test_merge_metadata_prefers_titled_pages() {
        let mut slot = None;
        merge_metadata(&mut slot, PageMetadata::default());
        assert!(slot.is_some());

        let fresh = PageMetadata {
            title: "Bão số 3".to_string(),
            ..PageMetadata::default()
        };
        merge_metadata(&mut slot, fresh);
        assert_eq!(slot.as_ref().unwrap().title, "Bão số 3");

        // An already-titled slot is kept.
        let other = PageMetadata {
            title: "Khác".to_string(),
            ..PageMetadata::default()
        };
        merge_metadata(&mut slot, other);
        assert_eq!(slot.as_ref().unwrap().title, "Bão số 3");
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_fetching() {
        let extractor = make_extractor(test_config());

        let result = extractor.extract("not a url", "vi").await;
        assert!(!result.success);
        assert_eq!(result.status, ExtractionStatus::Failed);
        assert_eq!(result.tier_used, ExtractionTier::Failed);
        assert_eq!(result.error, "Invalid URL");
        assert!(result.full_text.is_empty());

        let result = extractor.extract("ftp://example.com/x", "vi").await;
        assert_eq!(result.error, "Invalid URL");

        let stats = extractor.stats().snapshot();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.failed, 2);
    }

    #[tokio::test]
    async fn test_tier1_succeeds_on_clean_article() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bao-so-3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .mount(&server)
            .await;

        let extractor = make_extractor(test_config());
        let result = extractor
            .extract(&format!("{}/bao-so-3", server.uri()), "vi")
            .await;

        assert!(
            result.success,
            "error: {:?} guards: {:?}",
            result.error, result.guards_failed
        );
        assert_eq!(result.status, ExtractionStatus::Success);
        assert_eq!(result.tier_used, ExtractionTier::Tier1Dom);
        assert!(result.char_count >= 500);
        assert!(result.word_count > 100);
        assert_eq!(result.title, "Bão số 3 đổ bộ miền Trung");
        assert_eq!(result.authors, vec!["Trần Văn An".to_string()]);
        assert!(result.guards_failed.is_empty());
        assert!(result.error.is_empty());

        let stats = extractor.stats().snapshot();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.tier1_dom, 1);
    }

    #[tokio::test]
    async fn test_success_skips_later_tiers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bao-so-3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .mount(&server)
            .await;
        // Neither the browser endpoint nor the LLM may be touched when the
        // first tier already yields a full article.
        Mock::given(method("POST"))
            .and(path("/content"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("x")))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.tiers.headless.enabled = true;
        config.tiers.headless.endpoint = server.uri();
        config.tiers.ai.enabled = true;
        config.tiers.ai.endpoint = server.uri();
        config.tiers.ai.api_key = "sk-test".to_string();

        let extractor = make_extractor(config);
        let result = extractor
            .extract(&format!("{}/bao-so-3", server.uri()), "vi")
            .await;
        assert_eq!(result.tier_used, ExtractionTier::Tier1Dom);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_headless_tier_takes_over_for_empty_shell() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spa"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SPA_SHELL))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content"))
            .and(body_partial_json(json!({
                "gotoOptions": { "waitUntil": "networkidle2" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.tiers.headless.enabled = true;
        config.tiers.headless.endpoint = server.uri();

        let extractor = make_extractor(config);
        let result = extractor
            .extract(&format!("{}/spa", server.uri()), "vi")
            .await;

        assert!(
            result.success,
            "error: {:?} guards: {:?}",
            result.error, result.guards_failed
        );
        assert_eq!(result.tier_used, ExtractionTier::Tier2Headless);
        // Metadata comes from the rendered document, not the empty shell.
        assert_eq!(result.title, "Bão số 3 đổ bộ miền Trung");

        let stats = extractor.stats().snapshot();
        assert_eq!(stats.tier2_headless, 1);
    }

    #[tokio::test]
    async fn test_fulltext_tier_refetches_after_transient_error() {
        let server = MockServer::start().await;
        // First request (tier 1) is a transient failure; the retry from the
        // fulltext tier gets the real page.
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .mount(&server)
            .await;

        let extractor = make_extractor(test_config());
        let result = extractor
            .extract(&format!("{}/flaky", server.uri()), "vi")
            .await;

        assert_eq!(result.tier_used, ExtractionTier::Tier3Trafilatura);
        assert_ne!(result.status, ExtractionStatus::Failed);
        assert!(result.full_text.contains("sơ tán"));
    }

    #[tokio::test]
    async fn test_snippet_page_is_reported_as_snippet() {
        let server = MockServer::start().await;
        let teaser = "<html><body><article>\
                      <p>Bão số ba đang tiến vào đất liền. Xem thêm tại đây.</p>\
                      </article></body></html>";
        Mock::given(method("GET"))
            .and(path("/teaser"))
            .respond_with(ResponseTemplate::new(200).set_body_string(teaser))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.tiers.fulltext.enabled = false;

        let extractor = make_extractor(config);
        let result = extractor
            .extract(&format!("{}/teaser", server.uri()), "vi")
            .await;

        assert!(!result.success);
        assert_eq!(result.status, ExtractionStatus::Snippet);
        assert_eq!(result.tier_used, ExtractionTier::Tier1Dom);
        assert!(result.full_text.contains("Xem thêm"));
        assert!(result
            .guards_failed
            .iter()
            .any(|f| f.starts_with("no_snippet_patterns")));
    }

    #[tokio::test]
    async fn test_short_article_is_reported_as_partial() {
        let server = MockServer::start().await;
        let [first, second, ..] = storm_paragraphs();
        let page = format!(
            "<html><body><article><p>{first}</p><p>{second}</p></article></body></html>"
        );
        Mock::given(method("GET"))
            .and(path("/short"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.tiers.fulltext.enabled = false;

        let extractor = make_extractor(config);
        let result = extractor
            .extract(&format!("{}/short", server.uri()), "vi")
            .await;

        assert!(!result.success);
        assert_eq!(result.status, ExtractionStatus::Partial);
        assert_eq!(result.tier_used, ExtractionTier::Tier1Dom);
        assert!(result.full_text.contains("sơ tán"));
        assert!(result
            .guards_failed
            .iter()
            .any(|f| f.starts_with("min_length")));

        let stats = extractor.stats().snapshot();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.success, 0);
        assert_eq!(stats.tier1_dom, 1);
    }

    #[tokio::test]
    async fn test_ai_tier_reconstructs_from_partial() {
        let server = MockServer::start().await;
        // A single long paragraph: enough for the reconstruction gate but
        // nowhere near a full article.
        let [first, second, ..] = storm_paragraphs();
        let page = format!(
            "<html><head>\
             <meta property=\"og:title\" content=\"Bão số 3 đổ bộ miền Trung\">\
             </head><body><article><p>{first} {second}</p></article></body></html>"
        );
        Mock::given(method("GET"))
            .and(path("/gated"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let full_text = storm_paragraphs().join("\n\n");
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(&full_text)))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.tiers.ai.enabled = true;
        config.tiers.ai.endpoint = server.uri();
        config.tiers.ai.api_key = "sk-test".to_string();

        let extractor = make_extractor(config);
        let result = extractor
            .extract(&format!("{}/gated", server.uri()), "vi")
            .await;

        assert!(
            result.success,
            "error: {:?} guards: {:?}",
            result.error, result.guards_failed
        );
        assert_eq!(result.tier_used, ExtractionTier::Tier4Ai);
        assert_eq!(result.status, ExtractionStatus::Success);
        assert!(result.char_count >= 500);

        let stats = extractor.stats().snapshot();
        assert_eq!(stats.tier4_ai, 1);
    }

    #[tokio::test]
    async fn test_alternate_tier_reads_archive_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cache"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wayback"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "archived_snapshots": {
                    "closest": {
                        "available": true,
                        "url": format!("{}/snapshot", server.uri()),
                        "timestamp": "20260820093000",
                        "status": "200"
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/snapshot"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.tiers.alternate.enabled = true;
        config.tiers.alternate.cache_base = format!("{}/cache?u=", server.uri());
        config.tiers.alternate.archive_base = format!("{}/wayback?url=", server.uri());

        let extractor = make_extractor(config);
        let result = extractor
            .extract(&format!("{}/gone", server.uri()), "vi")
            .await;

        assert!(
            result.success,
            "error: {:?} guards: {:?}",
            result.error, result.guards_failed
        );
        assert_eq!(result.tier_used, ExtractionTier::Tier5Alternate);

        let stats = extractor.stats().snapshot();
        assert_eq!(stats.tier5_alternate, 1);
    }

    #[tokio::test]
    async fn test_exhausted_cascade_reports_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let extractor = make_extractor(test_config());
        let result = extractor
            .extract(&format!("{}/down", server.uri()), "vi")
            .await;

        assert!(!result.success);
        assert_eq!(result.status, ExtractionStatus::Failed);
        assert_eq!(result.tier_used, ExtractionTier::Failed);
        // The last tier failure is carried into the terminal error message.
        assert!(result.error.starts_with("All extraction tiers exhausted"));
        assert!(result.error.contains("500"), "error: {:?}", result.error);
        assert!(result.full_text.is_empty());

        let stats = extractor.stats().snapshot();
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bao-so-3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .mount(&server)
            .await;

        let extractor = make_extractor(test_config());
        let urls = vec![format!("{}/bao-so-3", server.uri()), "bogus".to_string()];
        let results = extractor.extract_batch(&urls, "vi").await;

        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[1].error, "Invalid URL");

        let stats = extractor.stats().snapshot();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.failed, 1);
    }
}
