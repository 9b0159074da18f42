//! Application configuration structures.
//!
//! Every field carries a serde default so a partial TOML file (or none at
//! all) falls back to the hardcoded values; `Config::validate` sanity-checks
//! ranges after loading.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared HTTP and article-size settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Content guard thresholds and pattern lists
    #[serde(default)]
    pub guards: GuardConfig,

    /// Per-tier extraction settings
    #[serde(default)]
    pub tiers: TiersConfig,

    /// Duplicate matching settings
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Per-site selector overrides, keyed by domain
    #[serde(default = "defaults::default_sites")]
    pub sites: HashMap<String, SiteConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.global.user_agent.trim().is_empty() {
            return Err(AppError::validation("global.user_agent is empty"));
        }
        if self.global.request_timeout_secs == 0 {
            return Err(AppError::validation(
                "global.request_timeout_secs must be > 0",
            ));
        }
        if self.global.min_article_length == 0 {
            return Err(AppError::validation(
                "global.min_article_length must be > 0",
            ));
        }
        if self.global.max_concurrent == 0 {
            return Err(AppError::validation("global.max_concurrent must be > 0"));
        }
        if self.guards.min_length == 0 {
            return Err(AppError::validation("guards.min_length must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.guards.max_special_char_ratio)
            || !(0.0..=1.0).contains(&self.guards.max_numeric_ratio)
            || !(0.0..=1.0).contains(&self.guards.vietnamese_ratio)
        {
            return Err(AppError::validation("guard ratios must be within 0..=1"));
        }
        // Ten guards total; tolerating 10+ failures would disable the rule.
        if self.guards.max_failed_guards > 9 {
            return Err(AppError::validation(
                "guards.max_failed_guards must be <= 9",
            ));
        }
        if !(0.0..=1.0).contains(&self.dedup.similarity_threshold) {
            return Err(AppError::validation(
                "dedup.similarity_threshold must be within 0..=1",
            ));
        }
        if self.dedup.window_hours <= 0 {
            return Err(AppError::validation("dedup.window_hours must be > 0"));
        }
        if self.tiers.ai.min_partial_length == 0 {
            return Err(AppError::validation(
                "tiers.ai.min_partial_length must be > 0",
            ));
        }
        Ok(())
    }

    /// Look up the selector pack for a domain, ignoring a `www.` prefix.
    pub fn site_for(&self, domain: &str) -> Option<&SiteConfig> {
        self.sites
            .get(domain)
            .or_else(|| self.sites.get(domain.strip_prefix("www.")?))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            guards: GuardConfig::default(),
            tiers: TiersConfig::default(),
            dedup: DedupConfig::default(),
            sites: defaults::default_sites(),
        }
    }
}

/// Shared HTTP client and article-size settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Minimum character count for a returned article
    #[serde(default = "defaults::min_article_length")]
    pub min_article_length: usize,

    /// Default request timeout in seconds
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Maximum concurrent extractions when processing a batch
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            min_article_length: defaults::min_article_length(),
            request_timeout_secs: defaults::request_timeout(),
            user_agent: defaults::user_agent(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Content guard thresholds and pattern lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Minimum text length in characters
    #[serde(default = "defaults::guard_min_length")]
    pub min_length: usize,

    /// Minimum number of blank-line-separated paragraphs
    #[serde(default = "defaults::guard_min_paragraphs")]
    pub min_paragraphs: usize,

    /// Maximum ratio of non-alphanumeric, non-whitespace characters
    #[serde(default = "defaults::guard_max_special_char_ratio")]
    pub max_special_char_ratio: f64,

    /// Maximum ratio of digit characters
    #[serde(default = "defaults::guard_max_numeric_ratio")]
    pub max_numeric_ratio: f64,

    /// Maximum times the title may repeat inside the body
    #[serde(default = "defaults::guard_max_title_repetitions")]
    pub max_title_repetitions: usize,

    /// Distinct navigation keywords tolerated before the text counts as spam
    #[serde(default = "defaults::guard_max_navigation_keywords")]
    pub max_navigation_keywords: usize,

    /// Minimum count of distinct word tokens
    #[serde(default = "defaults::guard_min_unique_words")]
    pub min_unique_words: usize,

    /// Vietnamese character-ratio threshold; the check passes at half of it
    #[serde(default = "defaults::guard_vietnamese_ratio")]
    pub vietnamese_ratio: f64,

    /// Total guard failures tolerated before the verdict flips
    #[serde(default = "defaults::guard_max_failed_guards")]
    pub max_failed_guards: usize,

    /// "read more"-style truncation markers (critical guard)
    #[serde(default = "defaults::snippet_patterns")]
    pub snippet_patterns: Vec<String>,

    /// Menu/section labels that betray scraped navigation
    #[serde(default = "defaults::navigation_keywords")]
    pub navigation_keywords: Vec<String>,

    /// Hard-reject substrings (error pages, consent walls)
    #[serde(default = "defaults::reject_patterns")]
    pub reject_patterns: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            min_length: defaults::guard_min_length(),
            min_paragraphs: defaults::guard_min_paragraphs(),
            max_special_char_ratio: defaults::guard_max_special_char_ratio(),
            max_numeric_ratio: defaults::guard_max_numeric_ratio(),
            max_title_repetitions: defaults::guard_max_title_repetitions(),
            max_navigation_keywords: defaults::guard_max_navigation_keywords(),
            min_unique_words: defaults::guard_min_unique_words(),
            vietnamese_ratio: defaults::guard_vietnamese_ratio(),
            max_failed_guards: defaults::guard_max_failed_guards(),
            snippet_patterns: defaults::snippet_patterns(),
            navigation_keywords: defaults::navigation_keywords(),
            reject_patterns: defaults::reject_patterns(),
        }
    }
}

/// Per-tier extraction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TiersConfig {
    #[serde(default)]
    pub dom: DomTierConfig,

    #[serde(default)]
    pub headless: HeadlessTierConfig,

    #[serde(default)]
    pub fulltext: FulltextTierConfig,

    #[serde(default)]
    pub ai: AiTierConfig,

    #[serde(default)]
    pub alternate: AlternateTierConfig,
}

/// Tier 1: structured DOM parse of the fetched page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomTierConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::dom_timeout")]
    pub timeout_secs: u64,

    /// Generic content selectors tried when no site override matches
    #[serde(default = "defaults::fallback_selectors")]
    pub fallback_selectors: Vec<String>,

    /// Elements excluded from harvested content
    #[serde(default = "defaults::strip_selectors")]
    pub strip_selectors: Vec<String>,
}

impl Default for DomTierConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            timeout_secs: defaults::dom_timeout(),
            fallback_selectors: defaults::fallback_selectors(),
            strip_selectors: defaults::strip_selectors(),
        }
    }
}

/// Tier 2: headless-browser rendering service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessTierConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Base URL of a Browserless-compatible service; empty disables the tier
    #[serde(default)]
    pub endpoint: String,

    /// API token appended as a query parameter
    #[serde(default)]
    pub token: String,

    /// Selector waited for before the rendered DOM is captured
    #[serde(default = "defaults::headless_content_selector")]
    pub content_selector: String,

    #[serde(default = "defaults::headless_timeout")]
    pub timeout_secs: u64,
}

impl Default for HeadlessTierConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            endpoint: String::new(),
            token: String::new(),
            content_selector: defaults::headless_content_selector(),
            timeout_secs: defaults::headless_timeout(),
        }
    }
}

/// Tier 3: generic boilerplate-removal extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulltextTierConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::fulltext_timeout")]
    pub timeout_secs: u64,
}

impl Default for FulltextTierConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            timeout_secs: defaults::fulltext_timeout(),
        }
    }
}

/// Tier 4: AI reconstruction from partial content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiTierConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// OpenAI-compatible API base URL
    #[serde(default = "defaults::ai_endpoint")]
    pub endpoint: String,

    /// API key; falls back to the OPENAI_API_KEY environment variable
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "defaults::ai_model")]
    pub model: String,

    /// Minimum partial-text length before reconstruction is attempted
    #[serde(default = "defaults::ai_min_partial_length")]
    pub min_partial_length: usize,

    #[serde(default = "defaults::ai_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "defaults::ai_timeout")]
    pub timeout_secs: u64,
}

impl Default for AiTierConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            endpoint: defaults::ai_endpoint(),
            api_key: String::new(),
            model: defaults::ai_model(),
            min_partial_length: defaults::ai_min_partial_length(),
            max_tokens: defaults::ai_max_tokens(),
            timeout_secs: defaults::ai_timeout(),
        }
    }
}

/// Tier 5: web-cache and web-archive cross-fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternateTierConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::alternate_timeout")]
    pub timeout_secs: u64,

    /// Web-cache mirror prefix the article URL is appended to
    #[serde(default = "defaults::cache_base")]
    pub cache_base: String,

    /// Archive availability API prefix the article URL is appended to
    #[serde(default = "defaults::archive_base")]
    pub archive_base: String,
}

impl Default for AlternateTierConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            timeout_secs: defaults::alternate_timeout(),
            cache_base: defaults::cache_base(),
            archive_base: defaults::archive_base(),
        }
    }
}

/// Duplicate matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Recent-time window candidates must fall within
    #[serde(default = "defaults::dedup_window_hours")]
    pub window_hours: i64,

    /// Fuzzy-title similarity floor
    #[serde(default = "defaults::dedup_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_hours: defaults::dedup_window_hours(),
            similarity_threshold: defaults::dedup_similarity_threshold(),
        }
    }
}

/// Selector overrides for a single news site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Content container selectors, tried in order
    pub selectors: Vec<String>,

    /// Site-specific elements excluded from harvested content
    #[serde(default)]
    pub remove_elements: Vec<String>,
}

mod defaults {
    use std::collections::HashMap;

    use super::SiteConfig;

    // Global defaults
    pub fn min_article_length() -> usize {
        500
    }
    pub fn request_timeout() -> u64 {
        15
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
            .into()
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Guard defaults
    pub fn guard_min_length() -> usize {
        500
    }
    pub fn guard_min_paragraphs() -> usize {
        3
    }
    pub fn guard_max_special_char_ratio() -> f64 {
        0.15
    }
    pub fn guard_max_numeric_ratio() -> f64 {
        0.30
    }
    pub fn guard_max_title_repetitions() -> usize {
        2
    }
    pub fn guard_max_navigation_keywords() -> usize {
        5
    }
    pub fn guard_min_unique_words() -> usize {
        50
    }
    pub fn guard_vietnamese_ratio() -> f64 {
        0.10
    }
    pub fn guard_max_failed_guards() -> usize {
        3
    }
    pub fn snippet_patterns() -> Vec<String> {
        [
            "xem thêm",
            "đọc thêm",
            "xem tiếp",
            "đọc tiếp",
            "xem chi tiết",
            "đọc toàn bộ bài viết",
            "read more",
            "continue reading",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn navigation_keywords() -> Vec<String> {
        [
            "trang chủ",
            "đăng nhập",
            "đăng ký",
            "liên hệ",
            "quảng cáo",
            "tìm kiếm",
            "chuyên mục",
            "mới nhất",
            "thời sự",
            "thể thao",
            "giải trí",
            "kinh doanh",
            "home",
            "login",
            "menu",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn reject_patterns() -> Vec<String> {
        [
            "vui lòng bật javascript",
            "javascript is disabled",
            "trang không tồn tại",
            "không tìm thấy trang",
            "404 not found",
            "access denied",
            "please enable cookies",
            "đang kiểm tra trình duyệt",
            "captcha",
        ]
        .map(String::from)
        .to_vec()
    }

    // Tier defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn dom_timeout() -> u64 {
        15
    }
    pub fn headless_content_selector() -> String {
        "article".into()
    }
    pub fn headless_timeout() -> u64 {
        40
    }
    pub fn fulltext_timeout() -> u64 {
        20
    }
    pub fn ai_endpoint() -> String {
        "https://api.openai.com/v1".into()
    }
    pub fn ai_model() -> String {
        "gpt-4o-mini".into()
    }
    pub fn ai_min_partial_length() -> usize {
        300
    }
    pub fn ai_max_tokens() -> u32 {
        2000
    }
    pub fn ai_timeout() -> u64 {
        60
    }
    pub fn alternate_timeout() -> u64 {
        20
    }
    pub fn cache_base() -> String {
        "https://webcache.googleusercontent.com/search?q=cache:".into()
    }
    pub fn archive_base() -> String {
        "https://archive.org/wayback/available?url=".into()
    }

    pub fn fallback_selectors() -> Vec<String> {
        [
            "article",
            "div.article-content",
            "div.detail-content",
            "div.content-detail",
            "div.post-content",
            "div.entry-content",
            "div#main-content",
            "main",
        ]
        .map(String::from)
        .to_vec()
    }
    pub fn strip_selectors() -> Vec<String> {
        [
            "script",
            "style",
            "nav",
            "header",
            "footer",
            "aside",
            "iframe",
            ".advertisement",
            ".banner",
            ".related-news",
            ".comment-box",
            ".social-share",
        ]
        .map(String::from)
        .to_vec()
    }

    // Dedup defaults
    pub fn dedup_window_hours() -> i64 {
        48
    }
    pub fn dedup_similarity_threshold() -> f64 {
        0.85
    }

    // Selector packs for the major Vietnamese news sites
    pub fn default_sites() -> HashMap<String, SiteConfig> {
        let mut sites = HashMap::new();
        sites.insert(
            "vnexpress.net".to_string(),
            SiteConfig {
                selectors: vec!["article.fck_detail".into()],
                remove_elements: vec!["div.box_brief_info".into(), "div#box_comment_vne".into()],
            },
        );
        sites.insert(
            "tuoitre.vn".to_string(),
            SiteConfig {
                selectors: vec!["div.detail-content".into()],
                remove_elements: vec!["div.detail-relate".into(), "div#InreadPc".into()],
            },
        );
        sites.insert(
            "dantri.com.vn".to_string(),
            SiteConfig {
                selectors: vec!["div.singular-content".into()],
                remove_elements: vec!["div.dt-ads".into()],
            },
        );
        sites.insert(
            "thanhnien.vn".to_string(),
            SiteConfig {
                selectors: vec!["div.detail-content".into()],
                remove_elements: vec!["div.detail-related".into()],
            },
        );
        sites.insert(
            "vietnamnet.vn".to_string(),
            SiteConfig {
                selectors: vec!["div.maincontent".into(), "div.content-detail".into()],
                remove_elements: vec!["div.inner-article-bottom".into()],
            },
        );
        sites.insert(
            "nhandan.vn".to_string(),
            SiteConfig {
                selectors: vec!["div.article__body".into()],
                remove_elements: vec![],
            },
        );
        sites.insert(
            "laodong.vn".to_string(),
            SiteConfig {
                selectors: vec!["div.art-body".into()],
                remove_elements: vec![],
            },
        );
        sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.global.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.global.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.dedup.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_vacuous_guard_tolerance() {
        let mut config = Config::default();
        config.guards.max_failed_guards = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn site_lookup_ignores_www_prefix() {
        let config = Config::default();
        assert!(config.site_for("vnexpress.net").is_some());
        assert!(config.site_for("www.vnexpress.net").is_some());
        assert!(config.site_for("unknown.example").is_none());
    }

    #[test]
    fn load_or_default_falls_back_on_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is { not toml").unwrap();

        let config = Config::load_or_default(&path);
        assert_eq!(config.guards.min_length, 500);

        let missing = Config::load_or_default(dir.path().join("nope.toml"));
        assert_eq!(missing.dedup.window_hours, 48);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let config: Config = toml::from_str(
            r#"
            [guards]
            min_length = 200

            [tiers.headless]
            endpoint = "http://localhost:3000"
            "#,
        )
        .unwrap();
        assert_eq!(config.guards.min_length, 200);
        assert_eq!(config.guards.min_paragraphs, 3);
        assert_eq!(config.tiers.headless.endpoint, "http://localhost:3000");
        assert_eq!(config.tiers.ai.min_partial_length, 300);
        assert!(config.site_for("tuoitre.vn").is_some());
    }
}
