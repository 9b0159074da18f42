//! Extraction result types.
//!
//! One [`ExtractionResult`] is produced per extraction attempt and handed to
//! the caller; the pipeline never persists it. Enum fields serialize to their
//! snake_case string names so results can travel as plain JSON maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Outcome class of an extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Guard-passing full article text
    Success,
    /// Some text was recovered but it failed the content guards
    Partial,
    /// The best text looks like a truncated listing snippet
    Snippet,
    /// No usable text at all
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Success => "success",
            ExtractionStatus::Partial => "partial",
            ExtractionStatus::Snippet => "snippet",
            ExtractionStatus::Failed => "failed",
        }
    }
}

/// Which extraction strategy produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    /// Structured DOM parse of the fetched page
    Tier1Dom,
    /// Headless-browser render, then the same DOM parse
    Tier2Headless,
    /// Generic boilerplate-removal extraction
    Tier3Trafilatura,
    /// AI reconstruction from partial content
    Tier4Ai,
    /// Web-cache / web-archive cross-fetch
    Tier5Alternate,
    /// All tiers exhausted
    Failed,
}

impl ExtractionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionTier::Tier1Dom => "tier1_dom",
            ExtractionTier::Tier2Headless => "tier2_headless",
            ExtractionTier::Tier3Trafilatura => "tier3_trafilatura",
            ExtractionTier::Tier4Ai => "tier4_ai",
            ExtractionTier::Tier5Alternate => "tier5_alternate",
            ExtractionTier::Failed => "failed",
        }
    }
}

/// Page-level metadata gathered while a tier holds a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub images: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
}

/// Result of a full extraction attempt for one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub status: ExtractionStatus,
    pub tier_used: ExtractionTier,
    pub full_text: String,
    pub title: String,
    pub authors: Vec<String>,
    pub images: Vec<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub word_count: usize,
    pub char_count: usize,
    pub guards_passed: Vec<String>,
    pub guards_failed: Vec<String>,
    pub error: String,
    pub extraction_time_ms: u64,
}

impl ExtractionResult {
    /// Build a terminal failure with no recovered text.
    pub fn failed(error: impl Into<String>, extraction_time_ms: u64) -> Self {
        Self {
            success: false,
            status: ExtractionStatus::Failed,
            tier_used: ExtractionTier::Failed,
            full_text: String::new(),
            title: String::new(),
            authors: Vec::new(),
            images: Vec::new(),
            publish_date: None,
            word_count: 0,
            char_count: 0,
            guards_passed: Vec::new(),
            guards_failed: Vec::new(),
            error: error.into(),
            extraction_time_ms,
        }
    }

    /// Word count of a text body, using Unicode word boundaries.
    pub fn count_words(text: &str) -> usize {
        text.unicode_words().count()
    }
}
