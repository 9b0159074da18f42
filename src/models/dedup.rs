//! Duplicate-detection types.
//!
//! The matcher owns none of the persisted records; the caller's repository
//! supplies [`DedupCandidate`] rows from the recent window and stores the
//! [`DedupFields`] computed here alongside each new item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::get_domain;
use crate::utils::text::{compute_content_hash, normalize_title};

/// How a duplicate was identified, strongest signal first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Identical content hash — verbatim reuse of the same wire copy
    ExactHash,
    /// Identical normalized title
    ExactTitle,
    /// Normalized-title similarity above the configured threshold
    FuzzyTitle,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::ExactHash => "exact_hash",
            MatchType::ExactTitle => "exact_title",
            MatchType::FuzzyTitle => "fuzzy_title",
        }
    }
}

/// A positive duplicate verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupMatch {
    pub duplicate_id: i64,
    pub similarity: f64,
    pub match_type: MatchType,
}

/// An already-ingested item offered as a duplicate candidate.
///
/// `normalized_title` may be precomputed by the repository; when absent it is
/// derived on the fly. A missing `created_at` is treated as inside the dedup
/// window (candidates are normally pre-filtered by the caller's query).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupCandidate {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub normalized_title: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl DedupCandidate {
    /// The candidate's normalized title, honoring a precomputed value.
    pub fn normalized(&self) -> String {
        self.normalized_title
            .clone()
            .unwrap_or_else(|| normalize_title(&self.title))
    }
}

/// Precomputed comparison fields stored with every ingested item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupFields {
    /// Diacritic-stripped, length-capped canonical title
    pub normalized_title: String,
    /// SHA-256 of the first 500 normalized description chars, if any
    pub content_hash: Option<String>,
    /// Host part of the article URL
    pub source_domain: Option<String>,
}

impl DedupFields {
    /// Compute the fields for a freshly ingested item.
    pub fn compute(title: &str, description: &str, url: &str) -> Self {
        Self {
            normalized_title: normalize_title(title),
            content_hash: compute_content_hash(description),
            source_domain: get_domain(url),
        }
    }
}
