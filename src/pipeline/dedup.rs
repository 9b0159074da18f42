// src/pipeline/dedup.rs

//! Duplicate detection for incoming articles.
//!
//! Three layers run in strict priority order: exact content hash, exact
//! normalized title, then fuzzy title similarity. A hit in an earlier layer
//! is final even when a later layer would score some other candidate higher.
//! Everything happens in memory over the caller's recent-window candidates;
//! nothing is fetched or persisted here.

use chrono::{DateTime, Duration, Utc};
use strsim::normalized_levenshtein;

use crate::models::{DedupCandidate, DedupConfig, DedupFields, DedupMatch, MatchType};

pub struct DedupMatcher {
    config: DedupConfig,
}

impl DedupMatcher {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Looks for a duplicate of a new item among `candidates`.
    ///
    /// `fields` are the new item's precomputed comparison fields and
    /// `reference` its ingest time; candidates older than the dedup window
    /// relative to `reference` are ignored. Candidates without a timestamp
    /// are assumed to be inside the window. On a fuzzy tie the candidate
    /// listed first wins, so callers should order candidates oldest first.
    pub fn find_duplicate(
        &self,
        candidates: &[DedupCandidate],
        fields: &DedupFields,
        reference: DateTime<Utc>,
    ) -> Option<DedupMatch> {
        let cutoff = reference - Duration::hours(self.config.window_hours);
        let in_window: Vec<&DedupCandidate> = candidates
            .iter()
            .filter(|c| c.created_at.map_or(true, |t| t >= cutoff))
            .collect();

        if let Some(hash) = fields.content_hash.as_deref() {
            for candidate in &in_window {
                if candidate.content_hash.as_deref() == Some(hash) {
                    log::debug!("Exact hash match against candidate {}", candidate.id);
                    return Some(DedupMatch {
                        duplicate_id: candidate.id,
                        similarity: 1.0,
                        match_type: MatchType::ExactHash,
                    });
                }
            }
        }

        let title = fields.normalized_title.as_str();
        if title.is_empty() {
            return None;
        }

        for candidate in &in_window {
            if candidate.normalized() == title {
                log::debug!("Exact title match against candidate {}", candidate.id);
                return Some(DedupMatch {
                    duplicate_id: candidate.id,
                    similarity: 1.0,
                    match_type: MatchType::ExactTitle,
                });
            }
        }

        let mut best: Option<(i64, f64)> = None;
        for candidate in &in_window {
            let other = candidate.normalized();
            if other.is_empty() {
                continue;
            }
            let similarity = normalized_levenshtein(title, &other);
            if similarity >= self.config.similarity_threshold
                && best.map_or(true, |(_, held)| similarity > held)
            {
                best = Some((candidate.id, similarity));
            }
        }
        best.map(|(id, similarity)| {
            log::debug!("Fuzzy title match against candidate {id} at {similarity:.3}");
            DedupMatch {
                duplicate_id: id,
                similarity,
                match_type: MatchType::FuzzyTitle,
            }
        })
    }
}
