//! Extraction run counters.
//!
//! Shared across concurrent extractions via `Arc`; counters are relaxed
//! atomics since they only feed logging and the CLI summary.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::models::ExtractionTier;

/// Live counters for one extractor instance.
#[derive(Debug, Default)]
pub struct ExtractionStats {
    total: AtomicU64,
    success: AtomicU64,
    tier1_dom: AtomicU64,
    tier2_headless: AtomicU64,
    tier3_trafilatura: AtomicU64,
    tier4_ai: AtomicU64,
    tier5_alternate: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub success: u64,
    pub tier1_dom: u64,
    pub tier2_headless: u64,
    pub tier3_trafilatura: u64,
    pub tier4_ai: u64,
    pub tier5_alternate: u64,
    pub failed: u64,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished extraction: which tier produced the returned
    /// text (or `Failed`) and whether it was a full success.
    pub fn record(&self, tier: ExtractionTier, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success.fetch_add(1, Ordering::Relaxed);
        }
        let counter = match tier {
            ExtractionTier::Tier1Dom => &self.tier1_dom,
            ExtractionTier::Tier2Headless => &self.tier2_headless,
            ExtractionTier::Tier3Trafilatura => &self.tier3_trafilatura,
            ExtractionTier::Tier4Ai => &self.tier4_ai,
            ExtractionTier::Tier5Alternate => &self.tier5_alternate,
            ExtractionTier::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            tier1_dom: self.tier1_dom.load(Ordering::Relaxed),
            tier2_headless: self.tier2_headless.load(Ordering::Relaxed),
            tier3_trafilatura: self.tier3_trafilatura.load(Ordering::Relaxed),
            tier4_ai: self.tier4_ai.load(Ordering::Relaxed),
            tier5_alternate: self.tier5_alternate.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Log a one-line summary at info level.
    pub fn log_summary(&self) {
        let s = self.snapshot();
        log::info!(
            "Extraction stats: {} total, {} success, tiers [dom={} headless={} trafilatura={} ai={} alternate={}], {} failed",
            s.total,
            s.success,
            s.tier1_dom,
            s.tier2_headless,
            s.tier3_trafilatura,
            s.tier4_ai,
            s.tier5_alternate,
            s.failed
        );
    }
}
