// src/models/mod.rs

//! Domain models for the ingestion pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod dedup;
mod extraction;

// Re-export all public types
pub use config::{
    AiTierConfig, AlternateTierConfig, Config, DedupConfig, DomTierConfig, FulltextTierConfig,
    GlobalConfig, GuardConfig, HeadlessTierConfig, SiteConfig, TiersConfig,
};
pub use dedup::{DedupCandidate, DedupFields, DedupMatch, MatchType};
pub use extraction::{ExtractionResult, ExtractionStatus, ExtractionTier, PageMetadata};
