//! Pipeline entry points for content ingestion.
//!
//! - `Extractor`: run the tier cascade over article URLs
//! - `ContentGuards`: quality-gate extracted text
//! - `DedupMatcher`: match new items against recently ingested ones

pub mod dedup;
pub mod extract;
pub mod guards;
pub mod stats;

pub use dedup::DedupMatcher;
pub use extract::{Extractor, TierCandidate, TierError};
pub use guards::{ContentGuards, GuardVerdict};
pub use stats::{ExtractionStats, StatsSnapshot};
