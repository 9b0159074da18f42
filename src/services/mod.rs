//! Service layer for the ingestion pipeline.
//!
//! This module contains the clients the extraction tiers are built on:
//! - DOM parsing and metadata (`DomExtractor`)
//! - Headless-browser rendering (`HeadlessClient`)
//! - AI article reconstruction (`LlmClient`)
//! - Cache/archive cross-fetch (`MirrorClient`)

mod dom;
mod headless;
mod llm;
mod mirrors;

pub use dom::DomExtractor;
pub use headless::HeadlessClient;
pub use llm::LlmClient;
pub use mirrors::{ARCHIVE_STRIP_SELECTORS, MirrorClient};
