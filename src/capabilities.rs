// src/capabilities.rs

//! Runtime capability detection.
//!
//! Which extraction tiers can actually run depends on compile-time features
//! (readability, fulltext) and on configuration (endpoints, API keys).
//! Resolving this once at startup lets the extractor skip dead tiers
//! silently instead of failing them on every URL.

use crate::models::Config;

/// Tiers available to the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Readability-style strategy inside the DOM tier
    pub dom_readability: bool,
    /// Tier 2: a headless endpoint is configured
    pub headless: bool,
    /// Tier 3: generic fulltext extraction compiled in
    pub fulltext: bool,
    /// Tier 4: an API key is available
    pub ai: bool,
    /// Tier 5: cache/archive cross-fetch
    pub alternate: bool,
}

impl Capabilities {
    pub fn resolve(config: &Config) -> Self {
        let headless =
            config.tiers.headless.enabled && !config.tiers.headless.endpoint.trim().is_empty();
        let ai = config.tiers.ai.enabled
            && (!config.tiers.ai.api_key.trim().is_empty()
                || std::env::var("OPENAI_API_KEY").is_ok_and(|v| !v.trim().is_empty()));
        Self {
            dom_readability: cfg!(feature = "readability"),
            headless,
            fulltext: config.tiers.fulltext.enabled && cfg!(feature = "fulltext"),
            ai,
            alternate: config.tiers.alternate.enabled,
        }
    }

    pub fn log_summary(&self) {
        log::info!(
            "Capabilities: readability={} headless={} fulltext={} ai={} alternate={}",
            mark(self.dom_readability),
            mark(self.headless),
            mark(self.fulltext),
            mark(self.ai),
            mark(self.alternate)
        );
    }
}

fn mark(available: bool) -> &'static str {
    if available { "on" } else { "off" }
}
