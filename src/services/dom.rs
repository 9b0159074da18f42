// src/services/dom.rs

//! DOM-based article extraction.
//!
//! Runs up to three strategies against parsed HTML and keeps the longest
//! result: a Readability port (feature `readability`), paragraph harvesting
//! grouped by parent container, and configured CSS selectors (site overrides
//! first, generic fallbacks after). Also pulls page metadata from Open Graph
//! and standard meta tags.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ego_tree::NodeId;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, PageMetadata};
use crate::utils::text::collapse_whitespace;
use crate::utils::{get_domain, resolve_url};

/// Extracts article text and metadata from raw HTML.
pub struct DomExtractor {
    config: Arc<Config>,
}

impl DomExtractor {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Extract article text, trying every strategy and keeping the longest
    /// result. `extra_remove` holds additional strip selectors for the
    /// current fetch (e.g. archive toolbars).
    pub fn extract_article(&self, html: &str, url: &str, extra_remove: &[String]) -> Option<String> {
        let document = Html::parse_document(html);
        let site = get_domain(url).and_then(|d| self.config.site_for(&d).cloned());
        let removed = self.removal_set(
            &document,
            site.as_ref().map_or(&[][..], |s| &s.remove_elements),
            extra_remove,
        );

        let mut candidates: Vec<(&'static str, String)> = Vec::new();

        #[cfg(feature = "readability")]
        if let Some(text) = self.readability_text(html, url) {
            candidates.push(("readability", text));
        }

        if let Some(text) = self.paragraph_harvest(&document, &removed) {
            candidates.push(("paragraph-harvest", text));
        }

        let mut selectors: Vec<String> = site.map(|s| s.selectors).unwrap_or_default();
        selectors.extend(self.config.tiers.dom.fallback_selectors.iter().cloned());
        if let Some(text) = self.selector_text(&document, &selectors, &removed) {
            candidates.push(("selectors", text));
        }

        let (strategy, text) = candidates
            .into_iter()
            .filter(|(_, t)| !t.trim().is_empty())
            .max_by_key(|(_, t)| t.chars().count())?;
        log::debug!(
            "DOM extraction: {} strategy won with {} chars for {}",
            strategy,
            text.chars().count(),
            url
        );
        Some(text)
    }

    /// Page metadata: title (og:title, then h1, then `<title>`), authors,
    /// images resolved to absolute URLs, and the published timestamp.
    pub fn extract_metadata(&self, html: &str, url: &str) -> PageMetadata {
        let document = Html::parse_document(html);
        let base = Url::parse(url).ok();

        let title = meta_content(&document, r#"meta[property="og:title"]"#)
            .or_else(|| first_text(&document, "h1"))
            .or_else(|| first_text(&document, "title"))
            .unwrap_or_default();

        let mut authors = Vec::new();
        for sel in [r#"meta[name="author"]"#, r#"meta[property="article:author"]"#] {
            for el in document.select(&static_selector(sel)) {
                if let Some(content) = el.value().attr("content") {
                    let content = content.trim();
                    if !content.is_empty() && !authors.iter().any(|a| a == content) {
                        authors.push(content.to_string());
                    }
                }
            }
        }

        let mut images = Vec::new();
        for el in document.select(&static_selector(r#"meta[property="og:image"]"#)) {
            if let Some(content) = el.value().attr("content") {
                push_image(&mut images, content, base.as_ref());
            }
        }
        for el in document.select(&static_selector("article img[src]")) {
            if let Some(src) = el.value().attr("src") {
                push_image(&mut images, src, base.as_ref());
            }
        }

        let publish_date = meta_content(&document, r#"meta[property="article:published_time"]"#)
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|d| d.with_timezone(&Utc));

        PageMetadata {
            title,
            authors,
            images,
            publish_date,
        }
    }

    #[cfg(feature = "readability")]
    fn readability_text(&self, html: &str, url: &str) -> Option<String> {
        use dom_smoothie::Readability;

        let mut reader = Readability::new(html, Some(url), None).ok()?;
        let article = reader.parse().ok()?;

        // Re-parse the cleaned content so paragraph boundaries survive.
        let fragment = Html::parse_fragment(&article.content.to_string());
        let text = self.container_text(fragment.root_element(), &HashSet::new());
        if text.trim().is_empty() {
            let plain = article.text_content.trim().to_string();
            return (!plain.is_empty()).then_some(plain);
        }
        Some(text)
    }

    /// Group paragraphs by their parent element and keep the parent with
    /// the most text. Works on pages no selector knows about.
    fn paragraph_harvest(&self, document: &Html, removed: &HashSet<NodeId>) -> Option<String> {
        let p_sel = static_selector("p");
        let mut by_parent: HashMap<NodeId, Vec<String>> = HashMap::new();
        for p in document.select(&p_sel) {
            if is_removed(&p, removed) {
                continue;
            }
            let text = collapse_whitespace(&p.text().collect::<String>());
            if text.is_empty() {
                continue;
            }
            if let Some(parent) = p.parent() {
                by_parent.entry(parent.id()).or_default().push(text);
            }
        }
        by_parent
            .into_values()
            .map(|paragraphs| paragraphs.join("\n\n"))
            .max_by_key(|t| t.chars().count())
    }

    /// Try selectors in order; the first one that matches a container with
    /// non-empty text wins.
    fn selector_text(
        &self,
        document: &Html,
        selectors: &[String],
        removed: &HashSet<NodeId>,
    ) -> Option<String> {
        for raw in selectors {
            let sel = match parse_selector(raw) {
                Ok(sel) => sel,
                Err(e) => {
                    log::warn!("Skipping content selector: {}", e);
                    continue;
                }
            };
            if let Some(container) = document.select(&sel).next() {
                let text = self.container_text(container, removed);
                if !text.trim().is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Text of a container: its paragraphs joined by blank lines, or the
    /// full subtree text when it holds no `<p>` elements.
    fn container_text(&self, container: ElementRef<'_>, removed: &HashSet<NodeId>) -> String {
        let p_sel = static_selector("p");
        let paragraphs: Vec<String> = container
            .select(&p_sel)
            .filter(|p| !is_removed(p, removed))
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect();
        if paragraphs.is_empty() {
            deep_text(container, removed)
        } else {
            paragraphs.join("\n\n")
        }
    }

    /// Node ids matched by strip selectors; descendants of these are
    /// excluded from harvested text.
    fn removal_set(
        &self,
        document: &Html,
        site_remove: &[String],
        extra_remove: &[String],
    ) -> HashSet<NodeId> {
        let mut removed = HashSet::new();
        let sources = self
            .config
            .tiers
            .dom
            .strip_selectors
            .iter()
            .chain(site_remove)
            .chain(extra_remove);
        for raw in sources {
            let sel = match parse_selector(raw) {
                Ok(sel) => sel,
                Err(e) => {
                    log::warn!("Skipping strip selector: {}", e);
                    continue;
                }
            };
            for el in document.select(&sel) {
                removed.insert(el.id());
            }
        }
        removed
    }
}

fn is_removed(el: &ElementRef<'_>, removed: &HashSet<NodeId>) -> bool {
    removed.contains(&el.id()) || el.ancestors().any(|a| removed.contains(&a.id()))
}

/// Collect text nodes under `root`, skipping stripped subtrees.
fn deep_text(root: ElementRef<'_>, removed: &HashSet<NodeId>) -> String {
    let parts: Vec<&str> = root
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(t) => {
                let stripped = node.ancestors().any(|a| removed.contains(&a.id()));
                (!stripped).then_some(&**t)
            }
            _ => None,
        })
        .collect();
    collapse_whitespace(&parts.join(" "))
}

fn meta_content(document: &Html, selector: &'static str) -> Option<String> {
    document
        .select(&static_selector(selector))
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn first_text(document: &Html, selector: &'static str) -> Option<String> {
    document
        .select(&static_selector(selector))
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn push_image(images: &mut Vec<String>, src: &str, base: Option<&Url>) {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return;
    }
    let resolved = match base {
        Some(base) => resolve_url(base, src),
        None if src.starts_with("http") => src.to_string(),
        None => return,
    };
    if !resolved.is_empty() && !images.contains(&resolved) {
        images.push(resolved);
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn static_selector(s: &'static str) -> Selector {
    Selector::parse(s).expect("Failed to parse built-in selector")
}
