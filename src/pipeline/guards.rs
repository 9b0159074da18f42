//! Content quality guards.
//!
//! Each extracted text runs through ten independent checks before it is
//! accepted as a full article. Thresholds come from [`GuardConfig`].
//!
//! ## Acceptance rule
//!
//! > A text is publishable when both critical checks (`min_length`,
//! > `no_snippet_patterns`) pass and at most `max_failed_guards` checks
//! > fail in total.

use std::collections::HashSet;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::GuardConfig;

/// Outcome of running all guards against one text.
#[derive(Debug, Clone)]
pub struct GuardVerdict {
    /// Names of checks that passed
    pub passed: Vec<String>,
    /// Failed checks as `"name (reason)"`
    pub failed: Vec<String>,
    /// Final accept/reject decision
    pub overall_pass: bool,
}

impl GuardVerdict {
    /// Whether the named check is among the failures.
    pub fn has_failed(&self, name: &str) -> bool {
        let prefix = format!("{name} (");
        self.failed.iter().any(|f| f.starts_with(&prefix))
    }
}

/// Quality gate for extracted article text.
#[derive(Debug, Clone)]
pub struct ContentGuards {
    config: GuardConfig,
    paragraph_re: Regex,
}

impl ContentGuards {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            paragraph_re: Regex::new(r"\n\s*\n").expect("Failed to compile paragraph regex"),
        }
    }

    /// Run all ten checks and compute the overall verdict.
    pub fn validate(&self, text: &str, title: &str) -> GuardVerdict {
        let lower = text.to_lowercase();

        let checks: [(&str, bool, Option<String>); 10] = [
            ("min_length", true, self.check_min_length(text)),
            ("min_paragraphs", false, self.check_min_paragraphs(text)),
            (
                "special_char_ratio",
                false,
                self.check_special_char_ratio(text),
            ),
            ("numeric_ratio", false, self.check_numeric_ratio(text)),
            (
                "no_snippet_patterns",
                true,
                self.check_snippet_patterns(&lower),
            ),
            (
                "title_repetition",
                false,
                self.check_title_repetition(&lower, title),
            ),
            (
                "no_navigation_spam",
                false,
                self.check_navigation_spam(&lower),
            ),
            ("unique_words", false, self.check_unique_words(&lower)),
            ("no_reject_patterns", false, self.check_reject_patterns(&lower)),
            (
                "vietnamese_content",
                false,
                self.check_vietnamese_content(text),
            ),
        ];

        let mut passed = Vec::new();
        let mut failed = Vec::new();
        let mut critical_failed = false;

        for (name, critical, outcome) in checks {
            match outcome {
                None => passed.push(name.to_string()),
                Some(reason) => {
                    if critical {
                        critical_failed = true;
                    }
                    failed.push(format!("{name} ({reason})"));
                }
            }
        }

        let overall_pass = !critical_failed && failed.len() <= self.config.max_failed_guards;

        GuardVerdict {
            passed,
            failed,
            overall_pass,
        }
    }

    fn check_min_length(&self, text: &str) -> Option<String> {
        let len = text.chars().count();
        (len < self.config.min_length).then(|| format!("{} < {}", len, self.config.min_length))
    }

    fn check_min_paragraphs(&self, text: &str) -> Option<String> {
        let count = self
            .paragraph_re
            .split(text)
            .filter(|p| !p.trim().is_empty())
            .count();
        (count < self.config.min_paragraphs)
            .then(|| format!("{} < {}", count, self.config.min_paragraphs))
    }

    fn check_special_char_ratio(&self, text: &str) -> Option<String> {
        let total = text.chars().count();
        if total == 0 {
            return None;
        }
        let special = text
            .chars()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
            .count();
        let ratio = special as f64 / total as f64;
        (ratio > self.config.max_special_char_ratio)
            .then(|| format!("{:.2} > {:.2}", ratio, self.config.max_special_char_ratio))
    }

    fn check_numeric_ratio(&self, text: &str) -> Option<String> {
        let total = text.chars().count();
        if total == 0 {
            return None;
        }
        let digits = text.chars().filter(char::is_ascii_digit).count();
        let ratio = digits as f64 / total as f64;
        (ratio > self.config.max_numeric_ratio)
            .then(|| format!("{:.2} > {:.2}", ratio, self.config.max_numeric_ratio))
    }

    fn check_snippet_patterns(&self, lower: &str) -> Option<String> {
        self.config
            .snippet_patterns
            .iter()
            .find(|p| lower.contains(p.as_str()))
            .map(|p| format!("contains '{p}'"))
    }

    fn check_title_repetition(&self, lower: &str, title: &str) -> Option<String> {
        let title = title.trim().to_lowercase();
        if title.is_empty() {
            return None;
        }
        let count = lower.matches(&title).count();
        (count > self.config.max_title_repetitions).then(|| {
            format!(
                "title appears {} times (max {})",
                count, self.config.max_title_repetitions
            )
        })
    }

    fn check_navigation_spam(&self, lower: &str) -> Option<String> {
        let count = self
            .config
            .navigation_keywords
            .iter()
            .filter(|kw| lower.contains(kw.as_str()))
            .count();
        (count >= self.config.max_navigation_keywords).then(|| {
            format!(
                "{} navigation keywords (limit {})",
                count, self.config.max_navigation_keywords
            )
        })
    }

    fn check_unique_words(&self, lower: &str) -> Option<String> {
        let unique: HashSet<&str> = lower.unicode_words().collect();
        (unique.len() < self.config.min_unique_words)
            .then(|| format!("{} < {}", unique.len(), self.config.min_unique_words))
    }

    fn check_reject_patterns(&self, lower: &str) -> Option<String> {
        self.config
            .reject_patterns
            .iter()
            .find(|p| lower.contains(p.as_str()))
            .map(|p| format!("contains '{p}'"))
    }

    /// Non-ASCII letters (diacritics, đ/Đ) as a share of all characters.
    /// Half the configured ratio is accepted so articles quoting English
    /// sources at length still pass.
    fn check_vietnamese_content(&self, text: &str) -> Option<String> {
        let total = text.chars().count();
        if total == 0 {
            return None;
        }
        let vietnamese = text
            .chars()
            .filter(|c| !c.is_ascii() && c.is_alphabetic())
            .count();
        let ratio = vietnamese as f64 / total as f64;
        let floor = self.config.vietnamese_ratio / 2.0;
        (ratio < floor).then(|| format!("{ratio:.2} < {floor:.2}"))
    }
}
