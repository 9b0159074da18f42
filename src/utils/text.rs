// src/utils/text.rs

//! Vietnamese-aware text normalization and content hashing.
//!
//! Both the content guards and the dedup matcher compare text through these
//! functions, so titles from different outlets ("Lũ lớn tại Quảng Bình" vs
//! "Lu lon tai Quang Binh") land on the same canonical form.

use sha2::{Digest, Sha256};

/// Maximum length of a normalized title, in characters.
pub const NORMALIZED_TITLE_MAX_CHARS: usize = 100;

/// Number of leading normalized characters fed into the content hash.
///
/// Cross-source copies of a wire-service brief usually agree on the opening
/// sentences but diverge after the lede, so hashing the full description
/// would miss exactly the duplicates we want to catch.
pub const CONTENT_HASH_CHARS: usize = 500;

/// Map a lowercase Vietnamese diacritic letter to its base Latin letter.
///
/// Covers all six tone families of a/ă/â, e/ê, i, o/ô/ơ, u/ư and y, plus đ.
/// Every other character passes through unchanged.
fn fold_vietnamese(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ'
        | 'ẩ' | 'ẫ' | 'ậ' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ'
        | 'ở' | 'ỡ' | 'ợ' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' => 'y',
        'đ' => 'd',
        _ => c,
    }
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an article title for equality and fuzzy comparison.
///
/// Lowercases, folds Vietnamese diacritics to base letters, strips everything
/// that is neither a word character nor whitespace, collapses runs of
/// whitespace to single spaces and truncates to
/// [`NORMALIZED_TITLE_MAX_CHARS`] characters. Total and idempotent; empty
/// input yields an empty string.
pub fn normalize_title(text: &str) -> String {
    let folded: String = text.to_lowercase().chars().map(fold_vietnamese).collect();
    let stripped: String = folded
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    let collapsed = collapse_whitespace(&stripped);
    let truncated: String = collapsed
        .chars()
        .take(NORMALIZED_TITLE_MAX_CHARS)
        .collect();
    // The cut can land right after a word boundary; trim so a second pass
    // through this function returns the same string.
    truncated.trim_end().to_string()
}

/// Compute the content hash for an article description.
///
/// Lowercases and collapses whitespace (diacritics are kept — this detects
/// verbatim reuse, not paraphrase), hashes the first [`CONTENT_HASH_CHARS`]
/// characters with SHA-256 and returns the lowercase hex digest. Returns
/// `None` when the description is empty after normalization; callers must
/// fall through to title matching in that case.
pub fn compute_content_hash(description: &str) -> Option<String> {
    let collapsed = collapse_whitespace(&description.to_lowercase());
    if collapsed.is_empty() {
        return None;
    }

    let head: String = collapsed.chars().take(CONTENT_HASH_CHARS).collect();
    let mut hasher = Sha256::new();
    hasher.update(head.as_bytes());
    Some(hex::encode(hasher.finalize()))
}
