//! Response normalizers: loosely-typed backend JSON in, bounded text out
//!
//! Normalizers never fail. Missing fields degrade to explicit defaults or
//! "none found" messages.

pub mod aggregation;
pub mod evidence;
pub mod fields;
pub mod image_analysis;
pub mod text_analysis;

/// Limit for list and summary views
pub const SUMMARY_LIMIT: usize = 300;
/// Limit for detail views
pub const DETAIL_LIMIT: usize = 1000;
/// Limit for OCR output
pub const OCR_LIMIT: usize = 3000;
/// Limit for text submitted to ML analysis (cut without marker)
pub const ML_INPUT_LIMIT: usize = 5000;

const ELLIPSIS: &str = "...";

/// Cut `text` to at most `limit` characters, marking the cut with `...`.
///
/// The marker counts toward the limit and is only added when something
/// was removed.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&ELLIPSIS[..limit.min(ELLIPSIS.len())]);
    out
}

/// Hard cut to `limit` characters, no marker
#[must_use]
pub fn clip(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Stable sort, highest score first
pub fn sort_by_score_desc<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

/// Score in `[0, 1]` as a whole percentage
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn whole_percent(score: f64) -> i64 {
    (score * 100.0).round() as i64
}
