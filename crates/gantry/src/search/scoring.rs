//! Text normalization, relevance scoring, highlighting, and snippets.
//!
//! Matching is ASCII case-insensitive: queries and fields are compared after
//! `to_ascii_lowercase`, which preserves byte offsets so highlight and
//! snippet slicing stay on the original text.

/// Normalize text for matching.
pub(super) fn normalize(text: &str) -> String {
    text.trim().to_ascii_lowercase()
}

/// Relevance score of `query` against `text`.
///
/// Cumulative: exact match 100, prefix 50, substring 25, plus 10 per
/// whitespace-separated query word contained in the text. Zero means no
/// match.
pub(super) fn score(text: &str, query: &str) -> u32 {
    let text = normalize(text);
    let query = normalize(query);
    if query.is_empty() {
        return 0;
    }

    let mut score = 0;
    if text == query {
        score += 100;
    }
    if text.starts_with(&query) {
        score += 50;
    }
    if text.contains(&query) {
        score += 25;
    }
    for word in query.split_whitespace() {
        if text.contains(word) {
            score += 10;
        }
    }
    score
}

/// Byte ranges of every occurrence of `query` in `text`, case-insensitive.
fn occurrences(text: &str, query: &str) -> Vec<(usize, usize)> {
    let haystack = text.to_ascii_lowercase();
    let needle = query.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    haystack
        .match_indices(&needle)
        .map(|(start, m)| (start, start + m.len()))
        .collect()
}

/// Wrap every occurrence of `query` in `text` with `<mark>...</mark>`,
/// preserving the original casing of the matched substring.
pub(super) fn highlight(text: &str, query: &str) -> String {
    let ranges = occurrences(text, query);
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + ranges.len() * 13);
    let mut cursor = 0;
    for (start, end) in ranges {
        out.push_str(&text[cursor..start]);
        out.push_str("<mark>");
        out.push_str(&text[start..end]);
        out.push_str("</mark>");
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Characters of surrounding context included in a snippet.
const SNIPPET_CONTEXT: usize = 100;

/// Extract a snippet of `text` centered on the first occurrence of `query`,
/// with ellipses marking truncation. Without a match, the head of the text
/// is returned.
pub(super) fn snippet(text: &str, query: &str) -> String {
    let Some(&(start, end)) = occurrences(text, query).first() else {
        if text.len() <= SNIPPET_CONTEXT {
            return text.to_string();
        }
        let cut = floor_char_boundary(text, SNIPPET_CONTEXT);
        return format!("{}...", &text[..cut]);
    };

    let from = floor_char_boundary(text, start.saturating_sub(SNIPPET_CONTEXT / 2));
    let to = ceil_char_boundary(text, usize::min(text.len(), end + SNIPPET_CONTEXT / 2));

    let mut out = String::new();
    if from > 0 {
        out.push_str("...");
    }
    out.push_str(&text[from..to]);
    if to < text.len() {
        out.push_str("...");
    }
    out
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`.
fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("API design", "API design", 195)] // exact + prefix + contains + 2 words
    #[case("API design", "api", 85)] // prefix + contains + word
    #[case("Design the API", "api", 35)] // contains + word
    #[case("Design the API", "storage", 0)]
    #[case("anything", "", 0)]
    fn scoring_tiers(#[case] text: &str, #[case] query: &str, #[case] expected: u32) {
        assert_eq!(score(text, query), expected);
    }

    #[test]
    fn highlight_wraps_all_occurrences_preserving_case() {
        let marked = highlight("Safari bug in Safari 17", "safari");
        assert_eq!(marked, "<mark>Safari</mark> bug in <mark>Safari</mark> 17");
    }

    #[test]
    fn highlight_without_match_returns_text_unchanged() {
        assert_eq!(highlight("nothing here", "safari"), "nothing here");
    }

    #[test]
    fn snippet_centers_on_match_with_ellipses() {
        let long = format!("{}target{}", "x".repeat(200), "y".repeat(200));
        let s = snippet(&long, "target");
        assert!(s.starts_with("..."));
        assert!(s.ends_with("..."));
        assert!(s.contains("target"));
        assert!(s.len() < long.len());
    }

    #[test]
    fn snippet_of_short_text_is_the_text() {
        assert_eq!(snippet("short text", "zzz"), "short text");
    }

    #[test]
    fn snippet_respects_utf8_boundaries() {
        let text = format!("{}naïve café target", "é".repeat(120));
        // Must not panic slicing into a multi-byte char.
        let s = snippet(&text, "target");
        assert!(s.contains("target"));
    }
}
