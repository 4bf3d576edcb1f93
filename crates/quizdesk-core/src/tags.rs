//! Tag normalization.
//!
//! Tags are compared and stored lower-cased with "ё" folded into "е". Every
//! tag that leaves the console in a create or update payload goes through
//! [`normalize_tag`].

/// Normalizes a single tag: trims, lower-cases, and folds "ё" into "е".
///
/// The operation is idempotent.
///
/// # Examples
///
/// ```
/// use quizdesk_core::normalize_tag;
///
/// assert_eq!(normalize_tag("  Ёмкость "), "емкость");
/// assert_eq!(normalize_tag(&normalize_tag("Ёж")), normalize_tag("Ёж"));
/// ```
#[must_use]
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase().replace('ё', "е")
}

/// Normalizes a list of tags, dropping empty entries and duplicates while
/// keeping the first occurrence order.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = normalize_tag(tag.as_ref());
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Parses newline-separated tag input, one tag per line.
#[must_use]
pub fn parse_tag_lines(text: &str) -> Vec<String> {
    normalize_tags(text.lines())
}
