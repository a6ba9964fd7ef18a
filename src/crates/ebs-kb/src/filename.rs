//! Content-addressed filenames: `<timestamp>_<type>_<safe_title>_<shortid>.json`.

use chrono::{DateTime, Utc};

const MAX_SAFE_TITLE_LEN: usize = 50;

/// Keeps only alphanumerics, spaces, underscores, and hyphens, then truncates —
/// the same character set the original archive's filenames used, so knowledge-base
/// directories stay portable across filesystems.
pub fn sanitize_title(title: &str) -> String {
    let filtered: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == ' ' || *c == '-')
        .collect();
    filtered.chars().take(MAX_SAFE_TITLE_LEN).collect()
}

pub fn build_filename(
    created_at: DateTime<Utc>,
    type_segment: &str,
    title: &str,
    short_id: &str,
) -> String {
    format!(
        "{}_{}_{}_{}.json",
        created_at.format("%Y%m%dT%H%M%S%.f"),
        type_segment,
        sanitize_title(title),
        short_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_unsafe_characters() {
        let sanitized = sanitize_title("Cache/Invalidation: \"don't\" over-fetch!");
        assert!(!sanitized.contains('/'));
        assert!(!sanitized.contains(':'));
        assert!(!sanitized.contains('"'));
        assert!(!sanitized.contains('!'));
    }

    #[test]
    fn truncates_to_fifty_chars() {
        let long_title = "x".repeat(200);
        assert_eq!(sanitize_title(&long_title).len(), MAX_SAFE_TITLE_LEN);
    }
}
