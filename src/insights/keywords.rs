//! Keyword fallback for symptoms logged without tags.

/// Ordered `(keyword, tag)` pairs. The first keyword found in the
/// lowercased description decides the tag.
pub const TAG_KEYWORDS: &[(&str, &str)] = &[
    ("headache", "headache"),
    ("nausea", "nausea"),
    ("fatigue", "fatigue"),
    ("tired", "fatigue"),
    ("dizzy", "dizziness"),
    ("dizziness", "dizziness"),
];

/// Tag used when no keyword matches.
pub const FALLBACK_TAG: &str = "other";

/// Resolve the tag for a free-text description.
pub fn tag_for_description(description: &str) -> &'static str {
    tag_with_keywords(description, TAG_KEYWORDS)
}

/// Resolve a tag against an arbitrary keyword table.
pub fn tag_with_keywords(description: &str, keywords: &[(&str, &'static str)]) -> &'static str {
    let lowered = description.to_lowercase();
    keywords
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, tag)| *tag)
        .unwrap_or(FALLBACK_TAG)
}
