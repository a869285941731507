//! Permanent artifact names: `<schema>_<tag values...>_<unix timestamp>.pdf`.

use itertools::Itertools;

pub const PDF_EXTENSION: &str = "pdf";

/// Used when a schema id sanitizes to nothing.
const FALLBACK_SCHEMA_COMPONENT: &str = "form";

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Reduces `value` to `[A-Za-z0-9_-]`.
///
/// Whitespace runs become a single `_`; every other character outside the
/// safe set is dropped. Sanitizing a sanitized value returns it unchanged.
pub fn sanitize_component(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| word.chars().filter(|c| is_safe(*c)).collect::<String>())
        .filter(|word| !word.is_empty())
        .join("_")
}

/// Builds the permanent file stem. Tags that sanitize to nothing are omitted.
pub fn permanent_stem<'a>(
    schema_id: &str,
    tags: impl IntoIterator<Item = &'a str>,
    timestamp: i64,
) -> String {
    let schema = sanitize_component(schema_id);
    let schema = if schema.is_empty() {
        FALLBACK_SCHEMA_COMPONENT.to_string()
    } else {
        schema
    };

    std::iter::once(schema)
        .chain(tags.into_iter().map(sanitize_component).filter(|t| !t.is_empty()))
        .chain(std::iter::once(timestamp.to_string()))
        .join("_")
}

/// Whether `stem` could be a permanent artifact name.
pub fn is_safe_stem(stem: &str) -> bool {
    !stem.is_empty() && stem.chars().all(is_safe)
}
