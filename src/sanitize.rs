//! Field label sanitization
//!
//! Converts arbitrary field labels into safe, stable machine names.
//! Machine names are lowercase `[a-z0-9_]` identifiers carrying the
//! `field_` namespace prefix, matching what the content store expects.

use once_cell::sync::Lazy;
use regex::Regex;

/// Namespace prefix applied to every generated machine name.
pub const FIELD_PREFIX: &str = "field_";

// Pre-compiled pattern for performance
static NON_IDENTIFIER_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9_]+").unwrap()
});

/// Produce the machine name for a field label.
///
/// Lower-cases the label, replaces every maximal run of characters outside
/// `[a-z0-9_]` with a single `_`, then prefixes [`FIELD_PREFIX`].
///
/// The prefix guard runs after lower-casing and run-collapsing, so labels
/// that already carry the namespace in any spelling (`field_summary`,
/// `Field_Summary`, `FIELD_SUMMARY`) are not prefixed twice. Without the
/// guard, sanitizing an already-sanitized name would not be idempotent.
///
/// Total on any input: never panics, never fails.
///
/// ```rust
/// use kiln::sanitize::sanitize_field_name;
///
/// assert_eq!(sanitize_field_name("Release Date"), "field_release_date");
/// assert_eq!(sanitize_field_name("field_summary"), "field_summary");
/// ```
pub fn sanitize_field_name(label: &str) -> String {
    let lowered = label.to_lowercase();
    let collapsed = NON_IDENTIFIER_RUN.replace_all(&lowered, "_");

    if collapsed.starts_with(FIELD_PREFIX) {
        collapsed.into_owned()
    } else {
        format!("{}{}", FIELD_PREFIX, collapsed)
    }
}

/// Capitalize the first character of a label.
///
/// Used for default display labels when the input supplies none.
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
