//! Canonical form of raw identifiers
//!
//! Two raw values that differ only in case, surrounding whitespace, internal
//! whitespace runs, or Unicode composition map to one registry entry. Diacritics
//! are kept: `José` and `Jose` are different people as far as the registry knows.

use unicode_normalization::UnicodeNormalization;

/// Canonicalizes a raw identifier
///
/// Steps: Unicode lowercase, NFC normalization, trim, collapse whitespace runs
/// to a single space.
///
/// # Examples
///
/// ```
/// use canvas_shield::anonymization::registry::canonicalize;
///
/// assert_eq!(canonicalize("  Jane   Doe "), "jane doe");
/// assert_eq!(canonicalize("JANE DOE"), canonicalize("jane doe"));
/// ```
pub fn canonicalize(raw: &str) -> String {
    let normalized: String = raw.to_lowercase().nfc().collect();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}
