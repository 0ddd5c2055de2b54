//! Slug normalization for group keys.
//!
//! Tag and author names are arbitrary strings; the paths they map to are not.
//! [`slugify`] turns any key into a URL-safe path segment by decomposing the
//! input (canonical decomposition), keeping only ASCII letters and digits,
//! and lowercasing the result.
//!
//! Accented Latin letters degrade to their base letter — the decomposition
//! splits `é` into `e` + a combining acute, and the combining mark is
//! dropped. Symbols, punctuation, and non-Latin scripts are removed
//! entirely, so a key like `"日本語"` normalizes to the empty string.
//! An empty slug means "no usable key": callers must skip that group
//! rather than write a page at an empty path.

use unicode_normalization::UnicodeNormalization;

/// Normalize an arbitrary key string into a URL-safe slug.
///
/// - `"Café Déjà-vu"` → `"cafedejavu"`
/// - `"Aaron Straup Cope"` → `"aaronstraupcope"`
/// - `"日本語"` → `""` (no usable key)
///
/// Pure and deterministic; no I/O. The result is empty when the input
/// contains no ASCII-representable letters or digits.
pub fn slugify(raw: &str) -> String {
    raw.nfd()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}
