use once_cell::sync::Lazy;
use regex::Regex;

/// Characters the destination store accepts verbatim: ASCII letters, digits,
/// hyphen, period, and both path separator styles. Everything else is
/// replaced with a hyphen.
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9.\-/\\]").expect("sanitizer pattern is valid"));

/// Normalize a raw archive entry name into a storage-safe key.
///
/// Replacement runs before lowercasing so a replaced character can never
/// reintroduce one outside the allowed set. The function is total and
/// deterministic; it performs no uniqueness enforcement, so two distinct raw
/// names that normalize to the same key overwrite each other downstream.
pub fn sanitize_key(raw: &str) -> String {
    DISALLOWED.replace_all(raw, "-").to_lowercase()
}
