//! Pluralization helpers for log lines and error summaries.

/// Return "s" suffix for plural counts
///
/// - `plural_s(1)` -> `""` (1 module)
/// - `plural_s(3)` -> `"s"` (3 modules)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun, handling pluralization
///
/// - `plural_count(0, "asset")` -> `"0 assets"`
/// - `plural_count(1, "asset")` -> `"1 asset"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}
