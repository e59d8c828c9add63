//! Whitespace normalization.
//!
//! Span rewriting pads short replacements with spaces so that character
//! offsets of later matches stay valid. [`collapse_whitespace`] is the final
//! pass that removes that padding again.
//!
//! ```rust
//! use canonical::collapse_whitespace;
//!
//! assert_eq!(collapse_whitespace("we   trained  neural_network"), "we trained neural_network");
//! ```

/// Collapse every run of Unicode whitespace into a single ASCII space and
/// trim both ends.
///
/// Newlines and tabs count as whitespace, so multi-line input comes out as a
/// single line. Empty or whitespace-only input yields an empty string.
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  hidden\t\tunit\r\n"), "hidden unit");
/// assert_eq!(collapse_whitespace("hidden\u{00A0}unit"), "hidden unit");
/// assert_eq!(collapse_whitespace(" \n\t "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}
