//! Name-encoded ordinal codec.
//!
//! The canonical store encodes a sibling's ordinal as a zero-padded digit
//! prefix on its stored name: `0002_chapter.md`. Parsing accepts any digit
//! run before the first underscore, so widening the pad width never orphans
//! existing entries.

use crate::types::Ordinal;

/// Split a stored name into its ordinal prefix (if any) and the rest.
///
/// A name without a parseable `digits_` prefix decodes to `(None, name)`.
pub fn decode(name: &str) -> (Option<Ordinal>, &str) {
    if let Some(pos) = name.find('_') {
        let digits = &name[..pos];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(ordinal) = digits.parse::<Ordinal>() {
                return (Some(ordinal), &name[pos + 1..]);
            }
        }
    }
    (None, name)
}

/// Stored name for `rest` at `ordinal`, zero-padded to `width`.
pub fn encode(ordinal: Ordinal, rest: &str, width: usize) -> String {
    format!("{:0width$}_{}", ordinal, rest, width = width)
}

/// The ordinal-free portion of a stored name.
pub fn strip(name: &str) -> &str {
    decode(name).1
}

/// Re-encode a stored name at a new ordinal, preserving the ordinal-free
/// portion. A name with no existing prefix gains one.
pub fn with_ordinal(name: &str, ordinal: Ordinal, width: usize) -> String {
    encode(ordinal, strip(name), width)
}
