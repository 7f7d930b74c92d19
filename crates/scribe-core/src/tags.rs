//! Tag codec: translation between a note's tag list and its serialized form.
//!
//! Tags are stored as a single comma-joined string. All functions here are
//! total over arbitrary strings — there is no error kind for malformed input;
//! a bare comma or a leading/trailing comma simply yields fewer tags. A tag
//! that itself contains a comma is not representable and decodes as two tags.

/// Delimiter used in the stored tag encoding.
const TAG_DELIMITER: char = ',';

/// Join tags into the stored representation. Empty input yields the empty
/// string.
pub fn encode_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// Split a stored tag string back into tags: split on `,`, trim each piece,
/// drop empties, preserve order.
///
/// Decoding does **not** de-duplicate — it returns exactly the recoverable
/// list; callers needing uniqueness de-duplicate explicitly (see
/// [`extract_unique_tags`]).
pub fn decode_tags(raw: &str) -> Vec<String> {
    raw.split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the tag universe from raw encoded values: decode every value,
/// flatten, drop blanks, de-duplicate preserving first-seen order.
///
/// Used to populate the set of tags offered for filtering.
pub fn extract_unique_tags<I>(raw_values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for raw in raw_values {
        for tag in decode_tags(&raw) {
            if seen.insert(tag.clone()) {
                unique.push(tag);
            }
        }
    }
    unique
}

/// Normalize a tag list for storage: trim, drop empties, de-duplicate
/// preserving first-seen order.
///
/// The store applies this on every write so that the persisted encoding
/// round-trips through [`decode_tags`] for any comma-free tag set.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_string()))
        .map(str::to_string)
        .collect()
}
