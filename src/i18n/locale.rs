//! Locale normalization for language tags.

/// Separator between a language and its regional subtag ("en-US").
const REGION_SEPARATOR: char = '-';

/// Strip a regional suffix from a language tag.
///
/// Returns the part before the first `-`, or the whole tag when there is none.
///
/// ```
/// use room_translator::i18n::normalize;
///
/// assert_eq!(normalize("en-US"), "en");
/// assert_eq!(normalize("fr"), "fr");
/// ```
pub fn normalize(tag: &str) -> &str {
    match tag.find(REGION_SEPARATOR) {
        Some(idx) => &tag[..idx],
        None => tag,
    }
}
