//! Tokenization shared by the inverted index and the embedding generator:
//! lowercase, then split on whitespace. No punctuation stripping and no
//! minimum-length filter — every whitespace-split lowercase token counts.

/// Lowercase `text` and split it on whitespace.
///
/// # Examples
///
/// ```
/// use lattice_search::tokenizer::tokenize;
///
/// assert_eq!(tokenize("The Quick Brown"), vec!["the", "quick", "brown"]);
/// assert_eq!(tokenize(""), Vec::<String>::new());
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
