use std::collections::BTreeSet;

/// Common function words removed before classification. Negations and
/// affect-bearing words are deliberately absent so emotional cues survive.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "them",
    "my", "your", "his", "its", "our", "their", "am", "is", "are", "was", "were", "be", "been",
    "being", "do", "does", "did", "have", "has", "had", "to", "of", "in", "on", "at", "by", "for",
    "with", "from", "and", "or", "that", "this", "these", "those", "as", "so", "just", "then",
    "there", "here",
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("no analyzable tokens in input")]
    EmptyInput,
}

/// Lowercases, strips punctuation, splits on whitespace and drops stopwords.
///
/// Fails with [`TextError::EmptyInput`] when nothing analyzable remains.
pub fn normalize(raw: &str) -> Result<Vec<String>, TextError> {
    let stopwords: BTreeSet<&str> = STOPWORDS.iter().copied().collect();
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let tokens: Vec<String> = cleaned
        .split_whitespace()
        .filter(|t| !stopwords.contains(t))
        .map(str::to_owned)
        .collect();
    if tokens.is_empty() {
        return Err(TextError::EmptyInput);
    }
    Ok(tokens)
}
