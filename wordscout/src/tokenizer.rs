//! Splits lines of text into index words.

/// Characters that separate words: whitespace plus the punctuation set the
/// indexer has always split on. Everything else, digits included, is part of
/// a word.
pub const DELIMITERS: &[char] = &[
    ' ', '\n', '\t', '\r', '-', '_', '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '[', ']',
    '{', '}', ':', ';', '+', '=', ',', '.', '/', '<', '>', '?',
];

pub fn is_delimiter(c: char) -> bool {
    DELIMITERS.contains(&c)
}

/// Iterates the words of `line`, in order, repeats included
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_delimiter).filter(|word| !word.is_empty())
}
