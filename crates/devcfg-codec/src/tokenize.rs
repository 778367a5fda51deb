//! Pure tokenizer and prefix matcher for dump lines.
//!
//! Matching never mutates the line: [`Words::strip`] and
//! [`PrefixTable::matches`] return the remainder as a new view.

use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, CodecResult};

/// Splits a line into words, unquoting double-quoted words.
///
/// Inside quotes `\"` and `\\` are escapes. An unterminated quote runs to the
/// end of the line.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut word = String::new();
        if c == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            word.push(escaped);
                        }
                    }
                    '"' => break,
                    _ => word.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
        }
        words.push(word);
    }

    words
}

/// A borrowed view over the unmatched words of one dump line.
#[derive(Debug, Clone, Copy)]
pub struct Words<'a> {
    line: &'a str,
    words: &'a [String],
}

impl<'a> Words<'a> {
    /// Creates a view over all words of `line`.
    pub fn new(line: &'a str, words: &'a [String]) -> Self {
        Self { line, words }
    }

    /// Returns the remaining words.
    pub fn as_slice(&self) -> &'a [String] {
        self.words
    }

    /// Returns true if no words remain.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Matches `prefix` against the leading words and returns the remainder.
    pub fn strip(&self, prefix: &[&str]) -> Option<Words<'a>> {
        if self.words.len() < prefix.len() {
            return None;
        }
        let (head, rest) = self.words.split_at(prefix.len());
        if head.iter().zip(prefix).all(|(w, p)| w == p) {
            Some(Words {
                line: self.line,
                words: rest,
            })
        } else {
            None
        }
    }

    /// Splits off the first word, typically a block identifier.
    pub fn split_first(&self) -> Option<(&'a str, Words<'a>)> {
        let (first, rest) = self.words.split_first()?;
        Some((
            first.as_str(),
            Words {
                line: self.line,
                words: rest,
            },
        ))
    }

    /// Returns the remaining words joined by a space.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Parses the remaining words as `T`, naming `field` in the error.
    pub fn parse<T>(&self, field: &str) -> CodecResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let text = self.text();
        text.parse::<T>()
            .map_err(|e| CodecError::parse(self.line, format!("{field}: {e}")))
    }
}

/// A fixed table of path prefixes, matched longest first.
///
/// Prefixes are written as space-separated words.
///
/// # Example
///
/// ```
/// use devcfg_codec::{tokenize, PrefixTable, Words};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Field { Port, AccountingPort }
///
/// let table = PrefixTable::new(&[
///     ("port", Field::Port),
///     ("accounting-port", Field::AccountingPort),
/// ]);
/// let words = tokenize("accounting-port 1813");
/// let (field, rest) = table.matches(Words::new("accounting-port 1813", &words)).unwrap();
/// assert_eq!(field, Field::AccountingPort);
/// assert_eq!(rest.text(), "1813");
/// ```
#[derive(Debug, Clone)]
pub struct PrefixTable<K> {
    entries: Vec<(Vec<&'static str>, K)>,
}

impl<K: Copy> PrefixTable<K> {
    /// Builds a table; entries are reordered so longer prefixes match first.
    pub fn new(entries: &[(&'static str, K)]) -> Self {
        let mut entries: Vec<(Vec<&'static str>, K)> = entries
            .iter()
            .map(|(prefix, key)| (prefix.split_whitespace().collect(), *key))
            .collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    /// Returns the key of the first matching prefix and the remainder.
    pub fn matches<'a>(&self, words: Words<'a>) -> Option<(K, Words<'a>)> {
        self.entries
            .iter()
            .find_map(|(prefix, key)| words.strip(prefix).map(|rest| (*key, rest)))
    }
}
