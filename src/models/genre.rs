use serde::{Deserialize, Serialize};
use std::{fmt::Display, iter::Peekable, str::CharIndices};

/// Error returned when legacy serialized genre text cannot be parsed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenreParseError {
    #[error("genre list must be enclosed in brackets: {0:?}")]
    MissingBrackets(String),

    #[error("unterminated quoted genre in {0:?}")]
    UnterminatedQuote(String),

    #[error("expected a quoted genre at offset {offset} in {raw:?}")]
    ExpectedQuote { raw: String, offset: usize },

    #[error("expected ',' or ']' at offset {offset} in {raw:?}")]
    ExpectedSeparator { raw: String, offset: usize },
}

/// Ordered, duplicate-free set of genre tags
///
/// Insertion order is preserved so genres render the way they were entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct GenreSet(Vec<String>);

impl GenreSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a genre, ignoring blanks and duplicates. Returns true if it was added.
    pub fn insert(&mut self, genre: impl Into<String>) -> bool {
        let genre = genre.into().trim().to_string();
        if genre.is_empty() || self.contains(&genre) {
            return false;
        }
        self.0.push(genre);
        true
    }

    pub fn contains(&self, genre: &str) -> bool {
        self.0.iter().any(|g| g == genre)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of genres shared with `other`
    pub fn overlap(&self, other: &GenreSet) -> usize {
        self.iter().filter(|g| other.contains(g)).count()
    }

    /// Parses legacy serialized genre text.
    ///
    /// JSON arrays go through `serde_json`. Anything else must be a list
    /// literal such as `['Action', "Children's"]`, where each item may use
    /// either quote style and backslash escapes are honoured.
    pub fn parse_serialized(raw: &str) -> Result<Self, GenreParseError> {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(values) => Ok(values.into_iter().collect()),
            Err(_) => parse_list_literal(raw),
        }
    }
}

fn parse_list_literal(raw: &str) -> Result<GenreSet, GenreParseError> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| GenreParseError::MissingBrackets(raw.to_string()))?;

    let unterminated = || GenreParseError::UnterminatedQuote(raw.to_string());
    let mut genres = GenreSet::new();
    let mut chars = inner.char_indices().peekable();

    loop {
        skip_whitespace(&mut chars);
        let quote = match chars.next() {
            // an empty list, or a trailing comma
            None => return Ok(genres),
            Some((_, c @ ('\'' | '"'))) => c,
            Some((offset, _)) => {
                return Err(GenreParseError::ExpectedQuote {
                    raw: raw.to_string(),
                    offset,
                })
            }
        };

        let mut value = String::new();
        loop {
            match chars.next().ok_or_else(unterminated)? {
                (_, '\\') => value.push(chars.next().ok_or_else(unterminated)?.1),
                (_, c) if c == quote => break,
                (_, c) => value.push(c),
            }
        }
        genres.insert(value);

        skip_whitespace(&mut chars);
        match chars.next() {
            None => return Ok(genres),
            Some((_, ',')) => {}
            Some((offset, _)) => {
                return Err(GenreParseError::ExpectedSeparator {
                    raw: raw.to_string(),
                    offset,
                })
            }
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<CharIndices<'_>>) {
    while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
}

impl From<Vec<String>> for GenreSet {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<GenreSet> for Vec<String> {
    fn from(genres: GenreSet) -> Self {
        genres.0
    }
}

impl<S: Into<String>> FromIterator<S> for GenreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut genres = GenreSet::new();
        for genre in iter {
            genres.insert(genre);
        }
        genres
    }
}

impl Display for GenreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}
