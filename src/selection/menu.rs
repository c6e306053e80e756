//! Parsing of numbered-menu input.

use thiserror::Error;

/// Malformed menu input. Always answered with a re-prompt, never escalated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    /// One comma-separated token was not a valid 1-based index.
    #[error("Skipping invalid entry: '{0}'")]
    InvalidEntry(String),
    /// A closed-choice prompt received something outside its token set.
    #[error("Please enter {expected}.")]
    UnexpectedToken {
        /// Human-readable list of accepted tokens.
        expected: &'static str,
    },
}

/// Parsed answer to a numbered list prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    /// The `back` keyword.
    Back,
    /// The `all` keyword.
    All,
    /// A comma-separated list of indices.
    Indices(IndexSelection),
}

/// Valid indices picked from a list, plus the tokens that were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSelection {
    /// Zero-based indices in order of first appearance, without duplicates.
    pub indices: Vec<usize>,
    /// Tokens that were not digits or were out of range, as typed.
    pub rejected: Vec<String>,
}

impl IndexSelection {
    /// One [`MenuError::InvalidEntry`] per rejected token.
    #[must_use]
    pub fn errors(&self) -> Vec<MenuError> {
        self.rejected
            .iter()
            .map(|token| MenuError::InvalidEntry(token.clone()))
            .collect()
    }
}

/// Parse input for a list of `len` items numbered from 1.
///
/// `back` and `all` are matched case-insensitively on the whole (trimmed)
/// input. Otherwise the input is split on commas; blank tokens are ignored.
#[must_use]
pub fn parse_menu(input: &str, len: usize) -> MenuChoice {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("back") {
        return MenuChoice::Back;
    }
    if trimmed.eq_ignore_ascii_case("all") {
        return MenuChoice::All;
    }

    let mut selection = IndexSelection::default();
    for token in trimmed.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match parse_index(token, len) {
            Some(index) => {
                if !selection.indices.contains(&index) {
                    selection.indices.push(index);
                }
            }
            None => selection.rejected.push(token.to_string()),
        }
    }
    MenuChoice::Indices(selection)
}

/// Zero-based index for a 1-based token, if it is all digits and in range.
fn parse_index(token: &str, len: usize) -> Option<usize> {
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: usize = token.parse().ok()?;
    (1..=len).contains(&number).then(|| number - 1)
}
