//! Word pools a board draws its 25 words from.

use crate::BOARD_SIZE;
use crate::error::WordPoolError;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A normalised, sorted, duplicate-free word list large enough for a board.
///
/// Normalisation trims each entry and upper-cases it; blank entries are
/// dropped. Sorting makes board derivation independent of input order, so the
/// same seed always yields the same board for the same set of words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPool {
    words: Arc<[String]>,
}

impl WordPool {
    /// Normalises `words` into a pool.
    ///
    /// # Errors
    ///
    /// Returns [`WordPoolError::TooFew`] when fewer than [`BOARD_SIZE`]
    /// distinct words remain.
    pub fn new<I, S>(words: I) -> Result<Self, WordPoolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_uppercase())
            .filter(|w| !w.is_empty())
            .collect();

        if distinct.len() < BOARD_SIZE {
            return Err(WordPoolError::TooFew {
                found: distinct.len(),
                required: BOARD_SIZE,
            });
        }

        Ok(Self {
            words: distinct.into_iter().collect(),
        })
    }

    /// The words, sorted.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Number of words in the pool.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false: a pool holds at least a board's worth of words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Where a game's words come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordSet {
    /// The server's corpus. Not embedded in state tokens.
    Default(WordPool),
    /// A client-supplied list. Travels inside every state token.
    Custom(WordPool),
}

impl WordSet {
    /// The pool backing this set.
    pub fn pool(&self) -> &WordPool {
        match self {
            WordSet::Default(pool) | WordSet::Custom(pool) => pool,
        }
    }

    /// Whether the words must be carried in the state token.
    pub fn is_custom(&self) -> bool {
        matches!(self, WordSet::Custom(_))
    }
}
