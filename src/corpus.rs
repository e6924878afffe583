//! Word lists loaded once at startup.

use crate::session::SessionStore;
use codenames_engine::WordPool;
use derive_more::{Display, Error};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Attempts at picking an unused game id before falling back to a suffix.
const AUTOGENERATE_ATTEMPTS: usize = 32;

/// Game-id words must be longer than this.
const MIN_GAME_ID_LEN: usize = 3;

/// Word list error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Word list error: {} at {}:{}", message, file, line)]
pub struct WordsError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl WordsError {
    /// Creates a new word list error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// A newline-separated word list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    words: Vec<String>,
}

impl Dictionary {
    /// Builds a dictionary from in-memory lines.
    ///
    /// Lines are trimmed; blank lines and `#` comments are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let words = lines
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { words }
    }

    /// Reads a dictionary file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WordsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WordsError::new(format!("Failed to read {}: {}", path.display(), e)))?;
        let dictionary = Self::from_lines(content.lines());
        debug!(words = dictionary.words.len(), "Loaded dictionary");
        Ok(dictionary)
    }

    /// Keeps only words matching `keep`.
    pub fn filter(self, keep: impl Fn(&str) -> bool) -> Self {
        Self {
            words: self.words.into_iter().filter(|w| keep(w)).collect(),
        }
    }

    /// The words, in file order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Consumes the dictionary.
    pub fn into_words(self) -> Vec<String> {
        self.words
    }
}

/// The process-wide word corpus.
#[derive(Debug, Clone)]
pub struct Corpus {
    game_ids: Vec<String>,
    default_words: WordPool,
}

impl Corpus {
    /// Loads the game-id and play-word files.
    ///
    /// # Errors
    ///
    /// Fails when either file cannot be read, no usable game-id word remains,
    /// or the play words cannot fill a board.
    #[instrument(skip_all, fields(game_id_file = %game_id_file.as_ref().display(), word_file = %word_file.as_ref().display()))]
    pub fn load(
        game_id_file: impl AsRef<Path>,
        word_file: impl AsRef<Path>,
    ) -> Result<Self, WordsError> {
        let game_ids = Dictionary::load(game_id_file)?;
        let words = Dictionary::load(word_file)?;
        let corpus = Self::from_dictionaries(game_ids, words)?;
        info!(
            game_ids = corpus.game_ids.len(),
            words = corpus.default_words.len(),
            "Loaded word corpus"
        );
        Ok(corpus)
    }

    /// Builds a corpus from already-loaded dictionaries.
    ///
    /// Game-id words of [`MIN_GAME_ID_LEN`] characters or fewer are dropped
    /// and the rest lower-cased.
    pub fn from_dictionaries(game_ids: Dictionary, words: Dictionary) -> Result<Self, WordsError> {
        let game_ids: Vec<String> = game_ids
            .filter(|w| w.chars().count() > MIN_GAME_ID_LEN)
            .into_words()
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        if game_ids.is_empty() {
            return Err(WordsError::new("No game-id words longer than 3 characters"));
        }

        let default_words = WordPool::new(words.words())
            .map_err(|e| WordsError::new(format!("Default word list: {}", e)))?;

        Ok(Self {
            game_ids,
            default_words,
        })
    }

    /// Words used to name auto-generated games.
    pub fn game_ids(&self) -> &[String] {
        &self.game_ids
    }

    /// Words new games draw from when the client supplies none.
    pub fn default_words(&self) -> &WordPool {
        &self.default_words
    }

    /// Picks a game id that is not resident in `store`.
    ///
    /// Falls back to a numbered id once the word list looks exhausted.
    #[instrument(skip_all)]
    pub fn autogenerate_id(&self, store: &SessionStore) -> String {
        let mut rng = rand::thread_rng();
        for _ in 0..AUTOGENERATE_ATTEMPTS {
            if let Some(candidate) = self.game_ids.choose(&mut rng)
                && !store.contains(candidate)
            {
                return candidate.clone();
            }
        }

        warn!("Game-id words exhausted, adding a numeric suffix");
        loop {
            let base = self.game_ids.choose(&mut rng).map_or("game", String::as_str);
            let candidate = format!("{}-{}", base, rng.gen_range(100..1_000_000));
            if !store.contains(&candidate) {
                return candidate;
            }
        }
    }
}
