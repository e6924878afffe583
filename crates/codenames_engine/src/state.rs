//! Minimal game state and its opaque token encoding.
//!
//! A token is a bincode-serialized [`Token`], base64url encoded without
//! padding. Custom word sets travel inside the token; default ones do not.

use crate::error::DecodeError;
use crate::words::{WordPool, WordSet};
use crate::BOARD_SIZE;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const TOKEN_VERSION: u8 = 1;
const REVEAL_MASK: u32 = (1 << BOARD_SIZE) - 1;

/// Wire form of a [`GameState`].
#[derive(Debug, Serialize, Deserialize)]
struct Token {
    version: u8,
    seed: u64,
    round: u32,
    revealed: u32,
    words: Option<Vec<String>>,
}

/// Everything needed to rebuild a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    seed: u64,
    round: u32,
    revealed: [bool; BOARD_SIZE],
    word_set: WordSet,
}

impl GameState {
    /// A fresh state with a random seed and nothing revealed.
    pub fn random(word_set: WordSet) -> Self {
        Self::with_seed(rand::random(), word_set)
    }

    /// A fresh state for a fixed seed.
    pub fn with_seed(seed: u64, word_set: WordSet) -> Self {
        Self {
            seed,
            round: 0,
            revealed: [false; BOARD_SIZE],
            word_set,
        }
    }

    /// Seed the board is derived from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Turns taken so far.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Reveal flag per cell.
    pub fn revealed(&self) -> &[bool; BOARD_SIZE] {
        &self.revealed
    }

    /// Words the board draws from.
    pub fn word_set(&self) -> &WordSet {
        &self.word_set
    }

    pub(crate) fn reveal(&mut self, index: usize) {
        self.revealed[index] = true;
    }

    pub(crate) fn advance_round(&mut self) {
        self.round = self.round.saturating_add(1);
    }

    /// Encodes the state as an opaque, URL-safe token.
    pub fn encode(&self) -> String {
        let token = Token {
            version: TOKEN_VERSION,
            seed: self.seed,
            round: self.round,
            revealed: reveal_mask(&self.revealed),
            words: match &self.word_set {
                WordSet::Default(_) => None,
                WordSet::Custom(pool) => Some(pool.words().to_vec()),
            },
        };
        // Only integers, an optional list and strings: serialization has no
        // failure path, and an empty token reads as "no token".
        let bytes = bincode::serialize(&token).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize state token");
            Vec::new()
        });
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decodes a token produced by [`GameState::encode`].
    ///
    /// Tokens without an embedded word set draw from `fallback`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] for any token that is not a well-formed
    /// version 1 encoding.
    #[instrument(skip(token, fallback), fields(token_len = token.len()))]
    pub fn decode(token: &str, fallback: &WordPool) -> Result<Self, DecodeError> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|e| {
            debug!(error = %e, "State token is not base64");
            DecodeError::Encoding
        })?;
        let token: Token = bincode::deserialize(&bytes).map_err(|e| {
            debug!(error = %e, "State token does not deserialize");
            DecodeError::Malformed
        })?;

        if token.version != TOKEN_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                version: token.version,
            });
        }
        if token.revealed & !REVEAL_MASK != 0 {
            return Err(DecodeError::InvalidReveal);
        }

        let word_set = match token.words {
            None => WordSet::Default(fallback.clone()),
            Some(words) => WordSet::Custom(WordPool::new(words)?),
        };

        debug!(
            seed = token.seed,
            round = token.round,
            custom = word_set.is_custom(),
            "Decoded state token"
        );
        Ok(Self {
            seed: token.seed,
            round: token.round,
            revealed: unpack_mask(token.revealed),
            word_set,
        })
    }
}

fn reveal_mask(revealed: &[bool; BOARD_SIZE]) -> u32 {
    revealed
        .iter()
        .enumerate()
        .filter(|(_, r)| **r)
        .fold(0, |mask, (i, _)| mask | (1 << i))
}

fn unpack_mask(mask: u32) -> [bool; BOARD_SIZE] {
    std::array::from_fn(|i| mask & (1 << i) != 0)
}
