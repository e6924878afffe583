//! Engine error types.

use derive_more::{Display, Error, From};

/// An action the rules do not allow.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// The guessed index is not on the board.
    #[display("index {index} is invalid")]
    InvalidIndex {
        /// Index the client sent.
        index: usize,
    },

    /// The cell was revealed by an earlier guess.
    #[display("cell {index} has already been revealed")]
    AlreadyRevealed {
        /// Index the client sent.
        index: usize,
    },

    /// A winner has been decided; no further actions apply.
    #[display("game is already over")]
    GameOver,
}

/// A word list that cannot fill a board.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum WordPoolError {
    /// Not enough distinct words after normalisation.
    #[display("need at least {required} distinct words, found {found}")]
    TooFew {
        /// Distinct words available.
        found: usize,
        /// Words a board needs.
        required: usize,
    },
}

/// A state token that does not describe a game.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum DecodeError {
    /// Not base64url.
    #[display("state token is not valid base64")]
    Encoding,

    /// The decoded bytes are not a serialized state.
    #[display("state token is malformed")]
    Malformed,

    /// The token was produced by an incompatible encoder.
    #[display("unsupported state token version {version}")]
    UnsupportedVersion {
        /// Version byte found in the token.
        version: u8,
    },

    /// Reveal bits are set outside the board.
    #[display("state token reveals cells outside the board")]
    InvalidReveal,

    /// The embedded word set cannot fill a board.
    #[display("state token word set: {_0}")]
    #[from]
    Words(WordPoolError),
}
