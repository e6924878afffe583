//! Pure Codenames board logic.
//!
//! A [`Game`] is fully determined by its [`GameState`]: a random seed, the
//! round counter, the reveal flags and the word set it draws from. The state
//! round-trips through an opaque token ([`Game::state_id`] /
//! [`Game::reconstruct`]), which is what lets a client resume a game the
//! server no longer holds in memory.
//!
//! # Example
//!
//! ```
//! use codenames_engine::{Game, WordPool, WordSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = WordPool::new((0..40).map(|i| format!("word{i}")))?;
//! let mut game = Game::new_random(WordSet::Default(pool.clone()));
//! game.end_turn()?;
//!
//! let resumed = Game::reconstruct(&game.state_id(), &pool)?;
//! assert_eq!(resumed, game);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod game;
mod state;
mod team;
mod words;

pub use error::{DecodeError, GameError, WordPoolError};
pub use game::Game;
pub use state::GameState;
pub use team::Team;
pub use words::{WordPool, WordSet};

/// Number of cells on a board.
pub const BOARD_SIZE: usize = 25;
