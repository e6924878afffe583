//! Codenames server library.
//!
//! Backs a browser-playable Codenames board: clients create and join games
//! over HTTP and receive game state as JSON.
//!
//! # Architecture
//!
//! - **Session**: the in-memory registry of live games, with token-based
//!   reconstruction and timed eviction
//! - **Server**: axum handlers translating HTTP requests into store calls
//! - **Corpus**: word lists loaded at startup
//! - **Frontend**: index page bootstrap
//! - **Config**: TOML and command-line settings
//!
//! # Example
//!
//! ```no_run
//! use codenames_server::{EvictionPolicy, SessionStore};
//! use codenames_engine::WordPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let words = WordPool::new((0..25).map(|i| format!("word{i}")))?;
//! let store = SessionStore::new(words, EvictionPolicy::default());
//!
//! let game = store.resolve_or_new("otter", None);
//! let token = game.state_id().clone();
//! store.mutate("otter", Some(&token), |g| g.end_turn())?;
//!
//! store.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod corpus;
mod frontend;
mod server;
mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, ConfigOverrides, ServerConfig};

// Crate-level exports - Word corpus
pub use corpus::{Corpus, Dictionary, WordsError};

// Crate-level exports - Index page
pub use frontend::IndexPage;

// Crate-level exports - HTTP layer
pub use server::{
    ApiError, AppState, EndTurnRequest, GameStateRequest, GuessRequest, NextGameRequest,
    RetrieveGameQuery, router,
};

// Crate-level exports - Session management
pub use session::{EvictionPolicy, GameId, GameSnapshot, SessionStore, StoreError, StoreStats};
