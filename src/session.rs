//! Game session management.
//!
//! [`SessionStore`] is the single registry of games resident in memory. One
//! mutex guards the whole registry, and every engine mutation happens while
//! it is held, so operations on different games are serialized too. Games
//! that are not resident can be rebuilt from the client's state token.

use chrono::{DateTime, TimeDelta, Utc};
use codenames_engine::{Game, GameError, Team, WordPool, WordSet};
use derive_getters::Getters;
use derive_more::{Display, Error, From};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Client-chosen or server-assigned game identifier.
pub type GameId = String;

/// When resident games are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Time between sweeps.
    pub sweep_interval: Duration,
    /// Age after which a decided game is dropped.
    pub completed_ttl: TimeDelta,
    /// Age after which any game is dropped.
    pub max_ttl: TimeDelta,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(10 * 60),
            completed_ttl: TimeDelta::hours(12),
            max_ttl: TimeDelta::hours(24),
        }
    }
}

/// A resident game.
#[derive(Debug)]
struct GameSession {
    id: GameId,
    game: Game,
    created_at: DateTime<Utc>,
}

impl GameSession {
    fn new(id: GameId, game: Game) -> Self {
        Self {
            id,
            game,
            created_at: Utc::now(),
        }
    }

    fn outcome(&self) -> Option<Team> {
        self.game.winning_team()
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id.clone(),
            created_at: self.created_at,
            state_id: self.game.state_id(),
            game: self.game.clone(),
        }
    }
}

/// A copy of a session taken while the registry lock was held.
///
/// Serializes as the game view plus `state_id`, the token the client must
/// send back on its next request.
#[derive(Debug, Clone, Getters, Serialize)]
pub struct GameSnapshot {
    /// Game identifier.
    id: GameId,
    /// When the session became resident.
    created_at: DateTime<Utc>,
    /// Engine state at the time of the snapshot.
    #[serde(flatten)]
    game: Game,
    /// Opaque token for `game`.
    state_id: String,
}

/// Registry-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, derive_new::new)]
pub struct StoreStats {
    /// Resident games without a winner.
    games_in_progress: usize,
}

/// Failure of a store operation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum StoreError {
    /// No resident game and no usable state token.
    #[display("no such game: {id}")]
    NotFound {
        /// Requested game.
        id: GameId,
    },

    /// The engine refused the action.
    #[display("{_0}")]
    #[from]
    Rejected(GameError),
}

type Registry = HashMap<GameId, GameSession>;

struct Sweeper {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Shared handle to the game registry.
///
/// Clones share the same registry and sweeper.
#[derive(Clone)]
pub struct SessionStore {
    games: Arc<Mutex<Registry>>,
    default_words: WordPool,
    policy: EvictionPolicy,
    sweeper: Arc<Mutex<Option<Sweeper>>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("resident", &self.lock().len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl SessionStore {
    /// Creates an empty store and starts its eviction sweeper.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(default_words), fields(words = default_words.len()))]
    pub fn new(default_words: WordPool, policy: EvictionPolicy) -> Self {
        let games = Arc::new(Mutex::new(Registry::new()));
        let sweeper = spawn_sweeper(Arc::clone(&games), policy);
        info!(interval = ?policy.sweep_interval, "Created session store");
        Self {
            games,
            default_words,
            policy,
            sweeper: Arc::new(Mutex::new(Some(sweeper))),
        }
    }

    /// The corpus new games draw from when no word set is given.
    pub fn default_words(&self) -> &WordPool {
        &self.default_words
    }

    /// Returns the resident game, or rebuilds it from `token`.
    ///
    /// A resident game always wins over the token, which may be stale.
    /// `None` means neither was available; the caller decides whether to
    /// start a fresh game.
    #[instrument(skip(self, token))]
    pub fn get_or_create(&self, id: &str, token: Option<&str>) -> Option<GameSnapshot> {
        let mut games = self.lock();
        resolve(&mut games, id, token, &self.default_words).map(|s| s.snapshot())
    }

    /// Like [`SessionStore::get_or_create`], but deals a fresh default game
    /// when nothing can be resolved. Both steps share one critical section.
    #[instrument(skip(self, token))]
    pub fn resolve_or_new(&self, id: &str, token: Option<&str>) -> GameSnapshot {
        let mut games = self.lock();
        if let Some(session) = resolve(&mut games, id, token, &self.default_words) {
            return session.snapshot();
        }
        let game = Game::new_random(WordSet::Default(self.default_words.clone()));
        install(&mut games, id, game)
    }

    /// Deals a fresh game under `id`, replacing any resident one.
    #[instrument(skip(self, word_set), fields(custom = word_set.is_custom()))]
    pub fn create_new(&self, id: &str, word_set: WordSet) -> GameSnapshot {
        let game = Game::new_random(word_set);
        let mut games = self.lock();
        install(&mut games, id, game)
    }

    /// Resolves the game as [`SessionStore::get_or_create`] does and applies
    /// `action` to it under the registry lock.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no game could be resolved,
    /// [`StoreError::Rejected`] when `action` fails.
    #[instrument(skip(self, token, action))]
    pub fn mutate<F>(&self, id: &str, token: Option<&str>, action: F) -> Result<GameSnapshot, StoreError>
    where
        F: FnOnce(&mut Game) -> Result<(), GameError>,
    {
        let mut games = self.lock();
        let session = resolve(&mut games, id, token, &self.default_words).ok_or_else(|| {
            debug!("Game not resident and no usable token");
            StoreError::NotFound { id: id.to_string() }
        })?;

        action(&mut session.game).map_err(|e| {
            warn!(error = %e, "Action rejected");
            StoreError::from(e)
        })?;

        Ok(session.snapshot())
    }

    /// Whether a game is resident under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Counts resident games that are still being played.
    #[instrument(skip(self))]
    pub fn stats(&self) -> StoreStats {
        let games = self.lock();
        let in_progress = games.values().filter(|s| s.outcome().is_none()).count();
        debug!(resident = games.len(), in_progress, "Computed stats");
        StoreStats::new(in_progress)
    }

    /// Drops games that have outlived the eviction policy as of `now`.
    ///
    /// Returns the number of games removed.
    #[instrument(skip(self))]
    pub fn evict(&self, now: DateTime<Utc>) -> usize {
        let mut games = self.lock();
        sweep(&mut games, now, &self.policy)
    }

    /// Stops the eviction sweeper and waits for it to finish.
    ///
    /// Resident games are left as they are. Later calls do nothing.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(Sweeper { stop, handle }) = sweeper else {
            warn!("Session store already shut down");
            return;
        };

        // The task may already be gone if the runtime is tearing down.
        let _ = stop.send(());
        if let Err(e) = handle.await {
            warn!(error = %e, "Eviction sweeper did not stop cleanly");
        }
        info!("Session store shut down");
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve<'a>(
    games: &'a mut Registry,
    id: &str,
    token: Option<&str>,
    fallback: &WordPool,
) -> Option<&'a mut GameSession> {
    match games.entry(id.to_string()) {
        Entry::Occupied(entry) => Some(entry.into_mut()),
        Entry::Vacant(entry) => {
            let token = token.filter(|t| !t.is_empty())?;
            match Game::reconstruct(token, fallback) {
                Ok(game) => {
                    info!(game_id = %id, "Reconstructed game from state token");
                    Some(entry.insert(GameSession::new(id.to_string(), game)))
                }
                Err(e) => {
                    debug!(game_id = %id, error = %e, "Unusable state token");
                    None
                }
            }
        }
    }
}

fn install(games: &mut Registry, id: &str, game: Game) -> GameSnapshot {
    let session = GameSession::new(id.to_string(), game);
    let snapshot = session.snapshot();
    if games.insert(id.to_string(), session).is_some() {
        info!(game_id = %id, "Replaced resident game");
    } else {
        info!(game_id = %id, "Created new game");
    }
    snapshot
}

fn sweep(games: &mut Registry, now: DateTime<Utc>, policy: &EvictionPolicy) -> usize {
    let before = games.len();
    // Both cutoffs measure from creation, not from when the game was decided.
    games.retain(|id, session| {
        if session.outcome().is_some() && session.created_at + policy.completed_ttl < now {
            info!(game_id = %id, "Removed completed game");
            return false;
        }
        if session.created_at + policy.max_ttl < now {
            info!(game_id = %id, "Removed expired game");
            return false;
        }
        true
    });
    let removed = before - games.len();
    debug!(removed, remaining = games.len(), "Eviction sweep finished");
    removed
}

fn spawn_sweeper(games: Arc<Mutex<Registry>>, policy: EvictionPolicy) -> Sweeper {
    let (stop, mut stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(policy.sweep_interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = &mut stopped => {
                    debug!("Eviction sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let mut guard = games.lock().unwrap_or_else(PoisonError::into_inner);
                    sweep(&mut guard, Utc::now(), &policy);
                }
            }
        }
    });
    Sweeper { stop, handle }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> WordPool {
        WordPool::new((0..40).map(|i| format!("word{i}"))).expect("40 words")
    }

    fn store() -> SessionStore {
        SessionStore::new(words(), EvictionPolicy::default())
    }

    fn age(store: &SessionStore, id: &str, by: TimeDelta) {
        let mut games = store.lock();
        let session = games.get_mut(id).expect("resident");
        session.created_at -= by;
    }

    fn finish(store: &SessionStore, id: &str) {
        store
            .mutate(id, None, |game| {
                let black = game
                    .layout()
                    .iter()
                    .position(|t| *t == Team::Black)
                    .expect("one assassin");
                game.guess(black)
            })
            .expect("legal guess");
    }

    #[tokio::test]
    async fn test_completed_games_expire_twelve_hours_after_creation() {
        let store = store();
        store.resolve_or_new("old", None);
        store.resolve_or_new("young", None);
        finish(&store, "old");
        finish(&store, "young");
        age(&store, "old", TimeDelta::hours(12) + TimeDelta::seconds(1));
        age(&store, "young", TimeDelta::hours(11));

        assert_eq!(store.evict(Utc::now()), 1);
        assert!(!store.contains("old"));
        assert!(store.contains("young"));
    }

    #[tokio::test]
    async fn test_all_games_expire_after_a_day() {
        let store = store();
        store.resolve_or_new("old", None);
        store.resolve_or_new("young", None);
        age(&store, "old", TimeDelta::hours(24) + TimeDelta::seconds(1));
        age(&store, "young", TimeDelta::hours(23));

        assert_eq!(store.evict(Utc::now()), 1);
        assert!(!store.contains("old"));
        assert!(store.contains("young"));
    }

    #[tokio::test]
    async fn test_in_progress_games_survive_completed_cutoff() {
        let store = store();
        store.resolve_or_new("g", None);
        age(&store, "g", TimeDelta::hours(13));
        assert_eq!(store.evict(Utc::now()), 0);
    }

    #[tokio::test]
    async fn test_sweeper_runs_on_interval() {
        let policy = EvictionPolicy {
            sweep_interval: Duration::from_millis(10),
            ..EvictionPolicy::default()
        };
        let store = SessionStore::new(words(), policy);
        store.resolve_or_new("g", None);
        age(&store, "g", TimeDelta::hours(25));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!store.contains("g"));
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_no_sweeps_after_shutdown() {
        let policy = EvictionPolicy {
            sweep_interval: Duration::from_millis(10),
            ..EvictionPolicy::default()
        };
        let store = SessionStore::new(words(), policy);
        store.shutdown().await;
        store.resolve_or_new("g", None);
        age(&store, "g", TimeDelta::hours(25));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.contains("g"));
        // Second call is a no-op.
        store.shutdown().await;
    }
}
