//! Board derivation and turn rules.

use crate::error::{DecodeError, GameError};
use crate::state::GameState;
use crate::team::Team;
use crate::words::{WordPool, WordSet};
use crate::BOARD_SIZE;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Serializer};
use std::iter;
use tracing::{debug, instrument};

/// Cards belonging to the team that moves first.
const STARTING_TEAM_CARDS: usize = 9;
/// Cards belonging to the team that moves second.
const SECOND_TEAM_CARDS: usize = 8;
/// Bystander cards.
const NEUTRAL_CARDS: usize = 7;

/// A Codenames game: the board derived from a [`GameState`] plus the outcome
/// implied by its reveals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    state: GameState,
    starting_team: Team,
    words: Vec<String>,
    layout: Vec<Team>,
    winning_team: Option<Team>,
}

impl Game {
    /// Deals a fresh board with a random seed.
    #[instrument(skip(word_set), fields(custom = word_set.is_custom()))]
    pub fn new_random(word_set: WordSet) -> Self {
        Self::from_state(GameState::random(word_set))
    }

    /// Rebuilds a game from a token produced by [`Game::state_id`].
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the token is malformed or carries a
    /// word set that cannot fill a board.
    pub fn reconstruct(token: &str, fallback: &WordPool) -> Result<Self, DecodeError> {
        GameState::decode(token, fallback).map(Self::from_state)
    }

    /// Derives the board for `state` and replays its outcome.
    pub fn from_state(state: GameState) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(state.seed());

        let starting_team = if rng.gen_bool(0.5) { Team::Red } else { Team::Blue };

        let words: Vec<String> = state
            .word_set()
            .pool()
            .words()
            .choose_multiple(&mut rng, BOARD_SIZE)
            .cloned()
            .collect();

        let mut layout: Vec<Team> = iter::repeat_n(starting_team, STARTING_TEAM_CARDS)
            .chain(iter::repeat_n(starting_team.other(), SECOND_TEAM_CARDS))
            .chain(iter::repeat_n(Team::Neutral, NEUTRAL_CARDS))
            .chain(iter::once(Team::Black))
            .collect();
        layout.shuffle(&mut rng);

        let mut game = Self {
            state,
            starting_team,
            words,
            layout,
            winning_team: None,
        };
        game.winning_team = game.replay_outcome();
        game
    }

    /// The opaque token for the current state.
    pub fn state_id(&self) -> String {
        self.state.encode()
    }

    /// Reveals the card at `index` for the team on turn.
    ///
    /// Revealing the assassin hands the win to the other team. Revealing a
    /// card that is not the guessing team's ends its turn.
    ///
    /// # Errors
    ///
    /// [`GameError::GameOver`] once a winner exists,
    /// [`GameError::InvalidIndex`] for an index off the board, and
    /// [`GameError::AlreadyRevealed`] for a card that is face up.
    #[instrument(skip(self), fields(round = self.state.round()))]
    pub fn guess(&mut self, index: usize) -> Result<(), GameError> {
        if self.winning_team.is_some() {
            return Err(GameError::GameOver);
        }
        if index >= BOARD_SIZE {
            return Err(GameError::InvalidIndex { index });
        }
        if self.state.revealed()[index] {
            return Err(GameError::AlreadyRevealed { index });
        }

        let guessing = self.current_team();
        let card = self.layout[index];
        self.state.reveal(index);

        if card == Team::Black {
            self.winning_team = Some(guessing.other());
            debug!(%guessing, "Assassin revealed");
            return Ok(());
        }

        self.winning_team = self.cleared_team();
        if self.winning_team.is_none() && card != guessing {
            self.state.advance_round();
        }

        debug!(%card, winner = ?self.winning_team, "Card revealed");
        Ok(())
    }

    /// Passes the turn to the other team.
    ///
    /// # Errors
    ///
    /// [`GameError::GameOver`] once a winner exists.
    #[instrument(skip(self), fields(round = self.state.round()))]
    pub fn end_turn(&mut self) -> Result<(), GameError> {
        if self.winning_team.is_some() {
            return Err(GameError::GameOver);
        }
        self.state.advance_round();
        Ok(())
    }

    /// The team whose turn it is.
    pub fn current_team(&self) -> Team {
        if self.state.round() % 2 == 0 {
            self.starting_team
        } else {
            self.starting_team.other()
        }
    }

    /// The team that moved first.
    pub fn starting_team(&self) -> Team {
        self.starting_team
    }

    /// The winner, once decided.
    pub fn winning_team(&self) -> Option<Team> {
        self.winning_team
    }

    /// Turns taken so far.
    pub fn round(&self) -> u32 {
        self.state.round()
    }

    /// Reveal flag per cell.
    pub fn revealed(&self) -> &[bool] {
        self.state.revealed()
    }

    /// Display word per cell.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Allegiance per cell.
    pub fn layout(&self) -> &[Team] {
        &self.layout
    }

    /// The underlying state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Outcome implied by the reveal flags alone.
    ///
    /// Play stops at the assassin without advancing the round, so the team on
    /// turn is the one that revealed it.
    fn replay_outcome(&self) -> Option<Team> {
        let assassin_revealed = self
            .cells()
            .any(|(team, revealed)| revealed && team == Team::Black);
        if assassin_revealed {
            return Some(self.current_team().other());
        }
        self.cleared_team()
    }

    /// A playing team with every one of its cards revealed.
    fn cleared_team(&self) -> Option<Team> {
        [self.starting_team, self.starting_team.other()]
            .into_iter()
            .find(|&candidate| {
                self.cells()
                    .all(|(team, revealed)| team != candidate || revealed)
            })
    }

    fn cells(&self) -> impl Iterator<Item = (Team, bool)> + '_ {
        self.layout
            .iter()
            .copied()
            .zip(self.state.revealed().iter().copied())
    }
}

#[derive(Serialize)]
struct GameView<'a> {
    starting_team: Team,
    current_team: Team,
    winning_team: Option<Team>,
    round: u32,
    revealed: &'a [bool],
    words: &'a [String],
    layout: &'a [Team],
}

impl Serialize for Game {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GameView {
            starting_team: self.starting_team,
            current_team: self.current_team(),
            winning_team: self.winning_team,
            round: self.round(),
            revealed: self.revealed(),
            words: &self.words,
            layout: &self.layout,
        }
        .serialize(serializer)
    }
}
