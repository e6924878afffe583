//! Card allegiance.

use serde::{Deserialize, Serialize};

/// The side a card belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Team {
    /// Innocent bystander.
    Neutral,
    /// Red agents.
    Red,
    /// Blue agents.
    Blue,
    /// The assassin. Revealing it loses the game for the guessing team.
    Black,
}

impl Team {
    /// Returns the opposing playing team.
    ///
    /// Neutral and black have no opponent and map to themselves.
    pub fn other(self) -> Self {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
            other => other,
        }
    }

    /// Whether this is one of the two teams that take turns.
    pub fn is_playing(self) -> bool {
        matches!(self, Team::Red | Team::Blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_other_swaps_playing_teams() {
        assert_eq!(Team::Red.other(), Team::Blue);
        assert_eq!(Team::Blue.other(), Team::Red);
        assert_eq!(Team::Black.other(), Team::Black);
    }

    #[test]
    fn test_only_red_and_blue_play() {
        let playing: Vec<_> = Team::iter().filter(|t| t.is_playing()).collect();
        assert_eq!(playing, vec![Team::Red, Team::Blue]);
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(Team::Neutral.to_string(), "neutral");
        assert_eq!(Team::Black.to_string(), "black");
    }
}
