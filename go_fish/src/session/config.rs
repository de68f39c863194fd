//! Session configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    constants::{HAND_SIZE, MAX_PLAYERS, MIN_PLAYERS},
    state_machine::GameSettings,
};

/// Per-session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cards dealt to each player (default: 5)
    pub hand_size: usize,

    /// Minimum roster size
    pub min_players: usize,

    /// Maximum roster size
    pub max_players: usize,

    /// Automated player "thinking" pause before acting
    pub bot_think_time_ms: u64,

    /// Random variance on the thinking pause (±milliseconds)
    pub bot_think_variance_ms: u64,

    /// Extra pause after a book is completed, so presentation layers can
    /// celebrate before the next automated action
    pub book_celebration_ms: u64,

    /// Echo the remaining deck in every snapshot (debugging only)
    pub echo_deck: bool,

    /// Capacity of the actor inbox
    pub inbox_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hand_size: HAND_SIZE,
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
            bot_think_time_ms: 1200,
            bot_think_variance_ms: 600,
            book_celebration_ms: 2000,
            echo_deck: false,
            inbox_capacity: 100,
        }
    }
}

impl SessionConfig {
    /// Configuration with every timed pause disabled.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            bot_think_time_ms: 0,
            bot_think_variance_ms: 0,
            book_celebration_ms: 0,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.hand_size == 0 {
            return Err("Hand size must be at least 1".to_string());
        }

        if self.min_players < 2 {
            return Err("A session needs at least 2 players".to_string());
        }

        if self.max_players < self.min_players {
            return Err("Max players must be at least min players".to_string());
        }

        if self.hand_size * self.max_players > 52 {
            return Err(format!(
                "Can't deal {} cards to {} players from one deck",
                self.hand_size, self.max_players
            ));
        }

        if self.bot_think_variance_ms > self.bot_think_time_ms {
            return Err("Think time variance can't exceed the base think time".to_string());
        }

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be positive".to_string());
        }

        Ok(())
    }

    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings::new(self.hand_size, self.min_players, self.max_players)
    }

    #[must_use]
    pub fn book_celebration(&self) -> Duration {
        Duration::from_millis(self.book_celebration_ms)
    }
}
