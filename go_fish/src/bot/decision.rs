//! Decision-making for automated participants.
//!
//! A [`Strategy`] only sees what the automated player is entitled to: its
//! own hand and the public list of players. Its choice goes through the same
//! ask path as a human's.

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::game::entities::{Card, Player, PlayerId, Rank};

pub trait Strategy: Send {
    /// Rank to ask for, or `None` with an empty hand.
    fn choose_rank(&mut self, hand: &[Card]) -> Option<Rank>;

    /// Opponent to ask, or `None` when there is nobody else.
    fn choose_target(&mut self, players: &[Player], self_id: &PlayerId) -> Option<PlayerId>;
}

/// Uniformly random among the distinct ranks held and the other players.
#[derive(Debug)]
pub struct RandomStrategy {
    rng: StdRng,
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible choices for a given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Strategy for RandomStrategy {
    fn choose_rank(&mut self, hand: &[Card]) -> Option<Rank> {
        let mut ranks: Vec<Rank> = hand.iter().map(|card| card.rank).collect();
        ranks.sort();
        ranks.dedup();
        ranks.choose(&mut self.rng).copied()
    }

    fn choose_target(&mut self, players: &[Player], self_id: &PlayerId) -> Option<PlayerId> {
        let opponents: Vec<&Player> = players.iter().filter(|p| &p.id != self_id).collect();
        opponents.choose(&mut self.rng).map(|p| p.id.clone())
    }
}

/// What an automated player does with its turn.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BotDecision {
    Ask { target: PlayerId, rank: Rank },
    /// Nothing to ask with (empty hand) or nobody to ask.
    Pass,
}

/// Runs `strategy` for the player `self_id` among `players`.
pub fn decide(strategy: &mut dyn Strategy, players: &[Player], self_id: &PlayerId) -> BotDecision {
    let Some(me) = players.iter().find(|p| &p.id == self_id) else {
        return BotDecision::Pass;
    };
    let Some(rank) = strategy.choose_rank(&me.hand) else {
        return BotDecision::Pass;
    };
    match strategy.choose_target(players, self_id) {
        Some(target) => BotDecision::Ask { target, rank },
        None => BotDecision::Pass,
    }
}
