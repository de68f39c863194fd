//! Peer-side mirror of the host's session.
//!
//! A [`Replica`] never mutates game state on its own. It only overwrites its
//! fields from [`Snapshot`]s, ignoring any that aren't newer than the last
//! one it applied.

use log::{debug, warn};

use super::constants::{DECK_SIZE, WELCOME_MESSAGE};
use super::entities::{Card, CompletedBook, Phase, Player, PlayerId};
use crate::net::messages::Snapshot;

#[derive(Clone, Debug)]
pub struct Replica {
    phase: Phase,
    players: Vec<Player>,
    current_player_id: Option<PlayerId>,
    cards_remaining: usize,
    log: Vec<String>,
    winners: Vec<Player>,
    is_vs_automated: bool,
    last_completed_book: Option<CompletedBook>,
    deck_echo: Option<Vec<Card>>,
    last_sequence: Option<u64>,
}

impl Default for Replica {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of offering a snapshot to a replica.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApplyOutcome {
    Applied,
    /// Sequence wasn't newer than the last applied one; nothing changed.
    Stale { last: u64, received: u64 },
}

impl Replica {
    /// Empty placeholder waiting for the host's first snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Matchmaking,
            players: Vec::new(),
            current_player_id: None,
            cards_remaining: DECK_SIZE,
            log: vec![WELCOME_MESSAGE.to_string()],
            winners: Vec::new(),
            is_vs_automated: false,
            last_completed_book: None,
            deck_echo: None,
            last_sequence: None,
        }
    }

    /// Overwrites every field present in `snapshot`. Snapshots without a
    /// sequence number are always applied.
    pub fn apply(&mut self, snapshot: Snapshot) -> ApplyOutcome {
        if let (Some(last), Some(received)) = (self.last_sequence, snapshot.sequence)
            && received <= last
        {
            warn!("Dropping stale snapshot #{received}, already at #{last}");
            return ApplyOutcome::Stale { last, received };
        }

        if let Some(sequence) = snapshot.sequence {
            self.last_sequence = Some(sequence);
        }
        if let Some(players) = snapshot.players {
            self.players = players;
        }
        if let Some(remaining) = snapshot.cards_remaining_in_deck {
            self.cards_remaining = remaining;
        }
        if let Some(winners) = snapshot.winners {
            self.winners = winners;
        }
        if let Some(current) = snapshot.current_player_id {
            self.current_player_id = Some(current);
        }
        if let Some(log) = snapshot.game_log {
            self.log = log;
        }
        if let Some(is_vs_automated) = snapshot.is_vs_automated {
            self.is_vs_automated = is_vs_automated;
        }
        if let Some(book) = snapshot.last_completed_book {
            self.last_completed_book = Some(book);
        }
        if let Some(deck) = snapshot.shuffled_deck {
            self.deck_echo = Some(deck);
        }
        // Any snapshot means a game is running; game over is final.
        self.phase = match (self.phase, snapshot.is_game_over) {
            (Phase::GameOver, _) | (_, Some(true)) => Phase::GameOver,
            _ => Phase::InGame,
        };

        debug!(
            "Applied snapshot {:?}, phase {}, {} cards left",
            snapshot.sequence, self.phase, self.cards_remaining
        );
        ApplyOutcome::Applied
    }

    pub fn reset(&mut self) {
        *self = Self::new();
        self.phase = Phase::Menu;
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn current_player_id(&self) -> Option<&PlayerId> {
        self.current_player_id.as_ref()
    }

    #[must_use]
    pub fn cards_remaining(&self) -> usize {
        self.cards_remaining
    }

    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    #[must_use]
    pub fn winners(&self) -> &[Player] {
        &self.winners
    }

    #[must_use]
    pub fn is_vs_automated(&self) -> bool {
        self.is_vs_automated
    }

    #[must_use]
    pub fn last_completed_book(&self) -> Option<&CompletedBook> {
        self.last_completed_book.as_ref()
    }

    #[must_use]
    pub fn deck_echo(&self) -> Option<&[Card]> {
        self.deck_echo.as_deref()
    }

    #[must_use]
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entities::{Deck, Participant, Rank},
        state_machine::{GameSettings, Session},
    };

    fn host_session() -> Session {
        let mut session = Session::new(GameSettings::default());
        session
            .start(vec![
                Participant::human("a", "Alice"),
                Participant::human("b", "Bob"),
                Participant::automated("bot-1", "Pike"),
            ])
            .unwrap();
        session
    }

    #[test]
    fn test_new_replica_waits() {
        let replica = Replica::new();
        assert_eq!(replica.phase(), Phase::Matchmaking);
        assert_eq!(replica.cards_remaining(), DECK_SIZE);
        assert!(replica.players().is_empty());
        assert_eq!(replica.last_sequence(), None);
    }

    #[test]
    fn test_full_snapshot_reproduces_host() {
        let session = host_session();
        let mut replica = Replica::new();
        let outcome = replica.apply(Snapshot::capture(&session, true));

        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(replica.phase(), Phase::InGame);
        assert_eq!(replica.players(), session.players());
        assert_eq!(replica.current_player_id(), session.current_player_id());
        assert_eq!(replica.cards_remaining(), session.cards_remaining());
        assert_eq!(replica.log(), session.log());
        assert_eq!(replica.winners(), session.winners());
        assert!(replica.is_vs_automated());
        assert_eq!(replica.deck_echo(), Some(session.deck().cards()));
        assert_eq!(replica.last_sequence(), Some(session.sequence()));
    }

    #[test]
    fn test_absent_fields_keep_previous_values() {
        let session = host_session();
        let mut replica = Replica::new();
        replica.apply(Snapshot::capture(&session, false));

        replica.apply(Snapshot {
            sequence: Some(session.sequence() + 1),
            cards_remaining_in_deck: Some(3),
            ..Snapshot::default()
        });

        assert_eq!(replica.cards_remaining(), 3);
        assert_eq!(replica.players(), session.players());
        assert_eq!(replica.log(), session.log());
        assert_eq!(replica.current_player_id(), session.current_player_id());
    }

    #[test]
    fn test_stale_snapshot_is_dropped() {
        let mut replica = Replica::new();
        replica.apply(Snapshot {
            sequence: Some(5),
            cards_remaining_in_deck: Some(10),
            ..Snapshot::default()
        });

        let outcome = replica.apply(Snapshot {
            sequence: Some(4),
            cards_remaining_in_deck: Some(30),
            ..Snapshot::default()
        });
        assert_eq!(outcome, ApplyOutcome::Stale { last: 5, received: 4 });

        let duplicate = replica.apply(Snapshot {
            sequence: Some(5),
            cards_remaining_in_deck: Some(30),
            ..Snapshot::default()
        });
        assert_eq!(duplicate, ApplyOutcome::Stale { last: 5, received: 5 });
        assert_eq!(replica.cards_remaining(), 10);
    }

    #[test]
    fn test_unsequenced_snapshot_is_applied() {
        let mut replica = Replica::new();
        replica.apply(Snapshot {
            sequence: Some(5),
            ..Snapshot::default()
        });
        let outcome = replica.apply(Snapshot {
            cards_remaining_in_deck: Some(7),
            ..Snapshot::default()
        });
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(replica.cards_remaining(), 7);
        assert_eq!(replica.last_sequence(), Some(5));
    }

    #[test]
    fn test_game_over_flag_sets_phase() {
        let mut replica = Replica::new();
        replica.apply(Snapshot {
            is_game_over: Some(true),
            ..Snapshot::default()
        });
        assert_eq!(replica.phase(), Phase::GameOver);
    }

    #[test]
    fn test_game_over_is_not_reverted() {
        let mut replica = Replica::new();
        replica.apply(Snapshot {
            sequence: Some(3),
            is_game_over: Some(true),
            ..Snapshot::default()
        });

        replica.apply(Snapshot {
            sequence: Some(4),
            cards_remaining_in_deck: Some(9),
            ..Snapshot::default()
        });
        assert_eq!(replica.phase(), Phase::GameOver);
        assert_eq!(replica.cards_remaining(), 9);

        replica.apply(Snapshot {
            sequence: Some(5),
            is_game_over: Some(false),
            ..Snapshot::default()
        });
        assert_eq!(replica.phase(), Phase::GameOver);
    }

    #[test]
    fn test_partial_snapshot_keeps_phase() {
        let mut replica = Replica::new();
        replica.apply(Snapshot {
            sequence: Some(1),
            cards_remaining_in_deck: Some(40),
            ..Snapshot::default()
        });
        assert_eq!(replica.phase(), Phase::InGame);

        replica.apply(Snapshot {
            sequence: Some(2),
            is_game_over: Some(false),
            ..Snapshot::default()
        });
        assert_eq!(replica.phase(), Phase::InGame);
    }

    #[test]
    fn test_book_pointer_is_mirrored() {
        let mut session = Session::new(GameSettings::new(5, 2, 6));
        let mut cards: Vec<_> = Deck::new().cards().to_vec();
        // Move all four kings to the front so the first hand is dealt a book.
        cards.sort_by_key(|card| card.rank != Rank::King);
        session
            .start_with_deck(
                vec![Participant::human("a", "A"), Participant::human("b", "B")],
                Deck::from_cards(cards),
            )
            .unwrap();

        let mut replica = Replica::new();
        replica.apply(Snapshot::capture(&session, false));
        assert_eq!(
            replica.last_completed_book().map(|b| b.rank),
            Some(Rank::King)
        );
    }

    #[test]
    fn test_reset_returns_to_menu() {
        let mut replica = Replica::new();
        replica.apply(Snapshot::capture(&host_session(), false));
        replica.reset();
        assert_eq!(replica.phase(), Phase::Menu);
        assert!(replica.players().is_empty());
        assert_eq!(replica.last_sequence(), None);
    }
}
