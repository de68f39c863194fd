//! Authoritative Go Fish session engine.
//!
//! Only the host runs a [`Session`]. It owns the live deck, the players and
//! the turn pointer, and every mutation bumps a sequence number that is
//! stamped on the snapshots sent to peers.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};
use thiserror::Error;

use super::constants::{BOOK_SIZE, HAND_SIZE, MAX_PLAYERS, MIN_PLAYERS, WELCOME_MESSAGE};
use super::entities::{CompletedBook, Deck, Participant, Phase, Player, PlayerId, Rank};

/// Reasons an action is refused. None of these change state.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("game is not in progress")]
    GameNotInProgress,
    #[error("game already in progress")]
    GameAlreadyInProgress,
    #[error("not your turn")]
    OutOfTurnAction,
    #[error("player {0} does not exist")]
    UnknownPlayer(PlayerId),
    #[error("can't ask yourself")]
    CannotAskSelf,
    #[error("must hold a {0} to ask for one")]
    RankNotHeld(Rank),
    #[error("need {min}-{max} players, got {actual}")]
    InvalidPlayerCount {
        min: usize,
        max: usize,
        actual: usize,
    },
    #[error("player {0} appears more than once")]
    DuplicatePlayer(PlayerId),
    #[error("roster has no human participant")]
    NoHumanParticipant,
    #[error("{0} is not the local player")]
    NotLocalPlayer(PlayerId),
}

/// Something that happened during play, rendered into the game log.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    Dealt,
    Asked {
        asker: String,
        asked: String,
        rank: Rank,
    },
    Handed {
        giver: String,
        receiver: String,
        rank: Rank,
        count: usize,
    },
    GoFish {
        asked: String,
        rank: Rank,
    },
    Drew(String),
    DeckEmpty(String),
    BookCompleted {
        player: String,
        rank: Rank,
    },
    TurnPassed(String),
    Won {
        player: String,
        books: usize,
    },
    Tied {
        players: Vec<String>,
        books: usize,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Dealt => "Cards have been dealt.".to_string(),
            Self::Asked { asker, asked, rank } => format!("{asker} asked {asked} for {rank}s."),
            Self::Handed {
                giver,
                receiver,
                rank,
                count,
            } => format!("{giver} gave {receiver} {count} × {rank}."),
            Self::GoFish { asked, rank } => format!("{asked} has no {rank}s. Go fish!"),
            Self::Drew(player) => format!("{player} drew a card."),
            Self::DeckEmpty(player) => format!("{player} can't draw, the deck is empty."),
            Self::BookCompleted { player, rank } => {
                format!("{player} completed a book of {rank}s!")
            }
            Self::TurnPassed(player) => format!("It's {player}'s turn."),
            Self::Won { player, books } => format!("{player} wins with {books} books!"),
            Self::Tied { players, books } => {
                format!("It's a tie between {} with {books} books!", players.join(", "))
            }
        };
        write!(f, "{repr}")
    }
}

/// Game rules that can vary between sessions.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub hand_size: usize,
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(HAND_SIZE, MIN_PLAYERS, MAX_PLAYERS)
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(hand_size: usize, min_players: usize, max_players: usize) -> Self {
        Self {
            hand_size,
            min_players,
            max_players,
        }
    }
}

/// How an ask resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AskOutcome {
    /// The target handed over `count` cards; the asker keeps the turn.
    Caught { count: usize },
    /// The target had none; the asker drew (if the deck allowed) and the
    /// turn moved on.
    GoFish { drew: bool },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AskResult {
    pub outcome: AskOutcome,
    /// Books the asker completed as a result of this action.
    pub new_books: Vec<Rank>,
    pub game_over: bool,
}

#[derive(Clone, Debug)]
pub struct Session {
    settings: GameSettings,
    phase: Phase,
    /// Turn order, fixed at deal time.
    players: Vec<Player>,
    current_idx: Option<usize>,
    deck: Deck,
    log: Vec<String>,
    winners: Vec<Player>,
    is_vs_automated: bool,
    last_completed_book: Option<CompletedBook>,
    sequence: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            phase: Phase::Menu,
            players: Vec::new(),
            current_idx: None,
            deck: Deck::from_cards(Vec::new()),
            log: vec![WELCOME_MESSAGE.to_string()],
            winners: Vec::new(),
            is_vs_automated: false,
            last_completed_book: None,
            sequence: 0,
        }
    }

    pub fn begin_matchmaking(&mut self) -> Result<(), UserError> {
        match self.phase {
            Phase::Menu | Phase::Matchmaking => {
                self.phase = Phase::Matchmaking;
                Ok(())
            }
            _ => Err(UserError::GameAlreadyInProgress),
        }
    }

    /// Builds a fresh shuffled deck and deals to `roster`.
    pub fn start(&mut self, roster: Vec<Participant>) -> Result<(), UserError> {
        let mut deck = Deck::new();
        deck.shuffle();
        self.start_with_deck(roster, deck)
    }

    /// Deals from `deck` as-is, without shuffling. Players are dealt in
    /// roster order and the first one dealt takes the first turn.
    pub fn start_with_deck(
        &mut self,
        roster: Vec<Participant>,
        deck: Deck,
    ) -> Result<(), UserError> {
        if matches!(self.phase, Phase::InGame | Phase::GameOver) {
            return Err(UserError::GameAlreadyInProgress);
        }
        validate_roster(&roster, &self.settings)?;

        self.deck = deck;
        self.is_vs_automated = roster.iter().any(|p| p.is_automated);
        self.players = roster
            .into_iter()
            .map(|participant| {
                let mut player = Player::new(participant);
                player.receive(self.deck.deal(self.settings.hand_size));
                player
            })
            .collect();
        self.current_idx = Some(0);
        self.winners.clear();
        self.last_completed_book = None;
        self.phase = Phase::InGame;
        self.record(GameEvent::Dealt);
        info!(
            "Dealt {} cards to {} players, {} left in the deck",
            self.settings.hand_size,
            self.players.len(),
            self.deck.cards_remaining()
        );

        for idx in 0..self.players.len() {
            self.detect_books(idx);
        }
        // A short hand can be booked out entirely, or the deal can empty the deck.
        self.check_game_over();
        self.sequence += 1;
        Ok(())
    }

    /// Resolves one ask. Refused actions leave every field untouched.
    pub fn ask(
        &mut self,
        asking_id: &PlayerId,
        asked_id: &PlayerId,
        rank: Rank,
    ) -> Result<AskResult, UserError> {
        if self.phase != Phase::InGame {
            return Err(UserError::GameNotInProgress);
        }
        let asker_idx = self.player_index(asking_id)?;
        if self.current_idx != Some(asker_idx) {
            return Err(UserError::OutOfTurnAction);
        }
        let asked_idx = self.player_index(asked_id)?;
        if asked_idx == asker_idx {
            return Err(UserError::CannotAskSelf);
        }
        if !self.players[asker_idx].has_rank(rank) {
            return Err(UserError::RankNotHeld(rank));
        }

        let asker_name = self.players[asker_idx].display_name.clone();
        let asked_name = self.players[asked_idx].display_name.clone();
        self.record(GameEvent::Asked {
            asker: asker_name.clone(),
            asked: asked_name.clone(),
            rank,
        });

        let taken = self.players[asked_idx].take_rank(rank);
        let outcome = if taken.is_empty() {
            self.record(GameEvent::GoFish {
                asked: asked_name,
                rank,
            });
            let drew = match self.deck.draw() {
                Some(card) => {
                    self.players[asker_idx].receive([card]);
                    self.record(GameEvent::Drew(asker_name));
                    true
                }
                None => {
                    self.record(GameEvent::DeckEmpty(asker_name));
                    false
                }
            };
            AskOutcome::GoFish { drew }
        } else {
            let count = taken.len();
            self.players[asker_idx].receive(taken);
            self.record(GameEvent::Handed {
                giver: asked_name,
                receiver: asker_name,
                rank,
                count,
            });
            AskOutcome::Caught { count }
        };

        let new_books = self.detect_books(asker_idx);
        if matches!(outcome, AskOutcome::GoFish { .. }) {
            self.advance_turn();
        }
        let game_over = self.check_game_over();
        self.sequence += 1;

        debug!(
            "{} asked {} for {}: {:?}, books {:?}",
            asking_id, asked_id, rank, outcome, new_books
        );
        Ok(AskResult {
            outcome,
            new_books,
            game_over,
        })
    }

    /// Skips the current player's turn. Only valid for a player with an
    /// empty hand, which can't ask for anything.
    pub fn pass_turn(&mut self, player_id: &PlayerId) -> Result<bool, UserError> {
        if self.phase != Phase::InGame {
            return Err(UserError::GameNotInProgress);
        }
        let idx = self.player_index(player_id)?;
        if self.current_idx != Some(idx) {
            return Err(UserError::OutOfTurnAction);
        }
        self.advance_turn();
        let game_over = self.check_game_over();
        self.sequence += 1;
        Ok(game_over)
    }

    /// Extracts every complete book from a player's hand. Running it again
    /// on an unchanged hand does nothing.
    pub fn detect_books(&mut self, player_idx: usize) -> Vec<Rank> {
        let Some(player) = self.players.get_mut(player_idx) else {
            return Vec::new();
        };
        let complete: Vec<Rank> = player
            .rank_counts()
            .into_iter()
            .filter(|&(_, count)| count == BOOK_SIZE)
            .map(|(rank, _)| rank)
            .collect();

        let mut new_books = Vec::with_capacity(complete.len());
        for rank in complete {
            player.take_rank(rank);
            if player.book_ranks.contains(&rank) {
                continue;
            }
            player.books += 1;
            player.book_ranks.push(rank);
            new_books.push(rank);
        }

        if !new_books.is_empty() {
            let player_id = player.id.clone();
            let name = player.display_name.clone();
            for &rank in &new_books {
                self.record(GameEvent::BookCompleted {
                    player: name.clone(),
                    rank,
                });
                self.last_completed_book = Some(CompletedBook {
                    player_id: player_id.clone(),
                    rank,
                });
            }
        }
        new_books
    }

    /// Ends the game when a hand or the deck runs dry. Fires at most once.
    pub fn check_game_over(&mut self) -> bool {
        if self.phase != Phase::InGame {
            return false;
        }
        let any_empty_hand = self.players.iter().any(|p| p.hand.is_empty());
        if !any_empty_hand && !self.deck.is_empty() {
            return false;
        }

        self.phase = Phase::GameOver;
        self.winners = determine_winners(&self.players);
        let books = self.winners.first().map_or(0, |p| p.books);
        let event = match self.winners.as_slice() {
            [winner] => GameEvent::Won {
                player: winner.display_name.clone(),
                books,
            },
            winners => GameEvent::Tied {
                players: winners.iter().map(|p| p.display_name.clone()).collect(),
                books,
            },
        };
        info!("Game over: {event}");
        self.record(event);
        true
    }

    /// Drops all match state and returns to the menu.
    pub fn reset(&mut self) {
        *self = Self::new(self.settings.clone());
    }

    fn advance_turn(&mut self) {
        if self.players.is_empty() {
            return;
        }
        let next = self.current_idx.map_or(0, |idx| (idx + 1) % self.players.len());
        self.current_idx = Some(next);
        let name = self.players[next].display_name.clone();
        self.record(GameEvent::TurnPassed(name));
    }

    fn player_index(&self, id: &PlayerId) -> Result<usize, UserError> {
        self.players
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| UserError::UnknownPlayer(id.clone()))
    }

    fn record(&mut self, event: GameEvent) {
        debug!("{event}");
        self.log.push(event.to_string());
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.current_idx.and_then(|idx| self.players.get(idx))
    }

    #[must_use]
    pub fn current_player_id(&self) -> Option<&PlayerId> {
        self.current_player().map(|p| &p.id)
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn cards_remaining(&self) -> usize {
        self.deck.cards_remaining()
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
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }
}

fn validate_roster(roster: &[Participant], settings: &GameSettings) -> Result<(), UserError> {
    if roster.len() < settings.min_players || roster.len() > settings.max_players {
        return Err(UserError::InvalidPlayerCount {
            min: settings.min_players,
            max: settings.max_players,
            actual: roster.len(),
        });
    }
    let mut seen = HashSet::with_capacity(roster.len());
    for participant in roster {
        if !seen.insert(&participant.id) {
            return Err(UserError::DuplicatePlayer(participant.id.clone()));
        }
    }
    Ok(())
}

/// Every player tied at the highest book count. Ties are kept.
#[must_use]
pub fn determine_winners(players: &[Player]) -> Vec<Player> {
    let Some(max_books) = players.iter().map(|p| p.books).max() else {
        return Vec::new();
    };
    players
        .iter()
        .filter(|p| p.books == max_books)
        .cloned()
        .collect()
}

/// The participant that runs the authoritative session: the smallest human
/// id. Automated participants are hosted by the authority, never the other
/// way round.
pub fn select_host(roster: &[Participant]) -> Result<&PlayerId, UserError> {
    roster
        .iter()
        .filter(|p| !p.is_automated)
        .map(|p| &p.id)
        .min()
        .ok_or(UserError::NoHumanParticipant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Card, Suit};

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn roster(n: usize) -> Vec<Participant> {
        ["a", "b", "c", "d", "e", "f"]
            .iter()
            .take(n)
            .map(|id| Participant::human(*id, id.to_uppercase()))
            .collect()
    }

    fn id(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    /// Builds a deck that deals `hands` (in roster order, `hand_size` cards
    /// each) followed by `rest`.
    fn stacked(hands: &[Vec<Card>], rest: Vec<Card>) -> Deck {
        let mut cards: Vec<Card> = hands.iter().flatten().copied().collect();
        cards.extend(rest);
        Deck::from_cards(cards)
    }

    fn session_with(hands: &[Vec<Card>], rest: Vec<Card>) -> Session {
        let hand_size = hands[0].len();
        let mut session = Session::new(GameSettings::new(hand_size, 2, 6));
        session
            .start_with_deck(roster(hands.len()), stacked(hands, rest))
            .unwrap();
        session
    }

    fn filler() -> Vec<Card> {
        vec![
            c(Rank::Nine, Suit::Clubs),
            c(Rank::Nine, Suit::Hearts),
            c(Rank::Ten, Suit::Clubs),
            c(Rank::Ten, Suit::Hearts),
        ]
    }

    #[test]
    fn test_new_session_is_in_menu() {
        let session = Session::default();
        assert_eq!(session.phase(), Phase::Menu);
        assert_eq!(session.log(), &[WELCOME_MESSAGE.to_string()]);
        assert_eq!(session.current_player_id(), None);
    }

    #[test]
    fn test_start_deals_hand_size_to_everyone() {
        let mut session = Session::default();
        session.start(roster(3)).unwrap();
        assert_eq!(session.phase(), Phase::InGame);
        let in_hands: usize = session.players().iter().map(|p| p.hand.len()).sum();
        let in_books: usize = session.players().iter().map(|p| p.books * BOOK_SIZE).sum();
        assert_eq!(in_hands + in_books + session.cards_remaining(), 52);
        assert_eq!(session.current_player_id(), Some(&id("a")));
        assert!(session.log().contains(&"Cards have been dealt.".to_string()));
        assert_eq!(session.sequence(), 1);
    }

    #[test]
    fn test_start_rejects_bad_rosters() {
        let mut session = Session::default();
        assert!(matches!(
            session.start(roster(1)),
            Err(UserError::InvalidPlayerCount { actual: 1, .. })
        ));
        let dup = vec![Participant::human("a", "A"), Participant::human("a", "A2")];
        assert_eq!(
            session.start(dup),
            Err(UserError::DuplicatePlayer(id("a")))
        );
        assert_eq!(session.phase(), Phase::Menu);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut session = Session::default();
        session.start(roster(2)).unwrap();
        assert_eq!(
            session.start(roster(2)),
            Err(UserError::GameAlreadyInProgress)
        );
    }

    #[test]
    fn test_initial_book_is_extracted() {
        let hands = vec![
            vec![
                c(Rank::King, Suit::Spades),
                c(Rank::King, Suit::Hearts),
                c(Rank::King, Suit::Clubs),
                c(Rank::King, Suit::Diamonds),
                c(Rank::Two, Suit::Clubs),
            ],
            vec![
                c(Rank::Three, Suit::Clubs),
                c(Rank::Four, Suit::Clubs),
                c(Rank::Five, Suit::Clubs),
                c(Rank::Six, Suit::Clubs),
                c(Rank::Seven, Suit::Clubs),
            ],
        ];
        let session = session_with(&hands, filler());
        let a = &session.players()[0];
        assert_eq!(a.books, 1);
        assert_eq!(a.book_ranks, vec![Rank::King]);
        assert_eq!(a.hand, vec![c(Rank::Two, Suit::Clubs)]);
        assert_eq!(
            session.last_completed_book(),
            Some(&CompletedBook {
                player_id: id("a"),
                rank: Rank::King
            })
        );
    }

    #[test]
    fn test_successful_ask_transfers_all_and_keeps_turn() {
        let hands = vec![
            vec![
                c(Rank::Seven, Suit::Spades),
                c(Rank::Two, Suit::Clubs),
                c(Rank::Five, Suit::Hearts),
            ],
            vec![
                c(Rank::Seven, Suit::Hearts),
                c(Rank::Seven, Suit::Clubs),
                c(Rank::Three, Suit::Clubs),
            ],
            vec![
                c(Rank::Three, Suit::Diamonds),
                c(Rank::Four, Suit::Clubs),
                c(Rank::Six, Suit::Clubs),
            ],
        ];
        let mut session = session_with(&hands, filler());
        let result = session.ask(&id("a"), &id("b"), Rank::Seven).unwrap();

        assert_eq!(result.outcome, AskOutcome::Caught { count: 2 });
        assert!(!result.game_over);
        assert_eq!(session.players()[0].hand.len(), 5);
        assert_eq!(session.players()[1].hand.len(), 1);
        assert_eq!(session.current_player_id(), Some(&id("a")));
    }

    #[test]
    fn test_failed_ask_draws_and_passes_turn() {
        let hands = vec![
            vec![c(Rank::Seven, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Eight, Suit::Hearts), c(Rank::Three, Suit::Clubs)],
            vec![c(Rank::Five, Suit::Clubs), c(Rank::Four, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, filler());
        let result = session.ask(&id("a"), &id("b"), Rank::Seven).unwrap();

        assert_eq!(result.outcome, AskOutcome::GoFish { drew: true });
        assert_eq!(session.players()[0].hand.len(), 3);
        assert_eq!(session.players()[1].hand.len(), 2);
        assert_eq!(session.cards_remaining(), 3);
        assert_eq!(session.current_player_id(), Some(&id("b")));
    }

    #[test]
    fn test_turn_wraps_around() {
        let hands = vec![
            vec![c(Rank::Two, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Three, Suit::Hearts), c(Rank::Three, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, filler());
        session.ask(&id("a"), &id("b"), Rank::Two).unwrap();
        assert_eq!(session.current_player_id(), Some(&id("b")));
        session.ask(&id("b"), &id("a"), Rank::Three).unwrap();
        assert_eq!(session.current_player_id(), Some(&id("a")));
    }

    #[test]
    fn test_transfer_completes_book() {
        let hands = vec![
            vec![
                c(Rank::King, Suit::Spades),
                c(Rank::King, Suit::Hearts),
                c(Rank::Two, Suit::Clubs),
            ],
            vec![
                c(Rank::King, Suit::Clubs),
                c(Rank::King, Suit::Diamonds),
                c(Rank::Three, Suit::Clubs),
            ],
        ];
        let mut session = session_with(&hands, filler());
        let remaining = session.cards_remaining();
        let result = session.ask(&id("a"), &id("b"), Rank::King).unwrap();

        assert_eq!(result.new_books, vec![Rank::King]);
        assert_eq!(session.players()[0].books, 1);
        assert!(session.players().iter().all(|p| !p.has_rank(Rank::King)));
        assert_eq!(session.cards_remaining(), remaining);
        assert!(
            session
                .log()
                .contains(&"A completed a book of Ks!".to_string())
        );
    }

    #[test]
    fn test_detect_books_is_idempotent() {
        let hands = vec![
            vec![
                c(Rank::King, Suit::Spades),
                c(Rank::King, Suit::Hearts),
                c(Rank::King, Suit::Clubs),
                c(Rank::King, Suit::Diamonds),
                c(Rank::Two, Suit::Clubs),
            ],
            vec![
                c(Rank::Three, Suit::Clubs),
                c(Rank::Four, Suit::Clubs),
                c(Rank::Five, Suit::Clubs),
                c(Rank::Six, Suit::Clubs),
                c(Rank::Seven, Suit::Clubs),
            ],
        ];
        let mut session = session_with(&hands, filler());
        let log_len = session.log().len();
        assert!(session.detect_books(0).is_empty());
        assert_eq!(session.players()[0].books, 1);
        assert_eq!(session.log().len(), log_len);
    }

    #[test]
    fn test_illegal_asks_change_nothing() {
        let hands = vec![
            vec![c(Rank::Seven, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Seven, Suit::Hearts), c(Rank::Three, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, filler());
        let before = session.players().to_vec();
        let seq = session.sequence();
        let log_len = session.log().len();

        assert_eq!(
            session.ask(&id("b"), &id("a"), Rank::Three),
            Err(UserError::OutOfTurnAction)
        );
        assert_eq!(
            session.ask(&id("a"), &id("a"), Rank::Seven),
            Err(UserError::CannotAskSelf)
        );
        assert_eq!(
            session.ask(&id("a"), &id("z"), Rank::Seven),
            Err(UserError::UnknownPlayer(id("z")))
        );
        assert_eq!(
            session.ask(&id("a"), &id("b"), Rank::Ace),
            Err(UserError::RankNotHeld(Rank::Ace))
        );
        assert_eq!(session.players(), before.as_slice());
        assert_eq!(session.sequence(), seq);
        assert_eq!(session.log().len(), log_len);
    }

    #[test]
    fn test_ask_before_start_is_rejected() {
        let mut session = Session::default();
        assert_eq!(
            session.ask(&id("a"), &id("b"), Rank::Two),
            Err(UserError::GameNotInProgress)
        );
    }

    #[test]
    fn test_drawing_last_card_ends_game() {
        let hands = vec![
            vec![c(Rank::Seven, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Eight, Suit::Hearts), c(Rank::Three, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, vec![c(Rank::Nine, Suit::Clubs)]);
        let result = session.ask(&id("a"), &id("b"), Rank::Seven).unwrap();

        assert_eq!(result.outcome, AskOutcome::GoFish { drew: true });
        assert!(result.game_over);
        assert_eq!(session.phase(), Phase::GameOver);
        assert_eq!(session.cards_remaining(), 0);
        assert_eq!(session.players()[0].hand.len(), 3);
    }

    #[test]
    fn test_deal_emptying_deck_ends_game() {
        let hands = vec![
            vec![c(Rank::Seven, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Eight, Suit::Hearts), c(Rank::Three, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, vec![]);

        assert_eq!(session.phase(), Phase::GameOver);
        assert_eq!(session.winners().len(), 2);
        assert_eq!(session.sequence(), 1);
        assert_eq!(
            session.ask(&id("a"), &id("b"), Rank::Seven),
            Err(UserError::GameNotInProgress)
        );
    }

    #[test]
    fn test_hand_booked_out_at_deal_ends_game() {
        let hands = vec![
            vec![
                c(Rank::King, Suit::Spades),
                c(Rank::King, Suit::Hearts),
                c(Rank::King, Suit::Clubs),
                c(Rank::King, Suit::Diamonds),
            ],
            vec![
                c(Rank::Three, Suit::Clubs),
                c(Rank::Four, Suit::Clubs),
                c(Rank::Five, Suit::Clubs),
                c(Rank::Six, Suit::Clubs),
            ],
        ];
        let session = session_with(&hands, filler());

        assert!(session.players()[0].hand.is_empty());
        assert_eq!(session.phase(), Phase::GameOver);
        let winners: Vec<&str> = session.winners().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(winners, vec!["a"]);
        assert_eq!(
            session.log().last().map(String::as_str),
            Some("A wins with 1 books!")
        );
    }

    #[test]
    fn test_empty_hand_ends_game() {
        let hands = vec![
            vec![c(Rank::Seven, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Seven, Suit::Hearts), c(Rank::Seven, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, filler());
        let result = session.ask(&id("a"), &id("b"), Rank::Seven).unwrap();
        assert!(result.game_over);
        assert!(session.is_game_over());
    }

    #[test]
    fn test_game_over_is_terminal() {
        let hands = vec![
            vec![c(Rank::Seven, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Seven, Suit::Hearts), c(Rank::Seven, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, filler());
        session.ask(&id("a"), &id("b"), Rank::Seven).unwrap();
        let players = session.players().to_vec();
        let winners = session.winners().to_vec();
        let remaining = session.cards_remaining();

        assert_eq!(
            session.ask(&id("a"), &id("b"), Rank::Two),
            Err(UserError::GameNotInProgress)
        );
        assert!(!session.check_game_over());
        assert_eq!(session.players(), players.as_slice());
        assert_eq!(session.winners(), winners.as_slice());
        assert_eq!(session.cards_remaining(), remaining);
    }

    #[test]
    fn test_winners_keep_ties() {
        let mut players: Vec<Player> = roster(3).into_iter().map(Player::new).collect();
        players[0].books = 3;
        players[1].books = 3;
        players[2].books = 1;
        let winners = determine_winners(&players);
        let ids: Vec<&str> = winners.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_single_winner() {
        let mut players: Vec<Player> = roster(1).into_iter().map(Player::new).collect();
        players[0].books = 5;
        let winners = determine_winners(&players);
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].books, 5);
    }

    #[test]
    fn test_game_over_log_names_tie() {
        let hands = vec![
            vec![c(Rank::Seven, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Eight, Suit::Hearts), c(Rank::Three, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, vec![c(Rank::Nine, Suit::Clubs)]);
        session.ask(&id("a"), &id("b"), Rank::Seven).unwrap();
        assert_eq!(session.winners().len(), 2);
        assert_eq!(
            session.log().last().map(String::as_str),
            Some("It's a tie between A, B with 0 books!")
        );
    }

    #[test]
    fn test_pass_turn() {
        let hands = vec![
            vec![c(Rank::Seven, Suit::Spades), c(Rank::Two, Suit::Clubs)],
            vec![c(Rank::Eight, Suit::Hearts), c(Rank::Three, Suit::Clubs)],
        ];
        let mut session = session_with(&hands, filler());
        assert_eq!(
            session.pass_turn(&id("b")),
            Err(UserError::OutOfTurnAction)
        );
        assert_eq!(session.pass_turn(&id("a")), Ok(false));
        assert_eq!(session.current_player_id(), Some(&id("b")));
    }

    #[test]
    fn test_reset_returns_to_menu() {
        let mut session = Session::default();
        session.start(roster(3)).unwrap();
        session.reset();
        assert_eq!(session.phase(), Phase::Menu);
        assert!(session.players().is_empty());
        assert_eq!(session.cards_remaining(), 0);
        assert_eq!(session.sequence(), 0);
    }

    #[test]
    fn test_is_vs_automated() {
        let mut session = Session::default();
        let mut players = roster(2);
        players.push(Participant::automated("bot-1", "Pike"));
        session.start(players).unwrap();
        assert!(session.is_vs_automated());
    }

    #[test]
    fn test_begin_matchmaking() {
        let mut session = Session::default();
        session.begin_matchmaking().unwrap();
        assert_eq!(session.phase(), Phase::Matchmaking);
        session.start(roster(2)).unwrap();
        assert_eq!(
            session.begin_matchmaking(),
            Err(UserError::GameAlreadyInProgress)
        );
    }

    #[test]
    fn test_select_host_smallest_human() {
        let roster = vec![
            Participant::human("m", "M"),
            Participant::automated("a-bot", "Pike"),
            Participant::human("k", "K"),
        ];
        assert_eq!(select_host(&roster), Ok(&id("k")));
    }

    #[test]
    fn test_select_host_needs_a_human() {
        let roster = vec![Participant::automated("bot-1", "Pike")];
        assert_eq!(select_host(&roster), Err(UserError::NoHumanParticipant));
    }
}
