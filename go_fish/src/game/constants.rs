//! Fixed game parameters.

/// Cards dealt to every player when a match forms.
pub const HAND_SIZE: usize = 5;

/// Matching cards that make up a book.
pub const BOOK_SIZE: usize = 4;

/// Cards in a full deck.
pub const DECK_SIZE: usize = 52;

/// Fewest participants a session can be formed with.
pub const MIN_PLAYERS: usize = 2;

/// Most participants a session can be formed with. Six hands of five
/// still leave 22 cards to fish from.
pub const MAX_PLAYERS: usize = 6;

/// First line of every fresh game log.
pub const WELCOME_MESSAGE: &str = "Welcome to Go Fish!";
