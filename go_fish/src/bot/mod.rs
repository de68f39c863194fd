//! Automated participants.
//!
//! This module implements:
//! - `Strategy`: pluggable decision function (rank + target)
//! - `RandomStrategy`: uniform random choices, optionally seeded
//! - Bot identities and human-like pacing for their turns
//!
//! ## Example
//!
//! ```
//! use go_fish::bot::{RandomStrategy, Strategy};
//! use go_fish::game::entities::{Card, Rank, Suit};
//!
//! let mut strategy = RandomStrategy::seeded(7);
//! let hand = [Card::new(Rank::Queen, Suit::Hearts)];
//! assert_eq!(strategy.choose_rank(&hand), Some(Rank::Queen));
//! ```

pub mod decision;
pub mod models;

pub use decision::{BotDecision, RandomStrategy, Strategy, decide};
pub use models::{BOT_NAMES, BotPacing, spawn_bots};
