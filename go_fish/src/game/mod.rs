//! Go Fish game engine - cards, authoritative session and peer replica.
//!
//! This module provides:
//! - Card, rank, suit, deck and player entities
//! - The host-side [`Session`] state machine (deal, ask, books, game over)
//! - The peer-side [`Replica`] that mirrors the host through snapshots

pub mod constants;
pub mod entities;
pub mod replica;
pub mod state_machine;

pub use replica::{ApplyOutcome, Replica};
pub use state_machine::{
    AskOutcome, AskResult, GameEvent, GameSettings, Session, UserError, determine_winners,
    select_host,
};
