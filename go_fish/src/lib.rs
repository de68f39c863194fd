//! # Go Fish
//!
//! A host-authoritative Go Fish engine with snapshot replication.
//!
//! One participant (the host) runs the authoritative [`Session`]: it owns the
//! live deck, resolves every ask, extracts books and decides the winners.
//! After each mutation it broadcasts a full [`Snapshot`](net::messages::Snapshot)
//! stamped with a sequence number, and every other participant mirrors it in a
//! [`Replica`]. Peers never mutate their copy; their asks travel to the host.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, deck, players, the session engine and the peer replica
//! - [`net`]: Wire messages, JSON codec and the transport seam
//! - [`bot`]: Decision strategies and pacing for automated participants
//! - [`session`]: One actor per session plus the manager that owns them
//!
//! ## Example
//!
//! ```
//! use go_fish::{GameSettings, Session};
//! use go_fish::entities::Participant;
//!
//! let mut session = Session::new(GameSettings::default());
//! session
//!     .start(vec![
//!         Participant::human("alice", "Alice"),
//!         Participant::automated("bot-1", "Pike"),
//!     ])
//!     .unwrap();
//! assert_eq!(session.current_player_id().map(|id| id.as_str()), Some("alice"));
//! ```

/// Automated participants.
pub mod bot;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    ApplyOutcome, GameSettings, Replica, Session, UserError,
    constants::{self, BOOK_SIZE, HAND_SIZE},
    entities,
};

/// Replication protocol and transport.
pub mod net;

/// Session actors and their manager.
pub mod session;
pub use session::{SessionConfig, SessionManager, SessionResponse, SessionView};
