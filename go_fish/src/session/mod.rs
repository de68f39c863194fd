//! Session module: one async actor per game session.
//!
//! This module implements:
//! - SessionActor: the single writer owning a host engine or a peer replica
//! - SessionManager: spawns sessions and routes requests to them by id
//! - Message types for requests, responses and change notifications
//!
//! ## Architecture
//!
//! Every mutation, inbound transport message, disconnect and automated-turn
//! timer is a message on the session's mpsc inbox, so they are applied one
//! at a time. Presentation layers subscribe for notifications and read the
//! published [`SessionView`].
//!
//! ## Example
//!
//! ```no_run
//! use go_fish::game::entities::Participant;
//! use go_fish::net::transport::NullTransport;
//! use go_fish::session::{SessionConfig, SessionManager};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), String> {
//! let manager = SessionManager::new();
//! let local = Participant::human("alice", "Alice");
//! let id = manager
//!     .create_session(SessionConfig::default(), local, Arc::new(NullTransport))
//!     .await?;
//! let roster = vec![
//!     Participant::human("alice", "Alice"),
//!     Participant::automated("bot-1", "Pike"),
//! ];
//! manager.match_formed(id, roster).await;
//! let view = manager.view(id).await?;
//! println!("{} cards left", view.cards_remaining);
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{SessionActor, SessionHandle, SessionId};
pub use config::SessionConfig;
pub use manager::SessionManager;
pub use messages::{SessionMessage, SessionResponse, SessionView, StateChangeNotification};
