//! Replication protocol between the host and its peers.
//!
//! The host serializes a full [`messages::Snapshot`] after every mutation and
//! pushes it through a [`transport::Transport`]. Peers proxy their actions
//! back to the host as [`messages::WireMessage::AskRequest`]s.

/// JSON encoding of wire messages with size limits.
pub mod codec;

/// Serialization error types.
pub mod errors;

/// Wire message and snapshot types.
pub mod messages;

/// Transport seam and an in-process loopback implementation.
pub mod transport;
