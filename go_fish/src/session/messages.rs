//! Session actor message types.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    UserError,
    entities::{CompletedBook, Participant, Phase, Player, PlayerId, Rank},
    replica::Replica,
    state_machine::Session,
};

/// Messages that can be sent to a SessionActor
#[derive(Debug)]
pub enum SessionMessage {
    /// Matchmaking finished with this roster (humans in the order received,
    /// automated participants last)
    MatchFormed {
        roster: Vec<Participant>,
        response: oneshot::Sender<SessionResponse>,
    },

    /// A participant asks another for a rank
    SubmitAsk {
        asking_id: PlayerId,
        asked_id: PlayerId,
        rank: Rank,
        response: oneshot::Sender<SessionResponse>,
    },

    /// Leave the session and return to the menu
    Reset {
        response: oneshot::Sender<SessionResponse>,
    },

    /// Bytes delivered by the transport
    Received { bytes: Vec<u8>, from: PlayerId },

    /// The transport lost a participant
    PeerDisconnected { peer: PlayerId },

    /// Get the current published state
    GetView {
        response: oneshot::Sender<SessionView>,
    },

    /// Subscribe to state change notifications
    Subscribe {
        sender: mpsc::Sender<StateChangeNotification>,
    },

    /// Internal: an automated player's thinking pause elapsed
    AutomatedTurn { sequence: u64 },
}

/// Notification sent when session state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChangeNotification {
    /// Any published field changed
    StateChanged,
    /// A book was just completed (sample the view promptly, the pointer is
    /// overwritten by the next one)
    BookCompleted(CompletedBook),
    /// The game finished
    GameOver,
    /// The session was reset or a participant disconnected; no further
    /// notifications follow
    SessionEnded { disconnected: Option<PlayerId> },
}

/// Response from session operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionResponse {
    /// Operation applied
    Success,

    /// This instance isn't the host; the request went to the host
    Forwarded,

    /// Operation refused, nothing changed
    Rejected(UserError),

    /// Operation failed for a reason outside the game rules
    Error(String),
}

impl SessionResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(self, SessionResponse::Success | SessionResponse::Forwarded)
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            SessionResponse::Rejected(e) => Some(e.to_string()),
            SessionResponse::Error(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

/// Everything a presentation layer observes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub is_host: bool,
    pub players: Vec<Player>,
    pub current_player_id: Option<PlayerId>,
    pub cards_remaining: usize,
    pub log: Vec<String>,
    pub winners: Vec<Player>,
    pub is_vs_automated: bool,
    pub last_completed_book: Option<CompletedBook>,
    pub sequence: Option<u64>,
}

impl SessionView {
    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn is_turn_of(&self, id: &PlayerId) -> bool {
        self.current_player_id.as_ref() == Some(id)
    }
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            phase: session.phase(),
            is_host: true,
            players: session.players().to_vec(),
            current_player_id: session.current_player_id().cloned(),
            cards_remaining: session.cards_remaining(),
            log: session.log().to_vec(),
            winners: session.winners().to_vec(),
            is_vs_automated: session.is_vs_automated(),
            last_completed_book: session.last_completed_book().cloned(),
            sequence: Some(session.sequence()),
        }
    }
}

impl From<&Replica> for SessionView {
    fn from(replica: &Replica) -> Self {
        Self {
            phase: replica.phase(),
            is_host: false,
            players: replica.players().to_vec(),
            current_player_id: replica.current_player_id().cloned(),
            cards_remaining: replica.cards_remaining(),
            log: replica.log().to_vec(),
            winners: replica.winners().to_vec(),
            is_vs_automated: replica.is_vs_automated(),
            last_completed_book: replica.last_completed_book().cloned(),
            sequence: replica.last_sequence(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success() {
        assert!(SessionResponse::Success.is_success());
        assert!(SessionResponse::Forwarded.is_success());
        assert!(!SessionResponse::Rejected(UserError::OutOfTurnAction).is_success());
    }

    #[test]
    fn test_response_error_message() {
        assert_eq!(
            SessionResponse::Rejected(UserError::OutOfTurnAction).error_message(),
            Some("not your turn".to_string())
        );
        assert_eq!(
            SessionResponse::Error("Session is closed".to_string()).error_message(),
            Some("Session is closed".to_string())
        );
        assert_eq!(SessionResponse::Success.error_message(), None);
    }

    #[test]
    fn test_view_from_fresh_session() {
        let view = SessionView::from(&Session::default());
        assert_eq!(view.phase, Phase::Menu);
        assert!(view.is_host);
        assert_eq!(view.log, vec!["Welcome to Go Fish!".to_string()]);
        assert_eq!(view.sequence, Some(0));
    }

    #[test]
    fn test_view_turn_helpers() {
        let view = SessionView {
            current_player_id: Some("a".into()),
            ..SessionView::default()
        };
        assert!(view.is_turn_of(&"a".into()));
        assert!(!view.is_turn_of(&"b".into()));
        assert!(view.player(&"a".into()).is_none());
    }
}
