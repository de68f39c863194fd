use serde::{Deserialize, Serialize};
use std::fmt;

use super::super::game::{
    entities::{Card, CompletedBook, Player, PlayerId, Rank},
    state_machine::Session,
};

/// Point-in-time projection of a session. Every field is optional: a field
/// that is present overwrites the receiver's copy, an absent one leaves it
/// alone.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Host mutation counter. Peers drop anything not strictly newer than
    /// what they last applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Player>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards_remaining_in_deck: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_game_over: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<Player>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_log: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_vs_automated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_book: Option<CompletedBook>,
    /// Remaining deck, echoed only when the host is configured to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffled_deck: Option<Vec<Card>>,
}

impl Snapshot {
    /// Captures everything a peer needs to mirror `session`.
    #[must_use]
    pub fn capture(session: &Session, echo_deck: bool) -> Self {
        Self {
            sequence: Some(session.sequence()),
            players: Some(session.players().to_vec()),
            cards_remaining_in_deck: Some(session.cards_remaining()),
            is_game_over: Some(session.is_game_over()),
            winners: Some(session.winners().to_vec()),
            current_player_id: session.current_player_id().cloned(),
            game_log: Some(session.log().to_vec()),
            is_vs_automated: Some(session.is_vs_automated()),
            last_completed_book: session.last_completed_book().cloned(),
            shuffled_deck: echo_deck.then(|| session.deck().cards().to_vec()),
        }
    }
}

/// Everything that travels over the transport.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WireMessage {
    /// Host to peers: replace your view with this.
    Snapshot(Snapshot),
    /// Peer to host: please run this ask on my behalf.
    AskRequest {
        asking_id: PlayerId,
        asked_id: PlayerId,
        rank: Rank,
    },
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Snapshot(snapshot) => match snapshot.sequence {
                Some(sequence) => write!(f, "snapshot #{sequence}"),
                None => write!(f, "snapshot"),
            },
            Self::AskRequest {
                asking_id,
                asked_id,
                rank,
            } => write!(f, "{asking_id} asks {asked_id} for {rank}s"),
        }
    }
}
