//! Session manager for spawning and tracking session actors.

use super::{
    actor::{SessionActor, SessionHandle, SessionId},
    config::SessionConfig,
    messages::{SessionResponse, SessionView, StateChangeNotification},
};
use crate::{
    bot::{RandomStrategy, Strategy},
    game::entities::{Participant, PlayerId, Rank},
    net::transport::Transport,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

const NOT_FOUND: &str = "Session not found";

/// Owns every live session. Nothing here is global: separate managers never
/// see each other's sessions.
#[derive(Clone)]
pub struct SessionManager {
    /// Active session handles
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,

    /// Next session ID
    next_session_id: Arc<RwLock<SessionId>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_session_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Create a session for `local`, with randomly deciding automated players
    pub async fn create_session(
        &self,
        config: SessionConfig,
        local: Participant,
        transport: Arc<dyn Transport>,
    ) -> Result<SessionId, String> {
        self.create_session_with_strategy(config, local, transport, Box::new(RandomStrategy::new()))
            .await
    }

    /// Create and spawn a session actor
    ///
    /// # Arguments
    ///
    /// * `config` - Session configuration
    /// * `local` - Participant supplied by the identity provider
    /// * `transport` - Broadcast channel to the other participants
    /// * `strategy` - Decision function for automated turns
    ///
    /// # Returns
    ///
    /// * `Result<SessionId, String>` - Session ID or configuration error
    pub async fn create_session_with_strategy(
        &self,
        config: SessionConfig,
        local: Participant,
        transport: Arc<dyn Transport>,
        strategy: Box<dyn Strategy>,
    ) -> Result<SessionId, String> {
        config.validate()?;

        let mut next_id = self.next_session_id.write().await;
        let session_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let local_id = local.id.clone();
        let (actor, handle) = SessionActor::new(session_id, config, local, transport, strategy);

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, handle);
        drop(sessions);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created session {} for {}", session_id, local_id);

        Ok(session_id)
    }

    /// Get a session handle, if the session is still running
    pub async fn get_session(&self, session_id: SessionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&session_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Signal that matchmaking produced `roster`
    pub async fn match_formed(
        &self,
        session_id: SessionId,
        roster: Vec<Participant>,
    ) -> SessionResponse {
        let Some(handle) = self.get_session(session_id).await else {
            return SessionResponse::Error(NOT_FOUND.to_string());
        };
        handle
            .match_formed(roster)
            .await
            .unwrap_or_else(SessionResponse::Error)
    }

    pub async fn submit_ask(
        &self,
        session_id: SessionId,
        asking_id: PlayerId,
        asked_id: PlayerId,
        rank: Rank,
    ) -> SessionResponse {
        let Some(handle) = self.get_session(session_id).await else {
            return SessionResponse::Error(NOT_FOUND.to_string());
        };
        handle
            .submit_ask(asking_id, asked_id, rank)
            .await
            .unwrap_or_else(SessionResponse::Error)
    }

    pub async fn view(&self, session_id: SessionId) -> Result<SessionView, String> {
        let handle = self
            .get_session(session_id)
            .await
            .ok_or_else(|| NOT_FOUND.to_string())?;
        handle.view().await
    }

    pub async fn subscribe(
        &self,
        session_id: SessionId,
        sender: mpsc::Sender<StateChangeNotification>,
    ) -> Result<(), String> {
        let handle = self
            .get_session(session_id)
            .await
            .ok_or_else(|| NOT_FOUND.to_string())?;
        handle.subscribe(sender).await
    }

    /// Hand inbound transport bytes to a session without waiting on it
    pub async fn deliver(
        &self,
        session_id: SessionId,
        bytes: Vec<u8>,
        from: PlayerId,
    ) -> Result<(), String> {
        let handle = self
            .get_session(session_id)
            .await
            .ok_or_else(|| NOT_FOUND.to_string())?;
        handle.deliver(bytes, from)
    }

    /// Report a lost participant. The session ends and is removed.
    pub async fn peer_disconnected(
        &self,
        session_id: SessionId,
        peer: PlayerId,
    ) -> Result<(), String> {
        let handle = self
            .remove(session_id)
            .await
            .ok_or_else(|| NOT_FOUND.to_string())?;
        handle.peer_disconnected(peer).await
    }

    /// Return the local participant to the menu and drop the session
    pub async fn reset(&self, session_id: SessionId) -> SessionResponse {
        let Some(handle) = self.remove(session_id).await else {
            return SessionResponse::Error(NOT_FOUND.to_string());
        };
        let response = handle.reset().await.unwrap_or_else(SessionResponse::Error);
        log::info!("Session {} reset", session_id);
        response
    }

    /// Number of sessions still running. Sessions that ended on their own
    /// (a disconnect routed straight to the handle) are pruned here.
    pub async fn active_session_count(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, handle| !handle.is_closed());
        sessions.len()
    }

    /// IDs of every tracked session, oldest first
    pub async fn list_sessions(&self) -> Vec<SessionId> {
        let sessions = self.sessions.read().await;
        let mut ids: Vec<SessionId> = sessions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    async fn remove(&self, session_id: SessionId) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{game::entities::Phase, net::transport::NullTransport};

    fn humans(ids: &[&str]) -> Vec<Participant> {
        ids.iter()
            .map(|id| Participant::human(*id, id.to_uppercase()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_session_assigns_increasing_ids() {
        let manager = SessionManager::new();
        let first = manager
            .create_session(
                SessionConfig::default(),
                Participant::human("a", "A"),
                Arc::new(NullTransport),
            )
            .await
            .unwrap();
        let second = manager
            .create_session(
                SessionConfig::default(),
                Participant::human("b", "B"),
                Arc::new(NullTransport),
            )
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(manager.active_session_count().await, 2);
        assert_eq!(manager.list_sessions().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_create_session_rejects_invalid_config() {
        let manager = SessionManager::new();
        let config = SessionConfig {
            hand_size: 0,
            ..SessionConfig::default()
        };
        let result = manager
            .create_session(config, Participant::human("a", "A"), Arc::new(NullTransport))
            .await;
        assert!(result.is_err());
        assert_eq!(manager.active_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let manager = SessionManager::new();
        assert!(manager.get_session(42).await.is_none());
        assert!(manager.view(42).await.is_err());
        assert_eq!(
            manager.reset(42).await,
            SessionResponse::Error("Session not found".to_string())
        );
    }

    #[tokio::test]
    async fn test_match_and_ask_through_manager() {
        let manager = SessionManager::new();
        let id = manager
            .create_session(
                SessionConfig::default(),
                Participant::human("a", "A"),
                Arc::new(NullTransport),
            )
            .await
            .unwrap();

        let response = manager.match_formed(id, humans(&["a", "b"])).await;
        assert_eq!(response, SessionResponse::Success);

        let view = manager.view(id).await.unwrap();
        assert_eq!(view.phase, Phase::InGame);
        let rank = view.player(&"a".into()).unwrap().hand[0].rank;

        let response = manager.submit_ask(id, "a".into(), "b".into(), rank).await;
        assert_eq!(response, SessionResponse::Success);
        assert_eq!(manager.view(id).await.unwrap().sequence, Some(2));
    }

    #[tokio::test]
    async fn test_reset_removes_session() {
        let manager = SessionManager::new();
        let id = manager
            .create_session(
                SessionConfig::default(),
                Participant::human("a", "A"),
                Arc::new(NullTransport),
            )
            .await
            .unwrap();

        assert_eq!(manager.reset(id).await, SessionResponse::Success);
        assert_eq!(manager.active_session_count().await, 0);
        assert!(manager.get_session(id).await.is_none());
    }

    #[tokio::test]
    async fn test_peer_disconnected_removes_session() {
        let manager = SessionManager::new();
        let id = manager
            .create_session(
                SessionConfig::default(),
                Participant::human("a", "A"),
                Arc::new(NullTransport),
            )
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        manager.subscribe(id, tx).await.unwrap();

        manager.peer_disconnected(id, "b".into()).await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(StateChangeNotification::SessionEnded {
                disconnected: Some("b".into())
            })
        );
        assert_eq!(manager.active_session_count().await, 0);
    }
}
