//! Session actor: the single writer for one game session.

use super::{
    config::SessionConfig,
    messages::{SessionMessage, SessionResponse, SessionView, StateChangeNotification},
};
use crate::{
    bot::{BotDecision, BotPacing, Strategy, decide},
    game::{
        ApplyOutcome, Replica, Session, UserError,
        constants::WELCOME_MESSAGE,
        entities::{CompletedBook, Participant, Phase, PlayerId, Rank},
        select_host,
    },
    net::{
        codec,
        messages::{Snapshot, WireMessage},
        transport::Transport,
    },
};
use rand::{SeedableRng, rngs::StdRng};
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{mpsc, oneshot},
    time::sleep,
};

pub type SessionId = u64;

/// Session actor handle for sending messages
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    session_id: SessionId,
}

impl SessionHandle {
    /// Create a new session handle
    pub fn new(sender: mpsc::Sender<SessionMessage>, session_id: SessionId) -> Self {
        Self { sender, session_id }
    }

    /// Get session ID
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// True once the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the session
    pub async fn send(&self, message: SessionMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Session is closed".to_string())
    }

    /// Non-blocking delivery of transport bytes. Transports call this from
    /// their receive path, which must never wait on the actor.
    pub fn deliver(&self, bytes: Vec<u8>, from: PlayerId) -> Result<(), String> {
        self.try_send(SessionMessage::Received { bytes, from })
    }

    /// Non-blocking disconnect notification.
    pub fn try_peer_disconnected(&self, peer: PlayerId) -> Result<(), String> {
        self.try_send(SessionMessage::PeerDisconnected { peer })
    }

    fn try_send(&self, message: SessionMessage) -> Result<(), String> {
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => "Session inbox is full".to_string(),
            mpsc::error::TrySendError::Closed(_) => "Session is closed".to_string(),
        })
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> SessionMessage,
    ) -> Result<T, String> {
        let (tx, rx) = oneshot::channel();
        self.send(message(tx)).await?;
        rx.await
            .map_err(|_| "Session dropped the request".to_string())
    }

    /// Hand the final roster to the session
    pub async fn match_formed(&self, roster: Vec<Participant>) -> Result<SessionResponse, String> {
        self.request(|response| SessionMessage::MatchFormed { roster, response })
            .await
    }

    /// Ask `asked_id` for `rank` on behalf of the local participant
    pub async fn submit_ask(
        &self,
        asking_id: PlayerId,
        asked_id: PlayerId,
        rank: Rank,
    ) -> Result<SessionResponse, String> {
        self.request(|response| SessionMessage::SubmitAsk {
            asking_id,
            asked_id,
            rank,
            response,
        })
        .await
    }

    /// Leave the session. The actor stops afterwards.
    pub async fn reset(&self) -> Result<SessionResponse, String> {
        self.request(|response| SessionMessage::Reset { response })
            .await
    }

    pub async fn view(&self) -> Result<SessionView, String> {
        self.request(|response| SessionMessage::GetView { response })
            .await
    }

    pub async fn subscribe(
        &self,
        sender: mpsc::Sender<StateChangeNotification>,
    ) -> Result<(), String> {
        self.send(SessionMessage::Subscribe { sender }).await
    }

    pub async fn peer_disconnected(&self, peer: PlayerId) -> Result<(), String> {
        self.send(SessionMessage::PeerDisconnected { peer }).await
    }
}

/// What this instance is allowed to do, fixed when the match forms.
enum Role {
    /// Waiting for the roster or the host's first snapshot
    Unassigned,
    /// Owns the live deck and runs every mutation
    Host(Session),
    /// Mirrors the host from snapshots
    Peer { host: PlayerId, replica: Replica },
}

/// Session actor running one Go Fish game for the local participant
pub struct SessionActor {
    /// Session ID
    id: SessionId,

    /// Session configuration
    config: SessionConfig,

    /// Identity supplied by the local identity provider
    local: Participant,

    /// Host engine, peer replica or neither yet
    role: Role,

    /// Message inbox
    inbox: mpsc::Receiver<SessionMessage>,

    /// Used by timers to post back into the inbox without keeping it open
    timer_sender: mpsc::WeakSender<SessionMessage>,

    /// Outbound broadcast to the other participants
    transport: Arc<dyn Transport>,

    /// Decision function for automated participants (host only)
    strategy: Box<dyn Strategy>,

    /// Automated player pacing
    pacing: BotPacing,

    /// Jitter source for the pacing
    rng: StdRng,

    /// Subscribers for state change notifications
    subscribers: HashMap<u64, mpsc::Sender<StateChangeNotification>>,

    /// Next subscriber key
    next_subscriber_id: u64,

    /// Is session closed
    is_closed: bool,
}

impl SessionActor {
    /// Create a new session actor
    ///
    /// # Arguments
    ///
    /// * `id` - Session ID
    /// * `config` - Session configuration
    /// * `local` - The participant this instance acts for
    /// * `transport` - Broadcast channel to the other participants
    /// * `strategy` - Decision function used for automated turns
    ///
    /// # Returns
    ///
    /// * `(SessionActor, SessionHandle)` - Actor and handle for sending messages
    pub fn new(
        id: SessionId,
        config: SessionConfig,
        local: Participant,
        transport: Arc<dyn Transport>,
        strategy: Box<dyn Strategy>,
    ) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let pacing = BotPacing::new(config.bot_think_time_ms, config.bot_think_variance_ms);

        let actor = Self {
            id,
            config,
            local,
            role: Role::Unassigned,
            inbox,
            timer_sender: sender.downgrade(),
            transport,
            strategy,
            pacing,
            rng: StdRng::from_os_rng(),
            subscribers: HashMap::new(),
            next_subscriber_id: 0,
            is_closed: false,
        };

        let handle = SessionHandle::new(sender, id);

        (actor, handle)
    }

    /// Run the session actor event loop
    pub async fn run(mut self) {
        log::info!("Session {} starting for {}", self.id, self.local.id);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);

            if self.is_closed {
                break;
            }
        }

        log::info!("Session {} closed", self.id);
    }

    /// Handle a session message
    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::MatchFormed { roster, response } => {
                let result = self.handle_match_formed(roster);
                let _ = response.send(result);
            }

            SessionMessage::SubmitAsk {
                asking_id,
                asked_id,
                rank,
                response,
            } => {
                let result = self.handle_submit_ask(asking_id, asked_id, rank);
                let _ = response.send(result);
            }

            SessionMessage::Reset { response } => {
                log::info!("Session {}: reset by {}", self.id, self.local.id);
                self.end_session(None);
                let _ = response.send(SessionResponse::Success);
            }

            SessionMessage::Received { bytes, from } => {
                self.handle_received(&bytes, from);
            }

            SessionMessage::PeerDisconnected { peer } => {
                log::warn!("Session {}: {} disconnected, ending session", self.id, peer);
                self.end_session(Some(peer));
            }

            SessionMessage::GetView { response } => {
                let _ = response.send(self.view());
            }

            SessionMessage::Subscribe { sender } => {
                let key = self.next_subscriber_id;
                self.next_subscriber_id += 1;
                self.subscribers.insert(key, sender);
                log::debug!("Session {}: subscriber {} added", self.id, key);
            }

            SessionMessage::AutomatedTurn { sequence } => {
                self.handle_automated_turn(sequence);
            }
        }
    }

    /// Broadcast state change notification to all subscribers
    fn notify_state_change(&mut self, notification: StateChangeNotification) {
        self.subscribers
            .retain(|key, sender| match sender.try_send(notification.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} channel full, dropping notification", key);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", key);
                    false
                }
            });
    }

    fn handle_match_formed(&mut self, roster: Vec<Participant>) -> SessionResponse {
        if !roster.iter().any(|p| p.id == self.local.id) {
            return SessionResponse::Rejected(UserError::UnknownPlayer(self.local.id.clone()));
        }
        let host = match select_host(&roster) {
            Ok(host) => host.clone(),
            Err(e) => return SessionResponse::Rejected(e),
        };

        match &mut self.role {
            Role::Host(_) => return SessionResponse::Rejected(UserError::GameAlreadyInProgress),
            Role::Peer {
                host: following, ..
            } => {
                // The host's first snapshot beat the matchmaking signal here.
                if *following != host {
                    log::warn!(
                        "Session {}: following {} but the roster's host is {}",
                        self.id,
                        following,
                        host
                    );
                }
                return SessionResponse::Success;
            }
            Role::Unassigned => {}
        }

        if host != self.local.id {
            log::info!(
                "Session {}: match formed with {} players, following host {}",
                self.id,
                roster.len(),
                host
            );
            self.role = Role::Peer {
                host,
                replica: Replica::new(),
            };
            self.notify_state_change(StateChangeNotification::StateChanged);
            return SessionResponse::Success;
        }

        let mut session = Session::new(self.config.game_settings());
        if let Err(e) = session.begin_matchmaking() {
            return SessionResponse::Rejected(e);
        }
        if let Err(e) = session.start(roster) {
            log::warn!("Session {}: can't start: {}", self.id, e);
            return SessionResponse::Rejected(e);
        }
        log::info!(
            "Session {}: hosting {} players",
            self.id,
            session.players().len()
        );
        self.role = Role::Host(session);
        self.publish(None);
        SessionResponse::Success
    }

    fn handle_submit_ask(
        &mut self,
        asking_id: PlayerId,
        asked_id: PlayerId,
        rank: Rank,
    ) -> SessionResponse {
        if asking_id != self.local.id {
            log::warn!(
                "Session {}: {} can't act for {}",
                self.id,
                self.local.id,
                asking_id
            );
            return SessionResponse::Rejected(UserError::NotLocalPlayer(asking_id));
        }

        if matches!(self.role, Role::Host(_)) {
            return self.run_ask(&asking_id, &asked_id, rank);
        }

        match &self.role {
            Role::Unassigned | Role::Host(_) => {
                SessionResponse::Rejected(UserError::GameNotInProgress)
            }
            Role::Peer { replica, .. } => {
                if replica.phase() != Phase::InGame {
                    return SessionResponse::Rejected(UserError::GameNotInProgress);
                }
                let message = WireMessage::AskRequest {
                    asking_id,
                    asked_id,
                    rank,
                };
                log::debug!("Session {}: forwarding {} to host", self.id, message);
                match codec::encode(&message) {
                    Ok(bytes) => match self.transport.send_to_all(bytes) {
                        Ok(()) => SessionResponse::Forwarded,
                        Err(e) => {
                            log::error!("Session {}: failed to forward ask: {}", self.id, e);
                            SessionResponse::Error(e.to_string())
                        }
                    },
                    Err(e) => {
                        log::error!("Session {}: failed to encode ask: {}", self.id, e);
                        SessionResponse::Error(e.to_string())
                    }
                }
            }
        }
    }

    /// Runs one ask on the host engine and publishes the result.
    fn run_ask(&mut self, asking_id: &PlayerId, asked_id: &PlayerId, rank: Rank) -> SessionResponse {
        let Role::Host(session) = &mut self.role else {
            return SessionResponse::Rejected(UserError::GameNotInProgress);
        };
        let prior_book = session.last_completed_book().cloned();
        match session.ask(asking_id, asked_id, rank) {
            Ok(result) => {
                log::debug!(
                    "Session {}: {} asked {} for {}s: {:?}",
                    self.id,
                    asking_id,
                    asked_id,
                    rank,
                    result.outcome
                );
                self.publish(prior_book);
                SessionResponse::Success
            }
            Err(e) => {
                log::warn!(
                    "Session {}: ask by {} rejected: {}",
                    self.id,
                    asking_id,
                    e
                );
                SessionResponse::Rejected(e)
            }
        }
    }

    fn handle_received(&mut self, bytes: &[u8], from: PlayerId) {
        let message = match codec::decode(bytes) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Session {}: dropping message from {}: {}", self.id, from, e);
                return;
            }
        };

        match message {
            WireMessage::Snapshot(snapshot) => self.apply_snapshot(snapshot, from),
            WireMessage::AskRequest {
                asking_id,
                asked_id,
                rank,
            } => {
                if !matches!(self.role, Role::Host(_)) {
                    log::warn!(
                        "Session {}: not the host, ignoring ask request from {}",
                        self.id,
                        from
                    );
                    return;
                }
                if asking_id != from {
                    log::warn!(
                        "Session {}: {} tried to ask on behalf of {}",
                        self.id,
                        from,
                        asking_id
                    );
                    return;
                }
                self.run_ask(&asking_id, &asked_id, rank);
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot, from: PlayerId) {
        if matches!(self.role, Role::Unassigned) {
            log::info!("Session {}: first snapshot from {}, following it", self.id, from);
            self.role = Role::Peer {
                host: from.clone(),
                replica: Replica::new(),
            };
        }

        let (prior_book, prior_phase, outcome) = match &mut self.role {
            Role::Peer { host, replica } => {
                if *host != from {
                    log::warn!(
                        "Session {}: ignoring snapshot from {}, host is {}",
                        self.id,
                        from,
                        host
                    );
                    return;
                }
                let prior_book = replica.last_completed_book().cloned();
                let prior_phase = replica.phase();
                (prior_book, prior_phase, replica.apply(snapshot))
            }
            _ => {
                log::warn!("Session {}: host ignoring snapshot from {}", self.id, from);
                return;
            }
        };

        if outcome != ApplyOutcome::Applied {
            return;
        }
        let (book, phase) = match &self.role {
            Role::Peer { replica, .. } => (replica.last_completed_book().cloned(), replica.phase()),
            _ => return,
        };
        self.notify_changes(prior_book, book, prior_phase, phase);
    }

    fn handle_automated_turn(&mut self, sequence: u64) {
        let Role::Host(session) = &mut self.role else {
            return;
        };
        if session.sequence() != sequence || session.phase() != Phase::InGame {
            log::debug!(
                "Session {}: stale automated turn #{} (now #{})",
                self.id,
                sequence,
                session.sequence()
            );
            return;
        }
        let Some(bot_id) = session
            .current_player()
            .filter(|p| p.is_automated)
            .map(|p| p.id.clone())
        else {
            return;
        };

        let prior_book = session.last_completed_book().cloned();
        let decision = decide(self.strategy.as_mut(), session.players(), &bot_id);
        let result = match decision {
            BotDecision::Ask { target, rank } => session.ask(&bot_id, &target, rank).map(|r| {
                log::debug!(
                    "Session {}: bot {} asked {} for {}s: {:?}",
                    self.id,
                    bot_id,
                    target,
                    rank,
                    r.outcome
                );
            }),
            BotDecision::Pass => session.pass_turn(&bot_id).map(|_| ()),
        };

        if let Err(e) = result {
            log::warn!(
                "Session {}: bot {} action rejected ({}), passing",
                self.id,
                bot_id,
                e
            );
            if let Err(e) = session.pass_turn(&bot_id) {
                log::error!("Session {}: bot {} can't pass: {}", self.id, bot_id, e);
                return;
            }
        }
        self.publish(prior_book);
    }

    /// Broadcasts the host state, notifies subscribers and schedules the
    /// next automated turn if one is due.
    fn publish(&mut self, prior_book: Option<CompletedBook>) {
        let Role::Host(session) = &self.role else {
            return;
        };
        let snapshot = Snapshot::capture(session, self.config.echo_deck);
        let book = session.last_completed_book().cloned();
        let phase = session.phase();

        match codec::encode(&WireMessage::Snapshot(snapshot)) {
            Ok(bytes) => {
                if let Err(e) = self.transport.send_to_all(bytes) {
                    log::error!("Session {}: snapshot broadcast failed: {}", self.id, e);
                }
            }
            Err(e) => log::error!("Session {}: failed to encode snapshot: {}", self.id, e),
        }

        let celebrate = book.is_some() && book != prior_book;
        self.notify_changes(prior_book, book, Phase::InGame, phase);
        self.schedule_automated_turn(celebrate);
    }

    fn notify_changes(
        &mut self,
        prior_book: Option<CompletedBook>,
        book: Option<CompletedBook>,
        prior_phase: Phase,
        phase: Phase,
    ) {
        self.notify_state_change(StateChangeNotification::StateChanged);
        if let Some(book) = book
            && Some(&book) != prior_book.as_ref()
        {
            self.notify_state_change(StateChangeNotification::BookCompleted(book));
        }
        if phase == Phase::GameOver && prior_phase != Phase::GameOver {
            self.notify_state_change(StateChangeNotification::GameOver);
        }
    }

    fn schedule_automated_turn(&mut self, celebrate: bool) {
        let Role::Host(session) = &self.role else {
            return;
        };
        if session.phase() != Phase::InGame
            || !session.current_player().is_some_and(|p| p.is_automated)
        {
            return;
        }

        let sequence = session.sequence();
        let mut delay = self.pacing.think_delay(&mut self.rng);
        if celebrate {
            delay += self.config.book_celebration();
        }
        log::debug!(
            "Session {}: automated turn #{} in {:?}",
            self.id,
            sequence,
            delay
        );

        let timer_sender = self.timer_sender.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            if let Some(sender) = timer_sender.upgrade() {
                let _ = sender.send(SessionMessage::AutomatedTurn { sequence }).await;
            }
        });
    }

    /// Discards the match and returns to the menu. The actor stops after
    /// the current message.
    fn end_session(&mut self, disconnected: Option<PlayerId>) {
        match &mut self.role {
            Role::Host(session) => session.reset(),
            Role::Peer { replica, .. } => replica.reset(),
            Role::Unassigned => {}
        }
        self.notify_state_change(StateChangeNotification::SessionEnded { disconnected });
        self.subscribers.clear();
        self.is_closed = true;
    }

    fn view(&self) -> SessionView {
        match &self.role {
            Role::Host(session) => SessionView::from(session),
            Role::Peer { replica, .. } => SessionView::from(replica),
            Role::Unassigned if self.is_closed => SessionView {
                phase: Phase::Menu,
                ..SessionView::default()
            },
            Role::Unassigned => SessionView {
                phase: Phase::Matchmaking,
                log: vec![WELCOME_MESSAGE.to_string()],
                ..SessionView::default()
            },
        }
    }
}
