//! Transport seam.
//!
//! The engine only ever calls [`Transport::send_to_all`]; inbound bytes and
//! connectivity changes are pushed into the session through its
//! [`SessionHandle`]. [`LoopbackHub`] wires several in-process sessions
//! together the same way a real match transport would.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::errors::TransportError;
use crate::{game::entities::PlayerId, session::SessionHandle};

/// Fire-and-forget broadcast to every other participant. Implementations
/// must not block the caller.
pub trait Transport: Send + Sync {
    fn send_to_all(&self, bytes: Vec<u8>) -> Result<(), TransportError>;
}

/// Transport for a session with no remote participants.
#[derive(Debug, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send_to_all(&self, _bytes: Vec<u8>) -> Result<(), TransportError> {
        Ok(())
    }
}

type Endpoints = Arc<Mutex<HashMap<PlayerId, SessionHandle>>>;

/// In-process switchboard connecting session actors by participant id.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    endpoints: Endpoints,
}

impl LoopbackHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that sends on behalf of `local`.
    #[must_use]
    pub fn transport(&self, local: PlayerId) -> Arc<LoopbackTransport> {
        Arc::new(LoopbackTransport {
            local,
            endpoints: self.endpoints.clone(),
        })
    }

    /// Routes bytes addressed to `id` into `handle`.
    pub fn register(&self, id: PlayerId, handle: SessionHandle) {
        if let Ok(mut endpoints) = self.endpoints.lock() {
            endpoints.insert(id, handle);
        }
    }

    pub fn unregister(&self, id: &PlayerId) -> Option<SessionHandle> {
        self.endpoints.lock().ok()?.remove(id)
    }

    /// Drops `id` from the hub and tells every remaining endpoint that it
    /// disconnected.
    pub fn disconnect(&self, id: &PlayerId) {
        let Ok(mut endpoints) = self.endpoints.lock() else {
            log::error!("Loopback hub poisoned, can't report {id} disconnecting");
            return;
        };
        endpoints.remove(id);
        for (peer, handle) in endpoints.iter() {
            if let Err(e) = handle.try_peer_disconnected(id.clone()) {
                log::warn!("Couldn't tell {peer} that {id} disconnected: {e}");
            }
        }
    }

    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.lock().map(|e| e.len()).unwrap_or(0)
    }
}

pub struct LoopbackTransport {
    local: PlayerId,
    endpoints: Endpoints,
}

impl Transport for LoopbackTransport {
    fn send_to_all(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        let endpoints = self.endpoints.lock().map_err(|_| TransportError::Closed)?;
        let mut total = 0;
        let mut failed = 0;
        for (peer, handle) in endpoints.iter() {
            if peer == &self.local {
                continue;
            }
            total += 1;
            if let Err(e) = handle.deliver(bytes.clone(), self.local.clone()) {
                log::warn!("Loopback delivery from {} to {peer} failed: {e}", self.local);
                failed += 1;
            }
        }
        match failed {
            0 => Ok(()),
            _ => Err(TransportError::PartialDelivery { failed, total }),
        }
    }
}
