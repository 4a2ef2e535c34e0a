use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{BrokerError, Result};

/// Send half of a duplex session. The WebSocket sink implements this in
/// production; tests use a recording mock.
#[async_trait]
pub trait SessionChannel: Send + Sync {
    async fn send_text(&self, text: String) -> Result<()>;
    async fn close(&self, reason: &str);
}

struct Session {
    recipient_code: Option<String>,
    status: Option<String>,
    last_seen_ms: u64,
    channel: Arc<dyn SessionChannel>,
}

/// Live duplex sessions keyed by broker-minted id. Channel writes happen
/// strictly outside the map lock: lock, snapshot, unlock, write.
pub struct SessionRegistry {
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn open(&self, channel: Arc<dyn SessionChannel>) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(
            session_id,
            Session {
                recipient_code: None,
                status: None,
                last_seen_ms: self.clock.now_ms(),
                channel,
            },
        );
        session_id
    }

    /// Binds the session to a recipient. Rebinding replaces the previous
    /// binding.
    pub fn bind(&self, session_id: Uuid, recipient_code: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .get_mut(&session_id)
            .ok_or(BrokerError::UnknownSession)?;
        if let Some(previous) = session.recipient_code.as_deref() {
            if previous != recipient_code {
                log::debug!("session {} rebound from {}", session_id, previous);
            }
        }
        session.recipient_code = Some(recipient_code.to_string());
        session.last_seen_ms = self.clock.now_ms();
        Ok(())
    }

    pub fn touch(&self, session_id: Uuid) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get_mut(&session_id) {
            session.last_seen_ms = self.clock.now_ms();
        }
    }

    pub fn set_status(&self, session_id: Uuid, status: Option<String>) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get_mut(&session_id) {
            session.status = status;
        }
    }

    pub fn lookup(&self, recipient_code: &str) -> Vec<(Uuid, Arc<dyn SessionChannel>)> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .iter()
            .filter(|(_, session)| session.recipient_code.as_deref() == Some(recipient_code))
            .map(|(id, session)| (*id, session.channel.clone()))
            .collect()
    }

    pub fn snapshot_all(&self) -> Vec<(Uuid, Arc<dyn SessionChannel>)> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .iter()
            .map(|(id, session)| (*id, session.channel.clone()))
            .collect()
    }

    pub async fn close(&self, session_id: Uuid, reason: &str) {
        let channel = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            sessions.remove(&session_id).map(|session| session.channel)
        };
        if let Some(channel) = channel {
            log::debug!("session {} closed: {}", session_id, reason);
            channel.close(reason).await;
        }
    }

    pub fn idle(&self, cutoff_ms: u64) -> Vec<Uuid> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .iter()
            .filter(|(_, session)| session.last_seen_ms <= cutoff_ms)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
