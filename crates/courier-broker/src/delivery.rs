use std::sync::Arc;

use courier_types::{to_json_string, ServerFrame};

use crate::pool::{MessagePool, PooledEnvelope};
use crate::sessions::SessionRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Pooled,
}

/// Push-then-pool delivery. The pool is ground truth; a push that reaches at
/// least one bound session removes the envelope, anything else leaves it
/// for a later pull. There are no timer-driven retries; pooled mail is
/// re-attempted when a new publish for the same recipient comes in.
pub struct DeliveryEngine {
    pool: Arc<MessagePool>,
    sessions: Arc<SessionRegistry>,
}

impl DeliveryEngine {
    pub fn new(pool: Arc<MessagePool>, sessions: Arc<SessionRegistry>) -> Self {
        Self { pool, sessions }
    }

    pub async fn deliver(&self, envelope: &PooledEnvelope) -> DeliveryOutcome {
        let outcome = self.push_one(envelope).await;
        self.flush_pending(&envelope.recipient_code, &envelope.id)
            .await;
        outcome
    }

    pub fn drain(&self, recipient_code: &str) -> Vec<PooledEnvelope> {
        self.pool.take_for(recipient_code)
    }

    /// Forwards a frame verbatim to every open session.
    pub async fn broadcast(&self, text: &str) {
        for (session_id, channel) in self.sessions.snapshot_all() {
            if channel.send_text(text.to_string()).await.is_err() {
                self.sessions.close(session_id, "write failed").await;
            }
        }
    }

    /// Ephemeral forward to the recipient's sessions; never touches the pool.
    pub async fn forward_real_time(&self, recipient_code: &str, text: &str) {
        for (session_id, channel) in self.sessions.lookup(recipient_code) {
            if channel.send_text(text.to_string()).await.is_err() {
                self.sessions.close(session_id, "write failed").await;
            }
        }
    }

    async fn push_one(&self, envelope: &PooledEnvelope) -> DeliveryOutcome {
        let candidates = self.sessions.lookup(&envelope.recipient_code);
        if candidates.is_empty() {
            return DeliveryOutcome::Pooled;
        }
        let frame = ServerFrame::NewMessage {
            message: envelope.payload.clone(),
            message_id: envelope.id.clone(),
            timestamp: envelope.created_at_ms,
        };
        let Ok(text) = to_json_string(&frame) else {
            return DeliveryOutcome::Pooled;
        };
        let mut delivered = false;
        for (session_id, channel) in candidates {
            match channel.send_text(text.clone()).await {
                Ok(()) => delivered = true,
                Err(err) => {
                    log::warn!("push to session {} failed: {}", session_id, err);
                    self.sessions.close(session_id, "write failed").await;
                }
            }
        }
        if delivered {
            self.pool.remove(&envelope.id);
            DeliveryOutcome::Delivered
        } else {
            self.pool.record_failed_push(&envelope.id);
            DeliveryOutcome::Pooled
        }
    }

    async fn flush_pending(&self, recipient_code: &str, skip_id: &str) {
        for envelope in self.pool.pending_for(recipient_code) {
            if envelope.id == skip_id {
                continue;
            }
            let _ = self.push_one(&envelope).await;
        }
    }
}
