use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Clone, Debug, PartialEq)]
pub struct PooledEnvelope {
    pub id: String,
    pub recipient_code: String,
    pub payload: Value,
    pub created_at_ms: u64,
    pub ttl_ms: u64,
    pub attempts: u32,
    pub max_attempts: u32,
}

impl PooledEnvelope {
    pub fn expires_at_ms(&self) -> u64 {
        self.created_at_ms.saturating_add(self.ttl_ms)
    }

    pub fn push_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

struct PoolInner {
    // id -> recipient, kept in lockstep with the per-recipient queues so
    // insert, take_for, remove, and expire_before are each atomic.
    by_id: HashMap<String, String>,
    queues: HashMap<String, Vec<PooledEnvelope>>,
}

/// The authoritative envelope buffer. Queues keep insertion order per
/// recipient; an envelope is present exactly once or not at all. Every
/// operation is a short synchronous critical section; the lock is never
/// held across I/O.
pub struct MessagePool {
    inner: Mutex<PoolInner>,
}

impl MessagePool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                by_id: HashMap::new(),
                queues: HashMap::new(),
            }),
        }
    }

    pub fn insert(&self, envelope: PooledEnvelope) -> InsertOutcome {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.by_id.contains_key(&envelope.id) {
            return InsertOutcome::Duplicate;
        }
        inner
            .by_id
            .insert(envelope.id.clone(), envelope.recipient_code.clone());
        inner
            .queues
            .entry(envelope.recipient_code.clone())
            .or_default()
            .push(envelope);
        InsertOutcome::Inserted
    }

    pub fn take_for(&self, recipient_code: &str) -> Vec<PooledEnvelope> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let drained = inner.queues.remove(recipient_code).unwrap_or_default();
        for envelope in &drained {
            inner.by_id.remove(&envelope.id);
        }
        drained
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(recipient) = inner.by_id.remove(id) else {
            return false;
        };
        if let Some(queue) = inner.queues.get_mut(&recipient) {
            queue.retain(|envelope| envelope.id != id);
            if queue.is_empty() {
                inner.queues.remove(&recipient);
            }
        }
        true
    }

    /// Pooled envelopes for the recipient that are still push candidates.
    pub fn pending_for(&self, recipient_code: &str) -> Vec<PooledEnvelope> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .queues
            .get(recipient_code)
            .map(|queue| {
                queue
                    .iter()
                    .filter(|envelope| !envelope.push_exhausted())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn record_failed_push(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(recipient) = inner.by_id.get(id).cloned() else {
            return;
        };
        if let Some(queue) = inner.queues.get_mut(&recipient) {
            if let Some(envelope) = queue.iter_mut().find(|envelope| envelope.id == id) {
                envelope.attempts = envelope.attempts.saturating_add(1);
            }
        }
    }

    pub fn expire_before(&self, now_ms: u64) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut expired = Vec::new();
        for queue in inner.queues.values_mut() {
            queue.retain(|envelope| {
                if envelope.expires_at_ms() <= now_ms {
                    expired.push(envelope.id.clone());
                    false
                } else {
                    true
                }
            });
        }
        inner.queues.retain(|_, queue| !queue.is_empty());
        for id in &expired {
            inner.by_id.remove(id);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }
}

impl Default for MessagePool {
    fn default() -> Self {
        Self::new()
    }
}
