mod reaper_tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use crate::clock::ManualClock;
use crate::config::BrokerConfig;
use crate::error::{BrokerError, Result};
use crate::pool::PooledEnvelope;
use crate::sessions::SessionChannel;

pub const TEST_EPOCH_MS: u64 = 1_000_000;

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(TEST_EPOCH_MS))
}

pub fn test_config() -> BrokerConfig {
    BrokerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        rate_limit_points: 10_000,
        ..BrokerConfig::default()
    }
}

pub fn envelope(id: &str, recipient: &str) -> PooledEnvelope {
    PooledEnvelope {
        id: id.to_string(),
        recipient_code: recipient.to_string(),
        payload: json!("ciphertext"),
        created_at_ms: TEST_EPOCH_MS,
        ttl_ms: 60_000,
        attempts: 0,
        max_attempts: 3,
    }
}

/// Mock duplex channel recording everything the broker writes.
pub struct RecordingChannel {
    pub sent: Mutex<Vec<String>>,
    pub close_reason: Mutex<Option<String>>,
    fail_sends: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            close_reason: Mutex::new(None),
            fail_sends: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        let channel = Self::new();
        channel.fail_sends.store(true, Ordering::SeqCst);
        channel
    }

    pub async fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl SessionChannel for RecordingChannel {
    async fn send_text(&self, text: String) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BrokerError::Transport("mock write failure".to_string()));
        }
        self.sent.lock().await.push(text);
        Ok(())
    }

    async fn close(&self, reason: &str) {
        *self.close_reason.lock().await = Some(reason.to_string());
    }
}
