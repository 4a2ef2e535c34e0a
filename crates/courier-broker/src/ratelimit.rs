use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::Clock;

struct Bucket {
    remaining: u32,
    window_start_ms: u64,
    last_used_ms: u64,
}

/// Token bucket per source address. The bucket refills to capacity when its
/// window has fully elapsed; buckets untouched for a whole window are pruned
/// by the session sweep.
pub struct RateLimiter {
    points: u32,
    window_ms: u64,
    clock: Arc<dyn Clock>,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    pub fn new(points: u32, window_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            points,
            window_ms,
            clock,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn admit(&self, addr: IpAddr) -> bool {
        let now = self.clock.now_ms();
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(addr).or_insert(Bucket {
            remaining: self.points,
            window_start_ms: now,
            last_used_ms: now,
        });
        if now.saturating_sub(bucket.window_start_ms) >= self.window_ms {
            bucket.remaining = self.points;
            bucket.window_start_ms = now;
        }
        bucket.last_used_ms = now;
        if bucket.remaining == 0 {
            return false;
        }
        bucket.remaining -= 1;
        true
    }

    pub fn prune_idle(&self) {
        let now = self.clock.now_ms();
        let window = self.window_ms;
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets.retain(|_, bucket| now.saturating_sub(bucket.last_used_ms) < window);
    }

    pub fn len(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
