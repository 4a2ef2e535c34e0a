use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::BrokerConfig;
use crate::pool::MessagePool;
use crate::ratelimit::RateLimiter;
use crate::sessions::SessionRegistry;

/// Spawns the two periodic sweeps: expired envelopes and idle sessions.
/// Each runs on its own interval; neither overlaps with itself. The server
/// aborts the handles on shutdown.
pub fn spawn_sweepers(
    pool: Arc<MessagePool>,
    sessions: Arc<SessionRegistry>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    config: &BrokerConfig,
) -> Vec<JoinHandle<()>> {
    let envelope_sweep = {
        let pool = pool.clone();
        let clock = clock.clone();
        let interval_ms = config.envelope_sweep_interval_ms;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                ticker.tick().await;
                let removed = pool.expire_before(clock.now_ms());
                if removed > 0 {
                    log::info!("envelope sweep removed {} expired", removed);
                }
            }
        })
    };

    let session_sweep = {
        let idle_ms = config.session_idle_ms;
        let interval_ms = config.session_sweep_interval_ms;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                ticker.tick().await;
                let cutoff = clock.now_ms().saturating_sub(idle_ms);
                for session_id in sessions.idle(cutoff) {
                    sessions.close(session_id, "idle timeout").await;
                }
                limiter.prune_idle();
            }
        })
    };

    vec![envelope_sweep, session_sweep]
}
