use super::{envelope, manual_clock, test_config, RecordingChannel};
use crate::pool::MessagePool;
use crate::ratelimit::RateLimiter;
use crate::reaper::spawn_sweepers;
use crate::sessions::SessionRegistry;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

// The sweeps tick on short real intervals here; the manual clock alone
// decides what counts as expired or idle.
#[tokio::test]
async fn sweepers_evict_expired_envelopes_idle_sessions_and_stale_buckets() {
    let clock = manual_clock();
    let pool = Arc::new(MessagePool::new());
    let sessions = Arc::new(SessionRegistry::new(clock.clone()));
    let limiter = Arc::new(RateLimiter::new(5, 60_000, clock.clone()));
    let mut config = test_config();
    config.envelope_sweep_interval_ms = 20;
    config.session_sweep_interval_ms = 20;

    let sweepers = spawn_sweepers(
        pool.clone(),
        sessions.clone(),
        limiter.clone(),
        clock.clone(),
        &config,
    );

    pool.insert(envelope("m-exp", "R"));
    let channel = RecordingChannel::new();
    let session_id = sessions.open(channel.clone());
    sessions.bind(session_id, "R").expect("bind");
    limiter.admit(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));

    // Several sweep ticks pass, but nothing is stale yet.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(pool.len(), 1);
    assert_eq!(sessions.len(), 1);
    assert_eq!(limiter.len(), 1);

    // Jump past the envelope TTL (60 s), the session idle threshold
    // (5 min), and the rate-limit window (60 s) in one step.
    clock.advance(400_000);
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(pool.len(), 0);
    assert_eq!(sessions.len(), 0);
    assert_eq!(limiter.len(), 0);
    assert_eq!(
        channel.close_reason.lock().await.as_deref(),
        Some("idle timeout")
    );

    for sweeper in sweepers {
        sweeper.abort();
    }
}

#[tokio::test]
async fn sweeps_leave_fresh_state_alone() {
    let clock = manual_clock();
    let pool = Arc::new(MessagePool::new());
    let sessions = Arc::new(SessionRegistry::new(clock.clone()));
    let limiter = Arc::new(RateLimiter::new(5, 60_000, clock.clone()));
    let mut config = test_config();
    config.envelope_sweep_interval_ms = 10;
    config.session_sweep_interval_ms = 10;

    let sweepers = spawn_sweepers(
        pool.clone(),
        sessions.clone(),
        limiter.clone(),
        clock.clone(),
        &config,
    );

    pool.insert(envelope("m-live", "R"));
    let session_id = sessions.open(RecordingChannel::new());
    sessions.bind(session_id, "R").expect("bind");

    // Stay inside every threshold; many ticks later everything survives.
    clock.advance(30_000);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(pool.len(), 1);
    assert_eq!(sessions.len(), 1);

    for sweeper in sweepers {
        sweeper.abort();
    }
}
