pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod http;
pub mod nodes;
pub mod pool;
pub mod ratelimit;
pub mod reaper;
pub mod replicate;
pub mod server;
pub mod sessions;
pub mod ws;

#[cfg(test)]
mod tests;

use std::net::IpAddr;
use std::sync::Arc;

use courier_types::{
    DeleteResponse, HealthResponse, NodeEntryDto, NodesResponse, PublishRequest, PublishResponse,
    PullResponse, RegisterNodeRequest, RegisterNodeResponse, StoredMessage,
};

use clock::Clock;
use config::BrokerConfig;
use delivery::{DeliveryEngine, DeliveryOutcome};
use error::{BrokerError, Result};
use nodes::NodeRegistry;
use pool::{InsertOutcome, MessagePool, PooledEnvelope};
use ratelimit::RateLimiter;
use replicate::Replicator;
use sessions::SessionRegistry;

/// One broker instance: the message pool, session registry, node registry,
/// rate limiter, delivery engine, and replicator, wired over a shared clock.
/// Constructed at startup, dropped on shutdown; no ambient globals.
pub struct Broker {
    config: BrokerConfig,
    clock: Arc<dyn Clock>,
    pool: Arc<MessagePool>,
    sessions: Arc<SessionRegistry>,
    nodes: Arc<NodeRegistry>,
    limiter: Arc<RateLimiter>,
    delivery: DeliveryEngine,
    replicator: Replicator,
}

impl Broker {
    pub fn new(config: BrokerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config
            .validate()
            .map_err(|err| BrokerError::Validation(err.to_string()))?;
        let pool = Arc::new(MessagePool::new());
        let sessions = Arc::new(SessionRegistry::new(clock.clone()));
        let nodes = Arc::new(NodeRegistry::new(clock.clone()));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_points,
            config.rate_limit_window_ms,
            clock.clone(),
        ));
        let delivery = DeliveryEngine::new(pool.clone(), sessions.clone());
        let replicator = Replicator::new(nodes.clone(), config.replication_timeout_ms)?;
        Ok(Self {
            config,
            clock,
            pool,
            sessions,
            nodes,
            limiter,
            delivery,
            replicator,
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn pool(&self) -> &Arc<MessagePool> {
        &self.pool
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn nodes(&self) -> &Arc<NodeRegistry> {
        &self.nodes
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn delivery(&self) -> &DeliveryEngine {
        &self.delivery
    }

    pub fn admit(&self, addr: IpAddr) -> bool {
        self.limiter.admit(addr)
    }

    /// Publish path: insert, push, fan out to peers.
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishResponse> {
        self.accept(request, true).await
    }

    /// Replicate-in path: insert and push locally, never fan out again.
    pub async fn replicate_in(&self, request: PublishRequest) -> Result<PublishResponse> {
        self.accept(request, false).await
    }

    async fn accept(&self, request: PublishRequest, fan_out: bool) -> Result<PublishResponse> {
        request
            .validate()
            .map_err(|err| BrokerError::Validation(err.to_string()))?;
        let envelope = self.envelope_from(request);
        let message_id = envelope.id.clone();
        if self.pool.insert(envelope.clone()) == InsertOutcome::Duplicate {
            // Existing entry retained; report the envelope as pooled.
            log::debug!("duplicate envelope {} ignored", message_id);
            return Ok(PublishResponse {
                success: true,
                message_id,
                delivered: false,
                pooled: true,
            });
        }
        let outcome = self.delivery.deliver(&envelope).await;
        if fan_out {
            self.replicator.spawn_fan_out(&envelope);
        }
        let delivered = outcome == DeliveryOutcome::Delivered;
        Ok(PublishResponse {
            success: true,
            message_id,
            delivered,
            pooled: !delivered,
        })
    }

    pub fn pull(&self, recipient_code: &str) -> PullResponse {
        let messages = self
            .delivery
            .drain(recipient_code)
            .into_iter()
            .map(|envelope| StoredMessage {
                id: envelope.id,
                encrypted_message: envelope.payload,
                timestamp: envelope.created_at_ms,
            })
            .collect();
        PullResponse { messages }
    }

    pub fn delete(&self, id: &str) -> DeleteResponse {
        DeleteResponse {
            removed: self.pool.remove(id),
        }
    }

    pub fn register_node(&self, request: RegisterNodeRequest) -> Result<RegisterNodeResponse> {
        request
            .validate()
            .map_err(|err| BrokerError::Validation(err.to_string()))?;
        self.nodes.register(request.node_url, request.public_key);
        Ok(RegisterNodeResponse { success: true })
    }

    pub fn list_nodes(&self) -> NodesResponse {
        let nodes = self
            .nodes
            .list()
            .into_iter()
            .map(|entry| NodeEntryDto {
                node_url: entry.node_url,
                last_seen: entry.last_seen_ms,
            })
            .collect();
        NodesResponse { nodes }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".to_string(),
            timestamp: self.clock.now_ms(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            message_pool_size: self.pool.len(),
            active_sessions: self.sessions.len(),
            connected_nodes: self.nodes.len(),
        }
    }

    pub async fn shutdown_sessions(&self) {
        for (session_id, _) in self.sessions.snapshot_all() {
            self.sessions.close(session_id, "server shutdown").await;
        }
    }

    fn envelope_from(&self, request: PublishRequest) -> PooledEnvelope {
        let ttl_ms = request
            .ttl
            .unwrap_or(self.config.default_ttl_ms)
            .min(self.config.max_ttl_ms);
        PooledEnvelope {
            id: request.id,
            recipient_code: request.recipient_contact_code,
            payload: request.encrypted_message,
            created_at_ms: self.clock.now_ms(),
            ttl_ms,
            attempts: 0,
            max_attempts: self.config.max_push_attempts,
        }
    }
}
