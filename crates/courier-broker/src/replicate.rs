use std::sync::Arc;
use std::time::Duration;

use courier_types::PublishRequest;
use futures_util::future::join_all;

use crate::error::{BrokerError, Result};
use crate::nodes::NodeRegistry;
use crate::pool::PooledEnvelope;

/// Best-effort fan-out of accepted envelopes to every registered peer.
/// Requests run off the publish path with an independent timeout each;
/// failures are logged and swallowed. Peers receive the copy on their
/// replicate-in endpoint, which pools without fanning out again.
#[derive(Clone)]
pub struct Replicator {
    nodes: Arc<NodeRegistry>,
    http: reqwest::Client,
}

impl Replicator {
    pub fn new(nodes: Arc<NodeRegistry>, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|_| BrokerError::Replication("client".to_string()))?;
        Ok(Self { nodes, http })
    }

    pub fn spawn_fan_out(&self, envelope: &PooledEnvelope) {
        let body = PublishRequest {
            recipient_contact_code: envelope.recipient_code.clone(),
            encrypted_message: envelope.payload.clone(),
            id: envelope.id.clone(),
            ttl: Some(envelope.ttl_ms),
        };
        let nodes = self.nodes.clone();
        let http = self.http.clone();
        tokio::spawn(async move {
            let peers = nodes.peer_urls();
            if peers.is_empty() {
                return;
            }
            let requests = peers.into_iter().map(|peer| {
                let http = http.clone();
                let body = body.clone();
                async move {
                    let url = format!("{}/api/replicate", peer.trim_end_matches('/'));
                    match http.post(&url).json(&body).send().await {
                        Ok(resp) if resp.status().is_success() => {}
                        Ok(resp) => {
                            log::warn!("replicate {} to {}: status {}", body.id, url, resp.status());
                        }
                        Err(err) => {
                            log::warn!("replicate {} to {}: {}", body.id, url, err);
                        }
                    }
                }
            });
            join_all(requests).await;
        });
    }
}
