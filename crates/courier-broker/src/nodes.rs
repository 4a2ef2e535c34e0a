use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::Clock;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeEntry {
    pub node_url: String,
    pub public_key: String,
    pub last_seen_ms: u64,
}

/// Peer brokers known to this node. Entries persist until process exit.
pub struct NodeRegistry {
    clock: Arc<dyn Clock>,
    nodes: Mutex<HashMap<String, NodeEntry>>,
}

impl NodeRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            nodes: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, node_url: String, public_key: String) {
        let now = self.clock.now_ms();
        let mut nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
        nodes.insert(
            node_url.clone(),
            NodeEntry {
                node_url,
                public_key,
                last_seen_ms: now,
            },
        );
    }

    pub fn list(&self) -> Vec<NodeEntry> {
        let nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<NodeEntry> = nodes.values().cloned().collect();
        entries.sort_by(|a, b| a.node_url.cmp(&b.node_url));
        entries
    }

    pub fn peer_urls(&self) -> Vec<String> {
        let nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
        nodes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
