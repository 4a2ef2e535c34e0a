use serde::{Deserialize, Serialize};

use crate::error::{CourierTypesError, Result};

pub const MAX_NODE_URL_LEN: usize = 256;
pub const MAX_PUBLIC_KEY_LEN: usize = 1024;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeRequest {
    pub node_url: String,
    pub public_key: String,
}

impl RegisterNodeRequest {
    pub fn validate(&self) -> Result<()> {
        validate_node_url(&self.node_url)?;
        let key = self.public_key.trim();
        if key.is_empty() || key.len() > MAX_PUBLIC_KEY_LEN {
            return Err(CourierTypesError::InvalidField("publicKey"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeResponse {
    pub success: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntryDto {
    pub node_url: String,
    pub last_seen: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodesResponse {
    pub nodes: Vec<NodeEntryDto>,
}

pub fn validate_node_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_NODE_URL_LEN {
        return Err(CourierTypesError::InvalidField("nodeUrl"));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(CourierTypesError::InvalidField("nodeUrl"));
    }
    Ok(())
}
