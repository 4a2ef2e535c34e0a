use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CourierTypesError, Result};

pub const MAX_CONTACT_CODE_LEN: usize = 256;
pub const MAX_MESSAGE_ID_LEN: usize = 128;

/// Body of `POST /api/message` and `POST /api/replicate`. The payload is
/// opaque to the broker; clients may attach extra fields (timestamp,
/// message type) which are accepted and ignored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub recipient_contact_code: String,
    pub encrypted_message: Value,
    #[serde(rename = "messageId", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl PublishRequest {
    pub fn validate(&self) -> Result<()> {
        validate_contact_code(&self.recipient_contact_code)?;
        let id = self.id.trim();
        if id.is_empty() || id.len() > MAX_MESSAGE_ID_LEN {
            return Err(CourierTypesError::InvalidField("id"));
        }
        if self.encrypted_message.is_null() {
            return Err(CourierTypesError::InvalidField("encryptedMessage"));
        }
        if self.ttl == Some(0) {
            return Err(CourierTypesError::InvalidField("ttl"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    pub message_id: String,
    pub delivered: bool,
    pub pooled: bool,
}

/// One pooled envelope as returned by `GET /api/messages/{contact_code}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub encrypted_message: Value,
    pub timestamp: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub messages: Vec<StoredMessage>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub removed: bool,
}

/// The hybrid-encryption record clients place in `encryptedMessage`. The
/// broker never reads it; this type exists for client code and for the
/// contract tests. `authTag` is always present on the wire, possibly empty
/// (one of the recorded cipher implementations leaves it blank).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    pub encrypted_message: String,
    pub encrypted_key: String,
    pub iv: String,
    #[serde(default)]
    pub auth_tag: String,
}

impl EncryptedPayload {
    pub fn validate(&self) -> Result<()> {
        validate_blob(&self.encrypted_message)?;
        validate_blob(&self.encrypted_key)?;
        validate_blob(&self.iv)?;
        if !self.auth_tag.is_empty() {
            STANDARD.decode(self.auth_tag.as_bytes())?;
        }
        Ok(())
    }
}

pub fn validate_contact_code(code: &str) -> Result<()> {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_CONTACT_CODE_LEN {
        return Err(CourierTypesError::InvalidField("contactCode"));
    }
    Ok(())
}

fn validate_blob(blob_b64: &str) -> Result<()> {
    let decoded = STANDARD.decode(blob_b64.as_bytes())?;
    if decoded.is_empty() {
        return Err(CourierTypesError::InvalidBase64);
    }
    Ok(())
}
