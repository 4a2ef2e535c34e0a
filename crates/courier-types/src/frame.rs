use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Frames a client may send over the duplex channel. `status_update` and
/// `real_time_message` are forwarded verbatim from the raw text, so only the
/// fields the broker routes on are captured here; everything else passes
/// through untouched.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    RegisterUser {
        #[serde(rename = "contactCode")]
        contact_code: String,
    },
    StatusUpdate {
        #[serde(default)]
        status: Option<String>,
    },
    RealTimeMessage {
        #[serde(rename = "recipientContactCode")]
        recipient_contact_code: String,
    },
}

/// Frames the broker writes to a session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    RegistrationSuccess {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    NewMessage {
        message: Value,
        #[serde(rename = "messageId")]
        message_id: String,
        timestamp: u64,
    },
    Error {
        error: String,
    },
}
