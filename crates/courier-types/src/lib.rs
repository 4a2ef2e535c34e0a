pub mod codec;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod health;
pub mod node;

pub use codec::{from_json_str, to_json_string};
pub use envelope::{
    DeleteResponse, EncryptedPayload, PublishRequest, PublishResponse, PullResponse, StoredMessage,
};
pub use error::{CourierTypesError, Result};
pub use frame::{ClientFrame, ServerFrame};
pub use health::HealthResponse;
pub use node::{NodeEntryDto, NodesResponse, RegisterNodeRequest, RegisterNodeResponse};
