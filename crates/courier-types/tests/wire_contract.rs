use courier_types::{
    ClientFrame, CourierTypesError, EncryptedPayload, HealthResponse, PublishRequest,
    PullResponse, RegisterNodeRequest, ServerFrame, StoredMessage,
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn publish_request_accepts_recorded_client_body() {
    // Verbatim shape sent by the desktop client, extra fields included.
    let body = json!({
        "id": "msg-1",
        "recipientContactCode": "CODE-A",
        "encryptedMessage": {
            "encryptedMessage": "aGVsbG8=",
            "encryptedKey": "a2V5",
            "iv": "aXY=",
            "authTag": ""
        },
        "timestamp": 1_700_000_000,
        "ttl": 86_400_000u64,
        "messageType": "text"
    });
    let request: PublishRequest = serde_json::from_value(body).expect("deserialize");
    assert_eq!(request.id, "msg-1");
    assert_eq!(request.recipient_contact_code, "CODE-A");
    assert_eq!(request.ttl, Some(86_400_000));
    request.validate().expect("valid");
}

#[test]
fn publish_request_accepts_message_id_alias() {
    let body = json!({
        "messageId": "msg-2",
        "recipientContactCode": "CODE-A",
        "encryptedMessage": "opaque"
    });
    let request: PublishRequest = serde_json::from_value(body).expect("deserialize");
    assert_eq!(request.id, "msg-2");
    assert_eq!(request.ttl, None);
}

#[test]
fn publish_request_rejects_blank_fields() {
    let request = PublishRequest {
        recipient_contact_code: "  ".to_string(),
        encrypted_message: json!("X"),
        id: "m1".to_string(),
        ttl: None,
    };
    assert_eq!(
        request.validate(),
        Err(CourierTypesError::InvalidField("contactCode"))
    );

    let request = PublishRequest {
        recipient_contact_code: "R".to_string(),
        encrypted_message: json!("X"),
        id: "m1".to_string(),
        ttl: Some(0),
    };
    assert_eq!(request.validate(), Err(CourierTypesError::InvalidField("ttl")));
}

#[test]
fn client_frames_parse_by_type_tag() {
    let register: ClientFrame =
        serde_json::from_str(r#"{"type":"register_user","contactCode":"CODE-A"}"#)
            .expect("register frame");
    assert_eq!(
        register,
        ClientFrame::RegisterUser {
            contact_code: "CODE-A".to_string()
        }
    );

    let status: ClientFrame = serde_json::from_str(
        r#"{"type":"status_update","status":"away","customMessage":"brb","userId":"u1"}"#,
    )
    .expect("status frame tolerates extra fields");
    assert_eq!(
        status,
        ClientFrame::StatusUpdate {
            status: Some("away".to_string())
        }
    );

    let rtm: ClientFrame = serde_json::from_str(
        r#"{"type":"real_time_message","recipientContactCode":"CODE-B","payload":"x"}"#,
    )
    .expect("real time frame");
    assert!(matches!(
        rtm,
        ClientFrame::RealTimeMessage { recipient_contact_code } if recipient_contact_code == "CODE-B"
    ));
}

#[test]
fn unknown_frame_type_is_an_error() {
    let parsed = serde_json::from_str::<ClientFrame>(r#"{"type":"voice_data","callId":"c1"}"#);
    assert!(parsed.is_err());
}

#[test]
fn server_frames_serialize_with_wire_field_names() {
    let session_id = Uuid::new_v4();
    let ack = serde_json::to_value(ServerFrame::RegistrationSuccess { session_id })
        .expect("serialize ack");
    assert_eq!(ack["type"], "registration_success");
    assert_eq!(ack["sessionId"], session_id.to_string());

    let push = serde_json::to_value(ServerFrame::NewMessage {
        message: json!("ciphertext"),
        message_id: "m1".to_string(),
        timestamp: 42,
    })
    .expect("serialize push");
    assert_eq!(push["type"], "new_message");
    assert_eq!(push["messageId"], "m1");
    assert_eq!(push["message"], "ciphertext");
    assert_eq!(push["timestamp"], 42);
}

#[test]
fn pull_response_uses_camel_case_keys() {
    let response = PullResponse {
        messages: vec![StoredMessage {
            id: "m1".to_string(),
            encrypted_message: json!("X"),
            timestamp: 7,
        }],
    };
    let value = serde_json::to_value(&response).expect("serialize");
    assert_eq!(value["messages"][0]["id"], "m1");
    assert_eq!(value["messages"][0]["encryptedMessage"], "X");
    assert_eq!(value["messages"][0]["timestamp"], 7);
}

#[test]
fn encrypted_payload_auth_tag_defaults_to_empty() {
    let payload: EncryptedPayload = serde_json::from_value(json!({
        "encryptedMessage": "aGVsbG8=",
        "encryptedKey": "a2V5",
        "iv": "aXY="
    }))
    .expect("deserialize without authTag");
    assert!(payload.auth_tag.is_empty());
    payload.validate().expect("empty tag is valid");

    let bad = EncryptedPayload {
        encrypted_message: "not base64!!".to_string(),
        encrypted_key: "a2V5".to_string(),
        iv: "aXY=".to_string(),
        auth_tag: String::new(),
    };
    assert_eq!(bad.validate(), Err(CourierTypesError::InvalidBase64));
}

#[test]
fn register_node_request_validates_url_scheme() {
    let request = RegisterNodeRequest {
        node_url: "ftp://node.example".to_string(),
        public_key: "pk".to_string(),
    };
    assert_eq!(
        request.validate(),
        Err(CourierTypesError::InvalidField("nodeUrl"))
    );

    let request = RegisterNodeRequest {
        node_url: "https://node.example:3000".to_string(),
        public_key: String::new(),
    };
    assert_eq!(
        request.validate(),
        Err(CourierTypesError::InvalidField("publicKey"))
    );
}

#[test]
fn health_response_round_trips_wire_keys() {
    let text = r#"{
        "status": "healthy",
        "timestamp": 1700000000000,
        "version": "0.1.0",
        "messagePoolSize": 3,
        "activeSessions": 2,
        "connectedNodes": 1
    }"#;
    let health: HealthResponse = serde_json::from_str(text).expect("deserialize");
    assert_eq!(health.status, "healthy");
    assert_eq!(health.message_pool_size, 3);
    assert_eq!(health.active_sessions, 2);
    assert_eq!(health.connected_nodes, 1);
}
