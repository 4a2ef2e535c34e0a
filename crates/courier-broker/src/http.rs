use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use courier_types::{PublishRequest, RegisterNodeRequest};
use serde_json::{json, Value};

use crate::Broker;

/// Every request passes the rate limiter before any other work; a rejection
/// is a 429 with no state change.
fn admit(broker: &Broker, addr: SocketAddr) -> Result<(), Response> {
    if broker.admit(addr.ip()) {
        Ok(())
    } else {
        Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "too many requests"})),
        )
            .into_response())
    }
}

fn bad_request(detail: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": detail})),
    )
        .into_response()
}

pub async fn health(
    State(broker): State<Arc<Broker>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    if let Err(rejection) = admit(&broker, addr) {
        return rejection;
    }
    Json(broker.health()).into_response()
}

pub async fn publish(
    State(broker): State<Arc<Broker>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<Value>, axum::extract::rejection::JsonRejection>,
) -> Response {
    accept_envelope(broker, addr, body, true).await
}

pub async fn replicate(
    State(broker): State<Arc<Broker>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<Value>, axum::extract::rejection::JsonRejection>,
) -> Response {
    accept_envelope(broker, addr, body, false).await
}

async fn accept_envelope(
    broker: Arc<Broker>,
    addr: SocketAddr,
    body: Result<Json<Value>, axum::extract::rejection::JsonRejection>,
    fan_out: bool,
) -> Response {
    if let Err(rejection) = admit(&broker, addr) {
        return rejection;
    }
    let Ok(Json(value)) = body else {
        return bad_request("invalid json body".to_string());
    };
    let request: PublishRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => return bad_request(format!("invalid envelope: {}", err)),
    };
    let result = if fan_out {
        broker.publish(request).await
    } else {
        broker.replicate_in(request).await
    };
    match result {
        Ok(response) => Json(response).into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

pub async fn pull(
    State(broker): State<Arc<Broker>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(contact_code): Path<String>,
) -> Response {
    if let Err(rejection) = admit(&broker, addr) {
        return rejection;
    }
    Json(broker.pull(&contact_code)).into_response()
}

pub async fn delete_message(
    State(broker): State<Arc<Broker>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<String>,
) -> Response {
    if let Err(rejection) = admit(&broker, addr) {
        return rejection;
    }
    Json(broker.delete(&id)).into_response()
}

pub async fn register_node(
    State(broker): State<Arc<Broker>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Json<Value>, axum::extract::rejection::JsonRejection>,
) -> Response {
    if let Err(rejection) = admit(&broker, addr) {
        return rejection;
    }
    let Ok(Json(value)) = body else {
        return bad_request("invalid json body".to_string());
    };
    let request: RegisterNodeRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => return bad_request(format!("invalid node: {}", err)),
    };
    match broker.register_node(request) {
        Ok(response) => Json(response).into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

pub async fn list_nodes(
    State(broker): State<Arc<Broker>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    if let Err(rejection) = admit(&broker, addr) {
        return rejection;
    }
    Json(broker.list_nodes()).into_response()
}
