use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use courier_types::{from_json_str, to_json_string, ClientFrame, ServerFrame};

use crate::error::{BrokerError, Result};
use crate::sessions::SessionChannel;
use crate::Broker;

struct WsChannel {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WsChannel {
    async fn pong(&self, data: Vec<u8>) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Pong(data))
            .await
            .map_err(|err| BrokerError::Transport(err.to_string()))
    }
}

#[async_trait]
impl SessionChannel for WsChannel {
    async fn send_text(&self, text: String) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text))
            .await
            .map_err(|err| BrokerError::Transport(err.to_string()))
    }

    async fn close(&self, reason: &str) {
        let mut sink = self.sink.lock().await;
        let _ = sink
            .send(Message::Close(Some(CloseFrame {
                code: close_code::NORMAL,
                reason: reason.to_string().into(),
            })))
            .await;
        let _ = sink.close().await;
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(broker): State<Arc<Broker>>,
) -> Response {
    if !broker.admit(addr.ip()) {
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, broker))
}

async fn handle_socket(socket: WebSocket, broker: Arc<Broker>) {
    let (sink, stream) = socket.split();
    let channel = Arc::new(WsChannel {
        sink: Mutex::new(sink),
    });
    let session_id = broker.sessions().open(channel.clone());
    log::debug!("session {} connected", session_id);

    read_loop(&broker, session_id, &channel, stream).await;

    // No-op when the session was already removed by a failed write or the
    // idle sweep.
    broker
        .sessions()
        .close(session_id, "connection closed")
        .await;
    log::debug!("session {} disconnected", session_id);
}

async fn read_loop(
    broker: &Arc<Broker>,
    session_id: Uuid,
    channel: &Arc<WsChannel>,
    mut stream: SplitStream<WebSocket>,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                broker.sessions().touch(session_id);
                handle_frame(broker, session_id, channel, &text).await;
            }
            Ok(Message::Ping(data)) => {
                broker.sessions().touch(session_id);
                if channel.pong(data).await.is_err() {
                    break;
                }
            }
            Ok(Message::Pong(_)) => {
                broker.sessions().touch(session_id);
            }
            Ok(Message::Binary(_)) => {
                broker.sessions().touch(session_id);
                send_error(broker, session_id, channel, "text frames only").await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
        }
    }
}

async fn handle_frame(
    broker: &Arc<Broker>,
    session_id: Uuid,
    channel: &Arc<WsChannel>,
    text: &str,
) {
    match from_json_str::<ClientFrame>(text) {
        Ok(ClientFrame::RegisterUser { contact_code }) => {
            if contact_code.trim().is_empty() {
                send_error(broker, session_id, channel, "contactCode required").await;
                return;
            }
            match broker.sessions().bind(session_id, &contact_code) {
                Ok(()) => {
                    send_frame(
                        broker,
                        session_id,
                        channel,
                        &ServerFrame::RegistrationSuccess { session_id },
                    )
                    .await;
                }
                Err(_) => {
                    send_error(broker, session_id, channel, "unknown session").await;
                }
            }
        }
        Ok(ClientFrame::StatusUpdate { status }) => {
            broker.sessions().set_status(session_id, status);
            // The raw text goes out, not a re-serialization, so unknown
            // fields survive the broadcast.
            broker.delivery().broadcast(text).await;
        }
        Ok(ClientFrame::RealTimeMessage {
            recipient_contact_code,
        }) => {
            broker
                .delivery()
                .forward_real_time(&recipient_contact_code, text)
                .await;
        }
        Err(_) => {
            send_error(broker, session_id, channel, "unsupported message type").await;
        }
    }
}

async fn send_frame(
    broker: &Arc<Broker>,
    session_id: Uuid,
    channel: &Arc<WsChannel>,
    frame: &ServerFrame,
) {
    let Ok(text) = to_json_string(frame) else {
        return;
    };
    if channel.send_text(text).await.is_err() {
        broker.sessions().close(session_id, "write failed").await;
    }
}

async fn send_error(broker: &Arc<Broker>, session_id: Uuid, channel: &Arc<WsChannel>, error: &str) {
    send_frame(
        broker,
        session_id,
        channel,
        &ServerFrame::Error {
            error: error.to_string(),
        },
    )
    .await;
}
