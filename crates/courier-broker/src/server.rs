use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::clock::Clock;
use crate::config::BrokerConfig;
use crate::error::{BrokerError, Result};
use crate::reaper;
use crate::{http, ws, Broker};

pub struct RunningServer {
    pub base_url: String,
    pub local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RunningServer {
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

pub fn build_router(broker: Arc<Broker>) -> Router {
    let cors = cors_layer(&broker.config().allowed_origins);
    Router::new()
        .route("/health", get(http::health))
        .route("/api/message", post(http::publish))
        .route("/api/messages/:contact_code", get(http::pull))
        .route("/api/message/:id", delete(http::delete_message))
        .route("/api/nodes/register", post(http::register_node))
        .route("/api/nodes", get(http::list_nodes))
        .route("/api/replicate", post(http::replicate))
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .with_state(broker)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
}

/// Binds the listener, starts the sweepers, and serves until `stop` or the
/// shutdown signal. Dropping the serve loop refuses new ingress; open
/// sessions are closed with a terminal reason, and the pool is not drained.
pub async fn start(config: BrokerConfig, clock: Arc<dyn Clock>) -> Result<RunningServer> {
    let broker = Arc::new(Broker::new(config, clock)?);
    let addr = broker
        .config()
        .socket_addr()
        .map_err(|err| BrokerError::Validation(err.to_string()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| BrokerError::Io(err.to_string()))?;
    let local_addr = listener
        .local_addr()
        .map_err(|err| BrokerError::Io(err.to_string()))?;
    let base_url = format!("http://{}", local_addr);

    let sweepers = reaper::spawn_sweepers(
        broker.pool().clone(),
        broker.sessions().clone(),
        broker.limiter().clone(),
        broker.clock().clone(),
        broker.config(),
    );
    let router = build_router(broker.clone());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        tokio::select! {
            result = axum::serve(listener, app).into_future() => {
                if let Err(err) = result {
                    log::error!("server error: {}", err);
                }
            }
            _ = shutdown_rx => {}
        }
        for sweeper in sweepers {
            sweeper.abort();
        }
        broker.shutdown_sessions().await;
    });
    log::info!("broker listening on {}", local_addr);
    Ok(RunningServer {
        base_url,
        local_addr,
        shutdown: shutdown_tx,
        handle,
    })
}
