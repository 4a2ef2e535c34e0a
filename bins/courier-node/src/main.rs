mod config;

use courier_broker::clock::SystemClock;
use courier_broker::server;
use log::LevelFilter;
use std::sync::Arc;
use tokio::signal;

#[derive(thiserror::Error, Debug)]
enum NodeError {
    #[error("config")]
    Config,
    #[error("server")]
    Server,
}

#[tokio::main]
async fn main() -> Result<(), NodeError> {
    let options = config::from_env().map_err(|err| {
        eprintln!("invalid configuration: {}", err);
        NodeError::Config
    })?;
    init_logging(&options.log_level);
    let running = server::start(options.broker, Arc::new(SystemClock))
        .await
        .map_err(|err| {
            log::error!("failed to start: {}", err);
            NodeError::Server
        })?;
    log::info!("courier node ready at {}", running.base_url);
    let _ = signal::ctrl_c().await;
    log::info!("shutting down");
    running.stop().await;
    Ok(())
}

fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}
