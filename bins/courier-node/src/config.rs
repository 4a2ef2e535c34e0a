use courier_broker::config::{BrokerConfig, ConfigError};

/// Environment overlay for the broker configuration. Every knob has a
/// `COURIER_*` variable; unset variables keep the defaults.
#[derive(Clone, Debug)]
pub struct NodeOptions {
    pub broker: BrokerConfig,
    pub log_level: String,
}

pub fn from_env() -> Result<NodeOptions, ConfigError> {
    let mut broker = BrokerConfig::default();
    if let Some(value) = env_string("COURIER_BIND_ADDR") {
        broker.bind_addr = value;
    }
    if let Some(value) = env_string("COURIER_ALLOWED_ORIGINS") {
        broker.allowed_origins = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
    }
    broker.rate_limit_points = env_u32("COURIER_RATE_LIMIT_POINTS", broker.rate_limit_points)?;
    broker.rate_limit_window_ms =
        env_u64("COURIER_RATE_LIMIT_WINDOW_MS", broker.rate_limit_window_ms)?;
    broker.default_ttl_ms = env_u64("COURIER_DEFAULT_TTL_MS", broker.default_ttl_ms)?;
    broker.max_ttl_ms = env_u64("COURIER_MAX_TTL_MS", broker.max_ttl_ms)?;
    broker.envelope_sweep_interval_ms = env_u64(
        "COURIER_ENVELOPE_SWEEP_MS",
        broker.envelope_sweep_interval_ms,
    )?;
    broker.session_sweep_interval_ms = env_u64(
        "COURIER_SESSION_SWEEP_MS",
        broker.session_sweep_interval_ms,
    )?;
    broker.session_idle_ms = env_u64("COURIER_SESSION_IDLE_MS", broker.session_idle_ms)?;
    broker.replication_timeout_ms = env_u64(
        "COURIER_REPLICATION_TIMEOUT_MS",
        broker.replication_timeout_ms,
    )?;
    broker.validate()?;
    let log_level = env_string("COURIER_LOG").unwrap_or_else(|| "info".to_string());
    Ok(NodeOptions { broker, log_level })
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env_string(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Validation(name.to_string())),
        None => Ok(default),
    }
}

fn env_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env_string(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Validation(name.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // from_env reads process-wide state; keep the tests serialized.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_without_environment() {
        let _guard = ENV_LOCK.lock().unwrap();
        let options = from_env().expect("defaults");
        assert_eq!(options.broker.bind_addr, "0.0.0.0:3000");
        assert_eq!(options.broker.rate_limit_points, 100);
        assert_eq!(options.broker.default_ttl_ms, 24 * 60 * 60 * 1000);
        assert_eq!(options.log_level, "info");
    }

    #[test]
    fn origins_split_on_commas() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(
            "COURIER_ALLOWED_ORIGINS",
            "https://app.example, https://alt.example ,",
        );
        let options = from_env().expect("options");
        std::env::remove_var("COURIER_ALLOWED_ORIGINS");
        assert_eq!(
            options.broker.allowed_origins,
            vec![
                "https://app.example".to_string(),
                "https://alt.example".to_string()
            ]
        );
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("COURIER_RATE_LIMIT_WINDOW_MS", "not-a-number");
        let result = from_env();
        std::env::remove_var("COURIER_RATE_LIMIT_WINDOW_MS");
        assert!(result.is_err());
    }
}
