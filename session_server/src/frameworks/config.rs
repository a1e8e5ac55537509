use crate::domain::tuning::{PlayerTuning, StaminaTuning};
use std::{env, time::Duration};

// Runtime/server constants (gameplay tuning lives in `domain::tuning`).

pub fn http_port() -> u16 {
    env::var("SESSION_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
}

/// Base URL of the auth service; unset means joins are never token-checked.
pub fn auth_service_url() -> Option<String> {
    env::var("AUTH_SERVICE_URL")
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

pub fn auth_verify_timeout() -> Duration {
    let millis = env::var("AUTH_VERIFY_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(54);
// Longest a single socket write may block before the connection is dropped.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
pub const WORLD_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Everything `run_with_settings` needs besides the listener and validator.
#[derive(Debug, Clone, Copy)]
pub struct ServerSettings {
    pub player: PlayerTuning,
    pub stamina: StaminaTuning,
    pub outbound_queue_capacity: usize,
    pub keepalive_interval: Duration,
    pub write_timeout: Duration,
    pub world_tick_interval: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            stamina: StaminaTuning::default(),
            outbound_queue_capacity: OUTBOUND_QUEUE_CAPACITY,
            keepalive_interval: KEEPALIVE_INTERVAL,
            write_timeout: WRITE_TIMEOUT,
            world_tick_interval: WORLD_TICK_INTERVAL,
        }
    }
}
