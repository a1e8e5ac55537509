use crate::domain::TokenValidator;
use crate::domain::tuning::StaminaTuning;
use crate::interface_adapters::net::hub::Hub;
use crate::use_cases::{InteractionResolver, WorldStore};
use std::sync::Arc;
use std::time::Duration;

/// Shared server state handed to every connection and HTTP handler.
pub struct AppState {
    // Authoritative player map.
    pub world: Arc<WorldStore>,
    // Proximity queries and interaction dispatch over `world`.
    pub resolver: InteractionResolver,
    // Registry of connected endpoints and their outbound queues.
    pub hub: Hub,
    // Join-token validator; `None` means every join is a guest join.
    pub validator: Option<Arc<dyn TokenValidator>>,
    // Starting stamina for newly joined players.
    pub stamina: StaminaTuning,
    // Interval between server-initiated pings on each connection.
    pub keepalive_interval: Duration,
    // Longest a single socket write may block; a stalled reader is dropped after this.
    pub write_timeout: Duration,
}

impl AppState {
    pub fn new(
        world: Arc<WorldStore>,
        hub: Hub,
        validator: Option<Arc<dyn TokenValidator>>,
        stamina: StaminaTuning,
        keepalive_interval: Duration,
        write_timeout: Duration,
    ) -> Self {
        Self {
            resolver: InteractionResolver::new(world.clone()),
            world,
            hub,
            validator,
            stamina,
            keepalive_interval,
            write_timeout,
        }
    }
}
