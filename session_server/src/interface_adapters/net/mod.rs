// Network adapter modules: the connection hub, per-connection session logic, the WebSocket
// driver, and the HTTP polling routes.

pub mod client;
pub mod hub;
pub mod internal;
pub mod session;

pub use client::ws_handler;
pub use hub::{BroadcastReport, ConnId, Delivery, Hub};
pub use internal::{status_handler, world_state_handler};
pub use session::Session;

use std::time::{Duration, Instant};

pub(crate) const LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Returns true at most once per `LOG_THROTTLE` for the given timestamp slot.
pub(crate) fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// A timestamp that lets the first throttled log through immediately.
pub(crate) fn throttle_start() -> Instant {
    let now = Instant::now();
    now.checked_sub(LOG_THROTTLE).unwrap_or(now)
}
