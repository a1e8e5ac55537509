use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Process-unique, monotonically increasing counter seeded from the wall clock.
fn next_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_nanos()));
    counter.fetch_add(1, Ordering::Relaxed)
}

/// Identifier for a new connection; used as its hub registry key and log correlation id.
pub fn conn_id() -> u64 {
    next_id()
}

/// Server-generated player id. Never reused within a running process, so two joins can't
/// overwrite each other's world entry.
pub fn player_id() -> String {
    format!("player_{}", next_id())
}
