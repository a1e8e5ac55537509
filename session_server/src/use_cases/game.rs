use crate::use_cases::world::WorldStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::trace;

/// Periodic world maintenance hook.
///
/// Ticks at a fixed interval for the lifetime of the server. The tick currently performs no
/// simulation; it only samples the population so future world rules have a place to run.
pub async fn world_task(world: Arc<WorldStore>, tick_interval: Duration, shutdown: Arc<Notify>) {
    let mut tick: u64 = 0;
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = interval.tick() => {
                tick += 1;
                let players = world.player_count().await;
                trace!(tick, players, "world tick");
            }
        }
    }
}
