// Authoritative store of connected players shared by every connection task.

use crate::domain::tuning::PlayerTuning;
use crate::domain::{Player, PlayerView, Position};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

pub type PlayerMap = HashMap<String, Player>;

/// Result of applying a move request against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Position and stamina were updated; carries the new public view.
    Applied(PlayerView),
    /// Step exceeded the per-message limit or coordinates were not finite.
    Rejected,
    /// The player left before the move was applied.
    UnknownPlayer,
}

/// Thread-safe player map. Every operation runs inside one critical section, so no caller can
/// observe another's partial effect; reads of the map may run concurrently.
#[derive(Debug)]
pub struct WorldStore {
    tuning: PlayerTuning,
    players: RwLock<PlayerMap>,
}

impl WorldStore {
    pub fn new(tuning: PlayerTuning) -> Self {
        Self {
            tuning,
            players: RwLock::new(HashMap::new()),
        }
    }

    pub fn tuning(&self) -> PlayerTuning {
        self.tuning
    }

    /// Inserts under the player's id; an existing entry with the same id is replaced.
    pub async fn add_player(&self, player: Player) {
        let mut players = self.players.write().await;
        players.insert(player.id.clone(), player);
    }

    /// Removes the player if present and hands back the removed entry.
    pub async fn remove_player(&self, player_id: &str) -> Option<Player> {
        let mut players = self.players.write().await;
        players.remove(player_id)
    }

    /// Returns a copy of the player; `None` means unknown or already disconnected.
    pub async fn get_player(&self, player_id: &str) -> Option<Player> {
        let players = self.players.read().await;
        players.get(player_id).cloned()
    }

    /// Copies out the public view of every registered player under one read lock.
    pub async fn snapshot(&self) -> Vec<PlayerView> {
        let players = self.players.read().await;
        players.values().map(PlayerView::from).collect()
    }

    pub async fn player_count(&self) -> usize {
        self.players.read().await.len()
    }

    /// Runs a read-only query against a consistent view of the whole map.
    pub async fn inspect<R>(&self, query: impl FnOnce(&PlayerMap) -> R) -> R {
        let players = self.players.read().await;
        query(&players)
    }

    /// Validates and applies a move for `player_id`.
    ///
    /// The step check and the write happen under the same write lock, so the displacement is
    /// always measured from the stored position rather than a stale copy.
    pub async fn apply_move(
        &self,
        player_id: &str,
        target: Position,
        sprinting: bool,
        now: Instant,
    ) -> MoveOutcome {
        if !target.x.is_finite() || !target.y.is_finite() {
            return MoveOutcome::Rejected;
        }

        let mut players = self.players.write().await;
        let Some(player) = players.get_mut(player_id) else {
            return MoveOutcome::UnknownPlayer;
        };

        let max_step = self.tuning.max_move_step;
        if player.position.distance_squared_to(&target) > max_step * max_step {
            return MoveOutcome::Rejected;
        }

        player.position.x = target.x;
        player.position.y = target.y;
        player.stamina.update(sprinting, now);
        MoveOutcome::Applied(player.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Stamina;
    use crate::domain::tuning::StaminaTuning;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn player(id: &str, x: f64, y: f64) -> Player {
        Player::new(
            id.to_string(),
            format!("name-{id}"),
            Position::new(x, y),
            0,
            Stamina::new(StaminaTuning::default(), Instant::now()),
        )
    }

    #[tokio::test]
    async fn when_player_is_added_then_get_and_snapshot_see_it() {
        let world = WorldStore::new(PlayerTuning::default());
        world.add_player(player("p1", 1.0, 2.0)).await;

        let found = world.get_player("p1").await.expect("player should exist");
        assert_eq!(found.position, Position::new(1.0, 2.0));

        let snapshot = world.snapshot().await;
        assert_eq!(
            snapshot,
            vec![PlayerView {
                id: "p1".to_string(),
                name: "name-p1".to_string(),
                x: 1.0,
                y: 2.0,
            }]
        );
    }

    #[tokio::test]
    async fn when_removing_unknown_player_then_it_is_a_no_op() {
        let world = WorldStore::new(PlayerTuning::default());
        world.add_player(player("p1", 0.0, 0.0)).await;

        assert!(world.remove_player("missing").await.is_none());
        assert!(world.remove_player("p1").await.is_some());
        assert!(world.remove_player("p1").await.is_none());
        assert!(world.get_player("p1").await.is_none());
    }

    #[tokio::test]
    async fn when_same_id_is_added_twice_then_last_writer_wins() {
        let world = WorldStore::new(PlayerTuning::default());
        world.add_player(player("p1", 0.0, 0.0)).await;
        world.add_player(player("p1", 9.0, 9.0)).await;

        assert_eq!(world.player_count().await, 1);
        let found = world.get_player("p1").await.expect("player should exist");
        assert_eq!(found.position, Position::new(9.0, 9.0));
    }

    #[tokio::test]
    async fn when_move_is_within_step_limit_then_it_is_applied() {
        let world = WorldStore::new(PlayerTuning::default());
        world.add_player(player("p1", 0.0, 0.0)).await;

        // 30² + 40² = 50², exactly on the limit.
        let outcome = world
            .apply_move("p1", Position::new(30.0, 40.0), false, Instant::now())
            .await;

        assert!(matches!(outcome, MoveOutcome::Applied(ref v) if v.x == 30.0 && v.y == 40.0));
        let found = world.get_player("p1").await.expect("player should exist");
        assert_eq!(found.position, Position::new(30.0, 40.0));
    }

    #[tokio::test]
    async fn when_move_exceeds_step_limit_then_position_is_unchanged() {
        let world = WorldStore::new(PlayerTuning::default());
        world.add_player(player("p1", 0.0, 0.0)).await;

        let outcome = world
            .apply_move("p1", Position::new(1000.0, 1000.0), false, Instant::now())
            .await;

        assert_eq!(outcome, MoveOutcome::Rejected);
        let found = world.get_player("p1").await.expect("player should exist");
        assert_eq!(found.position, Position::new(0.0, 0.0));
    }

    #[tokio::test]
    async fn when_move_is_just_over_step_limit_then_it_is_rejected() {
        let world = WorldStore::new(PlayerTuning::default());
        world.add_player(player("p1", 0.0, 0.0)).await;

        let outcome = world
            .apply_move("p1", Position::new(30.0, 40.001), false, Instant::now())
            .await;

        assert_eq!(outcome, MoveOutcome::Rejected);
    }

    #[tokio::test]
    async fn when_move_has_non_finite_coordinates_then_it_is_rejected() {
        let world = WorldStore::new(PlayerTuning::default());
        world.add_player(player("p1", 0.0, 0.0)).await;

        let outcome = world
            .apply_move("p1", Position::new(f64::NAN, 0.0), false, Instant::now())
            .await;

        assert_eq!(outcome, MoveOutcome::Rejected);
    }

    #[tokio::test]
    async fn when_moving_unknown_player_then_outcome_is_unknown() {
        let world = WorldStore::new(PlayerTuning::default());

        let outcome = world
            .apply_move("ghost", Position::new(1.0, 1.0), false, Instant::now())
            .await;

        assert_eq!(outcome, MoveOutcome::UnknownPlayer);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn when_many_tasks_add_and_remove_concurrently_then_snapshots_stay_consistent() {
        let world = Arc::new(WorldStore::new(PlayerTuning::default()));
        let mut writers = Vec::new();

        for task in 0..8 {
            let world = world.clone();
            writers.push(tokio::spawn(async move {
                for i in 0..200 {
                    let id = format!("t{task}-{}", i % 10);
                    world.add_player(player(&id, i as f64, i as f64)).await;
                    if i % 3 == 0 {
                        world.remove_player(&id).await;
                    }
                }
            }));
        }

        let reader = {
            let world = world.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let snapshot = world.snapshot().await;
                    let mut seen = HashSet::new();
                    for view in &snapshot {
                        assert!(seen.insert(view.id.clone()), "duplicate id {}", view.id);
                        // Every entry is written whole: name and coordinates come from one insert.
                        assert_eq!(view.name, format!("name-{}", view.id));
                        assert_eq!(view.x, view.y);
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        for writer in writers {
            writer.await.expect("writer task panicked");
        }
        reader.await.expect("reader task panicked");

        assert!(world.player_count().await <= 80);
    }
}
