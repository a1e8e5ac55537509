// Proximity queries and player-to-player interaction dispatch.

use crate::domain::interaction::{InteractionKind, InteractionOption, InteractionRequest, InteractionResult};
use crate::domain::Player;
use crate::use_cases::world::WorldStore;
use serde_json::{Value, json};
use std::sync::Arc;

pub struct InteractionResolver {
    world: Arc<WorldStore>,
    radius: f64,
}

impl InteractionResolver {
    pub fn new(world: Arc<WorldStore>) -> Self {
        let radius = world.tuning().interaction_radius;
        Self { world, radius }
    }

    /// Every other player within the interaction radius of `origin_id`'s current position.
    /// Unknown origins yield an empty list.
    pub async fn nearby_players(&self, origin_id: &str) -> Vec<Player> {
        let radius = self.radius;
        self.world
            .inspect(|players| {
                let Some(origin) = players.get(origin_id) else {
                    return Vec::new();
                };
                players
                    .values()
                    .filter(|other| other.id != origin_id)
                    .filter(|other| origin.position.distance_to(&other.position) <= radius)
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Capability catalog for a pair of live players. No distance check; `resolve` re-validates
    /// it when an interaction is attempted.
    pub async fn available_interactions(
        &self,
        from_id: &str,
        to_id: &str,
    ) -> Vec<InteractionOption> {
        let both_known = self
            .world
            .inspect(|players| players.contains_key(from_id) && players.contains_key(to_id))
            .await;
        if !both_known {
            return Vec::new();
        }
        InteractionKind::ALL
            .into_iter()
            .map(InteractionOption::from)
            .collect()
    }

    /// Resolves a request into a result. Failures are returned as data, never as errors.
    pub async fn resolve(&self, request: &InteractionRequest) -> InteractionResult {
        // Read both players under one lock so the distance is measured on a consistent pair.
        let pair = self
            .world
            .inspect(|players| {
                let from = players.get(&request.from_player_id)?.clone();
                let to = players.get(&request.to_player_id)?.clone();
                Some((from, to))
            })
            .await;

        let Some((from, to)) = pair else {
            return InteractionResult::player_not_found();
        };

        if from.position.distance_to(&to.position) > self.radius {
            return InteractionResult::too_far_apart();
        }

        let Some(kind) = request.kind else {
            return InteractionResult::unknown_kind();
        };

        dispatch(kind, &from, &to, request.data.as_ref())
    }
}

fn dispatch(
    kind: InteractionKind,
    from: &Player,
    to: &Player,
    data: Option<&Value>,
) -> InteractionResult {
    match kind {
        InteractionKind::ViewStats => view_stats(to),
        InteractionKind::Trade => InteractionResult::succeeded(
            "Trade request sent!",
            "show_trade_window",
            json!({
                "trade_initiated": true,
                "from_player": from.name,
                "to_player": to.name,
            }),
        ),
        InteractionKind::Challenge => InteractionResult::succeeded(
            "Duel challenge sent",
            "send_duel_challenge",
            json!({
                "challenge_sent": true,
                "challenger": from.name,
                "challenged": to.name,
            }),
        ),
        InteractionKind::SendMessage => send_message(from, to, data),
        InteractionKind::AddFriend => InteractionResult::succeeded(
            "Friend request sent!",
            "send_friend_request",
            json!({
                "friend_request_sent": true,
                "from": from.name,
                "to": to.name,
            }),
        ),
        InteractionKind::Block => InteractionResult::succeeded(
            "Player blocked successfully",
            "block_player",
            json!({
                "blocked_player": to.name,
                "blocker": from.name,
            }),
        ),
    }
}

fn view_stats(target: &Player) -> InteractionResult {
    let stamina = target.stamina.info();
    // TODO: replace the fixed level/attribute values once a progression system exists.
    InteractionResult::succeeded(
        "Stats viewed successfully",
        "show_player_stats",
        json!({
            "player_name": target.name,
            "player_id": target.id,
            "level": 1,
            "position": { "x": target.position.x, "y": target.position.y },
            "stats": {
                "health": 100,
                "max_health": 100,
                "mana": 50,
                "max_mana": 50,
                "stamina": stamina.current,
                "max_stamina": stamina.max,
                "can_sprint": stamina.can_sprint,
            },
            "attributes": {
                "strength": 10,
                "agility": 8,
                "intelligence": 12,
                "defense": 6,
            },
        }),
    )
}

fn send_message(from: &Player, to: &Player, data: Option<&Value>) -> InteractionResult {
    // Message delivery is acknowledgement-only; the client payload is echoed back untouched.
    let mut ack = json!({
        "message_sent": true,
        "from": from.name,
        "to": to.name,
    });
    if let (Some(payload), Some(obj)) = (data, ack.as_object_mut()) {
        obj.insert("payload".to_string(), payload.clone());
    }
    InteractionResult::succeeded("Message sent", "send_private_message", ack)
}
