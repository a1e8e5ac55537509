// Per-connection session logic: the join state machine and handling of each decoded client
// message. Transport concerns (socket reads, writes, keepalive) live in `client.rs`.

use crate::domain::{InteractionKind, InteractionRequest, Player, Position, Stamina};
use crate::interface_adapters::net::hub::{ConnId, Delivery};
use crate::interface_adapters::net::{should_log, throttle_start};
use crate::interface_adapters::protocol::{
    ChatPayload, ClientMessage, InteractionOptionDto, JoinPayload, MovePayload, NearbyPlayerDto,
    PlayerInteractPayload, PlayerStateDto, ServerMessage,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::player_id;
use crate::use_cases::MoveOutcome;

use std::sync::Arc;
use std::time::Instant;
use tracing::{Span, debug, info, warn};

pub const GUEST_NAME: &str = "Guest";
pub const MAX_NAME_CHARS: usize = 32;

#[derive(Debug, Clone)]
struct JoinedPlayer {
    id: String,
    name: String,
}

/// Server-side endpoint for one connection.
///
/// Starts without a player; a `join` creates one and every other message is ignored until then.
/// `teardown` consumes the session, so the leave sequence can only run once per connection.
pub struct Session {
    conn_id: ConnId,
    state: Arc<AppState>,
    player: Option<JoinedPlayer>,

    dropped_frames: u64,
    rejected_moves: u64,

    last_ignored_log: Instant,
    last_rejected_move_log: Instant,
    last_dropped_log: Instant,
}

impl Session {
    pub fn new(conn_id: ConnId, state: Arc<AppState>) -> Self {
        let start = throttle_start();
        Self {
            conn_id,
            state,
            player: None,
            dropped_frames: 0,
            rejected_moves: 0,
            last_ignored_log: start,
            last_rejected_move_log: start,
            last_dropped_log: start,
        }
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player.as_ref().map(|p| p.id.as_str())
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn rejected_moves(&self) -> u64 {
        self.rejected_moves
    }

    /// Applies one decoded client message. Protocol-local failures never escape: they are
    /// dropped or answered with a failure result to this connection only.
    pub async fn handle(&mut self, msg: ClientMessage) {
        if let ClientMessage::Join(payload) = msg {
            self.join(payload).await;
            return;
        }

        let Some(player) = self.player.clone() else {
            if should_log(&mut self.last_ignored_log) {
                debug!(conn_id = self.conn_id, "message before join ignored");
            }
            return;
        };

        match msg {
            ClientMessage::Join(_) => {}
            ClientMessage::Move(payload) => self.apply_move(&player, payload).await,
            ClientMessage::Chat(payload) => self.chat(&player, payload).await,
            ClientMessage::PlayerInteract(payload) => self.interact(&player, payload).await,
            ClientMessage::GetNearbyPlayers => self.nearby(&player).await,
        }
    }

    async fn join(&mut self, payload: JoinPayload) {
        if let Some(existing) = &self.player {
            if should_log(&mut self.last_ignored_log) {
                warn!(player_id = %existing.id, "duplicate join ignored");
            }
            return;
        }

        let name = self.resolve_name(&payload).await;
        let position = if payload.x.is_finite() && payload.y.is_finite() {
            Position::new(payload.x, payload.y)
        } else {
            Position::default()
        };
        let player = Player::new(
            player_id(),
            name,
            position,
            self.conn_id,
            Stamina::new(self.state.stamina, Instant::now()),
        );
        let joined = JoinedPlayer {
            id: player.id.clone(),
            name: player.name.clone(),
        };
        let dto = PlayerStateDto::from(&player);

        self.state.world.add_player(player).await;
        self.player = Some(joined.clone());
        Span::current().record("player_id", joined.id.as_str());

        // The new client sees its identity, then the snapshot, before any later broadcast.
        let queued = self
            .state
            .hub
            .send_intro(
                self.conn_id,
                &ServerMessage::YourPlayer(dto.clone()),
                &self.state.world,
            )
            .await;
        self.dropped_frames += 2 - queued as u64;

        let report = self
            .state
            .hub
            .broadcast_except(&ServerMessage::PlayerJoined(dto), self.conn_id)
            .await;

        info!(
            player_id = %joined.id,
            name = %joined.name,
            x = position.x,
            y = position.y,
            notified = report.delivered,
            "player joined"
        );
    }

    /// Display name for a join: a validated token's identity wins, otherwise the supplied name.
    async fn resolve_name(&self, payload: &JoinPayload) -> String {
        let token = payload.token.as_deref().map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return sanitize_name(&payload.name);
        }

        let Some(validator) = &self.state.validator else {
            debug!(conn_id = self.conn_id, "join token ignored; no validator configured");
            return sanitize_name(&payload.name);
        };

        match validator.verify_token(token).await {
            Ok(identity) => {
                debug!(
                    user_id = identity.user_id,
                    session_id = %identity.session_id,
                    "join token verified"
                );
                sanitize_name(&identity.display_name)
            }
            Err(e) => {
                warn!(conn_id = self.conn_id, error = ?e, "join token rejected; joining as guest");
                sanitize_name(&payload.name)
            }
        }
    }

    async fn apply_move(&mut self, player: &JoinedPlayer, payload: MovePayload) {
        let outcome = self
            .state
            .world
            .apply_move(
                &player.id,
                Position::new(payload.x, payload.y),
                payload.sprinting,
                Instant::now(),
            )
            .await;

        match outcome {
            MoveOutcome::Applied(view) => {
                self.state
                    .hub
                    .broadcast(&ServerMessage::PlayerMoved {
                        id: view.id,
                        x: view.x,
                        y: view.y,
                    })
                    .await;
            }
            MoveOutcome::Rejected => {
                self.rejected_moves += 1;
                if should_log(&mut self.last_rejected_move_log) {
                    warn!(
                        player_id = %player.id,
                        x = payload.x,
                        y = payload.y,
                        "move rejected"
                    );
                }
            }
            MoveOutcome::UnknownPlayer => {
                warn!(player_id = %player.id, "move for player missing from world");
            }
        }
    }

    async fn chat(&mut self, player: &JoinedPlayer, payload: ChatPayload) {
        if payload.message.is_empty() {
            return;
        }
        self.state
            .hub
            .broadcast(&ServerMessage::ChatMessage {
                name: player.name.clone(),
                message: payload.message,
            })
            .await;
    }

    async fn interact(&mut self, player: &JoinedPlayer, payload: PlayerInteractPayload) {
        let request = InteractionRequest {
            from_player_id: player.id.clone(),
            to_player_id: payload.to_player_id,
            kind: InteractionKind::parse(&payload.interaction_type),
            data: payload.data,
        };
        let result = self.state.resolver.resolve(&request).await;
        debug!(
            player_id = %player.id,
            to = %request.to_player_id,
            interaction = %payload.interaction_type,
            success = result.success,
            "interaction resolved"
        );

        self.reply(&ServerMessage::InteractionResult {
            result: result.into(),
        })
        .await;
    }

    async fn nearby(&mut self, player: &JoinedPlayer) {
        let resolver = &self.state.resolver;
        let mut nearby_players = Vec::new();
        for other in resolver.nearby_players(&player.id).await {
            let interactions = resolver
                .available_interactions(&player.id, &other.id)
                .await
                .iter()
                .map(InteractionOptionDto::from)
                .collect();
            nearby_players.push(NearbyPlayerDto {
                id: other.id,
                name: other.name,
                x: other.position.x,
                y: other.position.y,
                interactions,
            });
        }

        self.reply(&ServerMessage::NearbyPlayers { nearby_players })
            .await;
    }

    async fn reply(&mut self, msg: &ServerMessage) {
        if self.state.hub.send_to(self.conn_id, msg).await == Delivery::Dropped {
            self.dropped_frames += 1;
            if should_log(&mut self.last_dropped_log) {
                warn!(conn_id = self.conn_id, "outbound queue full; reply dropped");
            }
        }
    }

    /// Leave sequence: drop the player from the world, tell everyone else, then unregister,
    /// which closes this connection's outbound queue. Runs for joined and unjoined sessions.
    pub async fn teardown(self) {
        if let Some(joined) = &self.player {
            if let Some(removed) = self.state.world.remove_player(&joined.id).await {
                self.state
                    .hub
                    .broadcast_except(&ServerMessage::PlayerLeft { id: removed.id }, self.conn_id)
                    .await;
                info!(player_id = %joined.id, name = %joined.name, "player left");
            }
        }

        self.state.hub.unregister(self.conn_id).await;
    }
}

/// Trimmed display name, or `GUEST_NAME` when empty or longer than `MAX_NAME_CHARS`.
pub fn sanitize_name(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        GUEST_NAME.to_string()
    } else {
        name.to_string()
    }
}
