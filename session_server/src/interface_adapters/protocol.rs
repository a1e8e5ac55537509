// Wire protocol DTOs and conversions for the public WebSocket session protocol.
// Every frame is a JSON object whose `type` field selects the variant; payload fields sit
// beside it at the top level.

use crate::domain::{InteractionOption, InteractionResult, Player, PlayerView};
use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    // Creates the connection's player; the only message accepted before joining.
    Join(JoinPayload),
    Move(MovePayload),
    Chat(ChatPayload),
    PlayerInteract(PlayerInteractPayload),
    GetNearbyPlayers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    // Optional session token; verified when a validator is configured.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovePayload {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub sprinting: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInteractPayload {
    #[serde(default)]
    pub to_player_id: String,
    #[serde(default)]
    pub interaction_type: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    // Identity of the player created by this connection's join.
    YourPlayer(PlayerStateDto),
    // Full snapshot of every connected player.
    WorldState { players: Vec<PlayerStateDto> },
    PlayerJoined(PlayerStateDto),
    PlayerLeft { id: String },
    PlayerMoved { id: String, x: f64, y: f64 },
    ChatMessage { name: String, message: String },
    InteractionResult { result: InteractionResultDto },
    NearbyPlayers { nearby_players: Vec<NearbyPlayerDto> },
}

impl ServerMessage {
    pub fn world_state(players: &[PlayerView]) -> Self {
        ServerMessage::WorldState {
            players: players.iter().map(PlayerStateDto::from).collect(),
        }
    }

    /// Serializes once into shared UTF-8 bytes that can be cloned into many queues.
    pub fn to_frame(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}

/// Public player fields as sent on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateDto {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl From<&PlayerView> for PlayerStateDto {
    fn from(view: &PlayerView) -> Self {
        Self {
            id: view.id.clone(),
            name: view.name.clone(),
            x: view.x,
            y: view.y,
        }
    }
}

impl From<&Player> for PlayerStateDto {
    fn from(player: &Player) -> Self {
        Self::from(&player.view())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionResultDto {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<InteractionResult> for InteractionResultDto {
    fn from(result: InteractionResult) -> Self {
        Self {
            success: result.success,
            message: result.message,
            data: result.data,
            action: result.action,
            error: result.error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionOptionDto {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub enabled: bool,
}

impl From<&InteractionOption> for InteractionOptionDto {
    fn from(option: &InteractionOption) -> Self {
        Self {
            kind: option.kind.as_str(),
            label: option.label,
            icon: option.icon,
            enabled: option.enabled,
        }
    }
}

/// A nearby player together with the interactions the requester may attempt.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyPlayerDto {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub interactions: Vec<InteractionOptionDto>,
}
