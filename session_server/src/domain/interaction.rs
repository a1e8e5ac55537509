// Player-to-player interaction kinds, requests and outcomes.

use serde_json::Value;

/// Closed set of interactions a player can direct at another nearby player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    ViewStats,
    Trade,
    Challenge,
    SendMessage,
    AddFriend,
    Block,
}

impl InteractionKind {
    /// Catalog order advertised to clients.
    pub const ALL: [InteractionKind; 6] = [
        InteractionKind::ViewStats,
        InteractionKind::Trade,
        InteractionKind::Challenge,
        InteractionKind::SendMessage,
        InteractionKind::AddFriend,
        InteractionKind::Block,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::ViewStats => "view_stats",
            InteractionKind::Trade => "trade",
            InteractionKind::Challenge => "challenge",
            InteractionKind::SendMessage => "send_message",
            InteractionKind::AddFriend => "add_friend",
            InteractionKind::Block => "block",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            InteractionKind::ViewStats => "View Stats",
            InteractionKind::Trade => "Trade Items",
            InteractionKind::Challenge => "Challenge to Duel",
            InteractionKind::SendMessage => "Send Message",
            InteractionKind::AddFriend => "Add Friend",
            InteractionKind::Block => "Block Player",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            InteractionKind::ViewStats => "📊",
            InteractionKind::Trade => "🤝",
            InteractionKind::Challenge => "⚔️",
            InteractionKind::SendMessage => "💬",
            InteractionKind::AddFriend => "👥",
            InteractionKind::Block => "🚫",
        }
    }
}

/// One entry of the capability catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOption {
    pub kind: InteractionKind,
    pub label: &'static str,
    pub icon: &'static str,
    pub enabled: bool,
}

impl From<InteractionKind> for InteractionOption {
    fn from(kind: InteractionKind) -> Self {
        Self {
            kind,
            label: kind.label(),
            icon: kind.icon(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InteractionRequest {
    pub from_player_id: String,
    pub to_player_id: String,
    // None when the client named a kind the server does not know.
    pub kind: Option<InteractionKind>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionResult {
    pub success: bool,
    pub message: String,
    pub action: Option<String>,
    pub data: Option<Value>,
    pub error: Option<String>,
}

pub const ERR_PLAYER_NOT_FOUND: &str = "player not found";
pub const ERR_TOO_FAR: &str = "players too far apart";
pub const ERR_UNKNOWN_KIND: &str = "unknown interaction type";

impl InteractionResult {
    pub fn succeeded(message: impl Into<String>, action: &str, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            action: Some(action.to_string()),
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            action: None,
            data: None,
            error: Some(error.to_string()),
        }
    }

    pub fn player_not_found() -> Self {
        Self::failed("Player not found", ERR_PLAYER_NOT_FOUND)
    }

    pub fn too_far_apart() -> Self {
        Self::failed("Player is too far away", ERR_TOO_FAR)
    }

    pub fn unknown_kind() -> Self {
        Self::failed("Unknown interaction type", ERR_UNKNOWN_KIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_parsing_wire_names_then_every_kind_round_trips() {
        for kind in InteractionKind::ALL {
            assert_eq!(InteractionKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn when_kind_is_unrecognized_then_parse_returns_none() {
        assert_eq!(InteractionKind::parse("dance"), None);
        assert_eq!(InteractionKind::parse("Trade"), None);
    }
}
