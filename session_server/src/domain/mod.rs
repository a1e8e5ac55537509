// Domain layer: player state, interaction rules and collaborator ports.

pub mod interaction;
pub mod player;
pub mod ports;
pub mod tuning;

pub use interaction::{InteractionKind, InteractionOption, InteractionRequest, InteractionResult};
pub use player::{Player, PlayerView, Position, Stamina, StaminaInfo};
pub use ports::{Identity, TokenValidator, VerifyTokenError};
