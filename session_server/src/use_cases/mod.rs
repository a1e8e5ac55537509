// Use cases layer: shared world state and the workflows that read or mutate it.

pub mod game;
pub mod interactions;
pub mod world;

pub use game::world_task;
pub use interactions::InteractionResolver;
pub use world::{MoveOutcome, WorldStore};
