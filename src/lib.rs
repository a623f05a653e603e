pub mod broadcast;
pub mod cards;
pub mod config;
pub mod orchestrator;
pub mod randomness;
pub mod registry;
pub mod server;
pub mod session;
pub mod shuffle;

pub use cards::{Card, CardColor, CardFace, DECK_SIZE};
pub use orchestrator::RoomOrchestrator;
pub use session::{GamePhase, GameSession, SessionError};
