//! HTTP surface: REST operations per room, an SSE event feed, and liveness.

pub mod bootstrap;
pub mod dto;
pub mod error;
mod logging;
pub mod routes;

pub use bootstrap::run_server;
pub use error::ApiError;
pub use routes::{RoomServer, ServerContext};
