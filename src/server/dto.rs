use serde::{Deserialize, Serialize};

use crate::session::GamePhase;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub player: String,
}

#[derive(Debug, Deserialize)]
pub struct DealRequest {
    pub player_count: usize,
    pub cards_per_player: usize,
}

#[derive(Debug, Deserialize)]
pub struct DrawRequest {
    pub player: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub player: String,
    pub card: String,
    /// Required when `card` is a wild; e.g. `"R"` or `"red"`.
    pub declared_color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhaseResponse {
    pub phase: GamePhase,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub status: &'static str,
}
