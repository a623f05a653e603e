//! State-change events pushed into the broadcast sink.
//!
//! Events are public: they carry hand *sizes*, never hand contents. The
//! acting caller gets its own cards back in the operation response instead.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PenaltyDraw;
use crate::cards::CardColor;
use crate::randomness::SeedSource;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomEvent {
    pub event_id: Uuid,
    pub room_id: String,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: RoomEventKind,
}

impl RoomEvent {
    pub fn new(room_id: &str, kind: RoomEventKind) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            room_id: room_id.to_string(),
            at: Utc::now(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEventKind {
    PlayerJoined {
        player: String,
        seat: usize,
    },
    GameStarted {
        players: Vec<String>,
    },
    DeckDealt {
        hand_sizes: BTreeMap<String, usize>,
        draw_pile_size: usize,
        seed_source: SeedSource,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    CardDrawn {
        player: String,
        hand_size: usize,
        draw_pile_size: usize,
    },
    CardPlayed {
        player: String,
        card: String,
        active_color: Option<CardColor>,
        #[serde(skip_serializing_if = "Option::is_none")]
        penalty: Option<PenaltyDraw>,
        next_player: Option<String>,
    },
    GameEnded {
        winner: Option<String>,
    },
    RoomReset,
}
