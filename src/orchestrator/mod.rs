//! Ties the room registry, seed sourcing, and event fan-out together into
//! the session operations exposed to the transport layer.
//!
//! Each mutating operation runs inside its room's exclusive section:
//! validate, mutate, publish. Because the publish happens before the lock is
//! released, no reader can observe a transition whose notification is not
//! already queued, and a rejected operation publishes nothing. The only
//! suspension point inside a critical section is the seed fetch during
//! `shuffle_and_deal`, bounded by the randomness provider's timeout.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::broadcast::BroadcastSink;
use crate::randomness::SeedFetcher;
use crate::registry::SessionRegistry;
use crate::session::{
    DealSummary, DrawSummary, GamePhase, GameSession, JoinSummary, PlaySummary, PublicView,
    RoomEvent, RoomEventKind, SessionError,
};
use crate::cards::CardColor;


const LOG_TARGET: &str = "orchestrator";

/// Liveness snapshot for the health surface.
#[derive(Clone, Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub rooms: usize,
}

pub struct RoomOrchestrator {
    rooms: SessionRegistry,
    seeds: Arc<dyn SeedFetcher>,
    sink: Arc<dyn BroadcastSink>,
}

impl RoomOrchestrator {
    pub fn new(seeds: Arc<dyn SeedFetcher>, sink: Arc<dyn BroadcastSink>) -> Self {
        Self {
            rooms: SessionRegistry::new(),
            seeds,
            sink,
        }
    }

    pub async fn join(&self, room_id: &str, player: &str) -> Result<JoinSummary, SessionError> {
        self.rooms
            .with_session(room_id, |mut session| async move {
                let summary = session.join(player)?;
                self.sink.publish(
                    room_id,
                    RoomEvent::new(
                        room_id,
                        RoomEventKind::PlayerJoined {
                            player: summary.player.clone(),
                            seat: summary.seat,
                        },
                    ),
                );
                info!(
                    target = LOG_TARGET,
                    room_id = room_id,
                    player = player,
                    seat = summary.seat,
                    "player joined"
                );
                Ok(summary)
            })
            .await
    }

    pub async fn start(&self, room_id: &str) -> Result<GamePhase, SessionError> {
        self.rooms
            .with_session(room_id, |mut session| async move {
                session.start()?;
                self.sink.publish(
                    room_id,
                    RoomEvent::new(
                        room_id,
                        RoomEventKind::GameStarted {
                            players: session.players().to_vec(),
                        },
                    ),
                );
                info!(
                    target = LOG_TARGET,
                    room_id = room_id,
                    players = session.players().len(),
                    "game started"
                );
                Ok(session.phase())
            })
            .await
    }

    /// Sources a seed, shuffles a fresh deck, and deals it. Validation runs
    /// before the seed fetch so a doomed request never touches the chain.
    pub async fn shuffle_and_deal(
        &self,
        room_id: &str,
        player_count: usize,
        cards_per_player: usize,
    ) -> Result<DealSummary, SessionError> {
        self.rooms
            .with_session(room_id, |mut session| async move {
                session.validate_deal(player_count, cards_per_player)?;
                let seed = self.seeds.get_random_seed().await;
                let summary = session.shuffle_and_deal(player_count, cards_per_player, &seed)?;
                self.sink.publish(
                    room_id,
                    RoomEvent::new(
                        room_id,
                        RoomEventKind::DeckDealt {
                            hand_sizes: session.hand_sizes(),
                            draw_pile_size: summary.draw_pile_size,
                            seed_source: summary.seed_source,
                            request_id: summary.request_id.clone(),
                        },
                    ),
                );
                info!(
                    target = LOG_TARGET,
                    room_id = room_id,
                    players = player_count,
                    cards_per_player = cards_per_player,
                    seed_source = %summary.seed_source,
                    "deck shuffled and dealt"
                );
                Ok(summary)
            })
            .await
    }

    pub async fn draw(&self, room_id: &str, player: &str) -> Result<DrawSummary, SessionError> {
        self.rooms
            .with_session(room_id, |mut session| async move {
                let summary = session.draw(player)?;
                self.sink.publish(
                    room_id,
                    RoomEvent::new(
                        room_id,
                        RoomEventKind::CardDrawn {
                            player: summary.player.clone(),
                            hand_size: summary.hand_size,
                            draw_pile_size: summary.draw_pile_size,
                        },
                    ),
                );
                Ok(summary)
            })
            .await
    }

    pub async fn play(
        &self,
        room_id: &str,
        player: &str,
        card: &str,
        declared_color: Option<CardColor>,
    ) -> Result<PlaySummary, SessionError> {
        self.rooms
            .with_session(room_id, |mut session| async move {
                let summary = session.play(player, card, declared_color)?;
                self.sink.publish(
                    room_id,
                    RoomEvent::new(
                        room_id,
                        RoomEventKind::CardPlayed {
                            player: summary.player.clone(),
                            card: summary.card.clone(),
                            active_color: summary.active_color,
                            penalty: summary.penalty.clone(),
                            next_player: summary.next_player.clone(),
                        },
                    ),
                );
                if let Some(winner) = &summary.winner {
                    self.sink.publish(
                        room_id,
                        RoomEvent::new(
                            room_id,
                            RoomEventKind::GameEnded {
                                winner: Some(winner.clone()),
                            },
                        ),
                    );
                    info!(
                        target = LOG_TARGET,
                        room_id = room_id,
                        winner = %winner,
                        "game won"
                    );
                }
                Ok(summary)
            })
            .await
    }

    pub async fn end(&self, room_id: &str) -> Result<GamePhase, SessionError> {
        self.rooms
            .with_session(room_id, |mut session| async move {
                session.end()?;
                self.sink.publish(
                    room_id,
                    RoomEvent::new(room_id, RoomEventKind::GameEnded { winner: None }),
                );
                info!(target = LOG_TARGET, room_id = room_id, "game ended");
                Ok(session.phase())
            })
            .await
    }

    /// Replaces the session with a fresh one under the same id. Never fails;
    /// lazily creates (then immediately resets) unknown rooms.
    pub async fn reset(&self, room_id: &str) {
        self.rooms
            .with_session(room_id, |mut session| async move {
                *session = GameSession::new(room_id);
                self.sink
                    .publish(room_id, RoomEvent::new(room_id, RoomEventKind::RoomReset));
                info!(target = LOG_TARGET, room_id = room_id, "room reset");
            })
            .await
    }

    /// Read-only projection; `None` for rooms that were never touched.
    pub async fn inspect(&self, room_id: &str) -> Option<PublicView> {
        self.rooms
            .with_session_read(room_id, |session| async move { session.public_view() })
            .await
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok",
            rooms: self.rooms.room_count(),
        }
    }
}
