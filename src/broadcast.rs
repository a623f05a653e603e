//! Room-scoped event fan-out.
//!
//! The orchestrator publishes from inside each room's critical section, so a
//! channel's send order is the room's commit order. Delivery is
//! fire-and-forget: a room with no subscribers drops events silently, and a
//! lagging subscriber loses the oldest events rather than applying
//! backpressure to gameplay.

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::session::RoomEvent;

const LOG_TARGET: &str = "broadcast";

/// Sink the orchestrator pushes state-change events into.
pub trait BroadcastSink: Send + Sync {
    fn publish(&self, room_id: &str, event: RoomEvent);
}

/// Broadcast-channel-per-room implementation backing the SSE event feed.
pub struct ChannelBroadcaster {
    capacity: usize,
    channels: DashMap<String, broadcast::Sender<RoomEvent>>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: DashMap::new(),
        }
    }

    fn sender(&self, room_id: &str) -> broadcast::Sender<RoomEvent> {
        self.channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .value()
            .clone()
    }

    /// Subscribe to a room's events; usable before the room exists.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        self.sender(room_id).subscribe()
    }
}

impl BroadcastSink for ChannelBroadcaster {
    fn publish(&self, room_id: &str, event: RoomEvent) {
        // Err means no live subscribers, which is fine.
        if self.sender(room_id).send(event).is_err() {
            tracing::debug!(
                target = LOG_TARGET,
                room_id = room_id,
                "event dropped, no subscribers"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RoomEventKind;

    #[tokio::test]
    async fn events_reach_subscribers_in_publish_order() {
        let broadcaster = ChannelBroadcaster::new(16);
        let mut rx = broadcaster.subscribe("room-a");

        for seat in 0..3 {
            broadcaster.publish(
                "room-a",
                RoomEvent::new(
                    "room-a",
                    RoomEventKind::PlayerJoined {
                        player: format!("p{seat}"),
                        seat,
                    },
                ),
            );
        }

        for seat in 0..3 {
            let event = rx.recv().await.unwrap();
            assert_eq!(
                event.kind,
                RoomEventKind::PlayerJoined {
                    player: format!("p{seat}"),
                    seat,
                }
            );
        }
    }

    #[tokio::test]
    async fn rooms_have_independent_channels() {
        let broadcaster = ChannelBroadcaster::new(16);
        let mut rx_a = broadcaster.subscribe("room-a");
        let mut rx_b = broadcaster.subscribe("room-b");

        broadcaster.publish("room-a", RoomEvent::new("room-a", RoomEventKind::RoomReset));
        let event = rx_a.recv().await.unwrap();
        assert_eq!(event.room_id, "room-a");
        assert!(rx_b.try_recv().is_err(), "room-b must see nothing");
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let broadcaster = ChannelBroadcaster::new(16);
        broadcaster.publish("room-a", RoomEvent::new("room-a", RoomEventKind::RoomReset));
    }
}
