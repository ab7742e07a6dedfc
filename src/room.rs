use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::config::Tuning;
use crate::input::MoveKeys;
use crate::interaction::Interaction;
use crate::kitchen::{Kitchen, KitchenSnapshot};
use crate::layout::{KitchenLayout, LayoutError};
use crate::protocol::{ClientMessage, LayoutData, ServerMessage};

/// One connected kitchen session and its outbound message channel.
pub struct KitchenRoom {
    pub id: String,
    pub kitchen_id: String,
    kitchen: RwLock<Kitchen>,
    layout_data: LayoutData,
    tick_period: Duration,
    notice_ms: u64,
    broadcast_tx: broadcast::Sender<ServerMessage>,
}

impl KitchenRoom {
    pub fn new(
        layout: Arc<KitchenLayout>,
        tuning: Tuning,
        tick_period: Duration,
    ) -> Result<Self, LayoutError> {
        let (tx, _) = broadcast::channel(256);
        let layout_data = LayoutData::new(&layout, &tuning);
        let notice_ms = tuning.notice_duration_ms;
        let kitchen_id = layout.id.clone();
        let kitchen = Kitchen::new(layout, tuning)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            kitchen_id,
            kitchen: RwLock::new(kitchen),
            layout_data,
            tick_period,
            notice_ms,
            broadcast_tx: tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.broadcast_tx.subscribe()
    }

    fn broadcast(&self, msg: ServerMessage) {
        // Ignore send errors (no receivers)
        let _ = self.broadcast_tx.send(msg);
    }

    pub fn welcome_message(&self) -> ServerMessage {
        ServerMessage::Welcome {
            session_id: self.id.clone(),
            kitchen_id: self.kitchen_id.clone(),
        }
    }

    pub fn layout_message(&self) -> ServerMessage {
        ServerMessage::KitchenLayout(self.layout_data.clone())
    }

    pub async fn snapshot(&self) -> KitchenSnapshot {
        self.kitchen.read().await.snapshot()
    }

    /// Advance the session by one fixed tick period and publish the result.
    pub async fn tick(&self) {
        let (events, snapshot) = {
            let mut kitchen = self.kitchen.write().await;
            kitchen.tick(self.tick_period);
            (kitchen.drain_events(), kitchen.snapshot())
        };

        for event in events {
            self.broadcast(event.into());
        }
        self.broadcast(ServerMessage::StateSync(snapshot));
    }

    pub async fn handle_message(&self, msg: ClientMessage) {
        match msg {
            ClientMessage::Keys { pressed } => self.handle_keys(&pressed).await,
            ClientMessage::Interact => self.handle_interact().await,
            ClientMessage::Reset => self.handle_reset().await,
        }
    }

    pub async fn handle_keys(&self, pressed: &[String]) {
        let keys = MoveKeys::from_pressed(pressed);
        self.kitchen.write().await.set_keys(keys);
    }

    pub async fn handle_interact(&self) {
        let (result, events, served) = {
            let mut kitchen = self.kitchen.write().await;
            let result = kitchen.interact();
            (result, kitchen.drain_events(), kitchen.served())
        };

        for event in events {
            self.broadcast(event.into());
        }

        match result {
            Ok(interaction) => {
                if let Interaction::Served { plate, ingredients } = &interaction {
                    self.broadcast(ServerMessage::DishServed {
                        plate: *plate,
                        ingredients: ingredients.clone(),
                        served,
                    });
                }
                self.broadcast(ServerMessage::InteractResult {
                    success: true,
                    interaction: Some(interaction),
                    reason: None,
                });
            }
            Err(error) => {
                for msg in ServerMessage::interaction_failed(error, self.notice_ms) {
                    self.broadcast(msg);
                }
            }
        }
    }

    /// Tell the client a message it sent could not be handled.
    pub fn report_error(&self, code: u32, message: String) {
        self.broadcast(ServerMessage::Error { code, message });
    }

    pub async fn handle_reset(&self) {
        let snapshot = {
            let mut kitchen = self.kitchen.write().await;
            kitchen.reset();
            kitchen.snapshot()
        };
        info!("Room {} reset", self.id);
        self.broadcast(ServerMessage::StateSync(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> KitchenRoom {
        KitchenRoom::new(
            Arc::new(KitchenLayout::classic()),
            Tuning::default(),
            Duration::from_millis(50),
        )
        .unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn types(messages: &[ServerMessage]) -> Vec<&'static str> {
        messages.iter().map(|m| m.msg_type()).collect()
    }

    #[tokio::test]
    async fn test_tick_publishes_state() {
        let room = room();
        let mut rx = room.subscribe();

        room.tick().await;
        room.tick().await;

        let messages = drain(&mut rx);
        assert_eq!(types(&messages), vec!["stateSync", "stateSync"]);
        match &messages[1] {
            ServerMessage::StateSync(snapshot) => assert_eq!(snapshot.tick, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_interaction_sends_notice() {
        let room = room();
        let mut rx = room.subscribe();

        room.handle_message(ClientMessage::Interact).await;

        let messages = drain(&mut rx);
        assert_eq!(types(&messages), vec!["interactResult", "notice"]);
        match &messages[1] {
            ServerMessage::Notice { kind, duration_ms, .. } => {
                assert_eq!(*kind, "nothing_nearby");
                assert_eq!(*duration_ms, 2000);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(room.snapshot().await.notice.is_some());
    }

    #[tokio::test]
    async fn test_walk_to_serving_station() {
        let room = room();

        room.handle_keys(&["d".to_string()]).await;
        for _ in 0..14 {
            room.tick().await;
        }
        room.handle_keys(&["s".to_string()]).await;
        for _ in 0..20 {
            room.tick().await;
        }
        room.handle_keys(&[]).await;

        let player = room.snapshot().await.player;
        assert!((player.x - 4.2).abs() < 1e-3);
        assert!(player.y > -2.25 && player.y < -2.0, "stopped at {}", player.y);

        let mut rx = room.subscribe();
        room.handle_interact().await;
        match &drain(&mut rx)[1] {
            ServerMessage::Notice { kind, .. } => assert_eq!(*kind, "nothing_to_serve"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reset_returns_to_spawn() {
        let room = room();
        room.handle_keys(&["ArrowLeft".to_string()]).await;
        room.tick().await;
        assert!(room.snapshot().await.player.x < 0.0);

        let mut rx = room.subscribe();
        room.handle_message(ClientMessage::Reset).await;

        let messages = drain(&mut rx);
        assert_eq!(types(&messages), vec!["stateSync"]);
        let snapshot = room.snapshot().await;
        assert_eq!((snapshot.player.x, snapshot.player.y), (0.0, -1.5));
    }

    #[test]
    fn test_report_error() {
        let room = room();
        let mut rx = room.subscribe();
        room.report_error(400, "Unknown message type: dance".to_string());
        assert_eq!(types(&drain(&mut rx)), vec!["error"]);
    }

    #[test]
    fn test_layout_message() {
        let room = room();
        assert_eq!(room.kitchen_id, "classic");
        assert_eq!(room.layout_message().msg_type(), "kitchenLayout");
        assert_eq!(room.welcome_message().msg_type(), "welcome");
    }
}
