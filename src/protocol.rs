use serde::Serialize;

use crate::collision::Position;
use crate::config::Tuning;
use crate::interaction::{InteractError, Interaction};
use crate::item::{Ingredient, ItemId, ProcessingState};
use crate::kitchen::{KitchenEvent, KitchenSnapshot};
use crate::layout::{KitchenLayout, StationKind};
use crate::processing::ProcessKind;

/// Colyseus ROOM_DATA code, the first element of every frame
pub const ROOM_DATA: u8 = 13;

// ============================================================================
// Client -> Server Messages
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Full set of currently held keys
    Keys { pressed: Vec<String> },
    Interact,
    Reset,
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Welcome {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "kitchenId")]
        kitchen_id: String,
    },
    KitchenLayout(LayoutData),
    StateSync(KitchenSnapshot),
    InteractResult {
        success: bool,
        interaction: Option<Interaction>,
        reason: Option<String>,
    },
    Notice {
        kind: &'static str,
        message: String,
        #[serde(rename = "durationMs")]
        duration_ms: u64,
    },
    ItemProcessed {
        counter: usize,
        process: ProcessKind,
        consumed: ItemId,
        item: ItemId,
        ingredient: Ingredient,
        state: ProcessingState,
    },
    ProcessingAbandoned {
        counter: usize,
        process: ProcessKind,
    },
    DishServed {
        plate: ItemId,
        ingredients: Vec<Ingredient>,
        served: u32,
    },
    Error {
        code: u32,
        message: String,
    },
}

/// Static kitchen geometry, sent once after `welcome`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutData {
    pub id: String,
    pub display_name: String,
    pub half_extent: f32,
    pub station_size: f32,
    pub counter_size: f32,
    pub player_size: f32,
    pub interaction_radius: f32,
    pub spawn: Position,
    pub stations: Vec<StationData>,
    pub counters: Vec<CounterData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationData {
    pub kind: StationKind,
    pub x: f32,
    pub y: f32,
    pub counter: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterData {
    pub id: usize,
    pub x: f32,
    pub y: f32,
}

impl LayoutData {
    pub fn new(layout: &KitchenLayout, tuning: &Tuning) -> Self {
        Self {
            id: layout.id.clone(),
            display_name: layout.display_name.clone(),
            half_extent: layout.half_extent,
            station_size: layout.station_size,
            counter_size: layout.counter_size,
            player_size: tuning.player_size,
            interaction_radius: tuning.interaction_radius,
            spawn: layout.spawn,
            stations: layout
                .stations()
                .iter()
                .map(|s| StationData {
                    kind: s.kind,
                    x: s.position.x,
                    y: s.position.y,
                    counter: s.counter,
                })
                .collect(),
            counters: layout
                .counters
                .iter()
                .enumerate()
                .map(|(id, c)| CounterData {
                    id,
                    x: c.position.x,
                    y: c.position.y,
                })
                .collect(),
        }
    }
}

impl ServerMessage {
    pub fn msg_type(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::KitchenLayout(_) => "kitchenLayout",
            ServerMessage::StateSync(_) => "stateSync",
            ServerMessage::InteractResult { .. } => "interactResult",
            ServerMessage::Notice { .. } => "notice",
            ServerMessage::ItemProcessed { .. } => "itemProcessed",
            ServerMessage::ProcessingAbandoned { .. } => "processingAbandoned",
            ServerMessage::DishServed { .. } => "dishServed",
            ServerMessage::Error { .. } => "error",
        }
    }

    pub fn interaction_failed(error: InteractError, notice_ms: u64) -> [ServerMessage; 2] {
        [
            ServerMessage::InteractResult {
                success: false,
                interaction: None,
                reason: Some(error.kind().to_string()),
            },
            ServerMessage::Notice {
                kind: error.kind(),
                message: error.to_string(),
                duration_ms: notice_ms,
            },
        ]
    }
}

impl From<KitchenEvent> for ServerMessage {
    fn from(event: KitchenEvent) -> Self {
        match event {
            KitchenEvent::ItemProcessed {
                counter,
                kind,
                consumed,
                item,
                ingredient,
                state,
            } => ServerMessage::ItemProcessed {
                counter,
                process: kind,
                consumed,
                item,
                ingredient,
                state,
            },
            KitchenEvent::ProcessingAbandoned { counter, kind } => {
                ServerMessage::ProcessingAbandoned {
                    counter,
                    process: kind,
                }
            }
        }
    }
}

// ============================================================================
// Encoding/Decoding
// ============================================================================

/// Encode a server message to MessagePack.
/// Format: [13, "msgType", {data}]
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, String> {
    rmp_serde::to_vec_named(&(ROOM_DATA, msg.msg_type(), msg))
        .map_err(|e| format!("Failed to encode message: {}", e))
}

/// Decode a client message from MessagePack.
/// Expected format: [13, "msgType", {data}]
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, String> {
    use rmpv::Value;
    use std::io::Cursor;

    let mut cursor = Cursor::new(data);
    let value = rmpv::decode::read_value(&mut cursor)
        .map_err(|e| format!("Failed to decode MessagePack: {}", e))?;

    let array = value.as_array().ok_or("Expected array")?;

    if array.len() < 2 {
        return Err("Array too short".to_string());
    }

    let protocol = array[0].as_u64().ok_or("Protocol code must be integer")?;
    if protocol != ROOM_DATA as u64 {
        return Err(format!("Unexpected protocol code: {}", protocol));
    }

    let msg_type = array[1].as_str().ok_or("Message type must be string")?;

    let msg_data = array.get(2).unwrap_or(&Value::Nil);

    match msg_type {
        "keys" => {
            let pressed = extract_strings(msg_data, "pressed").unwrap_or_default();
            Ok(ClientMessage::Keys { pressed })
        }
        "interact" => Ok(ClientMessage::Interact),
        "reset" => Ok(ClientMessage::Reset),
        _ => Err(format!("Unknown message type: {}", msg_type)),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn extract_strings(value: &rmpv::Value, key: &str) -> Option<Vec<String>> {
    value.as_map().and_then(|map| {
        map.iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .and_then(|(_, v)| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(|s| s.to_string()))
                    .collect()
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmpv::Value;
    use std::collections::BTreeMap;

    fn frame(msg_type: &str, data: Value) -> Vec<u8> {
        let array = Value::Array(vec![
            Value::Integer(13.into()),
            Value::String(msg_type.into()),
            data,
        ]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &array).unwrap();
        buf
    }

    fn decode_frame(bytes: &[u8]) -> (u64, String, Value) {
        let value = rmpv::decode::read_value(&mut std::io::Cursor::new(bytes)).unwrap();
        let array = value.as_array().unwrap().clone();
        (
            array[0].as_u64().unwrap(),
            array[1].as_str().unwrap().to_string(),
            array[2].clone(),
        )
    }

    fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
        value
            .as_map()
            .unwrap()
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
            .unwrap_or_else(|| panic!("missing field {}", key))
    }

    #[test]
    fn test_decode_keys() {
        let data = Value::Map(vec![(
            Value::String("pressed".into()),
            Value::Array(vec![Value::String("w".into()), Value::String("ArrowLeft".into())]),
        )]);
        let msg = decode_client_message(&frame("keys", data)).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Keys {
                pressed: vec!["w".to_string(), "ArrowLeft".to_string()]
            }
        );
    }

    #[test]
    fn test_decode_without_payload() {
        let mut buf = Vec::new();
        let array = Value::Array(vec![Value::Integer(13.into()), Value::String("interact".into())]);
        rmpv::encode::write_value(&mut buf, &array).unwrap();
        assert_eq!(decode_client_message(&buf).unwrap(), ClientMessage::Interact);

        assert_eq!(
            decode_client_message(&frame("reset", Value::Nil)).unwrap(),
            ClientMessage::Reset
        );
        // Missing key list means nothing held
        assert_eq!(
            decode_client_message(&frame("keys", Value::Nil)).unwrap(),
            ClientMessage::Keys { pressed: vec![] }
        );
    }

    #[test]
    fn test_decode_rejects_bad_frames() {
        assert!(decode_client_message(&frame("dance", Value::Nil)).is_err());
        assert!(decode_client_message(&[0xc1]).is_err());

        let bytes = rmp_serde::to_vec(&(10u8, "interact", BTreeMap::<String, u8>::new())).unwrap();
        assert!(decode_client_message(&bytes).unwrap_err().contains("protocol code"));
    }

    #[test]
    fn test_encode_welcome() {
        let msg = ServerMessage::Welcome {
            session_id: "abc".into(),
            kitchen_id: "classic".into(),
        };
        let (code, msg_type, data) = decode_frame(&encode_server_message(&msg).unwrap());
        assert_eq!(code, 13);
        assert_eq!(msg_type, "welcome");
        assert_eq!(field(&data, "sessionId").as_str(), Some("abc"));
        assert_eq!(field(&data, "kitchenId").as_str(), Some("classic"));
    }

    #[test]
    fn test_encode_layout_and_interaction() {
        let layout = KitchenLayout::classic();
        let msg = ServerMessage::KitchenLayout(LayoutData::new(&layout, &Tuning::default()));
        let (_, msg_type, data) = decode_frame(&encode_server_message(&msg).unwrap());
        assert_eq!(msg_type, "kitchenLayout");
        assert_eq!(field(&data, "stations").as_array().unwrap().len(), 5);
        assert_eq!(field(&data, "counters").as_array().unwrap().len(), layout.counters.len());
        let first = &field(&data, "stations").as_array().unwrap()[0];
        assert_eq!(field(first, "kind").as_str(), Some("pantry"));

        let msg = ServerMessage::InteractResult {
            success: true,
            interaction: Some(Interaction::Placed {
                item: ItemId(7),
                counter: 2,
            }),
            reason: None,
        };
        let (_, msg_type, data) = decode_frame(&encode_server_message(&msg).unwrap());
        assert_eq!(msg_type, "interactResult");
        let interaction = field(&data, "interaction");
        assert_eq!(field(interaction, "action").as_str(), Some("placed"));
        assert_eq!(field(interaction, "item").as_u64(), Some(7));
    }

    #[test]
    fn test_failure_messages() {
        let [result, notice] = ServerMessage::interaction_failed(InteractError::ChopFirst, 2000);
        assert_eq!(result.msg_type(), "interactResult");

        let (_, msg_type, data) = decode_frame(&encode_server_message(&notice).unwrap());
        assert_eq!(msg_type, "notice");
        assert_eq!(field(&data, "kind").as_str(), Some("chop_first"));
        assert_eq!(field(&data, "message").as_str(), Some("Chop it first!"));
        assert_eq!(field(&data, "durationMs").as_u64(), Some(2000));
    }

    #[test]
    fn test_event_conversion() {
        let msg = ServerMessage::from(KitchenEvent::ProcessingAbandoned {
            counter: 1,
            kind: ProcessKind::Cook,
        });
        let (_, msg_type, data) = decode_frame(&encode_server_message(&msg).unwrap());
        assert_eq!(msg_type, "processingAbandoned");
        assert_eq!(field(&data, "process").as_str(), Some("cook"));
    }
}
