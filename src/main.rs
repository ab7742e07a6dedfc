use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

mod collision;
mod config;
mod input;
mod interaction;
mod item;
mod kitchen;
mod layout;
mod notice;
mod processing;
mod protocol;
mod room;

use config::{ServerConfig, DEFAULT_CONFIG_PATH};
use layout::LayoutRegistry;
use protocol::ServerMessage;
use room::KitchenRoom;

// ============================================================================
// App State
// ============================================================================

#[derive(Clone)]
struct AppState {
    // Room ID -> live kitchen session
    rooms: Arc<DashMap<String, Arc<KitchenRoom>>>,
    layouts: Arc<LayoutRegistry>,
    config: Arc<ServerConfig>,
}

impl AppState {
    fn new(config: ServerConfig) -> Self {
        let mut layouts = LayoutRegistry::new();
        if let Err(e) = layouts.load_from_directory(&config.server.data_dir) {
            error!("Failed to load kitchen layouts: {}", e);
        }

        if !layouts.contains(&config.server.default_kitchen) {
            warn!(
                "Default kitchen '{}' is not defined, /ws will be rejected",
                config.server.default_kitchen
            );
        }

        Self {
            rooms: Arc::new(DashMap::new()),
            layouts: Arc::new(layouts),
            config: Arc::new(config),
        }
    }

    fn create_room(&self, kitchen_id: &str) -> Option<Arc<KitchenRoom>> {
        let layout = self.layouts.get(kitchen_id)?;

        match KitchenRoom::new(
            layout,
            self.config.tuning.clone(),
            self.config.tick_interval(),
        ) {
            Ok(room) => {
                let room = Arc::new(room);
                self.rooms.insert(room.id.clone(), room.clone());
                info!("Created room {} for kitchen '{}'", room.id, kitchen_id);
                Some(room)
            }
            Err(e) => {
                error!("Failed to create room for kitchen '{}': {}", kitchen_id, e);
                None
            }
        }
    }
}

// ============================================================================
// HTTP Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp_millis(),
        "kitchens": state.rooms.len(),
        "layouts": state.layouts.len()
    }))
}

async fn list_kitchens(State(state): State<AppState>) -> impl IntoResponse {
    let kitchens: Vec<_> = state
        .layouts
        .all()
        .iter()
        .map(|layout| {
            serde_json::json!({
                "id": layout.id,
                "displayName": layout.display_name,
                "stations": layout.stations().len(),
                "counters": layout.counters.len()
            })
        })
        .collect();

    Json(kitchens)
}

// ============================================================================
// WebSocket Handler
// ============================================================================

async fn ws_default_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let kitchen_id = state.config.server.default_kitchen.clone();
    upgrade(ws, state, kitchen_id)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(kitchen_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    upgrade(ws, state, kitchen_id)
}

fn upgrade(ws: WebSocketUpgrade, state: AppState, kitchen_id: String) -> axum::response::Response {
    if !state.layouts.contains(&kitchen_id) {
        warn!("WebSocket rejected: unknown kitchen '{}'", kitchen_id);
        return (StatusCode::NOT_FOUND, "Unknown kitchen").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, kitchen_id))
}

async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match protocol::encode_server_message(msg) {
        Ok(bytes) => sender.send(Message::Binary(bytes)).await.is_ok(),
        Err(e) => {
            error!("Failed to encode {}: {}", msg.msg_type(), e);
            true
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState, kitchen_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let Some(room) = state.create_room(&kitchen_id) else {
        let _ = sender.send(Message::Close(None)).await;
        return;
    };
    let room_id = room.id.clone();

    // Subscribe before the first tick can publish anything
    let mut broadcast_rx = room.subscribe();

    let initial = [
        room.welcome_message(),
        room.layout_message(),
        ServerMessage::StateSync(room.snapshot().await),
    ];
    for msg in &initial {
        if !send_message(&mut sender, msg).await {
            state.rooms.remove(&room_id);
            return;
        }
    }

    // Spawn task to forward room messages to the WebSocket
    let mut send_task = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(msg) => {
                    if !send_message(&mut sender, &msg).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client lagging, skipped {} messages", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Handle incoming messages
    let room_clone = room.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Binary(data) => match protocol::decode_client_message(&data) {
                    Ok(client_msg) => room_clone.handle_message(client_msg).await,
                    Err(e) => {
                        warn!("Error handling message: {}", e);
                        room_clone.report_error(400, e);
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.rooms.remove(&room_id);
    info!("Room {} closed", room_id);
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kitchen_server=info".parse()?),
        )
        .init();

    let config_path =
        std::env::var("KITCHEN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ServerConfig::load(std::path::Path::new(&config_path))?;
    info!("Loaded config from {}", config_path);

    let state = AppState::new(config);

    // Spawn simulation tick loop
    let tick_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_state.config.tick_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let rooms: Vec<_> = tick_state.rooms.iter().map(|r| r.value().clone()).collect();
            for room in rooms {
                room.tick().await;
            }
        }
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/kitchens", get(list_kitchens))
        .route("/ws", get(ws_default_handler))
        .route("/ws/:kitchen_id", get(ws_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        )
        .with_state(state.clone());

    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    info!("Kitchen server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
