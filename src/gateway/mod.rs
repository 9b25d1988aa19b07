//! WebSocket gateway: connection lifecycle, auth handshake, and command
//! routing into `ShardManager` (spec.md §4.10). Structured the way the
//! teacher's `farm/websocket.rs` handles one socket — register, then
//! `tokio::select!` between inbound frames and an outbound command
//! channel — generalized to the 4-step auth-then-route flow this
//! gateway needs.

pub mod auth;
pub mod binary_codec;
pub mod protocol;

use crate::app_state::AppState;
use crate::domain::names::random_guest_name;
use crate::error::ErrorCode;
use crate::player::PlayerState;
use crate::shard_manager::CreateShardOptions;
use crate::world::store::Position;
use auth::{sign_token, verify_token, TokenPayload};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use binary_codec::{decode_client, BinaryMessage};
use protocol::{ClientCommand, PlayerStateView, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

const TOKEN_TTL_MS: u64 = 7 * 24 * 60 * 60 * 1_000;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

struct ConnectionState {
    player_id: Option<String>,
    display_name: String,
    shard_id: Option<String>,
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut conn = ConnectionState { player_id: None, display_name: String::new(), shard_id: None };

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientCommand>(&text) {
                            Ok(command) => handle_command(&state, &mut conn, command, &outbound_tx).await,
                            Err(e) => {
                                warn!("invalid frame: {e}");
                                let _ = outbound_tx.send(ServerMessage::error(ErrorCode::InvalidMessage));
                            }
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        match decode_client(&bytes) {
                            Ok(BinaryMessage::Move { x, y }) => {
                                handle_command(&state, &mut conn, ClientCommand::Move { seq: 0, x: x as i64, y: y as i64 }, &outbound_tx).await;
                            }
                            Ok(BinaryMessage::Dig { x, y }) => {
                                let now = state.clock.unix_millis();
                                handle_command(&state, &mut conn, ClientCommand::Dig { seq: 0, x: x as i64, y: y as i64, timestamp: now }, &outbound_tx).await;
                            }
                            Ok(_) => {}
                            Err(_) => {
                                let _ = outbound_tx.send(ServerMessage::error(ErrorCode::InvalidMessage));
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("websocket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }

            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(msg) => {
                        let json = match serde_json::to_string(&msg) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("failed to serialize outbound message: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    if let (Some(player_id), Some(shard_id)) = (conn.player_id.clone(), conn.shard_id.clone()) {
        info!(%player_id, %shard_id, "connection closed, starting reconnection grace");
        state.reconnection.on_disconnect(player_id.clone(), conn.display_name.clone(), shard_id.clone()).await;
        state.shard_manager.disconnect_player(&shard_id, player_id).await;
    }
}

async fn handle_command(state: &Arc<AppState>, conn: &mut ConnectionState, command: ClientCommand, outbound_tx: &mpsc::UnboundedSender<ServerMessage>) {
    match command {
        ClientCommand::Auth { token } => handle_auth(state, conn, token, outbound_tx).await,
        _ if conn.player_id.is_none() => {
            let _ = outbound_tx.send(ServerMessage::error(ErrorCode::NotAuthenticated));
        }
        ClientCommand::JoinQuickPlay {} => {
            let shard_id = state.shard_manager.find_or_create_quick_play_shard().await;
            join_shard(state, conn, shard_id, None, outbound_tx).await;
        }
        ClientCommand::CreateParty { max_players } => {
            let (shard_id, room_code) = state
                .shard_manager
                .create_shard(CreateShardOptions { max_players: max_players.unwrap_or(state.config.max_players_per_shard), private: true })
                .await;
            join_shard(state, conn, shard_id, room_code, outbound_tx).await;
        }
        ClientCommand::JoinParty { room_code } => match state.shard_manager.find_shard_by_room_code(&room_code).await {
            Some(shard_id) => join_shard(state, conn, shard_id, Some(room_code), outbound_tx).await,
            None => {
                let _ = outbound_tx.send(ServerMessage::MatchmakingResult {
                    success: false,
                    shard_id: None,
                    room_code: None,
                    error: Some("no party with that room code".to_string()),
                });
            }
        },
        ClientCommand::PlaySolo {} => {
            let (shard_id, _) = state.shard_manager.create_shard(CreateShardOptions { max_players: 1, private: false }).await;
            join_shard(state, conn, shard_id, None, outbound_tx).await;
        }
        other => match &conn.shard_id {
            Some(shard_id) => {
                let player_id = conn.player_id.clone().unwrap();
                state.shard_manager.enqueue_command(shard_id, player_id, other).await;
            }
            None => {
                let _ = outbound_tx.send(ServerMessage::error(ErrorCode::NotInShard));
            }
        },
    }
}

async fn handle_auth(state: &Arc<AppState>, conn: &mut ConnectionState, token: Option<String>, outbound_tx: &mpsc::UnboundedSender<ServerMessage>) {
    let now = state.clock.unix_millis();

    let payload = token
        .as_deref()
        .and_then(|t| verify_token(t, &state.config.auth_secret, now).ok());

    let (player_id, display_name, is_guest) = match payload {
        Some(p) => (p.player_id, p.display_name, p.is_guest),
        None => (Uuid::new_v4().to_string(), random_guest_name(), true),
    };

    conn.player_id = Some(player_id.clone());
    conn.display_name = display_name.clone();

    // A pending reconnection session takes priority over fresh matchmaking.
    if let Some(shard_id) = state.reconnection.on_reconnect(&player_id).await {
        if state.shard_manager.reconnect_player(&shard_id, player_id.clone(), outbound_tx.clone()).await {
            conn.shard_id = Some(shard_id);
        }
    }

    let new_token = sign_token(&TokenPayload { player_id: player_id.clone(), display_name: display_name.clone(), is_guest, expiry: now + TOKEN_TTL_MS }, &state.config.auth_secret);

    let state_view = PlayerStateView {
        id: player_id.clone(),
        display_name: display_name.clone(),
        x: 0,
        y: 0,
        gold: 0,
        equipment: crate::player::Equipment::starting(),
        max_inventory_slots: crate::player::Inventory::new().capacity(crate::domain::equipment::MIN_TIER),
        used_inventory_slots: 0,
        max_depth_reached: 0,
        is_stunned: false,
    };

    let _ = outbound_tx.send(ServerMessage::Welcome { player_id, display_name, token: new_token, state: state_view });
}

async fn join_shard(state: &Arc<AppState>, conn: &mut ConnectionState, shard_id: String, room_code: Option<String>, outbound_tx: &mpsc::UnboundedSender<ServerMessage>) {
    let player_id = conn.player_id.clone().expect("join_shard only reached once authenticated");
    let player = PlayerState::new(player_id.clone(), conn.display_name.clone(), Position { x: 0, y: 0 });

    let joined = state.shard_manager.join_shard(&shard_id, player, outbound_tx.clone()).await;
    if joined {
        conn.shard_id = Some(shard_id.clone());
    }

    let _ = outbound_tx.send(ServerMessage::MatchmakingResult {
        success: joined,
        shard_id: joined.then_some(shard_id),
        room_code,
        error: if joined { None } else { Some("shard is full".to_string()) },
    });
}
