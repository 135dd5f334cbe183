use crate::domain::PlayerId;
use crate::domain::session::normalize_display_name;
use crate::interface_adapters::protocol::{ClientMessage, parse_player_id};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::{rand_id, room_code};
use crate::use_cases::{Command, MatchOrchestrator};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    JoinRequired,
    JoinTimeout,
    InvalidDisplayName,
    ClosedBeforeJoin,
    OutboundClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        // Separate connection id for correlating logs before/after a player_id exists.
        let conn_id = rand_id();
        let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
        handle_socket(socket, state).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let display_name = match timeout(JOIN_HANDSHAKE_TIMEOUT, read_join_handshake(&mut socket)).await
    {
        Ok(Ok(display_name)) => display_name,
        Ok(Err(NetError::ClosedBeforeJoin)) => {
            info!("client disconnected before join handshake");
            return;
        }
        Ok(Err(e)) => {
            warn!(error = ?e, "join handshake rejected");
            return;
        }
        Err(_) => {
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "join timeout").await;
            warn!(error = ?NetError::JoinTimeout, "join handshake timed out");
            return;
        }
    };

    // Handshake & ID Assignment
    let player_id = rand_id();
    tracing::Span::current().record("player_id", player_id);

    // Open the outbound queue before registering so the `joined` reply is not lost.
    let outbound_rx = state.hub.register(player_id);
    state
        .orchestrator
        .register_player(player_id, display_name.clone());
    info!(player_id, %display_name, "client connected");

    let mut ctx = ConnCtx::new(player_id, outbound_rx);
    if let Err(e) = run_client_loop(&mut socket, &state.orchestrator, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }

    // Release the room slot first so remaining members are notified while the hub
    // still knows every other connection.
    state.orchestrator.disconnect(player_id).await;
    state.hub.unregister(player_id);
    info!(
        player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        "client disconnected"
    );
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(socket: &mut WebSocket) -> Result<String, NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => payload,
                    Ok(_) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                let Some(display_name) = normalize_display_name(&payload.display_name) else {
                    let _ =
                        send_close_with_reason(socket, close_code::POLICY, "invalid display name")
                            .await;
                    return Err(NetError::InvalidDisplayName);
                };
                return Ok(display_name);
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

struct ConnCtx {
    player_id: PlayerId,
    outbound_rx: mpsc::Receiver<Utf8Bytes>,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

impl ConnCtx {
    fn new(player_id: PlayerId, outbound_rx: mpsc::Receiver<Utf8Bytes>) -> Self {
        Self {
            player_id,
            outbound_rx,
            // The join frame.
            msgs_in: 1,
            msgs_out: 0,
            bytes_in: 0,
            bytes_out: 0,
            invalid_json: 0,
            last_invalid_input_log: Instant::now() - LOG_THROTTLE,
            close_frame: None,
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Maps a post-handshake message to an orchestrator command. `None` means drop it.
fn to_command(message: ClientMessage, last_invalid_input_log: &mut Instant) -> Option<Command> {
    match message {
        ClientMessage::Join(_) => {
            // Ignore repeated Join packets after bootstrap to keep the session stable.
            if should_log(last_invalid_input_log) {
                warn!("duplicate join ignored");
            }
            None
        }
        ClientMessage::CreateRoom(payload) => match payload.into_settings() {
            Ok(settings) => Some(Command::CreateRoom {
                room_id: room_code(),
                settings,
            }),
            Err(reason) => {
                if should_log(last_invalid_input_log) {
                    warn!(%reason, "invalid room settings");
                }
                None
            }
        },
        ClientMessage::JoinRoom(room) => Some(Command::JoinRoom {
            room_id: room.room_id,
        }),
        ClientMessage::LeaveRoom => Some(Command::LeaveRoom),
        ClientMessage::Ready(payload) => Some(Command::SetReady {
            ready: payload.ready,
        }),
        ClientMessage::Move(payload) => Some(Command::Act {
            room_id: payload.room_id,
            action: payload.action.into(),
        }),
        ClientMessage::UsePowerUp(payload) => Some(Command::UsePowerUp {
            room_id: payload.room_id,
            kind: payload.kind.into(),
            target: payload
                .target_player_id
                .as_deref()
                .and_then(parse_player_id),
        }),
    }
}

async fn run_client_loop(
    socket: &mut WebSocket,
    orchestrator: &MatchOrchestrator,
    ctx: &mut ConnCtx,
) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, orchestrator, ctx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing events queued by the hub
            outbound = ctx.outbound_rx.recv() => {
                match outbound {
                    Some(bytes) => {
                        ctx.bytes_out += bytes.len() as u64;
                        ctx.msgs_out += 1;
                        match socket.send(Message::Text(bytes)).await {
                            Ok(()) => false,
                            Err(e) => {
                                debug!(player_id, error = ?e, "send failed; disconnecting");
                                true
                            }
                        }
                    }
                    None => {
                        fatal = Some(NetError::OutboundClosed);
                        true
                    }
                }
            }
        };
        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    orchestrator: &MatchOrchestrator,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => {
                        if let Some(command) = to_command(message, &mut ctx.last_invalid_input_log)
                        {
                            orchestrator.handle(ctx.player_id, command).await;
                        }
                        Ok(LoopControl::Continue)
                    }
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                player_id = ctx.player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }
                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }
                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => Err(NetError::Ws(e)),
        None => Ok(LoopControl::Disconnect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, PowerUpKind};
    use crate::use_cases::PieceAction;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ClientMessage {
        serde_json::from_value(value).expect("valid client message")
    }

    #[test]
    fn when_create_room_is_valid_then_a_room_code_is_assigned() {
        let mut last = Instant::now() - LOG_THROTTLE;
        let command = to_command(
            parse(json!({"type": "create_room", "data": {"name": "Arena", "capacity": 2}})),
            &mut last,
        );

        let Some(Command::CreateRoom { room_id, settings }) = command else {
            panic!("expected create room command");
        };
        assert_eq!(room_id.len(), 6);
        assert_eq!(settings.capacity.get(), 2);
    }

    #[test]
    fn when_create_room_capacity_is_invalid_then_it_is_dropped() {
        let mut last = Instant::now() - LOG_THROTTLE;
        let command = to_command(
            parse(json!({"type": "create_room", "data": {"name": "Arena", "capacity": 5}})),
            &mut last,
        );
        assert!(command.is_none());
    }

    #[test]
    fn when_repeated_join_arrives_then_it_is_ignored() {
        let mut last = Instant::now() - LOG_THROTTLE;
        let command = to_command(
            parse(json!({"type": "join", "data": {"display_name": "Ann"}})),
            &mut last,
        );
        assert!(command.is_none());
    }

    #[test]
    fn when_move_arrives_then_it_becomes_an_action() {
        let mut last = Instant::now() - LOG_THROTTLE;
        let command = to_command(
            parse(json!({
                "type": "move",
                "data": {"room_id": "R1", "action": {"kind": "move", "direction": "right"}}
            })),
            &mut last,
        );
        let Some(Command::Act { room_id, action }) = command else {
            panic!("expected action command");
        };
        assert_eq!(room_id, "R1");
        assert_eq!(action, PieceAction::Move(Direction::Right));
    }

    #[test]
    fn when_power_up_target_is_not_numeric_then_target_is_dropped() {
        let mut last = Instant::now() - LOG_THROTTLE;
        let command = to_command(
            parse(json!({
                "type": "use_power_up",
                "data": {"room_id": "R1", "kind": "add_garbage", "target_player_id": "nope"}
            })),
            &mut last,
        );
        let Some(Command::UsePowerUp { kind, target, .. }) = command else {
            panic!("expected power-up command");
        };
        assert_eq!(kind, PowerUpKind::AddGarbage);
        assert_eq!(target, None);
    }
}
