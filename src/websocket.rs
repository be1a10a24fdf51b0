use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{sink::SinkExt, stream::StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::application::GameUseCase;
use crate::config::ModeConfig;
use crate::enums::{GameState, MoveEventType, Side, SideRequest, WinSide};
use crate::errors::{DataxoError, DataxoResult, NetworkError};
use crate::game::{Game, Move, MoveEvent};
use crate::modes::MODE_WITH_FRIEND;
use crate::repository::GameRepository;
use crate::{GameId, PlayerId};

/// Path segment that asks the socket endpoint to create a game first.
pub const CREATE_GAME_ID: &str = "create";

/// Client envelope. `message` is decoded according to `type`.
#[derive(Debug, Clone, Deserialize)]
pub struct WsRequest {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub message: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresenceRequest {
    pub action: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub move_id: usize,
    pub x: i32,
    pub y: i32,
}

/// Flat wire form of a [`MoveEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsMoveEvent {
    #[serde(rename = "type")]
    pub event_type: MoveEventType,
    pub move_id: usize,
    pub x: i32,
    pub y: i32,
    pub side: Side,
    pub times_used: u32,
}

impl From<&MoveEvent> for WsMoveEvent {
    fn from(event: &MoveEvent) -> Self {
        let m = &event.game_move;
        Self {
            event_type: event.event_type,
            move_id: m.in_game_id,
            x: m.x,
            y: m.y,
            side: m.side,
            times_used: m.times_used,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsGameConfig {
    /// 0 is no limit
    pub player_figures_limit: i32,
    pub win_line_length: i32,
    pub board_width: i32,
    pub board_height: i32,
}

impl From<ModeConfig> for WsGameConfig {
    fn from(config: ModeConfig) -> Self {
        Self {
            player_figures_limit: config.piece_limit,
            win_line_length: config.win_line_length,
            board_width: config.board_width,
            board_height: config.board_height,
        }
    }
}

/// Server to client messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    CreateMessage {
        game_id: GameId,
        side: Side,
    },
    SideMessage {
        response_for_id: String,
        side: Side,
    },
    GameStateResponse {
        response_for_id: String,
        game_id: GameId,
        mode: String,
        config: WsGameConfig,
        state: GameState,
        moves: Vec<Move>,
        win_sequence: Vec<Move>,
        winner: WinSide,
    },
    StartBroadcast,
    NewMoveBroadcast {
        move_events: Vec<WsMoveEvent>,
    },
    GameFinishBroadcast {
        winner: WinSide,
        win_sequence: Vec<Move>,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        response_for_id: String,
        need_re_sync: bool,
    },
}

impl WsMessage {
    pub fn error(err: &DataxoError, request_id: impl Into<String>) -> Self {
        WsMessage::Error {
            error: err.to_string(),
            response_for_id: request_id.into(),
            need_re_sync: err.need_re_sync(),
        }
    }

    pub fn game_state(game: Game, request_id: impl Into<String>) -> Self {
        WsMessage::GameStateResponse {
            response_for_id: request_id.into(),
            game_id: game.id,
            mode: game.mode,
            config: game.config.into(),
            state: game.state,
            moves: game.moves,
            win_sequence: game.win_sequence,
            winner: game.winner,
        }
    }

    pub fn new_moves(events: &[MoveEvent]) -> Self {
        WsMessage::NewMoveBroadcast {
            move_events: events.iter().map(WsMoveEvent::from).collect(),
        }
    }
}

/// Per-socket session: which game it is bound to and who is on the other end.
#[derive(Debug)]
pub struct Connection {
    pub game_id: GameId,
    pub client_id: PlayerId,
    /// Cached once known, so later moves don't need a lookup.
    pub side: Side,
    replies: mpsc::UnboundedSender<WsMessage>,
}

impl Connection {
    pub fn new(game_id: GameId, client_id: PlayerId, replies: mpsc::UnboundedSender<WsMessage>) -> Self {
        Self {
            game_id,
            client_id,
            side: Side::None,
            replies,
        }
    }

    /// Queues a message for this socket only.
    pub fn reply(&self, message: WsMessage) {
        if self.replies.send(message).is_err() {
            debug!("reply dropped, connection for game {} is gone", self.game_id);
        }
    }
}

type WsSender = SplitSink<WebSocket, Message>;

/// Real-time transport over [`GameUseCase`]. Holds no game rules.
pub struct WebSocketService<R: GameRepository> {
    use_case: Arc<GameUseCase<R>>,
    broadcaster: broadcast::Sender<(GameId, WsMessage)>,
}

impl<R: GameRepository> Clone for WebSocketService<R> {
    fn clone(&self) -> Self {
        Self {
            use_case: Arc::clone(&self.use_case),
            broadcaster: self.broadcaster.clone(),
        }
    }
}

impl<R: GameRepository + 'static> WebSocketService<R> {
    pub fn new(use_case: Arc<GameUseCase<R>>, capacity: usize) -> Self {
        let (broadcaster, _) = broadcast::channel(capacity);
        Self {
            use_case,
            broadcaster,
        }
    }

    pub fn broadcaster(&self) -> broadcast::Sender<(GameId, WsMessage)> {
        self.broadcaster.clone()
    }

    /// Sends a message to every socket bound to the game.
    pub fn broadcast(&self, game_id: GameId, message: WsMessage) {
        // No subscribers just means nobody is watching.
        let _ = self.broadcaster.send((game_id, message));
    }

    /// Drives one socket until either side hangs up.
    pub async fn handle_connection(&self, socket: WebSocket, game_param: String, client_id: PlayerId) {
        let (mut sender, mut receiver) = socket.split();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();

        // Subscribe before binding so a creator can't miss the start broadcast.
        let mut updates = self.broadcaster.subscribe();

        let mut conn = match self.bind(&game_param, client_id, reply_tx).await {
            Ok(conn) => conn,
            Err(err) => {
                warn!("rejecting socket for game {}: {}", game_param, err);
                let _ = send_message(&mut sender, &WsMessage::error(&err, "")).await;
                let _ = sender.send(Message::Close(None)).await;
                return;
            }
        };
        let game_id = conn.game_id;
        info!("socket connected to game {} (client {})", game_id, conn.client_id);

        let mut write_task = tokio::spawn(async move {
            loop {
                let message = tokio::select! {
                    update = updates.recv() => match update {
                        Ok((id, message)) if id == game_id => message,
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("socket for game {} lagged, {} broadcasts skipped", game_id, skipped);
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    reply = reply_rx.recv() => match reply {
                        Some(message) => message,
                        None => break,
                    },
                };

                if let Err(e) = send_message(&mut sender, &message).await {
                    debug!("socket for game {} closed while sending: {}", game_id, e);
                    break;
                }
            }
        });

        let service = self.clone();
        let mut read_task = tokio::spawn(async move {
            while let Some(Ok(message)) = receiver.next().await {
                match message {
                    Message::Text(text) => service.handle_text_message(&mut conn, text.as_str()).await,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        });

        tokio::select! {
            _ = &mut write_task => read_task.abort(),
            _ = &mut read_task => write_task.abort(),
        }

        info!("socket disconnected from game {}", game_id);
    }

    /// Resolves the game a new socket is for, creating one for
    /// [`CREATE_GAME_ID`].
    async fn bind(
        &self,
        game_param: &str,
        client_id: PlayerId,
        replies: mpsc::UnboundedSender<WsMessage>,
    ) -> DataxoResult<Connection> {
        if game_param == CREATE_GAME_ID {
            let created = self
                .use_case
                .create_game(client_id.clone(), MODE_WITH_FRIEND, SideRequest::Random)
                .await?;

            let mut conn = Connection::new(created.game_id, client_id, replies);
            conn.side = created.side;
            conn.reply(WsMessage::CreateMessage {
                game_id: created.game_id,
                side: created.side,
            });
            return Ok(conn);
        }

        let game_id = Uuid::parse_str(game_param).map_err(|e| NetworkError::InvalidGameId {
            details: e.to_string(),
        })?;
        self.use_case.get_game(game_id).await?;

        Ok(Connection::new(game_id, client_id, replies))
    }

    /// Decodes one envelope and dispatches it. Failures are reported back to
    /// the sender tagged with the request id.
    pub async fn handle_text_message(&self, conn: &mut Connection, text: &str) {
        let request: WsRequest = match serde_json::from_str(text) {
            Ok(request) => request,
            Err(e) => {
                let err: DataxoError = NetworkError::deserialization_failed(e.to_string()).into();
                conn.reply(WsMessage::error(&err, ""));
                return;
            }
        };
        debug!("game {}: {} request {}", conn.game_id, request.message_type, request.request_id);

        if let Some(client_id) = request.client_id.as_ref().filter(|id| !id.is_empty()) {
            conn.client_id = client_id.clone();
        }

        let result = match request.message_type.as_str() {
            "presence" => self.handle_presence(conn, &request).await,
            "game" => self.handle_game(conn, &request).await,
            "state" => self.handle_state(conn, &request).await,
            "side" => self.handle_side(conn, &request).await,
            other => Err(NetworkError::WrongMessageType {
                message_type: other.to_string(),
            }
            .into()),
        };

        if let Err(err) = result {
            if err.is_logic_error() {
                error!("game {}: {}", conn.game_id, err);
            } else {
                debug!("game {}: request {} failed: {}", conn.game_id, request.request_id, err);
            }
            conn.reply(WsMessage::error(&err, request.request_id));
        }
    }

    async fn handle_presence(&self, conn: &mut Connection, request: &WsRequest) -> DataxoResult<()> {
        let presence: PresenceRequest = decode(&request.message)?;
        if presence.action != "join" {
            return Err(NetworkError::InvalidPresenceAction {
                action: presence.action,
            }
            .into());
        }

        let joined = self
            .use_case
            .join_game(conn.game_id, conn.client_id.clone())
            .await?;
        conn.side = joined.side;
        conn.reply(WsMessage::SideMessage {
            response_for_id: request.request_id.clone(),
            side: joined.side,
        });

        if joined.ready_to_start {
            self.use_case.start_game(conn.game_id).await?;
            self.broadcast(conn.game_id, WsMessage::StartBroadcast);
        }
        Ok(())
    }

    async fn handle_game(&self, conn: &mut Connection, request: &WsRequest) -> DataxoResult<()> {
        let req: MoveRequest = decode(&request.message)?;
        let side = self.resolve_side(conn).await?;

        let result = self
            .use_case
            .make_move(conn.game_id, Move::new(req.move_id, req.x, req.y, side))
            .await?;
        self.broadcast(conn.game_id, WsMessage::new_moves(&result.events));

        if result.game_finished {
            let game = self.use_case.get_game(conn.game_id).await?;
            self.broadcast(
                conn.game_id,
                WsMessage::GameFinishBroadcast {
                    winner: game.winner,
                    win_sequence: game.win_sequence,
                },
            );
        }
        Ok(())
    }

    async fn handle_state(&self, conn: &mut Connection, request: &WsRequest) -> DataxoResult<()> {
        let game = self.use_case.get_game(conn.game_id).await?;
        conn.reply(WsMessage::game_state(game, request.request_id.clone()));
        Ok(())
    }

    async fn handle_side(&self, conn: &mut Connection, request: &WsRequest) -> DataxoResult<()> {
        let side = self.resolve_side(conn).await.unwrap_or(Side::None);
        conn.reply(WsMessage::SideMessage {
            response_for_id: request.request_id.clone(),
            side,
        });
        Ok(())
    }

    async fn resolve_side(&self, conn: &mut Connection) -> DataxoResult<Side> {
        if conn.side.is_playable() {
            return Ok(conn.side);
        }
        let side = self.use_case.get_side(conn.game_id, &conn.client_id).await?;
        conn.side = side;
        Ok(side)
    }
}

fn decode<T: for<'de> Deserialize<'de>>(message: &Value) -> DataxoResult<T> {
    serde_json::from_value(message.clone())
        .map_err(|e| NetworkError::deserialization_failed(e.to_string()).into())
}

async fn send_message(sender: &mut WsSender, message: &WsMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    sender.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::DisappearingMode;
    use crate::repository::InMemoryGameRepository;
    use serde_json::json;

    type Service = WebSocketService<InMemoryGameRepository>;

    fn service(config: ModeConfig) -> Service {
        let mode = DisappearingMode::new(config).unwrap();
        let use_case = GameUseCase::new(Arc::new(InMemoryGameRepository::new()), Arc::new(mode));
        WebSocketService::new(Arc::new(use_case), 16)
    }

    async fn connect(
        service: &Service,
        game_param: &str,
        client_id: &str,
    ) -> (Connection, mpsc::UnboundedReceiver<WsMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = service
            .bind(game_param, client_id.to_string(), tx)
            .await
            .unwrap();
        (conn, rx)
    }

    async fn send(service: &Service, conn: &mut Connection, request: Value) {
        service.handle_text_message(conn, &request.to_string()).await;
    }

    #[test]
    fn test_message_wire_shape() {
        let value = serde_json::to_value(WsMessage::StartBroadcast).unwrap();
        assert_eq!(value, json!({"type": "start_broadcast"}));

        let value = serde_json::to_value(WsMessage::Error {
            error: "boom".into(),
            response_for_id: String::new(),
            need_re_sync: false,
        })
        .unwrap();
        assert_eq!(value, json!({"type": "error", "error": "boom", "need_re_sync": false}));

        let event = MoveEvent::removal(Move {
            times_used: 2,
            ..Move::new(3, 1, 2, Side::O)
        });
        let value = serde_json::to_value(WsMessage::new_moves(&[event])).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "new_move_broadcast",
                "move_events": [{
                    "type": "remove_move", "move_id": 3, "x": 1, "y": 2,
                    "side": "o", "times_used": 2
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_create_binds_and_replies() {
        let service = service(ModeConfig::default());
        let (conn, mut rx) = connect(&service, CREATE_GAME_ID, "alice").await;

        match rx.try_recv().unwrap() {
            WsMessage::CreateMessage { game_id, side } => {
                assert_eq!(game_id, conn.game_id);
                assert_eq!(side, conn.side);
                assert!(side.is_playable());
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_game_ids() {
        let service = service(ModeConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = service
            .bind("not-a-uuid", "alice".into(), tx.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DataxoError::Network(NetworkError::InvalidGameId { .. })));

        let err = service
            .bind(&Uuid::new_v4().to_string(), "alice".into(), tx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(crate::errors::GameErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_unknown_type_is_reported() {
        let service = service(ModeConfig::default());
        let (mut conn, mut rx) = connect(&service, CREATE_GAME_ID, "alice").await;
        rx.try_recv().unwrap();

        send(&service, &mut conn, json!({"type": "dance", "request_id": "r1"})).await;

        match rx.try_recv().unwrap() {
            WsMessage::Error {
                error,
                response_for_id,
                need_re_sync,
            } => {
                assert!(error.contains("wrong message type"));
                assert_eq!(response_for_id, "r1");
                assert!(!need_re_sync);
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_starts_game_and_moves_broadcast() {
        let service = service(ModeConfig::new(3, 3, 3, 1));
        let mut updates = service.broadcaster().subscribe();

        let (mut alice, mut alice_rx) = connect(&service, CREATE_GAME_ID, "alice").await;
        alice_rx.try_recv().unwrap();
        let game_id = alice.game_id;
        let (mut bob, mut bob_rx) = connect(&service, &game_id.to_string(), "bob").await;

        send(
            &service,
            &mut bob,
            json!({"type": "presence", "request_id": "j1", "message": {"action": "join"}}),
        )
        .await;
        let bob_side = alice.side.opponent();
        assert_eq!(
            bob_rx.try_recv().unwrap(),
            WsMessage::SideMessage {
                response_for_id: "j1".into(),
                side: bob_side
            }
        );
        assert_eq!(updates.try_recv().unwrap(), (game_id, WsMessage::StartBroadcast));

        let (first, second) = if alice.side == Side::X {
            (&mut alice, &mut bob)
        } else {
            (&mut bob, &mut alice)
        };
        for (conn, move_id, x, y) in [(first, 0, 0, 0), (second, 1, 1, 1)] {
            send(
                &service,
                conn,
                json!({"type": "game", "request_id": "m", "message": {"move_id": move_id, "x": x, "y": y}}),
            )
            .await;
        }

        let (_, first_move) = updates.try_recv().unwrap();
        match first_move {
            WsMessage::NewMoveBroadcast { move_events } => {
                assert_eq!(move_events.len(), 1);
                assert_eq!(move_events[0].side, Side::X);
                assert_eq!(move_events[0].event_type, MoveEventType::Placement);
            }
            other => panic!("unexpected broadcast {:?}", other),
        }
        assert!(updates.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_out_of_turn_move_asks_for_resync() {
        let service = service(ModeConfig::default());
        let (mut alice, mut alice_rx) = connect(&service, CREATE_GAME_ID, "alice").await;
        alice_rx.try_recv().unwrap();
        let (mut bob, mut bob_rx) = connect(&service, &alice.game_id.to_string(), "bob").await;

        send(
            &service,
            &mut bob,
            json!({"type": "presence", "request_id": "j", "message": {"action": "join"}}),
        )
        .await;
        bob_rx.try_recv().unwrap();

        let o_player = if alice.side == Side::O {
            (&mut alice, &mut alice_rx)
        } else {
            (&mut bob, &mut bob_rx)
        };
        send(
            &service,
            o_player.0,
            json!({"type": "game", "request_id": "m0", "message": {"move_id": 0, "x": 0, "y": 0}}),
        )
        .await;

        match o_player.1.try_recv().unwrap() {
            WsMessage::Error {
                response_for_id,
                need_re_sync,
                ..
            } => {
                assert_eq!(response_for_id, "m0");
                assert!(need_re_sync);
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_state_and_side_requests() {
        let service = service(ModeConfig::default());
        let (mut alice, mut rx) = connect(&service, CREATE_GAME_ID, "alice").await;
        rx.try_recv().unwrap();

        send(&service, &mut alice, json!({"type": "state", "request_id": "s1"})).await;
        match rx.try_recv().unwrap() {
            WsMessage::GameStateResponse {
                response_for_id,
                game_id,
                config,
                state,
                ..
            } => {
                assert_eq!(response_for_id, "s1");
                assert_eq!(game_id, alice.game_id);
                assert_eq!(config.player_figures_limit, 6);
                assert_eq!(state, GameState::Created);
            }
            other => panic!("unexpected reply {:?}", other),
        }

        send(&service, &mut alice, json!({"type": "side", "request_id": "s2"})).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            WsMessage::SideMessage {
                response_for_id: "s2".into(),
                side: alice.side
            }
        );
    }
}
