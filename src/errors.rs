use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::Side;
use crate::game::Move;
use crate::{GameId, PlayerId};

/// Top-level error type for the whole engine
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataxoError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("internal consistency violation: {0}")]
    Logic(#[from] LogicError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

/// Stable identity of an expected, caller-recoverable error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameErrorKind {
    #[error("not found")]
    NotFound,

    #[error("invalid side")]
    InvalidSide,

    #[error("game not started")]
    GameNotStarted,

    #[error("game already started")]
    GameAlreadyStarted,

    #[error("game finished")]
    GameFinished,

    #[error("place already taken")]
    PlaceAlreadyTaken,

    #[error("move is out of board")]
    MoveOutOfBoard,

    #[error("invalid move ingame id")]
    InvalidMoveSequence,

    #[error("now is not your side turn")]
    InvalidSideTurn,

    #[error("already joined")]
    AlreadyJoined,

    #[error("all places already taken in this game")]
    AllPlacesAlreadyTaken,

    #[error("not enough players")]
    NotEnoughPlayers,

    #[error("invalid config")]
    InvalidConfig,
}

/// Whatever is known about the situation an error happened in.
///
/// Only used for rendering; two errors of the same kind compare equal by
/// `kind` regardless of context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub game_id: Option<GameId>,
    pub player_id: Option<PlayerId>,
    pub side: Option<Side>,
    pub game_move: Option<Move>,
    pub max_in_game_id: Option<usize>,
    pub detail: Option<String>,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(game_id) = &self.game_id {
            write!(f, "game_id({}) ", game_id)?;
        }
        if let Some(player_id) = &self.player_id {
            write!(f, "player_id({}) ", player_id)?;
        }
        if let Some(side) = &self.side {
            write!(f, "side({}) ", side)?;
        }
        if let Some(game_move) = &self.game_move {
            write!(
                f,
                "move_id({}) ingame_id({}) x({}) y({}) ",
                game_move.id, game_move.in_game_id, game_move.x, game_move.y
            )?;
        }
        if let Some(max_in_game_id) = &self.max_in_game_id {
            write!(f, "max_ingame_id({}) ", max_in_game_id)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "{}: ", detail)?;
        }
        Ok(())
    }
}

/// Expected rule or lifecycle violation, reported back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{context}{kind}")]
pub struct GameError {
    pub kind: GameErrorKind,
    pub context: ErrorContext,
}

/// Broken board invariant. Indicates a defect, never a user mistake.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicError {
    #[error("game {game_id}: move {in_game_id} completed {count} win lines at once")]
    MultipleWinLines {
        game_id: GameId,
        in_game_id: usize,
        count: usize,
    },
}

/// Transport-side errors
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetworkError {
    #[error("message deserialization failed: {details}")]
    DeserializationFailed { details: String },

    #[error("message serialization failed: {details}")]
    SerializationFailed { details: String },

    #[error("wrong message type: {message_type}")]
    WrongMessageType { message_type: String },

    #[error("invalid presence action: {action}")]
    InvalidPresenceAction { action: String },

    #[error("invalid game id: {details}")]
    InvalidGameId { details: String },
}

/// Result type aliases for convenience
pub type DataxoResult<T> = Result<T, DataxoError>;
pub type GameResult<T> = Result<T, GameError>;

impl GameError {
    pub fn new(kind: GameErrorKind) -> Self {
        Self {
            kind,
            context: ErrorContext::default(),
        }
    }

    pub fn with_game(mut self, game_id: GameId) -> Self {
        self.context.game_id = Some(game_id);
        self
    }

    pub fn with_player(mut self, player_id: impl Into<PlayerId>) -> Self {
        self.context.player_id = Some(player_id.into());
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.context.side = Some(side);
        self
    }

    pub fn with_move(mut self, game_move: &Move) -> Self {
        self.context.game_move = Some(game_move.clone());
        self
    }

    pub fn with_max_in_game_id(mut self, max_in_game_id: usize) -> Self {
        self.context.max_in_game_id = Some(max_in_game_id);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.context.detail = Some(detail.into());
        self
    }

    pub fn not_found(game_id: GameId) -> Self {
        Self::new(GameErrorKind::NotFound).with_game(game_id)
    }

    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::new(GameErrorKind::InvalidConfig).with_detail(detail)
    }

    /// Whether the client's view of the board is likely stale.
    pub fn need_re_sync(&self) -> bool {
        matches!(
            self.kind,
            GameErrorKind::InvalidMoveSequence
                | GameErrorKind::InvalidSideTurn
                | GameErrorKind::PlaceAlreadyTaken
        )
    }
}

impl From<GameErrorKind> for GameError {
    fn from(kind: GameErrorKind) -> Self {
        GameError::new(kind)
    }
}

impl From<GameErrorKind> for DataxoError {
    fn from(kind: GameErrorKind) -> Self {
        DataxoError::Game(GameError::new(kind))
    }
}

impl DataxoError {
    /// Kind of the underlying game error, if this is one.
    pub fn kind(&self) -> Option<GameErrorKind> {
        match self {
            DataxoError::Game(err) => Some(err.kind),
            _ => None,
        }
    }

    pub fn is_logic_error(&self) -> bool {
        matches!(self, DataxoError::Logic(_))
    }

    pub fn need_re_sync(&self) -> bool {
        match self {
            DataxoError::Game(err) => err.need_re_sync(),
            _ => false,
        }
    }
}

impl NetworkError {
    pub fn deserialization_failed(details: impl Into<String>) -> Self {
        Self::DeserializationFailed {
            details: details.into(),
        }
    }

    pub fn serialization_failed(details: impl Into<String>) -> Self {
        Self::SerializationFailed {
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_context_does_not_change_kind() {
        let bare = GameError::new(GameErrorKind::InvalidMoveSequence);
        let tagged = GameError::new(GameErrorKind::InvalidMoveSequence)
            .with_game(Uuid::new_v4())
            .with_max_in_game_id(1);

        assert_eq!(bare.kind, tagged.kind);
        assert_ne!(bare, tagged);
    }

    #[test]
    fn test_display_includes_context() {
        let game_id = Uuid::new_v4();
        let game_move = Move::new(5, 1, 2, Side::X);
        let err = GameError::new(GameErrorKind::InvalidMoveSequence)
            .with_game(game_id)
            .with_move(&game_move)
            .with_max_in_game_id(1);

        let text = err.to_string();
        assert!(text.contains(&game_id.to_string()));
        assert!(text.contains("ingame_id(5)"));
        assert!(text.contains("max_ingame_id(1)"));
        assert!(text.ends_with("invalid move ingame id"));
    }

    #[test]
    fn test_top_level_kind_and_re_sync() {
        let err: DataxoError = GameErrorKind::PlaceAlreadyTaken.into();
        assert_eq!(err.kind(), Some(GameErrorKind::PlaceAlreadyTaken));
        assert!(err.need_re_sync());
        assert!(!err.is_logic_error());

        let err: DataxoError = GameErrorKind::NotEnoughPlayers.into();
        assert!(!err.need_re_sync());

        let logic: DataxoError = LogicError::MultipleWinLines {
            game_id: Uuid::new_v4(),
            in_game_id: 4,
            count: 2,
        }
        .into();
        assert_eq!(logic.kind(), None);
        assert!(logic.is_logic_error());
    }
}
