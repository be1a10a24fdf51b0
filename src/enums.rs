use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{GameError, GameErrorKind};

/// Side of the board a piece or player belongs to.
///
/// `None` marks an empty cell, and also a move that has been removed by
/// the disappearing-piece rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    None,
    X,
    O,
}

impl Side {
    /// X or O. `None` is never a playable side.
    pub fn is_playable(self) -> bool {
        matches!(self, Side::X | Side::O)
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::X => Side::O,
            Side::O => Side::X,
            Side::None => Side::None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::None => write!(f, "none"),
            Side::X => write!(f, "x"),
            Side::O => write!(f, "o"),
        }
    }
}

/// Outcome of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinSide {
    #[default]
    None,
    X,
    O,
    Draw,
}

impl From<Side> for WinSide {
    fn from(side: Side) -> Self {
        match side {
            Side::None => WinSide::None,
            Side::X => WinSide::X,
            Side::O => WinSide::O,
        }
    }
}

impl fmt::Display for WinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinSide::None => write!(f, "none"),
            WinSide::X => write!(f, "x"),
            WinSide::O => write!(f, "o"),
            WinSide::Draw => write!(f, "draw"),
        }
    }
}

/// Lifecycle of a game. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Created,
    Started,
    Finished,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Created => write!(f, "created"),
            GameState::Started => write!(f, "started"),
            GameState::Finished => write!(f, "finished"),
        }
    }
}

/// Side asked for by the creator of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideRequest {
    Random,
    X,
    O,
}

/// Wire encoding used by the create endpoint: 0 random, 1 X, 2 O.
impl TryFrom<i32> for SideRequest {
    type Error = GameError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SideRequest::Random),
            1 => Ok(SideRequest::X),
            2 => Ok(SideRequest::O),
            _ => Err(GameError::new(GameErrorKind::InvalidSide)),
        }
    }
}

/// Kind of observable board change produced by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveEventType {
    #[serde(rename = "place_move")]
    Placement,
    #[serde(rename = "remove_move")]
    Removal,
    // Reserved for future modes.
    #[serde(rename = "heat_move")]
    Heat,
    #[serde(rename = "block_move")]
    Block,
}
