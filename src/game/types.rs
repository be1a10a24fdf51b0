// src/game/types.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::board::Board;
use crate::config::ModeConfig;
use crate::enums::{GameState, MoveEventType, Side, WinSide};
use crate::{GameId, PlayerId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A single placement in a game's history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Move {
    /// Process-wide id, assigned when the move is accepted.
    pub id: u64,
    /// 0-based, gapless position in the game's history.
    pub in_game_id: usize,
    pub x: i32,
    pub y: i32,
    /// How many times the cell has been (re)placed, for client animation.
    pub times_used: u32,
    pub side: Side,
}

impl Move {
    pub fn new(in_game_id: usize, x: i32, y: i32, side: Side) -> Self {
        Self {
            id: 0,
            in_game_id,
            x,
            y,
            times_used: 0,
            side,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub ready: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>) -> Self {
        Self {
            id: id.into(),
            ready: false,
        }
    }
}

/// The aggregate owned by the game repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: GameId,
    pub mode: String,
    pub config: ModeConfig,
    pub state: GameState,
    pub moves: Vec<Move>,
    pub x_player: Option<Player>,
    pub o_player: Option<Player>,
    pub win_sequence: Vec<Move>,
    pub winner: WinSide,
}

impl Game {
    pub fn new(mode: impl Into<String>, config: ModeConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: mode.into(),
            config,
            state: GameState::Created,
            moves: Vec::new(),
            x_player: None,
            o_player: None,
            win_sequence: Vec::new(),
            winner: WinSide::None,
        }
    }

    pub fn player_slot(&mut self, side: Side) -> Option<&mut Option<Player>> {
        match side {
            Side::X => Some(&mut self.x_player),
            Side::O => Some(&mut self.o_player),
            Side::None => None,
        }
    }

    /// Side occupied by the given player, `Side::None` if neither.
    pub fn side_of(&self, player_id: &str) -> Side {
        if self.x_player.as_ref().is_some_and(|p| p.id == player_id) {
            Side::X
        } else if self.o_player.as_ref().is_some_and(|p| p.id == player_id) {
            Side::O
        } else {
            Side::None
        }
    }

    pub fn has_both_players(&self) -> bool {
        self.x_player.is_some() && self.o_player.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.state == GameState::Finished
    }

    /// Board over the moves currently visible under the game's piece limit.
    pub fn board(&self) -> Board {
        Board::from_moves(&self.moves, self.config.piece_limit)
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.moves.last()
    }

    /// Records the outcome and moves the game to `Finished`.
    pub fn finish(&mut self, result: WinResult) {
        self.winner = result.side;
        self.win_sequence = result.sequence;
        self.state = GameState::Finished;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WinResult {
    pub side: WinSide,
    pub sequence: Vec<Move>,
}

impl WinResult {
    pub fn no_winner() -> Self {
        Self::default()
    }

    pub fn draw() -> Self {
        Self {
            side: WinSide::Draw,
            sequence: Vec::new(),
        }
    }

    pub fn line(side: Side, sequence: Vec<Move>) -> Self {
        Self {
            side: side.into(),
            sequence,
        }
    }

    pub fn is_no_winner(&self) -> bool {
        self.side == WinSide::None
    }
}

/// One observable board change, for broadcasting to participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveEvent {
    pub event_type: MoveEventType,
    pub game_move: Move,
}

impl MoveEvent {
    pub fn placement(game_move: Move) -> Self {
        Self {
            event_type: MoveEventType::Placement,
            game_move,
        }
    }

    pub fn removal(game_move: Move) -> Self {
        Self {
            event_type: MoveEventType::Removal,
            game_move,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateGameResult {
    pub game_id: GameId,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinGameResult {
    pub side: Side,
    pub ready_to_start: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MakeMoveResult {
    pub game_finished: bool,
    pub events: Vec<MoveEvent>,
}
