use std::net::SocketAddr;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::errors::{GameError, GameResult};

/// Rules of a disappearing-pieces game.
///
/// Kept signed so that nonsense coming off the wire can be represented and
/// rejected by [`ModeConfig::validate`] instead of wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub board_width: i32,
    pub board_height: i32,
    pub win_line_length: i32,
    /// Pieces each side may have on the board at once. 0 is no limit.
    pub piece_limit: i32,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            board_width: 4,
            board_height: 4,
            win_line_length: 4,
            piece_limit: 6,
        }
    }
}

impl ModeConfig {
    pub fn new(board_width: i32, board_height: i32, win_line_length: i32, piece_limit: i32) -> Self {
        Self {
            board_width,
            board_height,
            win_line_length,
            piece_limit,
        }
    }

    pub fn validate(&self) -> GameResult<()> {
        if self.piece_limit < 0 {
            return Err(GameError::invalid_config("player figures limit is negative"));
        }
        if self.win_line_length <= 0 {
            return Err(GameError::invalid_config(
                "win line length is negative or equals to zero",
            ));
        }
        if self.board_width <= 0 {
            return Err(GameError::invalid_config(
                "board width is negative or equals to zero",
            ));
        }
        if self.board_height <= 0 {
            return Err(GameError::invalid_config(
                "board height is negative or equals to zero",
            ));
        }
        Ok(())
    }

    /// Number of moves visible on the board, `None` when unlimited.
    pub fn visible_window(&self) -> Option<usize> {
        if self.piece_limit > 0 {
            Some(self.piece_limit as usize * 2)
        } else {
            None
        }
    }

    pub fn cell_count(&self) -> usize {
        self.board_width.max(0) as usize * self.board_height.max(0) as usize
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.board_width && y < self.board_height
    }
}

/// Process configuration for the game server
#[derive(Parser, Debug, Clone)]
#[command(name = "dataxo", version, about = "Disappearing-pieces tic-tac-toe game server")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "DATAXO_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    #[arg(long, env = "DATAXO_BOARD_WIDTH", default_value_t = 4)]
    pub board_width: i32,

    #[arg(long, env = "DATAXO_BOARD_HEIGHT", default_value_t = 4)]
    pub board_height: i32,

    #[arg(long, env = "DATAXO_WIN_LINE_LENGTH", default_value_t = 4)]
    pub win_line_length: i32,

    /// Pieces per side kept on the board, 0 for unlimited
    #[arg(long, env = "DATAXO_PIECE_LIMIT", default_value_t = 6)]
    pub piece_limit: i32,

    /// Buffered broadcast messages before slow WebSocket clients start lagging
    #[arg(long, env = "DATAXO_BROADCAST_CAPACITY", default_value_t = 1000)]
    pub broadcast_capacity: usize,
}

impl ServerConfig {
    pub fn mode_config(&self) -> ModeConfig {
        ModeConfig::new(
            self.board_width,
            self.board_height,
            self.win_line_length,
            self.piece_limit,
        )
    }
}
