use log::error;

use super::WinChecker;
use crate::config::ModeConfig;
use crate::enums::Side;
use crate::errors::{DataxoResult, LogicError};
use crate::game::{Board, Game, Move, WinResult};

/// The four directions a line can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Top to bottom
    Vertical,
    /// Left to right
    Horizontal,
    /// Top-left to bottom-right
    Diagonal,
    /// Top-right to bottom-left
    AntiDiagonal,
}

impl Axis {
    pub const ALL: [Axis; 4] = [
        Axis::Vertical,
        Axis::Horizontal,
        Axis::Diagonal,
        Axis::AntiDiagonal,
    ];

    /// Forward step along the axis. Lines are scanned in this direction.
    pub fn step(self) -> (i32, i32) {
        match self {
            Axis::Vertical => (0, 1),
            Axis::Horizontal => (1, 0),
            Axis::Diagonal => (1, 1),
            Axis::AntiDiagonal => (-1, 1),
        }
    }
}

/// Detects a line of `win_line_length` same-side pieces through the newest
/// move, and a full board.
#[derive(Debug, Clone)]
pub struct LineWinChecker {
    config: ModeConfig,
}

impl LineWinChecker {
    pub fn new(config: ModeConfig) -> Self {
        Self { config }
    }

    /// Winning line along one axis, ordered by the axis' forward step.
    ///
    /// Walks back to the start of the contiguous run holding the move, then
    /// requires exactly `win_line_length` same-side cells from there.
    pub fn check_axis(&self, board: &Board, game_move: &Move, axis: Axis) -> Option<Vec<Move>> {
        let side = game_move.side;
        if !side.is_playable() {
            return None;
        }

        let (dx, dy) = axis.step();
        let (mut x, mut y) = (game_move.x, game_move.y);
        while self.config.contains(x - dx, y - dy) && board.side_at(x - dx, y - dy) == side {
            x -= dx;
            y -= dy;
        }

        let length = self.config.win_line_length;
        if !self.config.contains(x + dx * (length - 1), y + dy * (length - 1)) {
            return None;
        }

        let mut sequence = Vec::with_capacity(length as usize);
        for i in 0..length {
            match board.get_move(x + dx * i, y + dy * i) {
                Some(cell) if cell.side == side => sequence.push(cell.clone()),
                _ => return None,
            }
        }
        Some(sequence)
    }

    /// Number of pieces the draw rule considers on the board after `game_move`.
    pub fn filled_cells(&self, game_move: &Move) -> usize {
        let placed = game_move.in_game_id + 1;
        if self.config.piece_limit > 0 {
            placed.min(self.config.piece_limit as usize)
        } else {
            placed
        }
    }
}

impl WinChecker for LineWinChecker {
    fn check_win(&self, game: &Game, board: &Board, game_move: &Move) -> DataxoResult<WinResult> {
        let mut lines: Vec<(Axis, Vec<Move>)> = Axis::ALL
            .iter()
            .filter_map(|&axis| self.check_axis(board, game_move, axis).map(|line| (axis, line)))
            .collect();

        match lines.len() {
            0 => {}
            1 => {
                let (_, sequence) = lines.remove(0);
                return Ok(WinResult::line(game_move.side, sequence));
            }
            count => {
                let axes: Vec<Axis> = lines.iter().map(|(axis, _)| *axis).collect();
                error!(
                    "game {}: move {} completed {} lines at once: {:?}",
                    game.id, game_move.in_game_id, count, axes
                );
                return Err(LogicError::MultipleWinLines {
                    game_id: game.id,
                    in_game_id: game_move.in_game_id,
                    count,
                }
                .into());
            }
        }

        if self.filled_cells(game_move) == self.config.cell_count() {
            return Ok(WinResult::draw());
        }

        Ok(WinResult::no_winner())
    }
}
