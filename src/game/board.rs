// src/game/board.rs
use std::collections::HashMap;

use super::types::{Move, Position};
use crate::enums::Side;

/// Positional index over the visible part of a game's history.
///
/// Never stored: rebuilt from the move list before every turn so it cannot
/// drift from the history it is derived from.
#[derive(Debug, Clone, Default)]
pub struct Board {
    cells: HashMap<Position, Move>,
    // Placement counts over the whole history, hidden moves included.
    times_used: HashMap<Position, u32>,
}

impl Board {
    /// Builds the board from the last `2 * piece_limit` moves, or from the
    /// whole history when `piece_limit` is 0.
    pub fn from_moves(moves: &[Move], piece_limit: i32) -> Self {
        let start = if piece_limit > 0 {
            moves.len().saturating_sub(piece_limit as usize * 2)
        } else {
            0
        };

        let mut board = Board {
            cells: HashMap::with_capacity(moves.len() - start),
            times_used: HashMap::new(),
        };
        for game_move in &moves[..start] {
            board.record_use(game_move);
        }
        for game_move in &moves[start..] {
            board.set_move(game_move.clone());
        }
        board
    }

    /// Latest move at a cell, if the visible window has one.
    pub fn get_move(&self, x: i32, y: i32) -> Option<&Move> {
        self.cells.get(&Position::new(x, y))
    }

    pub fn side_at(&self, x: i32, y: i32) -> Side {
        self.get_move(x, y).map_or(Side::None, |m| m.side)
    }

    /// How many times the cell has been placed on, 0 if never.
    pub fn times_used_at(&self, x: i32, y: i32) -> u32 {
        self.times_used
            .get(&Position::new(x, y))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_move(&mut self, game_move: Move) {
        self.record_use(&game_move);
        self.cells.insert(game_move.position(), game_move);
    }

    fn record_use(&mut self, game_move: &Move) {
        let used = self.times_used.entry(game_move.position()).or_insert(0);
        *used = (*used).max(game_move.times_used);
    }

    /// Cells currently holding an X or O piece.
    pub fn occupied_count(&self) -> usize {
        self.cells.values().filter(|m| m.side != Side::None).count()
    }
}
