use log::debug;

use super::MoveMaker;
use crate::config::ModeConfig;
use crate::enums::Side;
use crate::game::{Board, Game, Move, MoveEvent};

/// Places pieces and retires the oldest one once a side exceeds its limit.
#[derive(Debug, Clone)]
pub struct DisappearingMoveMaker {
    config: ModeConfig,
}

impl DisappearingMoveMaker {
    pub fn new(config: ModeConfig) -> Self {
        Self { config }
    }
}

impl MoveMaker for DisappearingMoveMaker {
    fn make_move(&self, game: &mut Game, board: &mut Board, mut game_move: Move) -> Vec<MoveEvent> {
        let mut events = Vec::with_capacity(2);

        game_move.times_used = board.times_used_at(game_move.x, game_move.y) + 1;
        events.push(MoveEvent::placement(game_move.clone()));
        board.set_move(game_move.clone());
        game.moves.push(game_move);

        let Some(window) = self.config.visible_window() else {
            return events;
        };
        if game.moves.len() <= window {
            return events;
        }

        let removed_index = game.moves.len() - window - 1;
        events.push(MoveEvent::removal(game.moves[removed_index].clone()));

        let removed = &mut game.moves[removed_index];
        removed.side = Side::None;
        let still_on_cell = board
            .get_move(removed.x, removed.y)
            .is_some_and(|m| m.in_game_id == removed.in_game_id);
        if still_on_cell {
            board.set_move(removed.clone());
        }

        debug!(
            "game {}: move {} disappeared from ({}, {})",
            game.id, removed.in_game_id, removed.x, removed.y
        );

        events
    }
}
