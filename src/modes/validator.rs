use super::MoveValidator;
use crate::config::ModeConfig;
use crate::enums::Side;
use crate::errors::{GameError, GameErrorKind, GameResult};
use crate::game::{Board, Game, Move};

/// Turn order, sequencing, bounds and occupancy rules shared by every
/// line-forming mode.
#[derive(Debug, Clone)]
pub struct DefaultMoveValidator {
    config: ModeConfig,
}

impl DefaultMoveValidator {
    pub fn new(config: ModeConfig) -> Self {
        Self { config }
    }

    /// Highest in-game id in the history, 0 for an empty one.
    pub fn max_in_game_id(moves: &[Move]) -> usize {
        moves.iter().map(|m| m.in_game_id).max().unwrap_or(0)
    }

    pub fn validate_in_game_id(in_game_id: usize, moves: &[Move]) -> GameResult<()> {
        if moves.is_empty() {
            if in_game_id != 0 {
                return Err(GameErrorKind::InvalidMoveSequence.into());
            }
            return Ok(());
        }

        if in_game_id != Self::max_in_game_id(moves) + 1 || in_game_id != moves.len() {
            return Err(GameErrorKind::InvalidMoveSequence.into());
        }
        Ok(())
    }

    pub fn validate_side_turn(moves: &[Move], side: Side) -> GameResult<()> {
        match moves.last() {
            None if side == Side::X => Ok(()),
            None => Err(GameErrorKind::InvalidSideTurn.into()),
            Some(previous) if previous.side == side => Err(GameErrorKind::InvalidSideTurn.into()),
            Some(_) => Ok(()),
        }
    }

    pub fn validate_coords(&self, x: i32, y: i32) -> GameResult<()> {
        if !self.config.contains(x, y) {
            return Err(GameErrorKind::MoveOutOfBoard.into());
        }
        Ok(())
    }

    pub fn validate_side(side: Side) -> GameResult<()> {
        if !side.is_playable() {
            return Err(GameErrorKind::InvalidSide.into());
        }
        Ok(())
    }
}

impl MoveValidator for DefaultMoveValidator {
    fn validate_move(&self, game: &Game, board: &Board, game_move: &Move) -> GameResult<()> {
        let tag = |err: GameError| err.with_game(game.id).with_move(game_move);

        if board.side_at(game_move.x, game_move.y) != Side::None {
            return Err(tag(GameErrorKind::PlaceAlreadyTaken.into()));
        }

        Self::validate_in_game_id(game_move.in_game_id, &game.moves)
            .map_err(|err| tag(err).with_max_in_game_id(Self::max_in_game_id(&game.moves)))?;

        Self::validate_side_turn(&game.moves, game_move.side)
            .map_err(|err| tag(err).with_side(game_move.side))?;

        self.validate_coords(game_move.x, game_move.y).map_err(tag)?;

        Self::validate_side(game_move.side).map_err(|err| tag(err).with_side(game_move.side))?;

        Ok(())
    }
}
