use log::{debug, info, warn};

use super::{
    DefaultMoveValidator, DisappearingMoveMaker, GameMode, LineWinChecker, MoveMaker,
    MoveValidator, WinChecker, MODE_WITH_FRIEND,
};
use crate::config::ModeConfig;
use crate::enums::GameState;
use crate::errors::{DataxoResult, GameError, GameErrorKind, GameResult};
use crate::game::{Board, Game, Move, MoveEvent};

/// Line-forming game where each side's oldest piece vanishes once it has
/// more than `piece_limit` pieces on the board.
pub struct DisappearingMode {
    config: ModeConfig,
    validator: Box<dyn MoveValidator>,
    move_maker: Box<dyn MoveMaker>,
    win_checker: Box<dyn WinChecker>,
}

impl std::fmt::Debug for DisappearingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisappearingMode")
            .field("config", &self.config)
            .finish()
    }
}

impl DisappearingMode {
    pub fn new(config: ModeConfig) -> GameResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            validator: Box::new(DefaultMoveValidator::new(config)),
            move_maker: Box::new(DisappearingMoveMaker::new(config)),
            win_checker: Box::new(LineWinChecker::new(config)),
        })
    }
}

impl GameMode for DisappearingMode {
    fn name(&self) -> &str {
        MODE_WITH_FRIEND
    }

    fn config(&self) -> ModeConfig {
        self.config
    }

    fn iterate_game(&self, game: &mut Game, game_move: Move) -> DataxoResult<Vec<MoveEvent>> {
        match game.state {
            GameState::Created => {
                return Err(GameError::new(GameErrorKind::GameNotStarted)
                    .with_game(game.id)
                    .into())
            }
            GameState::Finished => {
                return Err(GameError::new(GameErrorKind::GameFinished)
                    .with_game(game.id)
                    .into())
            }
            GameState::Started => {}
        }

        let mut board = Board::from_moves(&game.moves, self.config.piece_limit);

        if let Err(err) = self.validator.validate_move(game, &board, &game_move) {
            warn!("rejected move: {}", err);
            return Err(err.into());
        }

        let events = self.move_maker.make_move(game, &mut board, game_move);

        let Some(placed) = game.last_move().cloned() else {
            return Ok(events);
        };
        debug!(
            "game {}: {} placed move {} at ({}, {})",
            game.id, placed.side, placed.in_game_id, placed.x, placed.y
        );

        let result = self.win_checker.check_win(game, &board, &placed)?;
        if !result.is_no_winner() {
            info!(
                "game {} finished after {} moves, winner: {}",
                game.id,
                game.moves.len(),
                result.side
            );
            game.finish(result);
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{MoveEventType, Side, WinSide};

    fn started_game(mode: &DisappearingMode) -> Game {
        let mut game = Game::new(MODE_WITH_FRIEND, mode.config());
        game.state = GameState::Started;
        game
    }

    fn play(mode: &DisappearingMode, game: &mut Game, cells: &[(i32, i32)]) -> Vec<MoveEvent> {
        let mut last = Vec::new();
        for &(x, y) in cells {
            let in_game_id = game.moves.len();
            let side = if in_game_id % 2 == 0 { Side::X } else { Side::O };
            last = mode
                .iterate_game(game, Move::new(in_game_id, x, y, side))
                .unwrap();
        }
        last
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = DisappearingMode::new(ModeConfig::new(3, 3, 0, 0)).unwrap_err();
        assert_eq!(err.kind, GameErrorKind::InvalidConfig);
    }

    #[test]
    fn test_created_and_finished_games_rejected() {
        let mode = DisappearingMode::new(ModeConfig::new(3, 3, 3, 0)).unwrap();
        let mut game = Game::new(MODE_WITH_FRIEND, mode.config());

        let err = mode
            .iterate_game(&mut game, Move::new(0, 0, 0, Side::X))
            .unwrap_err();
        assert_eq!(err.kind(), Some(GameErrorKind::GameNotStarted));

        game.state = GameState::Finished;
        let err = mode
            .iterate_game(&mut game, Move::new(0, 0, 0, Side::X))
            .unwrap_err();
        assert_eq!(err.kind(), Some(GameErrorKind::GameFinished));
        assert!(game.moves.is_empty());
    }

    #[test]
    fn test_win_finishes_game() {
        let mode = DisappearingMode::new(ModeConfig::new(3, 3, 3, 0)).unwrap();
        let mut game = started_game(&mode);

        play(&mode, &mut game, &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);

        assert_eq!(game.state, GameState::Finished);
        assert_eq!(game.winner, WinSide::X);
        assert_eq!(game.win_sequence.len(), 3);

        let err = mode
            .iterate_game(&mut game, Move::new(5, 2, 2, Side::O))
            .unwrap_err();
        assert_eq!(err.kind(), Some(GameErrorKind::GameFinished));
    }

    #[test]
    fn test_rejected_move_leaves_game_untouched() {
        let mode = DisappearingMode::new(ModeConfig::new(3, 3, 3, 1)).unwrap();
        let mut game = started_game(&mode);
        play(&mode, &mut game, &[(0, 0), (1, 1)]);
        let before = game.clone();

        let err = mode
            .iterate_game(&mut game, Move::new(2, 1, 1, Side::X))
            .unwrap_err();
        assert_eq!(err.kind(), Some(GameErrorKind::PlaceAlreadyTaken));
        assert_eq!(game, before);
    }

    #[test]
    fn test_disappearing_piece_emits_removal() {
        let mode = DisappearingMode::new(ModeConfig::new(3, 3, 3, 1)).unwrap();
        let mut game = started_game(&mode);

        let events = play(&mode, &mut game, &[(0, 0), (1, 1), (0, 1)]);

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, MoveEventType::Removal);
        assert_eq!((events[1].game_move.x, events[1].game_move.y), (0, 0));
        assert_eq!(game.moves[0].side, Side::None);
        assert_eq!(game.state, GameState::Started);
    }
}
