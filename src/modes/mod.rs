// Game rule capabilities.
//
// A mode is composed from a validator, a move maker and a win checker; the
// use-case layer only ever talks to `GameMode`.
use crate::config::ModeConfig;
use crate::errors::{DataxoResult, GameResult};
use crate::game::{Board, Game, Move, MoveEvent, WinResult};

pub mod disappearing;
pub mod move_maker;
pub mod validator;
pub mod win_checker;

pub use disappearing::DisappearingMode;
pub use move_maker::DisappearingMoveMaker;
pub use validator::DefaultMoveValidator;
pub use win_checker::LineWinChecker;

/// Tag of the play-with-a-friend mode.
pub const MODE_WITH_FRIEND: &str = "with-friend";

/// Checks a move against the rules without touching the game
pub trait MoveValidator: Send + Sync {
    fn validate_move(&self, game: &Game, board: &Board, game_move: &Move) -> GameResult<()>;
}

/// Applies an already validated move
pub trait MoveMaker: Send + Sync {
    /// Appends the move to the history, updates the board, and returns the
    /// observable changes in the order they happened.
    fn make_move(&self, game: &mut Game, board: &mut Board, game_move: Move) -> Vec<MoveEvent>;
}

/// Decides whether the newest move ended the game
pub trait WinChecker: Send + Sync {
    fn check_win(&self, game: &Game, board: &Board, game_move: &Move) -> DataxoResult<WinResult>;
}

/// A complete rule set for one kind of game
pub trait GameMode: Send + Sync {
    fn name(&self) -> &str;

    /// Configuration new games of this mode are created with
    fn config(&self) -> ModeConfig;

    /// Validates and applies one move, finishing the game on a win or draw.
    ///
    /// On error nothing in `game` has been changed, except for logic errors
    /// raised after the move was applied; callers must discard the game in
    /// that case.
    fn iterate_game(&self, game: &mut Game, game_move: Move) -> DataxoResult<Vec<MoveEvent>>;
}
