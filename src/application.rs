use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, info};
use rand::Rng;

use crate::enums::{GameState, Side, SideRequest};
use crate::errors::{DataxoResult, GameError, GameErrorKind, GameResult};
use crate::game::{CreateGameResult, Game, JoinGameResult, MakeMoveResult, Move};
use crate::modes::GameMode;
use crate::repository::GameRepository;
use crate::{GameId, PlayerId};

/// Orchestrates game lifecycle and turn dispatch.
///
/// The only entry point transport code calls into: rules live in the
/// [`GameMode`], state lives in the [`GameRepository`].
pub struct GameUseCase<R: GameRepository> {
    repo: Arc<R>,
    mode: Arc<dyn GameMode>,
    next_move_id: AtomicU64,
}

impl<R: GameRepository> GameUseCase<R> {
    pub fn new(repo: Arc<R>, mode: Arc<dyn GameMode>) -> Self {
        Self {
            repo,
            mode,
            next_move_id: AtomicU64::new(1),
        }
    }

    /// Creates a game with the creator seated on the requested side.
    pub async fn create_game(
        &self,
        player_id: PlayerId,
        mode: &str,
        side_request: SideRequest,
    ) -> GameResult<CreateGameResult> {
        let side = resolve_side(side_request);
        if !side.is_playable() {
            return Err(GameError::new(GameErrorKind::InvalidSide).with_player(player_id));
        }

        let game = self
            .repo
            .create_game(player_id.clone(), side, mode, self.mode.config())
            .await?;

        info!(
            "created {} game {} for player {} as {}",
            game.mode, game.id, player_id, side
        );
        Ok(CreateGameResult {
            game_id: game.id,
            side,
        })
    }

    /// Seats the player on the free side. X is preferred when both are free.
    pub async fn join_game(&self, game_id: GameId, player_id: PlayerId) -> GameResult<JoinGameResult> {
        let game = self.repo.get_game(game_id).await?;

        if game.side_of(&player_id) != Side::None {
            return Err(GameError::new(GameErrorKind::AlreadyJoined)
                .with_game(game_id)
                .with_player(player_id));
        }

        let side = if game.x_player.is_none() {
            Side::X
        } else if game.o_player.is_none() {
            Side::O
        } else {
            return Err(GameError::new(GameErrorKind::AllPlacesAlreadyTaken)
                .with_game(game_id)
                .with_player(player_id));
        };

        self.repo
            .add_game_player(game_id, player_id.clone(), side)
            .await?;

        let (x_player, o_player) = self.repo.get_players(game_id).await?;
        let ready_to_start = x_player.is_some() && o_player.is_some();
        debug!(
            "player {} joined game {} as {} (ready: {})",
            player_id, game_id, side, ready_to_start
        );

        Ok(JoinGameResult {
            side,
            ready_to_start,
        })
    }

    pub async fn start_game(&self, game_id: GameId) -> GameResult<()> {
        let game = self.repo.get_game(game_id).await?;

        match game.state {
            GameState::Finished => {
                return Err(GameError::new(GameErrorKind::GameFinished).with_game(game_id))
            }
            GameState::Started => {
                return Err(GameError::new(GameErrorKind::GameAlreadyStarted).with_game(game_id))
            }
            GameState::Created => {}
        }
        if !game.has_both_players() {
            return Err(GameError::new(GameErrorKind::NotEnoughPlayers).with_game(game_id));
        }

        self.repo
            .update_game_state(game_id, GameState::Started)
            .await?;
        info!("game {} started", game_id);
        Ok(())
    }

    /// Side the player is seated on, `Side::None` for a player who has not
    /// joined a game that still has a free seat.
    pub async fn get_side(&self, game_id: GameId, player_id: &str) -> GameResult<Side> {
        let game = self.repo.get_game(game_id).await?;

        let side = game.side_of(player_id);
        if side == Side::None && game.has_both_players() {
            return Err(GameError::new(GameErrorKind::AllPlacesAlreadyTaken)
                .with_game(game_id)
                .with_player(player_id));
        }
        Ok(side)
    }

    pub async fn get_game(&self, game_id: GameId) -> GameResult<Game> {
        self.repo.get_game(game_id).await
    }

    /// Validates and applies one move, finishing the game on a win or draw.
    ///
    /// The move is applied to a working copy under the game's lock; the
    /// stored game only changes when the whole turn succeeds.
    pub async fn make_move(&self, game_id: GameId, mut game_move: Move) -> DataxoResult<MakeMoveResult> {
        let game = self.repo.get_game(game_id).await?;
        match game.state {
            GameState::Created => {
                return Err(GameError::new(GameErrorKind::GameNotStarted)
                    .with_game(game_id)
                    .with_move(&game_move)
                    .into())
            }
            GameState::Finished => {
                return Err(GameError::new(GameErrorKind::GameFinished)
                    .with_game(game_id)
                    .with_move(&game_move)
                    .into())
            }
            GameState::Started => {}
        }

        // Unique across the process, not gapless: rejected moves burn an id.
        game_move.id = self.next_move_id.fetch_add(1, Ordering::Relaxed);

        let mode = Arc::clone(&self.mode);
        let result = self
            .repo
            .modify_game(game_id, move |game| {
                let events = mode.iterate_game(game, game_move)?;
                Ok(MakeMoveResult {
                    game_finished: game.is_finished(),
                    events,
                })
            })
            .await;

        if let Err(err) = &result {
            if err.is_logic_error() {
                error!("game {}: turn discarded: {}", game_id, err);
            }
        }
        result
    }
}

fn resolve_side(side_request: SideRequest) -> Side {
    match side_request {
        SideRequest::X => Side::X,
        SideRequest::O => Side::O,
        SideRequest::Random => {
            if rand::thread_rng().gen_bool(0.5) {
                Side::X
            } else {
                Side::O
            }
        }
    }
}
