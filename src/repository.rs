use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use crate::config::ModeConfig;
use crate::enums::{GameState, Side};
use crate::errors::{DataxoError, DataxoResult, GameError, GameErrorKind, GameResult};
use crate::game::{Game, Player};
use crate::{GameId, PlayerId};

/// Exclusive owner of every live game.
///
/// Callers get snapshots; the only way to change a stored game is through
/// one of the mutating methods, each atomic for that game.
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn create_game(
        &self,
        player_id: PlayerId,
        side: Side,
        mode: &str,
        config: ModeConfig,
    ) -> GameResult<Game>;

    async fn get_game(&self, game_id: GameId) -> GameResult<Game>;

    /// Moves the game forward in its lifecycle. Backward or repeated
    /// transitions are rejected.
    async fn update_game_state(&self, game_id: GameId, state: GameState) -> GameResult<()>;

    /// Replaces the stored game wholesale.
    async fn update_game(&self, game: Game) -> GameResult<()>;

    async fn get_players(&self, game_id: GameId) -> GameResult<(Option<Player>, Option<Player>)>;

    async fn add_game_player(&self, game_id: GameId, player_id: PlayerId, side: Side) -> GameResult<()>;

    /// Runs `command` against a working copy of the game under that game's
    /// lock, storing the copy only if the command succeeds.
    async fn modify_game<F, T>(&self, game_id: GameId, command: F) -> DataxoResult<T>
    where
        F: FnOnce(&mut Game) -> DataxoResult<T> + Send,
        T: Send;
}

/// In-process game store.
///
/// The map lock is only held to insert or look up a game; every game has its
/// own lock, so moves in different games never wait on each other.
#[derive(Clone, Default)]
pub struct InMemoryGameRepository {
    games: Arc<RwLock<HashMap<GameId, Arc<RwLock<Game>>>>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn game_lock(&self, game_id: GameId) -> GameResult<Arc<RwLock<Game>>> {
        let games = self.games.read().await;
        games
            .get(&game_id)
            .cloned()
            .ok_or_else(|| GameError::not_found(game_id))
    }

    /// Number of games in the store
    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.games.read().await.is_empty()
    }
}

fn transition_error(game: &Game, state: GameState) -> GameError {
    let kind = match game.state {
        GameState::Finished => GameErrorKind::GameFinished,
        GameState::Started => GameErrorKind::GameAlreadyStarted,
        GameState::Created => GameErrorKind::GameNotStarted,
    };
    GameError::new(kind)
        .with_game(game.id)
        .with_detail(format!("{} -> {}", game.state, state))
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn create_game(
        &self,
        player_id: PlayerId,
        side: Side,
        mode: &str,
        config: ModeConfig,
    ) -> GameResult<Game> {
        let mut game = Game::new(mode, config);
        match game.player_slot(side) {
            Some(slot) => *slot = Some(Player::new(player_id)),
            None => {
                return Err(GameError::new(GameErrorKind::InvalidSide)
                    .with_player(player_id)
                    .with_side(side))
            }
        }

        let mut games = self.games.write().await;
        games.insert(game.id, Arc::new(RwLock::new(game.clone())));
        debug!("stored game {} ({} games live)", game.id, games.len());

        Ok(game)
    }

    async fn get_game(&self, game_id: GameId) -> GameResult<Game> {
        let game = self.game_lock(game_id).await?;
        let game = game.read().await;
        Ok(game.clone())
    }

    async fn update_game_state(&self, game_id: GameId, state: GameState) -> GameResult<()> {
        let game = self.game_lock(game_id).await?;
        let mut game = game.write().await;

        if state <= game.state {
            return Err(transition_error(&game, state));
        }
        game.state = state;
        Ok(())
    }

    async fn update_game(&self, game: Game) -> GameResult<()> {
        let stored = self.game_lock(game.id).await?;
        let mut stored = stored.write().await;
        *stored = game;
        Ok(())
    }

    async fn get_players(&self, game_id: GameId) -> GameResult<(Option<Player>, Option<Player>)> {
        let game = self.game_lock(game_id).await?;
        let game = game.read().await;
        Ok((game.x_player.clone(), game.o_player.clone()))
    }

    async fn add_game_player(&self, game_id: GameId, player_id: PlayerId, side: Side) -> GameResult<()> {
        let game = self.game_lock(game_id).await?;
        let mut game = game.write().await;

        let tag = |err: GameError, player_id: &str| {
            err.with_game(game_id).with_player(player_id).with_side(side)
        };

        if game.side_of(&player_id) != Side::None {
            return Err(tag(GameErrorKind::AlreadyJoined.into(), &player_id));
        }

        match game.player_slot(side) {
            None => Err(tag(GameErrorKind::InvalidSide.into(), &player_id)),
            Some(Some(_)) => Err(tag(GameErrorKind::AllPlacesAlreadyTaken.into(), &player_id)),
            Some(slot) => {
                *slot = Some(Player::new(player_id));
                Ok(())
            }
        }
    }

    async fn modify_game<F, T>(&self, game_id: GameId, command: F) -> DataxoResult<T>
    where
        F: FnOnce(&mut Game) -> DataxoResult<T> + Send,
        T: Send,
    {
        let game = self.game_lock(game_id).await.map_err(DataxoError::from)?;
        let mut game = game.write().await;

        let mut working = game.clone();
        let output = command(&mut working)?;
        *game = working;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Move;
    use crate::modes::MODE_WITH_FRIEND;
    use uuid::Uuid;

    async fn repo_with_game() -> (InMemoryGameRepository, Game) {
        let repo = InMemoryGameRepository::new();
        let game = repo
            .create_game("alice".into(), Side::X, MODE_WITH_FRIEND, ModeConfig::default())
            .await
            .unwrap();
        (repo, game)
    }

    #[tokio::test]
    async fn test_create_and_get_game() {
        let (repo, game) = repo_with_game().await;

        let stored = repo.get_game(game.id).await.unwrap();
        assert_eq!(stored, game);
        assert_eq!(stored.state, GameState::Created);
        assert_eq!(stored.x_player, Some(Player::new("alice")));
        assert!(stored.o_player.is_none());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_game_with_none_side_fails() {
        let repo = InMemoryGameRepository::new();
        let err = repo
            .create_game("alice".into(), Side::None, MODE_WITH_FRIEND, ModeConfig::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, GameErrorKind::InvalidSide);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_game_not_found() {
        let repo = InMemoryGameRepository::new();
        let err = repo.get_game(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, GameErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_state_only_moves_forward() {
        let (repo, game) = repo_with_game().await;

        repo.update_game_state(game.id, GameState::Started).await.unwrap();
        let err = repo
            .update_game_state(game.id, GameState::Started)
            .await
            .unwrap_err();
        assert_eq!(err.kind, GameErrorKind::GameAlreadyStarted);

        repo.update_game_state(game.id, GameState::Finished).await.unwrap();
        let err = repo
            .update_game_state(game.id, GameState::Created)
            .await
            .unwrap_err();
        assert_eq!(err.kind, GameErrorKind::GameFinished);
    }

    #[tokio::test]
    async fn test_add_player_checks_slot() {
        let (repo, game) = repo_with_game().await;

        let err = repo
            .add_game_player(game.id, "alice".into(), Side::O)
            .await
            .unwrap_err();
        assert_eq!(err.kind, GameErrorKind::AlreadyJoined);

        let err = repo
            .add_game_player(game.id, "bob".into(), Side::X)
            .await
            .unwrap_err();
        assert_eq!(err.kind, GameErrorKind::AllPlacesAlreadyTaken);

        let err = repo
            .add_game_player(game.id, "bob".into(), Side::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, GameErrorKind::InvalidSide);

        repo.add_game_player(game.id, "bob".into(), Side::O).await.unwrap();
        let (x, o) = repo.get_players(game.id).await.unwrap();
        assert_eq!(x.unwrap().id, "alice");
        assert_eq!(o.unwrap().id, "bob");
    }

    #[tokio::test]
    async fn test_update_game_replaces_aggregate() {
        let (repo, mut game) = repo_with_game().await;

        game.moves.push(Move::new(0, 1, 1, Side::X));
        game.state = GameState::Started;
        repo.update_game(game.clone()).await.unwrap();

        assert_eq!(repo.get_game(game.id).await.unwrap(), game);
    }

    #[tokio::test]
    async fn test_failed_command_is_discarded() {
        let (repo, game) = repo_with_game().await;

        let result: DataxoResult<()> = repo
            .modify_game(game.id, |g| {
                g.moves.push(Move::new(0, 0, 0, Side::X));
                Err(GameErrorKind::PlaceAlreadyTaken.into())
            })
            .await;
        assert!(result.is_err());
        assert!(repo.get_game(game.id).await.unwrap().moves.is_empty());

        let len = repo
            .modify_game(game.id, |g| {
                g.moves.push(Move::new(0, 0, 0, Side::X));
                Ok(g.moves.len())
            })
            .await
            .unwrap();
        assert_eq!(len, 1);
        assert_eq!(repo.get_game(game.id).await.unwrap().moves.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_joins_take_one_slot() {
        let (repo, game) = repo_with_game().await;

        let handles: Vec<_> = ["bob", "carol", "dave"]
            .into_iter()
            .map(|player| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.add_game_player(game.id, player.into(), Side::O).await
                })
            })
            .collect();

        let mut joined = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                joined += 1;
            }
        }
        assert_eq!(joined, 1);
    }
}
