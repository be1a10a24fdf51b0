// Dataxo game server library
//
// Engine for the disappearing-pieces line game plus the axum transport that
// serves it. Leaf modules first: rules never depend on transport.

// Core domain types
pub mod config;
pub mod enums;
pub mod errors;
pub mod game;

// Game rules and state
pub mod modes;
pub mod repository;

// Orchestration
pub mod application;

// Server implementation
pub mod handlers;
pub mod websocket;

// Re-export common types for convenient access
pub use crate::application::GameUseCase;
pub use crate::config::{ModeConfig, ServerConfig};
pub use crate::enums::{GameState, MoveEventType, Side, SideRequest, WinSide};
pub use crate::errors::{DataxoError, DataxoResult, GameError, GameErrorKind, GameResult};
pub use crate::game::{Board, Game, Move, MoveEvent, Player, WinResult};
pub use crate::modes::{DisappearingMode, GameMode, MODE_WITH_FRIEND};
pub use crate::repository::{GameRepository, InMemoryGameRepository};
pub use crate::websocket::{WebSocketService, WsMessage};

// Common types used throughout the application
pub type GameId = uuid::Uuid;
pub type PlayerId = String;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
