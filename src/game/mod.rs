// src/game/mod.rs
mod board;
mod types;

pub use board::*;
pub use types::*;
