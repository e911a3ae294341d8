//! tetrs-engine - a falling-block game engine
//!
//! The engine is driven by [`Game::update`] at a fixed tick rate and by
//! [`KeyEvent`]s from any front end. Everything a renderer needs is exposed
//! through read-only queries on [`Game`].

pub mod bag;
pub mod board;
pub mod game;
pub mod input;
pub mod mode;
pub mod piece;
pub mod score;
pub mod settings;
pub mod srs;
pub mod tetromino;

pub use board::{Board, Cell};
pub use game::{Feedback, Game, GameState, Key, KeyEvent, Timing, Update};
pub use mode::{GameMode, GameResult, Outcome, RecordStore};
pub use piece::Piece;
pub use score::{LockScore, Score, Spin};
pub use settings::Settings;
pub use tetromino::{PieceKind, Rotation, RotationDirection};
